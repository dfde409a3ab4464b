//! Vesper script compiler CLI
//!
//! Entry point for the standalone compiler driver. Parses CLI arguments,
//! compiles the given file and renders diagnostics, the AST, or the
//! bytecode disassembly.

use clap::Parser as ClapParser;
use script_cli::{CliError, Driver, Rendering};

/// Command line options.
#[derive(Debug, ClapParser)]
#[command(name = "vesper-script", about = "Vesper script compiler")]
struct Cli {
    /// Script file to compile
    file: String,

    /// Print the parsed AST as JSON
    #[arg(long)]
    print_ast: bool,

    /// Print the compiled bytecode disassembly
    #[arg(long)]
    print_bytecode: bool,
}

fn main() {
    let cli = Cli::parse();
    let rendering = if cli.print_ast {
        Rendering::Ast
    } else if cli.print_bytecode {
        Rendering::Disassembly
    } else {
        Rendering::Check
    };
    let mut driver = Driver::new();
    match driver.run_file(&cli.file, rendering) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(CliError::Io(error)) => {
            eprintln!("Error: could not read '{}': {}", cli.file, error);
            std::process::exit(1);
        }
        Err(CliError::Compile(error)) => {
            eprintln!("{}", error);
            std::process::exit(1);
        }
    }
}
