//! Unit test suite for the bytecode system component.

mod test_instruction_stream;
mod test_round_trip;
