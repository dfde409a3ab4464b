//! Parse-time lexical scope records and closure resolution.
//!
//! Scopes are pushed while parsing scope-introducing constructs and stay
//! attached to the node that introduced them. After the tree is complete,
//! [`resolve_closures`] walks it bottom-up and turns the recorded
//! name references into captured-variable sets on every function and class
//! boundary the reference crosses.

use crate::ast::{NodeArena, NodeId};
use std::collections::BTreeSet;

/// Stable index of a scope record inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// Scope flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Block scope: `let`/`const` attach here, `var` hoists through
    Block,
    /// Function or program scope: `var` declarations land here
    Lex,
}

/// Declaration keyword recorded with each binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `var`
    Var,
    /// `const`
    Const,
    /// `let`
    Let,
    /// Hoisted `function`
    Function,
}

/// One recorded binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Declaration keyword
    pub kind: DeclarationKind,
    /// Node that introduced the binding
    pub node: NodeId,
    /// Bound name
    pub name: String,
}

/// One parse-time scope record.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    /// Scope flavor
    pub kind: ScopeKind,
    /// Enclosing scope
    pub parent: Option<ScopeId>,
    /// Node that introduced this scope
    pub node: NodeId,
    /// Bindings declared here, in declaration order
    pub declarations: Vec<Declaration>,
    /// Names referenced in or under the owning node
    pub refs: BTreeSet<String>,
}

/// Arena holding every scope record of one tree.
///
/// Records are popped from the parser's working stack when their construct
/// completes, but stay alive here until the whole tree is dropped.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a scope record.
    pub fn alloc(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    /// Borrow a scope record.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Mutably borrow a scope record.
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// Number of records allocated.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// True when no scope has been allocated.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Resolve closure captures over a finished tree, bottom-up.
///
/// For every name a scope recorded as referenced, the scope-parent chain is
/// searched for the declaring scope. Every function/class boundary crossed
/// on the way has the name inserted into its captured set, and into its own
/// reference set so the capture propagates outward transitively. A
/// function's reference to its own declared name, and a body's reference to
/// its own function's name, do not capture.
pub fn resolve_closures(arena: &mut NodeArena, scopes: &mut ScopeArena, node: NodeId) {
    for child in arena.node(node).kind.children() {
        resolve_closures(arena, scopes, child);
    }
    let Some(scope_id) = arena.node(node).scope else {
        return;
    };
    let refs: Vec<String> = scopes.scope(scope_id).refs.iter().cloned().collect();
    for name in refs {
        let mut crossed: Vec<ScopeId> = Vec::new();
        let mut declaration: Option<NodeId> = None;
        let mut cursor = Some(scope_id);
        while let Some(current) = cursor {
            let scope = scopes.scope(current);
            if let Some(found) = scope
                .declarations
                .iter()
                .find(|declaration| declaration.name == name)
            {
                declaration = Some(found.node);
                break;
            }
            if scope.kind == ScopeKind::Lex {
                crossed.push(current);
            }
            cursor = scope.parent;
        }
        let Some(declaration) = declaration else {
            continue;
        };
        if matches!(
            arena.node(node).kind,
            crate::ast::NodeKind::FunctionBody { .. }
        ) {
            if arena.node(node).parent == Some(declaration) {
                continue;
            }
        } else if node == declaration {
            continue;
        }
        for crossed_scope in crossed {
            let owner = scopes.scope(crossed_scope).node;
            if let Some(closure) = arena.node_mut(owner).kind.closure_mut() {
                closure.insert(name.clone());
                if let Some(owner_scope) = arena.node(owner).scope {
                    scopes.scope_mut(owner_scope).refs.insert(name.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, NodeKind};
    use core_types::SourceSpan;

    #[test]
    fn test_scope_arena_alloc() {
        let mut arena = NodeArena::new();
        let node = arena.alloc(Node::new(
            NodeKind::Program {
                interpreter: None,
                directives: vec![],
                statements: vec![],
            },
            SourceSpan::default(),
        ));
        let mut scopes = ScopeArena::new();
        let id = scopes.alloc(Scope {
            kind: ScopeKind::Lex,
            parent: None,
            node,
            declarations: vec![],
            refs: BTreeSet::new(),
        });
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes.scope(id).kind, ScopeKind::Lex);
    }

    #[test]
    fn test_refs_are_ordered() {
        let mut arena = NodeArena::new();
        let node = arena.alloc(Node::new(NodeKind::EmptyStatement, SourceSpan::default()));
        let mut scopes = ScopeArena::new();
        let id = scopes.alloc(Scope {
            kind: ScopeKind::Block,
            parent: None,
            node,
            declarations: vec![],
            refs: BTreeSet::new(),
        });
        scopes.scope_mut(id).refs.insert("zeta".to_string());
        scopes.scope_mut(id).refs.insert("alpha".to_string());
        let names: Vec<&String> = scopes.scope(id).refs.iter().collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }
}
