use std::collections::BTreeMap;
use std::fmt;

use crate::parser::ast::{Position, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Variable => f.write_str("variable"),
            SymbolKind::Parameter => f.write_str("parameter"),
            SymbolKind::Function => f.write_str("function"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub _type: Type,
    pub kind: SymbolKind,
    pub scope_id: usize,
    /// Ordered parameter types; empty unless `kind` is `Function`.
    pub param_types: Vec<Type>,
    pub used: bool,
    pub position: Position,
}

#[derive(Debug)]
struct Scope {
    id: usize,
    symbols: BTreeMap<String, Symbol>,
}

/// Lexical scopes, innermost last. Index 0 is the global scope and is never
/// popped.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    next_id: usize,
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack::new()
    }
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack {
            scopes: vec![Scope {
                id: 0,
                symbols: BTreeMap::new(),
            }],
            next_id: 1,
        }
    }

    pub fn current_id(&self) -> usize {
        self.scopes.last().map_or(0, |scope| scope.id)
    }

    pub fn enter(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.scopes.push(Scope {
            id,
            symbols: BTreeMap::new(),
        });
        id
    }

    /// Closes the innermost scope and hands back the symbols it held.
    pub fn exit(&mut self) -> Vec<Symbol> {
        if self.scopes.len() <= 1 {
            return vec![];
        }
        self.scopes
            .pop()
            .map(|scope| scope.symbols.into_values().collect())
            .unwrap_or_default()
    }

    // The global scope is never popped, so the stack is never empty.
    fn innermost(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Declares into the innermost scope. On a same-level clash the existing
    /// symbol is returned as the error.
    pub fn declare(
        &mut self,
        name: &str,
        _type: Type,
        kind: SymbolKind,
        param_types: Vec<Type>,
        position: Position,
    ) -> Result<(), Symbol> {
        let scope = self.innermost();
        let scope_id = scope.id;

        if let Some(existing) = scope.symbols.get(name) {
            return Err(existing.clone());
        }

        scope.symbols.insert(
            name.to_owned(),
            Symbol {
                name: name.to_owned(),
                _type,
                kind,
                scope_id,
                param_types,
                used: false,
                position,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
    }

    /// Looks a name up and flags the match as used.
    pub fn resolve(&mut self, name: &str) -> Option<&Symbol> {
        let symbol = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.symbols.get_mut(name))?;
        symbol.used = true;
        Some(symbol)
    }

    /// Drains every scope still open, outermost first.
    pub fn into_symbols(self) -> Vec<Symbol> {
        self.scopes
            .into_iter()
            .flat_map(|scope| scope.symbols.into_values())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare_var(scopes: &mut ScopeStack, name: &str) -> Result<(), Symbol> {
        scopes.declare(name, Type::Int, SymbolKind::Variable, vec![], Position::new(1, 0))
    }

    #[test]
    fn test_symbol_invisible_after_scope_exit() {
        let mut scopes = ScopeStack::new();
        scopes.enter();
        declare_var(&mut scopes, "x").unwrap();
        assert!(scopes.lookup("x").is_some());

        let closed = scopes.exit();
        assert_eq!(closed.len(), 1);
        assert!(scopes.lookup("x").is_none());
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let mut scopes = ScopeStack::new();
        scopes.enter();
        declare_var(&mut scopes, "x").unwrap();
        let existing = declare_var(&mut scopes, "x").unwrap_err();
        assert_eq!(existing.name, "x");
    }

    #[test]
    fn test_shadowing_in_nested_scope() {
        let mut scopes = ScopeStack::new();
        scopes.enter();
        declare_var(&mut scopes, "x").unwrap();
        let inner = scopes.enter();
        scopes
            .declare("x", Type::Float, SymbolKind::Variable, vec![], Position::new(2, 0))
            .unwrap();

        let found = scopes.lookup("x").unwrap();
        assert_eq!(found._type, Type::Float);
        assert_eq!(found.scope_id, inner);

        scopes.exit();
        assert_eq!(scopes.lookup("x").unwrap()._type, Type::Int);
    }

    #[test]
    fn test_resolve_marks_used() {
        let mut scopes = ScopeStack::new();
        declare_var(&mut scopes, "x").unwrap();
        assert!(!scopes.lookup("x").unwrap().used);
        scopes.resolve("x");
        assert!(scopes.lookup("x").unwrap().used);
        assert!(scopes.resolve("y").is_none());
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut scopes = ScopeStack::new();
        declare_var(&mut scopes, "g").unwrap();
        assert!(scopes.exit().is_empty());
        assert_eq!(scopes.current_id(), 0);
        declare_var(&mut scopes, "h").unwrap();
        assert_eq!(scopes.lookup("h").unwrap().scope_id, 0);
        assert!(scopes.lookup("g").is_some());
    }

    #[test]
    fn test_scope_ids_are_unique() {
        let mut scopes = ScopeStack::new();
        let a = scopes.enter();
        scopes.exit();
        let b = scopes.enter();
        assert_ne!(a, b);
    }
}
