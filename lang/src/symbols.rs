//! Scope tree and symbol table shared by both execution engines.
//!
//! Scopes form a tree rooted at the global scope; name lookup walks parent
//! links. The table also carries the register counter the bytecode compiler
//! uses to number symbols, reset for each function body.

use crate::error::LumenError;
use crate::runtime::value::Value;
use crate::source::Position;
use std::collections::HashMap;

/// Index of a scope in the table's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScopeId(usize);

#[derive(Debug, Clone)]
pub struct Symbol {
    pub mutable: bool,
    pub value: Value,
    /// Register index; populated by the bytecode compiler only.
    pub register: Option<usize>,
    /// Defined outside any function body. Such symbols live in the VM's
    /// globals vector rather than in a call frame.
    pub global: bool,
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    table: HashMap<String, Symbol>,
}

/// Saved state around a function body; restored on exit so the caller's
/// scope and register numbering resume unchanged.
#[derive(Debug, Clone, Copy)]
pub struct CallFrame {
    saved_scope: ScopeId,
    saved_count: usize,
    saved_len: usize,
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    global: ScopeId,
    current: ScopeId,
    symbol_count: usize,
    call_depth: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                table: HashMap::new(),
            }],
            global: ScopeId(0),
            current: ScopeId(0),
            symbol_count: 0,
            call_depth: 0,
        }
    }

    /// Open a lexical child scope of the current scope.
    pub fn push_scope(&mut self) {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(self.current),
            table: HashMap::new(),
        });
        self.current = id;
    }

    /// Close the current scope. Scope usage is strictly nested (the language
    /// has no closures), so the arena shrinks back with it.
    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            if self.current.0 == self.scopes.len() - 1 {
                self.scopes.pop();
            }
            self.current = parent;
        }
    }

    /// Enter a fresh scope parented at the *global* scope for a function
    /// call, restarting register numbering for the callee.
    pub fn enter_call(&mut self) -> CallFrame {
        let frame = CallFrame {
            saved_scope: self.current,
            saved_count: self.symbol_count,
            saved_len: self.scopes.len(),
        };
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(self.global),
            table: HashMap::new(),
        });
        self.current = id;
        self.symbol_count = 0;
        self.call_depth += 1;
        frame
    }

    pub fn exit_call(&mut self, frame: CallFrame) {
        self.scopes.truncate(frame.saved_len);
        self.current = frame.saved_scope;
        self.symbol_count = frame.saved_count;
        self.call_depth -= 1;
    }

    /// Number of symbols allocated so far in the active numbering (the
    /// program's for the top level, the callee's inside a call).
    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    pub fn in_call(&self) -> bool {
        self.call_depth > 0
    }

    /// Define a symbol in the current scope. Used by the interpreter, which
    /// tracks values but not registers.
    pub fn define(
        &mut self,
        name: &str,
        mutable: bool,
        value: Value,
        at: Position,
    ) -> Result<(), LumenError> {
        self.insert(name, mutable, value, None, at)
    }

    /// Define a symbol and allocate it the next register index. Used by the
    /// bytecode compiler.
    pub fn define_register(
        &mut self,
        name: &str,
        mutable: bool,
        at: Position,
    ) -> Result<usize, LumenError> {
        let register = self.symbol_count;
        self.insert(name, mutable, Value::Void, Some(register), at)?;
        self.symbol_count += 1;
        Ok(register)
    }

    fn insert(
        &mut self,
        name: &str,
        mutable: bool,
        value: Value,
        register: Option<usize>,
        at: Position,
    ) -> Result<(), LumenError> {
        let global = self.call_depth == 0;
        let scope = &mut self.scopes[self.current.0];
        if scope.table.contains_key(name) {
            return Err(LumenError::runtime_at(
                format!("'{name}' is already defined in this scope"),
                at,
            ));
        }
        scope.table.insert(
            name.to_string(),
            Symbol {
                mutable,
                value,
                register,
                global,
            },
        );
        Ok(())
    }

    /// Resolve a name through the scope chain.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut scope = self.current;
        loop {
            if let Some(symbol) = self.scopes[scope.0].table.get(name) {
                return Some(symbol);
            }
            scope = self.scopes[scope.0].parent?;
        }
    }

    /// Overwrite the value of an existing symbol, respecting mutability.
    pub fn assign(&mut self, name: &str, value: Value, at: Position) -> Result<(), LumenError> {
        let Some(scope) = self.resolve_scope(name) else {
            return Err(LumenError::symbol_not_found(name, at));
        };
        if let Some(symbol) = self.scopes[scope.0].table.get_mut(name) {
            if !symbol.mutable {
                return Err(LumenError::runtime_at(
                    format!("can't assign to constant '{name}'"),
                    at,
                ));
            }
            symbol.value = value;
        }
        Ok(())
    }

    fn resolve_scope(&self, name: &str) -> Option<ScopeId> {
        let mut scope = self.current;
        loop {
            if self.scopes[scope.0].table.contains_key(name) {
                return Some(scope);
            }
            scope = self.scopes[scope.0].parent?;
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn int(n: i64) -> Value {
        Value::Int(BigInt::from(n))
    }

    fn at() -> Position {
        Position::default()
    }

    #[test]
    fn define_and_lookup() {
        let mut symbols = SymbolTable::new();
        symbols.define("x", true, int(1), at()).unwrap();
        assert_eq!(symbols.lookup("x").map(|s| s.value.clone()), Some(int(1)));
        assert!(symbols.lookup("y").is_none());
    }

    #[test]
    fn duplicate_define_in_same_scope_errors() {
        let mut symbols = SymbolTable::new();
        symbols.define("x", true, int(1), at()).unwrap();
        assert!(symbols.define("x", true, int(2), at()).is_err());
    }

    #[test]
    fn inner_scopes_shadow_and_expire() {
        let mut symbols = SymbolTable::new();
        symbols.define("x", true, int(1), at()).unwrap();
        symbols.push_scope();
        symbols.define("x", true, int(2), at()).unwrap();
        assert_eq!(symbols.lookup("x").map(|s| s.value.clone()), Some(int(2)));
        symbols.pop_scope();
        assert_eq!(symbols.lookup("x").map(|s| s.value.clone()), Some(int(1)));
    }

    #[test]
    fn assignment_respects_mutability() {
        let mut symbols = SymbolTable::new();
        symbols.define("k", false, int(1), at()).unwrap();
        let error = symbols.assign("k", int(2), at()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "can't assign to constant 'k' at line 1, character 1"
        );
    }

    #[test]
    fn call_scopes_see_globals_but_not_caller_locals() {
        let mut symbols = SymbolTable::new();
        symbols.define("global", true, int(1), at()).unwrap();
        symbols.push_scope();
        symbols.define("local", true, int(2), at()).unwrap();

        let frame = symbols.enter_call();
        assert!(symbols.lookup("global").is_some());
        assert!(symbols.lookup("local").is_none());
        symbols.exit_call(frame);

        assert!(symbols.lookup("local").is_some());
    }

    #[test]
    fn call_resets_and_restores_register_numbering() {
        let mut symbols = SymbolTable::new();
        symbols.define_register("a", true, at()).unwrap();
        symbols.define_register("b", true, at()).unwrap();
        assert_eq!(symbols.symbol_count(), 2);

        let frame = symbols.enter_call();
        assert_eq!(symbols.symbol_count(), 0);
        assert_eq!(symbols.define_register("p", true, at()).unwrap(), 0);
        symbols.exit_call(frame);

        assert_eq!(symbols.symbol_count(), 2);
        assert_eq!(symbols.define_register("c", true, at()).unwrap(), 2);
    }

    #[test]
    fn globalness_follows_call_depth() {
        let mut symbols = SymbolTable::new();
        symbols.define_register("top", true, at()).unwrap();
        symbols.push_scope();
        symbols.define_register("nested", true, at()).unwrap();
        assert!(symbols.lookup("nested").is_some_and(|s| s.global));
        symbols.pop_scope();

        let frame = symbols.enter_call();
        symbols.define_register("param", true, at()).unwrap();
        assert!(symbols.lookup("param").is_some_and(|s| !s.global));
        symbols.exit_call(frame);
    }
}
