//! Compile-time name resolution: a stack of lexical scopes plus the global
//! name list, collapsed behind one resolver so callers never need to know
//! which backing store answered "is this name defined?".

use std::collections::HashSet;

use crate::error::EarlError;
use crate::pool::GlobalTable;

pub struct CompileContext {
    scopes: Vec<HashSet<String>>,
}

impl CompileContext {
    /// Scope 0 (the module scope) is always present.
    pub fn new() -> Self {
        CompileContext {
            scopes: vec![HashSet::new()],
        }
    }

    pub fn open_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    pub fn close_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "module scope must never be popped");
    }

    /// True iff `name` is visible in any open scope, or already a global.
    pub fn is_defined(&self, globals: &GlobalTable, name: &str) -> bool {
        globals.contains(name) || self.scopes.iter().any(|s| s.contains(name))
    }

    /// Insert `name` into the innermost scope.
    ///
    /// Precondition: the caller has already checked `!is_defined(..)`, and
    /// should report `EarlError::Name` itself before calling this — declaring
    /// a name that is already visible is a logic error in the compiler, not
    /// a user-facing failure path, so this only asserts in debug builds.
    pub fn declare(&mut self, name: &str) {
        let innermost = self
            .scopes
            .last_mut()
            .expect("module scope must never be popped");
        innermost.insert(name.to_string());
    }

    pub fn assert_not_defined(&self, globals: &GlobalTable, name: &str) -> Result<(), EarlError> {
        if self.is_defined(globals, name) {
            Err(EarlError::Name(format!(
                "identifier `{}` is already defined",
                name
            )))
        } else {
            Ok(())
        }
    }

    pub fn assert_defined(&self, globals: &GlobalTable, name: &str) -> Result<(), EarlError> {
        if self.is_defined(globals, name) {
            Ok(())
        } else {
            Err(EarlError::Name(format!(
                "identifier `{}` was not defined",
                name
            )))
        }
    }
}

impl Default for CompileContext {
    fn default() -> Self {
        Self::new()
    }
}
