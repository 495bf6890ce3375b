//! Symbol table and scope tree (§3 "Symbol Table & Scope Tree").
//!
//! Grounded in `original_source/lab5/include/syntax_semantic_analyzer/
//! scope_table.h` (`ScopeTable`: counter, stack, parent/child maps) and
//! `lab6/include/syntax_semantic_analyzer/symbol_table.h` (`SymbolTable`: an
//! ordered `set<SymbolEntry>` keyed by `(scope_id, name)`). The `std::set`
//! ordering is reproduced here with an `IndexSet` insertion-then-binary-
//! lookup is unnecessary -- an `IndexMap` keyed by `(scope_id, name)` gives
//! the same uniqueness invariant with O(1) lookup instead of O(log n).

use indexmap::IndexMap;

use crate::error::{Error, Result};

pub const INT_MEMORY_SIZE: i64 = 4;
pub const FLOAT_MEMORY_SIZE: i64 = 8;
pub const MEMORY_ADDRESS_SIZE: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Array,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub scope_id: u32,
    pub data_type: String,
    pub memory_size: i64,
    pub array_length: Option<i64>,
    pub arg_list: Option<Vec<String>>,
    pub direct_child_scope: Option<u32>,
}

/// An ordered collection of symbol entries keyed by `(name, scope_id)`.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: IndexMap<(String, u32), SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry`, failing if `(name, scope_id)` is already taken
    /// (duplicate-declaration check, §4.7).
    pub fn add_symbol(&mut self, entry: SymbolEntry) -> Result<()> {
        let key = (entry.name.clone(), entry.scope_id);
        if self.entries.contains_key(&key) {
            return Err(Error::SemanticError(format!(
                "symbol `{}` already declared in scope {}",
                entry.name, entry.scope_id
            )));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    pub fn symbol_exists(&self, name: &str, scope_id: u32) -> bool {
        self.entries.contains_key(&(name.to_string(), scope_id))
    }

    pub fn find_in_scope(&self, name: &str, scope_id: u32) -> Option<&SymbolEntry> {
        self.entries.get(&(name.to_string(), scope_id))
    }

    /// Walks `scope_id` up through `scopes`' parent chain looking for
    /// `name`, stopping at the first scope that declares it.
    pub fn find_in_scope_chain(&self, name: &str, scope_id: u32, scopes: &ScopeTable) -> Option<&SymbolEntry> {
        let mut current = Some(scope_id);
        while let Some(scope) = current {
            if let Some(entry) = self.find_in_scope(name, scope) {
                return Some(entry);
            }
            current = scopes.parent_of(scope);
        }
        None
    }

    pub fn all_in_scope(&self, scope_id: u32) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.values().filter(move |e| e.scope_id == scope_id)
    }
}

/// A scope forest rooted at scope 0, with a stack of currently open scopes
/// (§3, §5: entry/exit is ordinary RAII via [`ScopeTable::enter`]/
/// [`ScopeTable::exit`] paired in the semantic walk).
#[derive(Debug, Clone)]
pub struct ScopeTable {
    next_id: u32,
    stack: Vec<u32>,
    parent: IndexMap<u32, u32>,
    children: IndexMap<u32, Vec<u32>>,
}

impl Default for ScopeTable {
    fn default() -> Self {
        ScopeTable {
            next_id: 1,
            stack: vec![0],
            parent: IndexMap::new(),
            children: IndexMap::new(),
        }
    }
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current(&self) -> u32 {
        *self.stack.last().expect("scope stack is never empty")
    }

    /// Pushes a fresh child scope of the current scope and returns its id.
    pub fn enter(&mut self) -> u32 {
        let parent = self.current();
        let id = self.next_id;
        self.next_id += 1;
        self.parent.insert(id, parent);
        self.children.entry(parent).or_default().push(id);
        self.stack.push(id);
        id
    }

    /// Pops the current scope, returning to its parent.
    pub fn exit(&mut self) -> Result<u32> {
        if self.stack.len() == 1 {
            return Err(Error::SemanticError("cannot exit the root scope".to_string()));
        }
        Ok(self.stack.pop().unwrap())
    }

    pub fn parent_of(&self, scope_id: u32) -> Option<u32> {
        self.parent.get(&scope_id).copied()
    }

    pub fn children_of(&self, scope_id: u32) -> &[u32] {
        self.children.get(&scope_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, scope_id: u32) -> SymbolEntry {
        SymbolEntry {
            name: name.to_string(),
            kind: SymbolKind::Variable,
            scope_id,
            data_type: "int".to_string(),
            memory_size: INT_MEMORY_SIZE,
            array_length: None,
            arg_list: None,
            direct_child_scope: None,
        }
    }

    #[test]
    fn rejects_duplicate_name_in_same_scope() {
        let mut table = SymbolTable::new();
        table.add_symbol(var("x", 0)).unwrap();
        assert!(table.add_symbol(var("x", 0)).is_err());
    }

    #[test]
    fn allows_same_name_in_different_scopes() {
        let mut table = SymbolTable::new();
        table.add_symbol(var("x", 0)).unwrap();
        assert!(table.add_symbol(var("x", 1)).is_ok());
    }

    #[test]
    fn scope_chain_lookup_finds_enclosing_declaration() {
        let mut scopes = ScopeTable::new();
        let child = scopes.enter();
        let mut table = SymbolTable::new();
        table.add_symbol(var("x", 0)).unwrap();
        assert!(table.find_in_scope_chain("x", child, &scopes).is_some());
        assert!(table.find_in_scope_chain("y", child, &scopes).is_none());
    }

    #[test]
    fn exit_root_scope_fails() {
        let mut scopes = ScopeTable::new();
        assert!(scopes.exit().is_err());
    }
}
