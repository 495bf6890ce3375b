//! Crate-wide error taxonomy.
//!
//! Every error here is fatal: there is no recovery path, and the pipeline
//! stops at the first one (§7). Each variant carries enough context to
//! render an actionable message without the caller needing to re-derive
//! state/terminal/symbol names from raw indices.

use crate::index::StateIndex;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("invalid item set: {0}")]
    InvalidItemSet(String),

    #[error("canonical collection construction failed: {0}")]
    CollectionConstructionFailure(String),

    #[error("grammar is not SLR(1): state {state:?}, terminal `{terminal}`: {reason}")]
    NotSlr1 {
        state: StateIndex,
        terminal: String,
        reason: String,
    },

    #[error("grammar is not LR(1): state {state:?}, terminal `{terminal}`: {reason}")]
    NotLr1 {
        state: StateIndex,
        terminal: String,
        reason: String,
    },

    #[error("ambiguous parsing table at state {state:?}, terminal `{terminal}` ({count} actions) -- this indicates a table-construction bug, not a user error")]
    AmbiguousTable {
        state: StateIndex,
        terminal: String,
        count: usize,
    },

    #[error("syntax error at state {state:?} on token `{terminal}` (value {value:?})")]
    SyntaxError {
        state: StateIndex,
        terminal: String,
        value: String,
    },

    #[error("unknown token type `{0}`: no matching grammar terminal")]
    UnknownToken(String),

    #[error("semantic error: {0}")]
    SemanticError(String),

    #[error("intermediate-code error: node `{0}` emitted before its children")]
    IntermediateCodeError(String),

    #[error("no AST node-kind mapping for production {lhs} -> {rhs:?}")]
    SemanticMappingMissing { lhs: String, rhs: Vec<String> },
}
