//! LR parsing-table generator and semantic-action engine for the SimC
//! teaching compiler: build canonical collections (SLR or LR(1)), assemble
//! ACTION/GOTO tables, drive a token stream to an AST, then run the
//! semantic pass that produces a symbol table, scope tree, and three-
//! address intermediate-code listing.

pub mod ast;
pub mod canonical;
pub mod config;
pub mod driver;
pub mod error;
pub mod grammar;
pub mod ic;
pub mod index;
pub mod items;
pub mod semantic;
pub mod simulator;
pub mod symtab;
pub mod table;

pub use error::{Error, Result};
