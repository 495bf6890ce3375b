//! Driver and AST construction (§4.6): three synchronized stacks walking
//! the ACTION/GOTO tables to completion.
//!
//! Grounded in the teacher's `Parser`/`ParserDefinition`/`Context` trait
//! trio (`examples/andrewbaxter-fork_rustemo/src/parser.rs`), which drives
//! a single state stack against a generated table through a `Builder`
//! callback object. This crate inlines that into one explicit loop over
//! three parallel stacks (state, symbol, AST subtree) since there is only
//! one driver in this crate, not a pluggable trait object per generated
//! parser.

use crate::ast::Ast;
use crate::config::{AstMappingDocument, TokenRecord};
use crate::error::{Error, Result};
use crate::grammar::{Cfg, Symbol};
use crate::table::{Action, ParsingTable};

fn lookup_terminal(cfg: &Cfg, kind: &str) -> Result<Symbol> {
    cfg.terminals
        .iter()
        .find(|t| t.name == kind)
        .cloned()
        .ok_or_else(|| Error::UnknownToken(kind.to_string()))
}

/// Runs the driver over `tokens` (the `END` token is appended internally)
/// and returns the single remaining AST subtree on accept.
#[tracing::instrument(skip(cfg, table, mapping, tokens))]
pub fn parse(cfg: &Cfg, table: &ParsingTable, mapping: &AstMappingDocument, tokens: &[TokenRecord]) -> Result<Ast> {
    let end = cfg
        .end_symbol()
        .ok_or_else(|| Error::InvalidGrammar("grammar has no END terminal".to_string()))?
        .clone();

    let mut input: Vec<TokenRecord> = tokens.to_vec();
    input.push(TokenRecord {
        kind: end.name.clone(),
        value: String::new(),
    });

    let mut state_stack = vec![table.start];
    let mut ast_stack: Vec<Ast> = Vec::new();
    let mut pos = 0usize;

    loop {
        let current_state = *state_stack.last().expect("state stack is never empty");
        let token = &input[pos];
        let terminal = lookup_terminal(cfg, &token.kind)?;

        let action = table
            .action(current_state, &terminal)
            .cloned()
            .ok_or_else(|| Error::SyntaxError {
                state: current_state,
                terminal: terminal.to_string(),
                value: token.value.clone(),
            })?;

        match action {
            Action::Shift(next) => {
                ast_stack.push(Ast::Terminal(crate::ast::Terminal {
                    name: terminal.name.clone(),
                    value: token.value.clone(),
                }));
                state_stack.push(next);
                pos += 1;
            }

            Action::Reduce { lhs, rhs } => {
                let k = rhs.len();
                let children = ast_stack.split_off(ast_stack.len() - k);
                state_stack.truncate(state_stack.len() - k);

                let rhs_names: Vec<String> = rhs.iter().map(|s| s.name.clone()).collect();
                let node_kind = mapping.lookup(&lhs.name, &rhs_names).ok_or_else(|| {
                    Error::SemanticMappingMissing {
                        lhs: lhs.name.clone(),
                        rhs: rhs_names.clone(),
                    }
                })?;
                let node = Ast::build(node_kind, children).ok_or_else(|| Error::SemanticMappingMissing {
                    lhs: lhs.name.clone(),
                    rhs: rhs_names.clone(),
                })?;

                let from_state = *state_stack.last().expect("state stack is never empty");
                let goto_state = table.goto(from_state, &lhs).ok_or_else(|| {
                    Error::InvalidGrammar(format!("no GOTO entry from state {from_state:?} on `{lhs}`"))
                })?;
                state_stack.push(goto_state);
                ast_stack.push(node);
            }

            Action::Accept => {
                if ast_stack.len() != 1 {
                    return Err(Error::InvalidGrammar(
                        "parse accepted with more than one AST subtree remaining".to_string(),
                    ));
                }
                return Ok(ast_stack.pop().expect("checked len == 1 above"));
            }
        }
    }
}
