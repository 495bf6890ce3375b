//! Parsing-Table Assembler & Conflict Resolver (§4.5).
//!
//! Grounded in the teacher's unfinished `calculate_lr_tables` in
//! `examples/andrewbaxter-fork_rustemo/src/table.rs` (a `todo!()`-stubbed
//! ACTION/GOTO projection over `LRState`/`LRItem`); this module finishes
//! that projection, generalized to run over either canonical-collection
//! flavor via the `CollectionItem`/`ReduceLookahead` traits so the SLR and
//! LR(1) paths share one conflict-resolution pass.

use indexmap::IndexMap;
use tracing::warn;

use crate::canonical::{CanonicalCollection, CollectionItem, ReduceLookahead};
use crate::config::ConflictPolicy;
use crate::error::{Error, Result};
use crate::grammar::{analyzer::Analysis, Rhs, Symbol};
use crate::index::{StateIndex, StateVec};
use crate::items::Lr0Item;

/// One ACTION-table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateIndex),
    Reduce { lhs: Symbol, rhs: Rhs },
    Accept,
}

/// The assembled ACTION/GOTO tables plus the start state (§4.5). A missing
/// entry in either map is the "empty"/no-goto sentinel the spec calls for:
/// encoded as map absence rather than a dedicated `Action::Error`, which
/// keeps the driver's lookup (`table.action(state, terminal)`) a single
/// `Option` match.
#[derive(Debug, Clone)]
pub struct ParsingTable {
    action: StateVec<IndexMap<Symbol, Action>>,
    goto: StateVec<IndexMap<Symbol, StateIndex>>,
    pub start: StateIndex,
}

impl ParsingTable {
    pub fn action(&self, state: StateIndex, terminal: &Symbol) -> Option<&Action> {
        self.action[state].get(terminal)
    }

    pub fn goto(&self, state: StateIndex, non_terminal: &Symbol) -> Option<StateIndex> {
        self.goto[state].get(non_terminal).copied()
    }

    pub fn state_count(&self) -> usize {
        self.action.len()
    }
}

/// Builds the SLR(1) table: a complete item reduces under every terminal in
/// `FOLLOW(lhs)`. Conflicts require a disjoint partition between the
/// shift-terminals of a state and the FOLLOW-reduce-terminals of each
/// complete item sharing it, else `NotSlr1`.
#[tracing::instrument(skip(collection, analysis, end_item))]
pub fn build_slr_table(
    collection: &CanonicalCollection<Lr0Item>,
    analysis: &Analysis,
    end_item: &Lr0Item,
    policy: ConflictPolicy,
) -> Result<ParsingTable> {
    assemble(collection, analysis, end_item, policy, |state, terminal, reason| {
        Error::NotSlr1 {
            state,
            terminal,
            reason,
        }
    })
}

/// Builds the canonical LR(1) table: a complete item reduces under its own
/// lookahead set, so two items sharing a core but disagreeing on lookahead
/// contribute distinct reduce sets rather than one FOLLOW-wide set.
#[tracing::instrument(skip(collection, analysis, end_item))]
pub fn build_lr1_table<I>(
    collection: &CanonicalCollection<I>,
    analysis: &Analysis,
    end_item: &Lr0Item,
    policy: ConflictPolicy,
) -> Result<ParsingTable>
where
    I: CollectionItem + ReduceLookahead,
{
    assemble(collection, analysis, end_item, policy, |state, terminal, reason| {
        Error::NotLr1 {
            state,
            terminal,
            reason,
        }
    })
}

fn assemble<I>(
    collection: &CanonicalCollection<I>,
    analysis: &Analysis,
    end_item: &Lr0Item,
    policy: ConflictPolicy,
    make_conflict_error: impl Fn(StateIndex, String, String) -> Error,
) -> Result<ParsingTable>
where
    I: CollectionItem + ReduceLookahead,
{
    let state_count = collection.states.len();
    let mut action: Vec<IndexMap<Symbol, Action>> = (0..state_count).map(|_| IndexMap::new()).collect();
    let mut goto: Vec<IndexMap<Symbol, StateIndex>> = (0..state_count).map(|_| IndexMap::new()).collect();

    for (idx, state) in collection.states.iter().enumerate() {
        let state_idx = StateIndex(idx);

        for (symbol, &target) in &state.transitions {
            if symbol.is_terminal {
                action[idx].insert(symbol.clone(), Action::Shift(target));
            } else {
                goto[idx].insert(symbol.clone(), target);
            }
        }

        for item in &state.items {
            let core = item.core();
            if !core.is_complete() {
                continue;
            }

            if core == end_item {
                insert_action(
                    &mut action[idx],
                    Symbol::end(),
                    Action::Accept,
                    state_idx,
                    policy,
                    &make_conflict_error,
                )?;
                continue;
            }

            for terminal in item.reduce_lookahead(analysis) {
                let reduce = Action::Reduce {
                    lhs: core.lhs.clone(),
                    rhs: core.rhs(),
                };
                insert_action(
                    &mut action[idx],
                    terminal,
                    reduce,
                    state_idx,
                    policy,
                    &make_conflict_error,
                )?;
            }
        }
    }

    Ok(ParsingTable {
        action: StateVec(action),
        goto: StateVec(goto),
        start: collection.start,
    })
}

fn insert_action(
    row: &mut IndexMap<Symbol, Action>,
    terminal: Symbol,
    new: Action,
    state: StateIndex,
    policy: ConflictPolicy,
    make_conflict_error: &impl Fn(StateIndex, String, String) -> Error,
) -> Result<()> {
    match row.get(&terminal) {
        None => {
            row.insert(terminal, new);
            Ok(())
        }
        Some(existing) => {
            let resolved = resolve_conflict(existing, &new, &terminal, state, policy, make_conflict_error)?;
            row.insert(terminal, resolved);
            Ok(())
        }
    }
}

fn resolve_conflict(
    existing: &Action,
    new: &Action,
    terminal: &Symbol,
    state: StateIndex,
    policy: ConflictPolicy,
    make_conflict_error: &impl Fn(StateIndex, String, String) -> Error,
) -> Result<Action> {
    match (existing, new) {
        (Action::Shift(_), Action::Shift(_)) | (Action::Accept, Action::Accept) => Ok(existing.clone()),

        (Action::Shift(_), Action::Reduce { .. }) | (Action::Reduce { .. }, Action::Shift(_)) => {
            warn!(
                ?state,
                %terminal,
                ?policy,
                "shift/reduce conflict resolved by configured precedence policy"
            );
            let shift = if matches!(existing, Action::Shift(_)) {
                existing
            } else {
                new
            };
            let reduce = if matches!(existing, Action::Reduce { .. }) {
                existing
            } else {
                new
            };
            match policy {
                ConflictPolicy::ShiftOverReduce => Ok(shift.clone()),
                ConflictPolicy::ReduceOverShift => Ok(reduce.clone()),
            }
        }

        (Action::Reduce { .. }, Action::Reduce { .. }) => Err(make_conflict_error(
            state,
            terminal.to_string(),
            "reduce/reduce conflict between two distinct productions".to_string(),
        )),

        _ => Err(Error::AmbiguousTable {
            state,
            terminal: terminal.to_string(),
            count: 2,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{lr1, slr};
    use crate::config::ConflictPolicy;
    use crate::grammar::analyzer::analyze;
    use crate::grammar::tests::expr_grammar;
    use crate::items::{expand, generate_items};

    #[test]
    fn slr_table_accepts_on_end_at_the_end_item_state() {
        let expanded = expand(&expr_grammar());
        let item_set = generate_items(&expanded).unwrap();
        let analysis = analyze(&expanded).unwrap();
        let collection = slr::build_collection(&item_set).unwrap();

        let table = build_slr_table(&collection, &analysis, &item_set.end_item, ConflictPolicy::ShiftOverReduce)
            .unwrap();

        let has_accept = (0..table.state_count()).any(|i| {
            matches!(table.action(StateIndex(i), &Symbol::end()), Some(Action::Accept))
        });
        assert!(has_accept, "no state accepts on END");
    }

    #[test]
    fn lr1_table_has_no_reduce_reduce_conflict_on_simple_grammar() {
        let expanded = expand(&expr_grammar());
        let item_set = generate_items(&expanded).unwrap();
        let analysis = analyze(&expanded).unwrap();
        let collection = lr1::build_collection(&expanded, &item_set, &analysis).unwrap();

        let table = build_lr1_table(&collection, &analysis, &item_set.end_item, ConflictPolicy::ShiftOverReduce);
        assert!(table.is_ok());
    }

    #[test]
    fn goto_table_has_entries_for_nonterminal_transitions() {
        let expanded = expand(&expr_grammar());
        let item_set = generate_items(&expanded).unwrap();
        let analysis = analyze(&expanded).unwrap();
        let collection = slr::build_collection(&item_set).unwrap();
        let table = build_slr_table(&collection, &analysis, &item_set.end_item, ConflictPolicy::ShiftOverReduce)
            .unwrap();

        let has_goto = (0..table.state_count())
            .any(|i| table.goto(StateIndex(i), &Symbol::nonterminal("T")).is_some());
        assert!(has_goto, "no state has a GOTO entry for T");
    }
}
