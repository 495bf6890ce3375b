//! SLR path of the Canonical-Collection Builder (§4.3): item-set NFA,
//! epsilon-closure, subset construction.
//!
//! Grounded in the teacher's unfinished `table::closure` fixpoint
//! (`examples/andrewbaxter-fork_rustemo/src/table.rs`), which closes a
//! single kernel set over non-terminal epsilon-transitions; here that
//! closure is made explicit as an NFA (§9: "two variants of the NFA->DFA
//! converter exist in the source... an implementation must pick one and
//! document it"). This crate picks the *deterministic* variant: a DFA state
//! is the ε-closure of a *set* of NFA states, subset-constructed and
//! deduplicated by canonical closure name, i.e. many-to-one from NFA state
//! to the DFA states it participates in -- never many DFA states sharing
//! an identical closure.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use super::{CanonicalCollection, DfaState};
use crate::error::{Error, Result};
use crate::index::{StateIndex, StateVec};
use crate::items::{ItemSet, Lr0Item};

/// The item-set NFA described in §4.3 step 1: one state per item, a
/// non-epsilon edge on `X` for `A -> a . X b`, and epsilon edges from
/// `A -> a . B g` to every `B -> . d`.
pub struct ItemSetNfa {
    pub start: Lr0Item,
    epsilon_edges: IndexMap<Lr0Item, Vec<Lr0Item>>,
}

#[tracing::instrument(skip(item_set))]
pub fn build_nfa(item_set: &ItemSet) -> ItemSetNfa {
    // Index productions by LHS so epsilon-edge targets can be found without
    // rescanning the whole item set per source item.
    let mut initial_items_by_nonterminal: IndexMap<&str, Vec<Lr0Item>> = IndexMap::new();
    for item in &item_set.items {
        if item.parsed.is_empty() {
            initial_items_by_nonterminal
                .entry(item.lhs.name.as_str())
                .or_default()
                .push(item.clone());
        }
    }

    let mut epsilon_edges: IndexMap<Lr0Item, Vec<Lr0Item>> = IndexMap::new();
    for item in &item_set.items {
        if let Some(next) = item.next_symbol() {
            if !next.is_terminal {
                let targets = initial_items_by_nonterminal
                    .get(next.name.as_str())
                    .cloned()
                    .unwrap_or_default();
                epsilon_edges.insert(item.clone(), targets);
            }
        }
    }

    ItemSetNfa {
        start: item_set.start_item.clone(),
        epsilon_edges,
    }
}

fn epsilon_closure(nfa: &ItemSetNfa, seed: &[Lr0Item]) -> IndexSet<Lr0Item> {
    let mut closure: IndexSet<Lr0Item> = seed.iter().cloned().collect();
    let mut frontier: Vec<Lr0Item> = seed.to_vec();
    while let Some(item) = frontier.pop() {
        if let Some(targets) = nfa.epsilon_edges.get(&item) {
            for t in targets {
                if closure.insert(t.clone()) {
                    frontier.push(t.clone());
                }
            }
        }
    }
    closure
}

/// Steps 2-4 of §4.3: subset construction from the NFA into a canonical
/// DFA, deduplicating states by canonical closure name.
#[tracing::instrument(skip(item_set))]
pub fn build_collection(item_set: &ItemSet) -> Result<CanonicalCollection<Lr0Item>> {
    let nfa = build_nfa(item_set);

    let mut states: StateVec<DfaState<Lr0Item>> = StateVec::new();
    let mut name_to_index: IndexMap<String, StateIndex> = IndexMap::new();

    let start_items = epsilon_closure(&nfa, std::slice::from_ref(&nfa.start));
    let start_state = DfaState::new(start_items);
    let start_name = start_state.name.clone();
    let start = states.push(start_state);
    name_to_index.insert(start_name, start);

    let mut worklist = vec![start];
    while let Some(state_idx) = worklist.pop() {
        // Group the state's items by the symbol that follows the dot so we
        // visit each outgoing symbol once.
        let mut per_symbol: IndexMap<_, Vec<Lr0Item>> = IndexMap::new();
        for item in states[state_idx].items.clone() {
            if let Some(sym) = item.next_symbol().cloned() {
                if let Some(advanced) = item.advanced() {
                    per_symbol.entry(sym).or_default().push(advanced);
                }
            }
        }

        for (symbol, kernel) in per_symbol {
            let closure = epsilon_closure(&nfa, &kernel);
            let candidate = DfaState::new(closure);
            if candidate.items.is_empty() {
                return Err(Error::CollectionConstructionFailure(
                    "subset construction produced an empty closure".to_string(),
                ));
            }
            let target = match name_to_index.get(&candidate.name) {
                Some(&existing) => existing,
                None => {
                    let name = candidate.name.clone();
                    let idx = states.push(candidate);
                    name_to_index.insert(name, idx);
                    worklist.push(idx);
                    idx
                }
            };
            states[state_idx].transitions.insert(symbol, target);
        }
    }

    let collection = CanonicalCollection { states, start };
    debug_assert!(
        collection.all_states_reachable(),
        "subset construction must only create states reachable from start"
    );
    Ok(collection)
}
