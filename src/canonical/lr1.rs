//! LR(1) path of the Canonical-Collection Builder (§4.4): items carry their
//! own lookahead set instead of borrowing FOLLOW(lhs) at table-assembly
//! time, so two states that an SLR build would merge (and which might
//! actually require different reduce decisions) stay distinct.
//!
//! Grounded in `original_source/lab6/include/parsing_table/
//! lr1_parsing_table_generator.h`'s item-pool design: the original guards a
//! shared item pool with `std::mutex` because its generator is invoked from
//! multiple worker threads. This crate's pipeline is strictly single
//! threaded (one grammar in, one table out), so `Lr1ItemPool` is a plain
//! `IndexSet` with no synchronization.

use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};

use super::{CanonicalCollection, CollectionItem, DfaState, ReduceLookahead};
use crate::error::{Error, Result};
use crate::grammar::{analyzer::Analysis, Cfg, Symbol};
use crate::index::{StateIndex, StateVec};
use crate::items::{ItemSet, Lr0Item};

/// An LR(1) item: an LR(0) core plus the set of terminals that may follow a
/// reduction by this item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lr1Item {
    pub core: Lr0Item,
    pub lookahead: BTreeSet<Symbol>,
}

impl CollectionItem for Lr1Item {
    fn core(&self) -> &Lr0Item {
        &self.core
    }

    fn to_canonical_string(&self) -> String {
        let mut la: Vec<String> = self.lookahead.iter().map(Symbol::to_string).collect();
        la.sort();
        format!("{} / {{{}}}", self.core, la.join(","))
    }
}

impl ReduceLookahead for Lr1Item {
    fn reduce_lookahead(&self, _analysis: &Analysis) -> std::collections::HashSet<Symbol> {
        self.lookahead.iter().cloned().collect()
    }
}

/// Interns `Lr1Item`s by full structural identity (core + lookahead), so
/// two closure computations that arrive at the same item share one value.
/// Not `Mutex`-guarded: this pipeline never constructs a collection from
/// more than one thread.
#[derive(Debug, Default)]
pub struct Lr1ItemPool {
    items: IndexSet<Lr1Item>,
}

impl Lr1ItemPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, item: Lr1Item) -> Lr1Item {
        if let Some(existing) = self.items.get(&item) {
            return existing.clone();
        }
        self.items.insert(item.clone());
        item
    }
}

/// Closes `seed` (core -> accumulated lookahead) under the LR(1) closure
/// rule: for `A -> a . B g, L` and every production `B -> d`, add
/// `B -> . d, FIRST(g L)`. Lookahead for a given core accumulates across
/// iterations of the fixpoint rather than producing separate items per
/// contributing lookahead terminal, matching §4.4's merge-by-core rule.
fn grow_closure(
    cfg: &Cfg,
    analysis: &Analysis,
    mut working: IndexMap<Lr0Item, BTreeSet<Symbol>>,
) -> IndexMap<Lr0Item, BTreeSet<Symbol>> {
    loop {
        let mut changed = false;
        let snapshot: Vec<(Lr0Item, BTreeSet<Symbol>)> = working
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (item, lookaheads) in &snapshot {
            let Some(next) = item.next_symbol() else {
                continue;
            };
            if next.is_terminal {
                continue;
            }
            let rest = &item.to_parse[1..];
            let (mut first_of_rest, nullable) = analysis.first_of_sequence(rest);
            if nullable {
                first_of_rest.extend(lookaheads.iter().cloned());
            }

            for rhs in cfg.productions_of(next) {
                let new_core = Lr0Item::new(next.clone(), rhs.clone());
                let entry = working.entry(new_core).or_default();
                for la in &first_of_rest {
                    if entry.insert(la.clone()) {
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            return working;
        }
    }
}

fn intern_closure(pool: &mut Lr1ItemPool, working: IndexMap<Lr0Item, BTreeSet<Symbol>>) -> IndexSet<Lr1Item> {
    let mut out = IndexSet::new();
    for (core, lookahead) in working {
        out.insert(pool.intern(Lr1Item { core, lookahead }));
    }
    out
}

/// The closure of the single start item `S' -> . S, {END}` (§4.4).
pub fn initial_closure(
    cfg: &Cfg,
    analysis: &Analysis,
    pool: &mut Lr1ItemPool,
    start_item: &Lr0Item,
) -> Result<IndexSet<Lr1Item>> {
    let end = cfg
        .end_symbol()
        .ok_or_else(|| Error::InvalidGrammar("grammar has no END terminal".to_string()))?
        .clone();
    let mut seed = IndexMap::new();
    seed.insert(start_item.clone(), BTreeSet::from([end]));
    Ok(intern_closure(pool, grow_closure(cfg, analysis, seed)))
}

/// Steps 2-4 of §4.3, specialized to direct LR(1) construction: GOTO closes
/// the advanced kernel rather than reusing a precomputed FOLLOW set.
#[tracing::instrument(skip(item_set, analysis))]
pub fn build_collection(
    cfg: &Cfg,
    item_set: &ItemSet,
    analysis: &Analysis,
) -> Result<CanonicalCollection<Lr1Item>> {
    let mut pool = Lr1ItemPool::new();

    let mut states: StateVec<DfaState<Lr1Item>> = StateVec::new();
    let mut name_to_index: IndexMap<String, StateIndex> = IndexMap::new();

    let start_items = initial_closure(cfg, analysis, &mut pool, &item_set.start_item)?;
    let start_state = DfaState::new(start_items);
    let start_name = start_state.name.clone();
    let start = states.push(start_state);
    name_to_index.insert(start_name, start);

    let mut worklist = vec![start];
    while let Some(state_idx) = worklist.pop() {
        let mut per_symbol: IndexMap<Symbol, IndexMap<Lr0Item, BTreeSet<Symbol>>> = IndexMap::new();
        for item in &states[state_idx].items {
            let Some(sym) = item.core.next_symbol().cloned() else {
                continue;
            };
            let Some(advanced_core) = item.core.advanced() else {
                continue;
            };
            per_symbol
                .entry(sym)
                .or_default()
                .entry(advanced_core)
                .or_default()
                .extend(item.lookahead.iter().cloned());
        }

        for (symbol, kernel) in per_symbol {
            let closed = intern_closure(&mut pool, grow_closure(cfg, analysis, kernel));
            let candidate = DfaState::new(closed);
            if candidate.items.is_empty() {
                return Err(Error::CollectionConstructionFailure(
                    "LR(1) subset construction produced an empty closure".to_string(),
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
    debug_assert!(collection.all_states_reachable());
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::analyzer::analyze;
    use crate::grammar::tests::expr_grammar;
    use crate::items::{expand, generate_items};

    #[test]
    fn start_state_lookahead_is_end() {
        let expanded = expand(&expr_grammar());
        let item_set = generate_items(&expanded).unwrap();
        let analysis = analyze(&expanded).unwrap();
        let collection = build_collection(&expanded, &item_set, &analysis).unwrap();

        let start_state = &collection.states[collection.start];
        let start_lr1 = start_state
            .items
            .iter()
            .find(|i| i.core == item_set.start_item)
            .unwrap();
        assert_eq!(start_lr1.lookahead, BTreeSet::from([Symbol::end()]));
    }

    #[test]
    fn distinct_lookaheads_keep_states_distinct_from_slr() {
        // This grammar is small enough that LR(1) and SLR produce the same
        // state count, but the collection must still be well-formed: every
        // state reachable, every item's core a valid dotted production.
        let expanded = expand(&expr_grammar());
        let item_set = generate_items(&expanded).unwrap();
        let analysis = analyze(&expanded).unwrap();
        let collection = build_collection(&expanded, &item_set, &analysis).unwrap();

        assert!(collection.all_states_reachable());
        for state in &collection.states {
            for item in &state.items {
                assert!(item_set.items.contains(&item.core));
            }
        }
    }

    #[test]
    fn pool_interns_identical_items() {
        let mut pool = Lr1ItemPool::new();
        let core = Lr0Item::new(Symbol::nonterminal("E"), vec![Symbol::terminal("id")]);
        let a = pool.intern(Lr1Item {
            core: core.clone(),
            lookahead: BTreeSet::from([Symbol::end()]),
        });
        let b = pool.intern(Lr1Item {
            core,
            lookahead: BTreeSet::from([Symbol::end()]),
        });
        assert_eq!(a, b);
        assert_eq!(pool.items.len(), 1);
    }
}
