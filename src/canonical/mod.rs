//! Canonical-Collection Builder (§4.3, §4.4).
//!
//! Two independent constructions share one shape: a `CanonicalCollection<I>`
//! of `DfaState<I>`s keyed by canonical, content-derived names (§3
//! "Canonical DFA"). `slr` builds it by NFA epsilon-closure + subset
//! construction over `Lr0Item`; `lr1` builds it directly over `Lr1Item`
//! with lookahead propagation. The table assembler (`crate::table`)
//! consumes either collection through the `CollectionItem` /
//! `ReduceLookahead` traits below rather than duplicating its projection
//! logic per path.

pub mod lr1;
pub mod slr;

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::grammar::{analyzer::Analysis, Symbol};
use crate::index::{StateIndex, StateVec};
use crate::items::Lr0Item;

/// Common projection from either item flavor down to its LR(0) core, so
/// shift/goto transitions and "is this item complete" checks are shared
/// code between the SLR and LR(1) paths.
pub trait CollectionItem: Clone + Eq + std::hash::Hash + Ord {
    fn core(&self) -> &Lr0Item;

    fn to_canonical_string(&self) -> String;
}

impl CollectionItem for Lr0Item {
    fn core(&self) -> &Lr0Item {
        self
    }

    fn to_canonical_string(&self) -> String {
        self.to_string()
    }
}

/// Supplies the terminals a complete item reduces under: `FOLLOW(lhs)` for
/// the SLR path, the item's own lookahead set for the LR(1) path (§4.5).
pub trait ReduceLookahead {
    fn reduce_lookahead(&self, analysis: &Analysis) -> HashSet<Symbol>;
}

impl ReduceLookahead for Lr0Item {
    fn reduce_lookahead(&self, analysis: &Analysis) -> HashSet<Symbol> {
        analysis.follow_of(&self.lhs)
    }
}

/// One state of a canonical collection: a non-empty closure of items, named
/// by the sorted concatenation of its members' string forms, with
/// deterministic transitions on grammar symbols.
#[derive(Debug, Clone)]
pub struct DfaState<I> {
    pub name: String,
    pub items: IndexSet<I>,
    pub transitions: IndexMap<Symbol, StateIndex>,
}

impl<I: CollectionItem> DfaState<I> {
    pub fn new(items: IndexSet<I>) -> Self {
        let mut names: Vec<String> = items.iter().map(|i| i.to_canonical_string()).collect();
        names.sort();
        DfaState {
            name: names.concat(),
            items,
            transitions: IndexMap::new(),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.items.iter().any(|i| i.core().is_complete())
    }
}

#[derive(Debug, Clone)]
pub struct CanonicalCollection<I> {
    pub states: StateVec<DfaState<I>>,
    pub start: StateIndex,
}

impl<I: CollectionItem> CanonicalCollection<I> {
    /// Testable property (§8): every state is reachable, and for a given
    /// state/symbol there is at most one transition (the latter holds
    /// trivially here since `transitions` is a map, but we check the
    /// construction didn't silently merge two distinct targets by checking
    /// reachability instead, which is the property that can actually break).
    pub fn all_states_reachable(&self) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![self.start];
        seen.insert(self.start);
        while let Some(s) = stack.pop() {
            for &target in self.states[s].transitions.values() {
                if seen.insert(target) {
                    stack.push(target);
                }
            }
        }
        seen.len() == self.states.len()
    }
}
