//! FIRST/FOLLOW computation (§4.1).
//!
//! Structurally this is the teacher's `table::first_sets`/`follow_sets`/
//! `firsts` trio (examples/andrewbaxter-fork_rustemo/src/table.rs), ported
//! from `SymbolVec<HashSet<SymbolIndex>>` to `Symbol`-keyed maps since our
//! `Symbol` is a value type rather than an arena index, and epsilon is
//! tracked as membership in a side-set rather than as a sentinel element of
//! FIRST (§9: the spec standardizes on the side-set representation).

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::{Cfg, Symbol};
use crate::error::{Error, Result};

pub type FirstSet = HashSet<Symbol>;
pub type FollowSet = HashSet<Symbol>;

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub first: HashMap<Symbol, FirstSet>,
    pub follow: HashMap<Symbol, FollowSet>,
    pub symbols_with_epsilon: HashSet<Symbol>,
}

impl Analysis {
    pub fn first_of(&self, sym: &Symbol) -> FirstSet {
        self.first.get(sym).cloned().unwrap_or_default()
    }

    pub fn follow_of(&self, sym: &Symbol) -> FollowSet {
        self.follow.get(sym).cloned().unwrap_or_default()
    }

    /// FIRST of a symbol sequence: walks the sequence, stopping at the first
    /// symbol that cannot derive epsilon. If every symbol in the sequence
    /// (or the sequence itself is empty) can derive epsilon, the sequence as
    /// a whole derives epsilon.
    pub fn first_of_sequence(&self, seq: &[Symbol]) -> (FirstSet, bool) {
        let mut out = FirstSet::new();
        for sym in seq {
            out.extend(self.first_of(sym));
            if !self.symbols_with_epsilon.contains(sym) {
                return (out, false);
            }
        }
        (out, true)
    }
}

/// Computes FIRST for every symbol and FOLLOW for every non-terminal of
/// `cfg`. `cfg` must already be `validate()`-clean.
#[tracing::instrument(skip(cfg))]
pub fn analyze(cfg: &Cfg) -> Result<Analysis> {
    let symbols_with_epsilon = compute_epsilon_derivers(cfg);
    let first = compute_first(cfg, &symbols_with_epsilon);
    let follow = compute_follow(cfg, &first, &symbols_with_epsilon)?;
    Ok(Analysis {
        first,
        follow,
        symbols_with_epsilon,
    })
}

fn compute_epsilon_derivers(cfg: &Cfg) -> HashSet<Symbol> {
    // Seed with the explicitly declared epsilon producers, then close over
    // non-terminals whose entire RHS is made of epsilon-deriving symbols.
    let mut epsilon: HashSet<Symbol> = cfg.epsilon_production_symbols.iter().cloned().collect();
    let mut changed = true;
    while changed {
        changed = false;
        for (lhs, rhss) in &cfg.production_rules {
            if epsilon.contains(lhs) {
                continue;
            }
            let derives = rhss
                .iter()
                .any(|rhs| rhs.iter().all(|s| epsilon.contains(s)));
            if derives {
                epsilon.insert(lhs.clone());
                changed = true;
            }
        }
    }
    epsilon
}

fn compute_first(cfg: &Cfg, symbols_with_epsilon: &HashSet<Symbol>) -> HashMap<Symbol, FirstSet> {
    let mut first: HashMap<Symbol, FirstSet> = HashMap::new();
    for t in &cfg.terminals {
        first.insert(t.clone(), FirstSet::from([t.clone()]));
    }
    for n in &cfg.non_terminals {
        first.entry(n.clone()).or_default();
    }

    let mut pass = 0usize;
    let mut changed = true;
    while changed {
        changed = false;
        pass += 1;
        for (lhs, rhss) in &cfg.production_rules {
            for rhs in rhss {
                let before = first[lhs].len();
                let addition = first_of_rhs(rhs, &first, symbols_with_epsilon);
                first.get_mut(lhs).unwrap().extend(addition);
                if first[lhs].len() > before {
                    changed = true;
                }
            }
        }
        trace!(pass, changed, "FIRST fixpoint iteration");
    }
    debug!(pass, "FIRST sets stabilized");
    first
}

fn first_of_rhs(
    rhs: &[Symbol],
    first: &HashMap<Symbol, FirstSet>,
    symbols_with_epsilon: &HashSet<Symbol>,
) -> FirstSet {
    let mut out = FirstSet::new();
    for sym in rhs {
        if let Some(f) = first.get(sym) {
            out.extend(f.iter().cloned());
        }
        if !symbols_with_epsilon.contains(sym) {
            break;
        }
    }
    out
}

fn compute_follow(
    cfg: &Cfg,
    first: &HashMap<Symbol, FirstSet>,
    symbols_with_epsilon: &HashSet<Symbol>,
) -> Result<HashMap<Symbol, FollowSet>> {
    let end = cfg
        .end_symbol()
        .ok_or_else(|| Error::InvalidGrammar("grammar has no END terminal".to_string()))?
        .clone();

    let mut follow: HashMap<Symbol, FollowSet> = HashMap::new();
    for n in &cfg.non_terminals {
        follow.entry(n.clone()).or_default();
    }
    follow
        .entry(cfg.start_symbol.clone())
        .or_default()
        .insert(end);

    let mut pass = 0usize;
    let mut changed = true;
    while changed {
        changed = false;
        pass += 1;
        for (lhs, rhss) in &cfg.production_rules {
            for rhs in rhss {
                for (i, sym) in rhs.iter().enumerate() {
                    if sym.is_terminal {
                        continue;
                    }
                    let rest = &rhs[i + 1..];
                    let (rest_first, rest_nullable) = {
                        let mut out = FirstSet::new();
                        let mut nullable = true;
                        for s in rest {
                            if let Some(f) = first.get(s) {
                                out.extend(f.iter().cloned());
                            }
                            if !symbols_with_epsilon.contains(s) {
                                nullable = false;
                                break;
                            }
                        }
                        (out, nullable)
                    };

                    let before = follow[sym].len();
                    follow.get_mut(sym).unwrap().extend(rest_first);
                    if rest_nullable {
                        let lhs_follow = follow[lhs].clone();
                        follow.get_mut(sym).unwrap().extend(lhs_follow);
                    }
                    if follow[sym].len() > before {
                        changed = true;
                    }
                }
            }
        }
        trace!(pass, changed, "FOLLOW fixpoint iteration");
    }
    debug!(pass, "FOLLOW sets stabilized");
    Ok(follow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tests::expr_grammar;

    #[test]
    fn first_sets_match_dragon_book_example() {
        let g = expr_grammar();
        let a = analyze(&g).unwrap();

        let id = Symbol::terminal("id");
        let plus = Symbol::terminal("+");

        assert_eq!(a.first_of(&Symbol::nonterminal("F")), FirstSet::from([id.clone()]));
        assert_eq!(a.first_of(&Symbol::nonterminal("T")), FirstSet::from([id.clone()]));
        assert_eq!(a.first_of(&Symbol::nonterminal("E")), FirstSet::from([id]));
        assert!(a.symbols_with_epsilon.contains(&Symbol::nonterminal("Ep")));
        assert_eq!(a.first_of(&Symbol::nonterminal("Ep")), FirstSet::from([plus]));
    }

    #[test]
    fn follow_sets_contain_end_for_start_symbol() {
        let g = expr_grammar();
        let a = analyze(&g).unwrap();
        let end = Symbol::end();
        assert!(a.follow_of(&Symbol::nonterminal("E")).contains(&end));
        assert!(a.follow_of(&Symbol::nonterminal("Ep")).contains(&end));
        assert!(a.follow_of(&Symbol::nonterminal("T")).contains(&Symbol::terminal("+")));
    }

    #[test]
    fn fails_without_end_terminal() {
        let mut g = expr_grammar();
        g.terminals = g.terminals.into_iter().filter(|t| !t.is_end()).collect();
        assert!(matches!(analyze(&g), Err(Error::InvalidGrammar(_))));
    }
}
