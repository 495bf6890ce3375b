//! Item-Set Generator (§4.2): grammar augmentation and LR(0) item
//! enumeration.
//!
//! Grounded in the teacher's `LRItem`/`LRState` pair in
//! `examples/andrewbaxter-fork_rustemo/src/table.rs`, generalized from a
//! `(ProdIndex, position)` pair over an index-packed grammar to an explicit
//! `(lhs, parsed, to_parse)` triple over value-typed `Symbol`s, matching the
//! data model in §3.

use std::fmt;

use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::grammar::{Cfg, Rhs, Symbol};

/// An LR(0) item: `lhs -> parsed . to_parse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lr0Item {
    pub lhs: Symbol,
    pub parsed: Vec<Symbol>,
    pub to_parse: Vec<Symbol>,
}

impl Lr0Item {
    pub fn new(lhs: Symbol, rhs: Rhs) -> Self {
        Lr0Item {
            lhs,
            parsed: Vec::new(),
            to_parse: rhs,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.to_parse.is_empty()
    }

    pub fn is_kernel(&self, start_item: &Lr0Item) -> bool {
        !self.parsed.is_empty() || self == start_item
    }

    pub fn next_symbol(&self) -> Option<&Symbol> {
        self.to_parse.first()
    }

    /// Returns the item with the dot advanced past the next symbol, or
    /// `None` if the item is already complete.
    pub fn advanced(&self) -> Option<Lr0Item> {
        if self.to_parse.is_empty() {
            return None;
        }
        let mut parsed = self.parsed.clone();
        parsed.push(self.to_parse[0].clone());
        Some(Lr0Item {
            lhs: self.lhs.clone(),
            parsed,
            to_parse: self.to_parse[1..].to_vec(),
        })
    }

    /// The full RHS this item is walking: `parsed` followed by `to_parse`.
    pub fn rhs(&self) -> Rhs {
        self.parsed
            .iter()
            .chain(self.to_parse.iter())
            .cloned()
            .collect()
    }
}

impl fmt::Display for Lr0Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.lhs)?;
        for s in &self.parsed {
            write!(f, " {s}")?;
        }
        write!(f, " .")?;
        for s in &self.to_parse {
            write!(f, " {s}")?;
        }
        Ok(())
    }
}

/// The augmented grammar plus the item-set container described in §3
/// ("Item Set (Canonical Collection Input)").
#[derive(Debug, Clone)]
pub struct ItemSet {
    pub items: IndexSet<Lr0Item>,
    pub start_item: Lr0Item,
    pub end_item: Lr0Item,
}

/// Augments `cfg` with a fresh start symbol `S'` and the production
/// `S' -> S` (§4.2). The suffix is lengthened until it no longer collides
/// with a name already in use.
#[tracing::instrument(skip(cfg))]
pub fn expand(cfg: &Cfg) -> Cfg {
    let mut fresh_name = format!("{}'", cfg.start_symbol.name);
    while cfg
        .non_terminals
        .iter()
        .chain(cfg.terminals.iter())
        .any(|s| s.name == fresh_name)
    {
        fresh_name.push('\'');
    }
    let fresh_start = Symbol::nonterminal(fresh_name);

    let mut expanded = cfg.clone();
    expanded
        .non_terminals
        .insert(fresh_start.clone());
    expanded
        .production_rules
        .insert(fresh_start.clone(), vec![vec![cfg.start_symbol.clone()]]);
    expanded.start_symbol = fresh_start;
    expanded
}

/// Enumerates every LR(0) item of the augmented grammar `g` (§4.2): the
/// k+1 dotted positions of every production of length k, plus the single
/// `N -> .` item for every epsilon-producing non-terminal.
#[tracing::instrument(skip(g))]
pub fn generate_items(g: &Cfg) -> Result<ItemSet> {
    let mut items = IndexSet::new();

    for (lhs, rhss) in &g.production_rules {
        for rhs in rhss {
            let mut item = Lr0Item::new(lhs.clone(), rhs.clone());
            loop {
                items.insert(item.clone());
                match item.advanced() {
                    Some(next) => item = next,
                    None => break,
                }
            }
        }
    }
    for n in &g.epsilon_production_symbols {
        items.insert(Lr0Item::new(n.clone(), Vec::new()));
    }

    let start_rhs = g
        .production_rules
        .get(&g.start_symbol)
        .and_then(|v| v.first())
        .ok_or_else(|| {
            Error::InvalidItemSet(format!(
                "augmented start symbol `{}` has no production",
                g.start_symbol
            ))
        })?
        .clone();
    let start_item = Lr0Item::new(g.start_symbol.clone(), start_rhs.clone());
    let end_item = Lr0Item {
        lhs: g.start_symbol.clone(),
        parsed: start_rhs,
        to_parse: Vec::new(),
    };

    if !items.contains(&start_item) {
        return Err(Error::InvalidItemSet(
            "start item not found in generated item set".to_string(),
        ));
    }
    if !items.contains(&end_item) {
        return Err(Error::InvalidItemSet(
            "end item not found in generated item set".to_string(),
        ));
    }

    Ok(ItemSet {
        items,
        start_item,
        end_item,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tests::expr_grammar;

    #[test]
    fn expand_mints_fresh_start_and_wraps_once() {
        let g = expr_grammar();
        let expanded = expand(&g);
        assert_eq!(expanded.start_symbol.name, "E'");
        assert_eq!(
            expanded.production_rules[&expanded.start_symbol],
            vec![vec![Symbol::nonterminal("E")]]
        );

        // Re-expansion is benign: another layer of wrapping, not a panic or
        // silent no-op (§8 round-trip property).
        let twice = expand(&expanded);
        assert_eq!(twice.start_symbol.name, "E''");
    }

    #[test]
    fn generate_items_enumerates_all_dot_positions() {
        let expanded = expand(&expr_grammar());
        let item_set = generate_items(&expanded).unwrap();

        // F -> id has 2 positions: F -> . id ; F -> id .
        let f = Symbol::nonterminal("F");
        let id = Symbol::terminal("id");
        assert!(item_set.items.contains(&Lr0Item::new(f.clone(), vec![id.clone()])));
        assert!(item_set.items.contains(&Lr0Item {
            lhs: f,
            parsed: vec![id],
            to_parse: vec![],
        }));

        // Ep -> EMPTY contributes the single `Ep -> .` item.
        let ep = Symbol::nonterminal("Ep");
        assert!(item_set.items.contains(&Lr0Item::new(ep, vec![])));

        assert_eq!(item_set.start_item.lhs, expanded.start_symbol);
        assert!(item_set.end_item.is_complete());
    }
}
