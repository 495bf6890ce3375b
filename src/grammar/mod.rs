//! Grammar model: symbols, productions, and the CFG container (§3, §4.1).

pub mod analyzer;

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

/// Marks a terminal with a role the analyzer must recognize by identity
/// rather than by name (today: end-of-input only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialProperty {
    End,
}

/// A grammar symbol. Symbols are value objects: two symbols with the same
/// `name` and `is_terminal` are the same symbol, full stop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    pub name: String,
    pub is_terminal: bool,
    pub special: Option<SpecialProperty>,
}

impl Symbol {
    pub fn terminal(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            is_terminal: true,
            special: None,
        }
    }

    pub fn nonterminal(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            is_terminal: false,
            special: None,
        }
    }

    pub fn end() -> Self {
        Symbol {
            name: "END".to_string(),
            is_terminal: true,
            special: Some(SpecialProperty::End),
        }
    }

    pub fn is_end(&self) -> bool {
        self.special == Some(SpecialProperty::End)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A production's right-hand side: an ordered sequence of symbols. Empty
/// means an epsilon production.
pub type Rhs = Vec<Symbol>;

/// A context-free grammar, per §3.
#[derive(Debug, Clone)]
pub struct Cfg {
    pub start_symbol: Symbol,
    pub terminals: IndexSet<Symbol>,
    pub non_terminals: IndexSet<Symbol>,
    pub production_rules: IndexMap<Symbol, Vec<Rhs>>,
    pub epsilon_production_symbols: IndexSet<Symbol>,
}

impl Cfg {
    /// Checks the invariants from §3: start symbol declared, every RHS
    /// symbol declared somewhere, exactly one END terminal, epsilon set
    /// drawn from the non-terminals.
    pub fn validate(&self) -> Result<()> {
        if !self.non_terminals.contains(&self.start_symbol) {
            return Err(Error::InvalidGrammar(format!(
                "start symbol `{}` is not in non_terminals",
                self.start_symbol
            )));
        }

        let end_count = self.terminals.iter().filter(|t| t.is_end()).count();
        if end_count != 1 {
            return Err(Error::InvalidGrammar(format!(
                "expected exactly one END terminal, found {end_count}"
            )));
        }

        for (lhs, rhss) in &self.production_rules {
            if !self.non_terminals.contains(lhs) {
                return Err(Error::InvalidGrammar(format!(
                    "production LHS `{lhs}` is not a declared non-terminal"
                )));
            }
            for rhs in rhss {
                for sym in rhs {
                    let declared = if sym.is_terminal {
                        self.terminals.contains(sym)
                    } else {
                        self.non_terminals.contains(sym)
                    };
                    if !declared {
                        return Err(Error::InvalidGrammar(format!(
                            "symbol `{sym}` on RHS of `{lhs}` is not declared in terminals or non_terminals"
                        )));
                    }
                }
            }
        }

        for sym in &self.epsilon_production_symbols {
            if !self.non_terminals.contains(sym) {
                return Err(Error::InvalidGrammar(format!(
                    "epsilon-production symbol `{sym}` is not a declared non-terminal"
                )));
            }
        }

        Ok(())
    }

    pub fn end_symbol(&self) -> Option<&Symbol> {
        self.terminals.iter().find(|t| t.is_end())
    }

    pub fn productions_of(&self, lhs: &Symbol) -> &[Rhs] {
        self.production_rules
            .get(lhs)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn derives_epsilon(&self, sym: &Symbol) -> bool {
        self.epsilon_production_symbols.contains(sym)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `E -> T Ep ; Ep -> "+" T Ep | EMPTY ; T -> F ; F -> "id"`
    pub(crate) fn expr_grammar() -> Cfg {
        let id = Symbol::terminal("id");
        let plus = Symbol::terminal("+");
        let end = Symbol::end();
        let e = Symbol::nonterminal("E");
        let ep = Symbol::nonterminal("Ep");
        let t = Symbol::nonterminal("T");
        let f = Symbol::nonterminal("F");

        let mut production_rules = IndexMap::new();
        production_rules.insert(e.clone(), vec![vec![t.clone(), ep.clone()]]);
        production_rules.insert(
            ep.clone(),
            vec![vec![plus.clone(), t.clone(), ep.clone()], vec![]],
        );
        production_rules.insert(t.clone(), vec![vec![f.clone()]]);
        production_rules.insert(f.clone(), vec![vec![id.clone()]]);

        Cfg {
            start_symbol: e.clone(),
            terminals: IndexSet::from([id, plus, end]),
            non_terminals: IndexSet::from([e, ep.clone(), t, f]),
            production_rules,
            epsilon_production_symbols: IndexSet::from([ep]),
        }
    }

    #[test]
    fn validates_well_formed_grammar() {
        assert!(expr_grammar().validate().is_ok());
    }

    #[test]
    fn rejects_missing_end() {
        let mut g = expr_grammar();
        g.terminals = g.terminals.into_iter().filter(|t| !t.is_end()).collect();
        assert!(matches!(g.validate(), Err(Error::InvalidGrammar(_))));
    }

    #[test]
    fn rejects_undeclared_rhs_symbol() {
        let mut g = expr_grammar();
        g.production_rules
            .get_mut(&Symbol::nonterminal("T"))
            .unwrap()
            .push(vec![Symbol::terminal("ghost")]);
        assert!(matches!(g.validate(), Err(Error::InvalidGrammar(_))));
    }
}
