//! External document/config contracts (§3.2, §6). These are the shapes a
//! boundary (CLI, test harness, embedding application) hands to this crate;
//! the core never reads a file or environment variable itself.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One terminal or non-terminal as declared by an external grammar source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDoc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_property: Option<String>,
}

/// The wire shape of a context-free grammar, before it is turned into
/// [`crate::grammar::Cfg`] (which requires `special_property: "END"` to
/// resolve to exactly one terminal).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarDocument {
    pub start_symbol: String,
    pub terminals: Vec<SymbolDoc>,
    pub non_terminals: Vec<SymbolDoc>,
    pub production_rules: IndexMap<String, Vec<Vec<String>>>,
    pub epsilon_production_symbols: Vec<String>,
}

/// One `(lhs, rhs) -> node_kind` entry of an [`AstMappingDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstMappingEntry {
    pub lhs: String,
    pub rhs: Vec<String>,
    pub node_kind: String,
}

/// Maps each production to the AST node kind its reduction should build.
/// Serialized as a flat list of entries since tuple keys aren't directly
/// representable in JSON/YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstMappingDocument(pub Vec<AstMappingEntry>);

impl AstMappingDocument {
    pub fn lookup(&self, lhs: &str, rhs: &[String]) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.lhs == lhs && e.rhs == rhs)
            .map(|e| e.node_kind.as_str())
    }
}

/// One token handed down by the (out-of-scope) lexer. Only `kind` drives
/// parsing; `value` rides along into terminal AST leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub kind: String,
    pub value: String,
}

/// Which canonical-collection construction to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStrategy {
    Slr,
    CanonicalLr1,
}

/// Precedence policy applied to a shift/reduce conflict the grammar itself
/// doesn't resolve (§4.5). Never consulted for reduce/reduce conflicts --
/// those are always a hard `NotSlr1`/`NotLr1` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    ShiftOverReduce,
    ReduceOverShift,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::ShiftOverReduce
    }
}

/// Top-level knobs for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub collection_strategy: CollectionStrategy,
    pub conflict_policy: ConflictPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            collection_strategy: CollectionStrategy::CanonicalLr1,
            conflict_policy: ConflictPolicy::ShiftOverReduce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ast_mapping_lookup_matches_lhs_and_rhs() {
        let doc = AstMappingDocument(vec![AstMappingEntry {
            lhs: "Stat".to_string(),
            rhs: vec!["if".to_string(), "Expr".to_string()],
            node_kind: "StatIf".to_string(),
        }]);
        assert_eq!(
            doc.lookup("Stat", &["if".to_string(), "Expr".to_string()]),
            Some("StatIf")
        );
        assert_eq!(doc.lookup("Stat", &["while".to_string()]), None);
    }

    #[test]
    fn pipeline_settings_default_is_canonical_lr1_shift_over_reduce() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.collection_strategy, CollectionStrategy::CanonicalLr1);
        assert_eq!(settings.conflict_policy, ConflictPolicy::ShiftOverReduce);
    }
}
