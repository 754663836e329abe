//! Requirement model
//!
//! Turns a raw requirement source (spreadsheet rows or a grouped tree) into a
//! flat [`RequirementSet`]. Building never fails: a source that can't be read
//! produces an empty set, which scores as a vacuous pass downstream.

pub mod columns;
pub mod structured;
pub mod tabular;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub use columns::{classify_columns, collect_headers, ColumnMapping, ColumnRole};
pub use structured::{NodeProperty, RequirementNode, StructuredRequirements};

/// One spreadsheet row keyed by header
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Text,
    Symbol,
    Layout,
}

impl RequirementKind {
    /// Prefix of generated requirement ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            RequirementKind::Text => "text",
            RequirementKind::Symbol => "symbol",
            RequirementKind::Layout => "layout",
        }
    }
}

impl std::fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id_prefix())
    }
}

/// A single text, symbol or layout requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    pub kind: RequirementKind,
    pub description: String,
    pub match_target: String,
    pub required: bool,
    /// Extra equivalent names (symbol requirements only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

/// All requirements for one validation run, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSet {
    pub required_texts: Vec<Requirement>,
    pub required_symbols: Vec<Requirement>,
    pub layout_requirements: Vec<Requirement>,
}

impl RequirementSet {
    /// Append a requirement, assigning the next `<kind>_<n>` id (1-based)
    pub fn push(
        &mut self,
        kind: RequirementKind,
        description: String,
        match_target: String,
        required: bool,
        synonyms: Vec<String>,
    ) -> &Requirement {
        let group = self.group_mut(kind);
        let id = format!("{}_{}", kind.id_prefix(), group.len() + 1);
        let synonyms = match kind {
            RequirementKind::Symbol => synonyms,
            RequirementKind::Text | RequirementKind::Layout => Vec::new(),
        };

        group.push(Requirement {
            id,
            kind,
            description,
            match_target,
            required,
            synonyms,
        });
        &group[group.len() - 1]
    }

    pub fn group(&self, kind: RequirementKind) -> &[Requirement] {
        match kind {
            RequirementKind::Text => &self.required_texts,
            RequirementKind::Symbol => &self.required_symbols,
            RequirementKind::Layout => &self.layout_requirements,
        }
    }

    fn group_mut(&mut self, kind: RequirementKind) -> &mut Vec<Requirement> {
        match kind {
            RequirementKind::Text => &mut self.required_texts,
            RequirementKind::Symbol => &mut self.required_symbols,
            RequirementKind::Layout => &mut self.layout_requirements,
        }
    }

    pub fn len(&self) -> usize {
        self.required_texts.len() + self.required_symbols.len() + self.layout_requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build from any source; tabular sources use the guessed column mapping
    /// with `overrides` applied on top
    pub fn build(source: &RequirementSource, overrides: Option<&ColumnMapping>) -> Self {
        let set = match source {
            RequirementSource::Tabular(rows) => {
                let mapping = source_mapping(rows, overrides);
                debug!(?mapping, rows = rows.len(), "Classifying tabular requirements");
                tabular::build_from_rows(rows, &mapping)
            }
            RequirementSource::Structured(tree) => structured::build_from_tree(tree),
            RequirementSource::Empty => Self::default(),
        };

        debug!(
            texts = set.required_texts.len(),
            symbols = set.required_symbols.len(),
            layout = set.layout_requirements.len(),
            "Built requirement set"
        );
        set
    }
}

fn source_mapping(rows: &[Row], overrides: Option<&ColumnMapping>) -> ColumnMapping {
    let guessed = classify_columns(&collect_headers(rows));
    match overrides {
        Some(overrides) => guessed.with_overrides(overrides),
        None => guessed,
    }
}

/// Raw requirement input as received from the host
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequirementSource {
    /// Spreadsheet-derived rows with arbitrary headers
    Tabular(Vec<Row>),
    /// Backend tree already split into text/symbol/layout groups
    Structured(StructuredRequirements),
    /// Nothing usable was supplied
    #[default]
    Empty,
}

impl RequirementSource {
    /// Sniff the shape of a JSON requirement source.
    ///
    /// Arrays are rows, objects with requirement groups are trees, and
    /// `{"rows": [...]}` is accepted as a wrapped table. Anything else is
    /// `Empty`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::Tabular(object_rows(items)),
            Value::Object(_) if StructuredRequirements::looks_structured(value) => {
                Self::Structured(StructuredRequirements::from_value(value))
            }
            Value::Object(object) => match object.get("rows").and_then(Value::as_array) {
                Some(items) => Self::Tabular(object_rows(items)),
                None => {
                    warn!("Requirement source has no rows or requirement groups");
                    Self::Empty
                }
            },
            Value::Null => Self::Empty,
            _ => {
                warn!("Requirement source is neither a table nor a requirement tree");
                Self::Empty
            }
        }
    }

    /// Parse JSON text, degrading to `Empty` when it isn't valid JSON
    pub fn from_json_str(json: &str) -> Self {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                warn!(error = %e, "Requirement source is not valid JSON");
                Self::Empty
            }
        }
    }

    /// Column mapping a tabular source would be classified with
    pub fn column_mapping(&self, overrides: Option<&ColumnMapping>) -> Option<ColumnMapping> {
        match self {
            Self::Tabular(rows) => Some(source_mapping(rows, overrides)),
            Self::Structured(_) | Self::Empty => None,
        }
    }
}

fn object_rows(items: &[Value]) -> Vec<Row> {
    let rows: Vec<Row> = items
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect();
    if rows.len() < items.len() {
        warn!(
            dropped = items.len() - rows.len(),
            "Ignoring requirement rows that are not objects"
        );
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_ids_are_per_kind() {
        let mut set = RequirementSet::default();
        set.push(
            RequirementKind::Text,
            "a".into(),
            "a".into(),
            true,
            vec![],
        );
        set.push(
            RequirementKind::Symbol,
            "b".into(),
            "b".into(),
            true,
            vec![],
        );
        let third = set
            .push(
                RequirementKind::Text,
                "c".into(),
                "c".into(),
                false,
                vec!["ignored".into()],
            )
            .clone();

        assert_eq!(set.required_texts[0].id, "text_1");
        assert_eq!(set.required_symbols[0].id, "symbol_1");
        assert_eq!(third.id, "text_2");
        assert!(third.synonyms.is_empty());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_source_sniffing() {
        assert!(matches!(
            RequirementSource::from_value(&json!([{"Item": "warning"}])),
            RequirementSource::Tabular(rows) if rows.len() == 1
        ));
        assert!(matches!(
            RequirementSource::from_value(&json!({"rows": [{"Item": "warning"}, 3]})),
            RequirementSource::Tabular(rows) if rows.len() == 1
        ));
        assert!(matches!(
            RequirementSource::from_value(&json!({"textRequirement": [{"name": "x"}]})),
            RequirementSource::Structured(_)
        ));
        assert_eq!(
            RequirementSource::from_value(&json!({"unexpected": true})),
            RequirementSource::Empty
        );
        assert_eq!(
            RequirementSource::from_value(&json!("a string")),
            RequirementSource::Empty
        );
        assert_eq!(RequirementSource::from_value(&Value::Null), RequirementSource::Empty);
    }

    #[test]
    fn test_invalid_json_degrades_to_empty_set() {
        let source = RequirementSource::from_json_str("{not json");
        assert_eq!(source, RequirementSource::Empty);
        assert!(RequirementSet::build(&source, None).is_empty());
    }

    #[test]
    fn test_build_tabular_with_override() {
        let source = RequirementSource::from_value(&json!([
            {"Label": "Keep dry", "Kind": "text"},
            {"Label": "Fragile", "Kind": "text"}
        ]));

        // "Label"/"Kind" match no role keywords on their own
        assert!(RequirementSet::build(&source, None).is_empty());

        let overrides = ColumnMapping {
            item: Some("Label".to_string()),
            kind: Some("Kind".to_string()),
            ..ColumnMapping::default()
        };
        let set = RequirementSet::build(&source, Some(&overrides));
        assert_eq!(set.required_texts.len(), 2);
        assert_eq!(set.required_texts[1].match_target, "Fragile");

        let mapping = source.column_mapping(Some(&overrides)).unwrap();
        assert_eq!(mapping.item.as_deref(), Some("Label"));
    }

    #[test]
    fn test_set_serializes_with_spec_keys() {
        let mut set = RequirementSet::default();
        set.push(
            RequirementKind::Symbol,
            "CE".into(),
            "ce_mark".into(),
            true,
            vec![],
        );
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["requiredSymbols"][0]["matchTarget"], json!("ce_mark"));
        assert_eq!(value["requiredTexts"], json!([]));
        assert_eq!(value["layoutRequirements"], json!([]));
    }
}
