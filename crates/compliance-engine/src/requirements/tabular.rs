//! Requirement rows from spreadsheet-derived tables

use serde_json::Value;
use tracing::debug;

use super::columns::{ColumnMapping, ColumnRole};
use super::{RequirementKind, RequirementSet, Row};
use crate::patterns::{is_placeholder, TEXT_REQUIREMENT_KEYWORDS};

/// Build requirements from rows, using `mapping` to find each column.
///
/// Rows that can't be classified are skipped without error.
pub fn build_from_rows(rows: &[Row], mapping: &ColumnMapping) -> RequirementSet {
    let mut set = RequirementSet::default();
    let mut skipped = 0usize;

    for row in rows {
        let Some(kind) = classify_row(row, mapping) else {
            skipped += 1;
            continue;
        };

        let item = item_text(row, mapping);
        let match_target = match kind {
            RequirementKind::Symbol => symbol_cell(row, mapping).or_else(|| item.clone()),
            RequirementKind::Text | RequirementKind::Layout => item.clone(),
        }
        .unwrap_or_default();

        let description = cell_text(row, mapping.get(ColumnRole::Description))
            .or(item)
            .unwrap_or_else(|| match_target.clone());

        set.push(
            kind,
            description,
            match_target,
            is_required(row, mapping),
            Vec::new(),
        );
    }

    if skipped > 0 {
        debug!(skipped, "Dropped unclassifiable requirement rows");
    }

    set
}

/// Decide which kind of requirement a row describes, if any.
///
/// Order: explicit type column, then a usable symbol cell, then wording
/// heuristics on the item text.
pub fn classify_row(row: &Row, mapping: &ColumnMapping) -> Option<RequirementKind> {
    if let Some(kind) = cell_text(row, mapping.get(ColumnRole::Kind)) {
        let kind = kind.to_lowercase();
        if kind.contains("text") {
            return Some(RequirementKind::Text);
        }
        if kind.contains("symbol") {
            return Some(RequirementKind::Symbol);
        }
        if kind.contains("layout") {
            return Some(RequirementKind::Layout);
        }
    }

    if symbol_cell(row, mapping).is_some() {
        return Some(RequirementKind::Symbol);
    }

    let item = item_text(row, mapping)?.to_lowercase();
    TEXT_REQUIREMENT_KEYWORDS
        .iter()
        .any(|keyword| item.contains(keyword))
        .then_some(RequirementKind::Text)
}

/// Required unless the required cell is literally `false`
pub fn is_required(row: &Row, mapping: &ColumnMapping) -> bool {
    let Some(value) = mapping
        .get(ColumnRole::Required)
        .and_then(|column| row.get(column))
    else {
        return true;
    };

    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.trim().eq_ignore_ascii_case("false"),
        _ => true,
    }
}

fn item_text(row: &Row, mapping: &ColumnMapping) -> Option<String> {
    cell_text(row, mapping.get(ColumnRole::Item))
        .or_else(|| cell_text(row, mapping.get(ColumnRole::Description)))
}

fn symbol_cell(row: &Row, mapping: &ColumnMapping) -> Option<String> {
    cell_text(row, mapping.get(ColumnRole::Symbol)).filter(|value| !is_placeholder(value))
}

/// Trimmed, non-empty text of a cell; numbers and booleans are stringified
fn cell_text(row: &Row, column: Option<&str>) -> Option<String> {
    let text = match row.get(column?)? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::columns::classify_columns;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|row| row.as_object().cloned())
            .collect()
    }

    fn standard_mapping() -> ColumnMapping {
        classify_columns(&["Item", "Symbol", "Description", "Required", "Type"])
    }

    #[test]
    fn test_type_column_decides_first() {
        let mapping = standard_mapping();
        let rows = rows(json!([
            {"Item": "Keep away from fire", "Type": "Text"},
            {"Item": "CE", "Type": "Symbol"},
            {"Item": "Warning on front panel", "Type": "Layout rule"},
        ]));

        let kinds: Vec<_> = rows
            .iter()
            .map(|row| classify_row(row, &mapping))
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some(RequirementKind::Text),
                Some(RequirementKind::Symbol),
                Some(RequirementKind::Layout),
            ]
        );
    }

    #[test]
    fn test_symbol_cell_makes_symbol_requirement() {
        let mapping = standard_mapping();
        let rows = rows(json!([{"Item": "Conformity", "Symbol": "ce_mark"}]));
        assert_eq!(
            classify_row(&rows[0], &mapping),
            Some(RequirementKind::Symbol)
        );

        let set = build_from_rows(&rows, &mapping);
        assert_eq!(set.required_symbols.len(), 1);
        assert_eq!(set.required_symbols[0].match_target, "ce_mark");
        assert_eq!(set.required_symbols[0].description, "Conformity");
    }

    #[test]
    fn test_placeholder_symbol_cell_is_ignored() {
        let mapping = standard_mapping();
        let rows = rows(json!([
            {"Item": "Made in Vietnam", "Symbol": "N/A"},
            {"Item": "Batch number", "Symbol": "-"},
        ]));

        assert_eq!(classify_row(&rows[0], &mapping), Some(RequirementKind::Text));
        assert_eq!(classify_row(&rows[1], &mapping), None);
    }

    #[test]
    fn test_keyword_heuristics_for_untyped_rows() {
        let mapping = classify_columns(&["Item"]);
        let rows = rows(json!([
            {"Item": "WARNING: Choking hazard"},
            {"Item": "Country of origin"},
            {"Item": "Age grade 3+"},
            {"Item": "Barcode"},
        ]));

        let set = build_from_rows(&rows, &mapping);
        assert_eq!(set.required_texts.len(), 3);
        assert!(set.required_symbols.is_empty());
        assert!(set.layout_requirements.is_empty());
        assert_eq!(set.required_texts[0].id, "text_1");
        assert_eq!(set.required_texts[2].id, "text_3");
    }

    #[test]
    fn test_required_defaults_to_true() {
        let mapping = standard_mapping();
        let rows = rows(json!([
            {"Item": "warning a", "Required": false},
            {"Item": "warning b", "Required": "FALSE"},
            {"Item": "warning c", "Required": "no"},
            {"Item": "warning d", "Required": true},
            {"Item": "warning e"},
            {"Item": "warning f", "Required": 0},
        ]));

        let required: Vec<bool> = rows.iter().map(|row| is_required(row, &mapping)).collect();
        assert_eq!(required, vec![false, false, true, true, true, true]);
    }

    #[test]
    fn test_description_falls_back_to_item() {
        let mapping = standard_mapping();
        let rows = rows(json!([
            {"Item": "Choking hazard", "Description": "Small parts warning for toys", "Type": "text"},
            {"Item": "Not for children under 3", "Type": "text"},
        ]));

        let set = build_from_rows(&rows, &mapping);
        assert_eq!(set.required_texts[0].description, "Small parts warning for toys");
        assert_eq!(set.required_texts[0].match_target, "Choking hazard");
        assert_eq!(set.required_texts[1].description, "Not for children under 3");
    }

    #[test]
    fn test_item_falls_back_to_description_column() {
        let mapping = classify_columns(&["Requirement", "Category"]);
        let rows = rows(json!([{"Requirement": "Keep out of reach of children", "Category": "Text"}]));

        let set = build_from_rows(&rows, &mapping);
        assert_eq!(
            set.required_texts[0].match_target,
            "Keep out of reach of children"
        );
    }

    #[test]
    fn test_numeric_cells_are_stringified() {
        let mapping = standard_mapping();
        let rows = rows(json!([{"Item": 2024, "Type": "text"}]));
        let set = build_from_rows(&rows, &mapping);
        assert_eq!(set.required_texts[0].match_target, "2024");
    }

    #[test]
    fn test_no_columns_means_no_requirements() {
        let rows = rows(json!([{"foo": "bar"}, {"baz": 1}]));
        let set = build_from_rows(&rows, &ColumnMapping::default());
        assert!(set.is_empty());
    }
}
