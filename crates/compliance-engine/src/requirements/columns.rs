//! Column sniffing for spreadsheet-derived requirement rows
//!
//! Header names vary between sources, so each role is guessed by
//! case-insensitive substring match. The guess is a plain [`ColumnMapping`]
//! value that callers can inspect and override before rows are classified.

use serde::{Deserialize, Serialize};

use super::Row;

/// What a column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Item,
    Symbol,
    Description,
    Required,
    #[serde(rename = "type")]
    Kind,
}

impl ColumnRole {
    /// Claim order: a header taken by an earlier role is skipped by later ones,
    /// so "Requirement Type" is a type column and not a description column.
    pub const CLAIM_ORDER: [ColumnRole; 5] = [
        ColumnRole::Required,
        ColumnRole::Kind,
        ColumnRole::Symbol,
        ColumnRole::Description,
        ColumnRole::Item,
    ];

    /// Header substrings that suggest this role
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Item => &["item", "term", "text"],
            ColumnRole::Symbol => &["symbol", "icon", "mark"],
            ColumnRole::Description => &["description", "requirement", "rule"],
            ColumnRole::Required => &["required", "mandatory"],
            ColumnRole::Kind => &["type", "category"],
        }
    }

    fn matches(&self, header: &str) -> bool {
        let header = header.to_lowercase();
        self.keywords().iter().any(|keyword| header.contains(keyword))
    }
}

/// Header chosen for each role, if any
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ColumnMapping {
    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.slot(role).as_deref()
    }

    fn slot(&self, role: ColumnRole) -> &Option<String> {
        match role {
            ColumnRole::Item => &self.item,
            ColumnRole::Symbol => &self.symbol,
            ColumnRole::Description => &self.description,
            ColumnRole::Required => &self.required,
            ColumnRole::Kind => &self.kind,
        }
    }

    fn slot_mut(&mut self, role: ColumnRole) -> &mut Option<String> {
        match role {
            ColumnRole::Item => &mut self.item,
            ColumnRole::Symbol => &mut self.symbol,
            ColumnRole::Description => &mut self.description,
            ColumnRole::Required => &mut self.required,
            ColumnRole::Kind => &mut self.kind,
        }
    }

    /// Replace every role the override names; keep guesses for the rest
    pub fn with_overrides(mut self, overrides: &ColumnMapping) -> Self {
        for role in ColumnRole::CLAIM_ORDER {
            if let Some(header) = overrides.get(role) {
                *self.slot_mut(role) = Some(header.to_string());
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        ColumnRole::CLAIM_ORDER
            .iter()
            .all(|role| self.get(*role).is_none())
    }
}

/// Guess a column for each role; the first qualifying header wins
pub fn classify_columns<S: AsRef<str>>(headers: &[S]) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();
    let mut claimed = vec![false; headers.len()];

    for role in ColumnRole::CLAIM_ORDER {
        let pick = headers
            .iter()
            .map(AsRef::<str>::as_ref)
            .enumerate()
            .find(|(position, header)| !claimed[*position] && role.matches(header));

        if let Some((position, header)) = pick {
            claimed[position] = true;
            *mapping.slot_mut(role) = Some(header.to_string());
        }
    }

    mapping
}

/// Every key seen across the rows, in order of first appearance
pub fn collect_headers(rows: &[Row]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.iter().any(|known| known == key) {
                headers.push(key.clone());
            }
        }
    }
    headers
}
