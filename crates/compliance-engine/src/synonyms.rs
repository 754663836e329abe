//! Symbol synonym families
//!
//! One immutable table is shared (via `Arc`) by the evidence normalizer and
//! the matcher. Lookups go through [`canonical_key`], so `"ce_mark"`,
//! `"CE-mark"` and `"ce mark"` all hit the same family.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::patterns::canonical_key;

/// Built-in families: (family name, accepted spellings)
const BUILTIN_FAMILIES: &[(&str, &[&str])] = &[
    (
        "ce_mark",
        &["ce", "ce mark", "ce_mark", "ce marking", "conformite europeenne"],
    ),
    (
        "age_grade",
        &["age grade", "age_grade", "age", "age warning", "age 3+", "0-3"],
    ),
    (
        "mobius_loop",
        &[
            "mobius loop",
            "mobius_loop",
            "mobius",
            "recycle",
            "recycling",
            "recycling symbol",
            "recyclable",
        ],
    ),
    (
        "registered_trademark",
        &[
            "registered trademark",
            "registered_trademark",
            "registered",
            "trademark",
            "®",
            "r mark",
        ],
    ),
    (
        "small_parts",
        &[
            "small parts",
            "small_parts",
            "small parts warning",
            "choking hazard",
            "choking_hazard",
        ],
    ),
    (
        "country_of_origin",
        &[
            "country of origin",
            "country_of_origin",
            "made in",
            "origin",
        ],
    ),
];

lazy_static! {
    static ref BUILTIN: Arc<SynonymTable> = Arc::new(SynonymTable::indexed(
        BUILTIN_FAMILIES
            .iter()
            .map(|(name, members)| SynonymFamily::new(*name, members.iter().copied()))
            .collect(),
    ));
}

/// Errors raised while loading an override synonym table
#[derive(Error, Debug, PartialEq)]
pub enum SynonymTableError {
    #[error("Synonym table is not valid JSON: {0}")]
    Parse(String),

    #[error("Synonym table must be a JSON object of family name to spellings")]
    NotAnObject,

    #[error("Family '{0}' must be a list of strings")]
    InvalidFamily(String),

    #[error("Family '{0}' has no usable spellings")]
    EmptyFamily(String),

    #[error("Spelling '{member}' appears in both '{first}' and '{second}'")]
    DuplicateMember {
        member: String,
        first: String,
        second: String,
    },
}

/// A set of spellings treated as one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymFamily {
    pub name: String,
    pub members: Vec<String>,
}

impl SynonymFamily {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into().to_lowercase(),
            members: members
                .into_iter()
                .map(|member| member.into().trim().to_lowercase())
                .filter(|member| !member.is_empty())
                .collect(),
        }
    }

    /// Family name followed by every member, lowercase
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.members.iter().map(String::as_str))
    }
}

/// Immutable lookup table from any spelling to its family
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    families: Vec<SynonymFamily>,
    index: HashMap<String, usize>,
}

impl SynonymTable {
    /// Build a table, rejecting empty families and spellings shared by two families
    pub fn new(families: Vec<SynonymFamily>) -> Result<Self, SynonymTableError> {
        let mut owner: HashMap<String, String> = HashMap::new();

        for family in &families {
            if family.members.is_empty() {
                return Err(SynonymTableError::EmptyFamily(family.name.clone()));
            }
            for spelling in family.spellings() {
                let key = canonical_key(spelling);
                match owner.get(&key) {
                    Some(first) if *first != family.name => {
                        return Err(SynonymTableError::DuplicateMember {
                            member: spelling.to_string(),
                            first: first.clone(),
                            second: family.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        owner.insert(key, family.name.clone());
                    }
                }
            }
        }

        Ok(Self::indexed(families))
    }

    /// Index families as given; the first family to claim a spelling keeps it
    fn indexed(families: Vec<SynonymFamily>) -> Self {
        let mut index = HashMap::new();
        for (position, family) in families.iter().enumerate() {
            for spelling in family.spellings() {
                index.entry(canonical_key(spelling)).or_insert(position);
            }
        }
        Self { families, index }
    }

    /// The shared built-in table
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Parse an override table shaped as `{"family": ["spelling", ...]}`
    pub fn from_json_str(json: &str) -> Result<Self, SynonymTableError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| SynonymTableError::Parse(e.to_string()))?;
        let object = value.as_object().ok_or(SynonymTableError::NotAnObject)?;

        let mut families = Vec::with_capacity(object.len());
        for (name, members) in object {
            let members = members
                .as_array()
                .ok_or_else(|| SynonymTableError::InvalidFamily(name.clone()))?
                .iter()
                .map(|member| {
                    member
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| SynonymTableError::InvalidFamily(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            families.push(SynonymFamily::new(name.as_str(), members));
        }

        Self::new(families)
    }

    pub fn families(&self) -> &[SynonymFamily] {
        &self.families
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Family containing `name` under any separator convention
    pub fn family_of(&self, name: &str) -> Option<&SynonymFamily> {
        self.index
            .get(&canonical_key(name))
            .map(|&position| &self.families[position])
    }
}
