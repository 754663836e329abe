//! Layered requirement matching
//!
//! Each layer is plain string algebra so a verdict can be re-run and
//! explained. Layers run in order and stop at the first success:
//!
//! 1. exact containment against texts and symbols
//! 2. separator-swapped forms against symbols
//! 3. synonym family membership against symbols
//! 4. keyword overlap against everything

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceSet;
use crate::patterns::{canonical_key, keywords, underscore_form};
use crate::requirements::Requirement;
use crate::synonyms::SynonymTable;

/// Minimum share of target keywords that must appear in the evidence
pub const KEYWORD_MATCH_THRESHOLD: f64 = 0.4;

/// Layer that confirmed a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    ExactContainment,
    CanonicalForm,
    SynonymFamily,
    KeywordOverlap,
}

impl MatchStrategy {
    pub fn describe(&self) -> &'static str {
        match self {
            MatchStrategy::ExactContainment => "exact match",
            MatchStrategy::CanonicalForm => "separator-insensitive match",
            MatchStrategy::SynonymFamily => "synonym match",
            MatchStrategy::KeywordOverlap => "keyword overlap",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Matcher {
    synonyms: Arc<SynonymTable>,
}

impl Matcher {
    pub fn new(synonyms: Arc<SynonymTable>) -> Self {
        Self { synonyms }
    }

    /// Match a requirement's target, honoring its own synonyms
    pub fn match_requirement(
        &self,
        requirement: &Requirement,
        evidence: &EvidenceSet,
    ) -> Option<MatchStrategy> {
        self.find_with_synonyms(&requirement.match_target, &requirement.synonyms, evidence)
    }

    /// Match a bare target string
    pub fn find(&self, target: &str, evidence: &EvidenceSet) -> Option<MatchStrategy> {
        self.find_with_synonyms(target, &[], evidence)
    }

    fn find_with_synonyms(
        &self,
        target: &str,
        extra_synonyms: &[String],
        evidence: &EvidenceSet,
    ) -> Option<MatchStrategy> {
        let target = target.trim().to_lowercase();
        if target.is_empty() || evidence.is_empty() {
            return None;
        }

        if exact_containment(&target, evidence) {
            return Some(MatchStrategy::ExactContainment);
        }
        if canonical_containment(&target, evidence) {
            return Some(MatchStrategy::CanonicalForm);
        }
        if self.synonym_containment(&target, extra_synonyms, evidence) {
            return Some(MatchStrategy::SynonymFamily);
        }
        if keyword_overlap_ratio(&target, evidence) >= KEYWORD_MATCH_THRESHOLD {
            return Some(MatchStrategy::KeywordOverlap);
        }
        None
    }

    fn synonym_containment(
        &self,
        target: &str,
        extra_synonyms: &[String],
        evidence: &EvidenceSet,
    ) -> bool {
        let symbol_keys: HashSet<String> = evidence
            .symbol_classes
            .iter()
            .map(|symbol| canonical_key(symbol))
            .collect();

        let family = self.synonyms.family_of(target).into_iter().flat_map(|f| f.spellings());
        let extras = extra_synonyms.iter().map(String::as_str);

        family
            .chain(extras)
            .map(canonical_key)
            .any(|key| !key.is_empty() && symbol_keys.contains(&key))
    }
}

/// Target inside any text, or target and a symbol containing one another
fn exact_containment(target: &str, evidence: &EvidenceSet) -> bool {
    evidence.texts.iter().any(|text| text.contains(target))
        || symbol_containment(target, evidence)
}

fn symbol_containment(target: &str, evidence: &EvidenceSet) -> bool {
    evidence.symbol_classes.iter().any(|symbol| {
        !symbol.is_empty()
            && (symbol == target || symbol.contains(target) || target.contains(symbol.as_str()))
    })
}

/// Retry symbol containment with spaces and underscores swapped
fn canonical_containment(target: &str, evidence: &EvidenceSet) -> bool {
    let spaced = target.replace('_', " ");
    let underscored = target.replace(' ', "_");

    [spaced, underscored, canonical_key(target), underscore_form(target)]
        .iter()
        .filter(|form| form.as_str() != target && !form.is_empty())
        .any(|form| symbol_containment(form, evidence))
}

/// Share of the target's keywords (3+ chars) found in the evidence.
///
/// A keyword counts when it is a whole word of some evidence item or a
/// substring of one. Targets without keywords score 0.
pub fn keyword_overlap_ratio(target: &str, evidence: &EvidenceSet) -> f64 {
    let target = target.to_lowercase();
    let target_words = keywords(&target);
    if target_words.is_empty() {
        return 0.0;
    }

    let evidence_words: HashSet<&str> = evidence.items().flat_map(keywords).collect();
    let matched = target_words
        .iter()
        .filter(|&&word| {
            evidence_words.contains(word) || evidence.items().any(|item| item.contains(word))
        })
        .count();

    matched as f64 / target_words.len() as f64
}
