//! Packaging compliance validation engine
//!
//! Decides whether the texts and symbols detected on a packaging image satisfy
//! a set of labeling requirements. Data flows one way:
//!
//! - [`requirements`] builds a [`RequirementSet`] from spreadsheet rows or a
//!   grouped requirement tree
//! - [`evidence`] reduces OCR regions and symbol detections to an [`EvidenceSet`]
//! - [`matcher`] decides `found` per requirement
//! - [`aggregate`] turns verdicts into category ratios and a pass/fail score
//! - [`report`] projects everything into a [`ValidationReport`]
//!
//! Every stage is synchronous and stateless; one call is one validation run.

pub mod aggregate;
pub mod evidence;
pub mod matcher;
pub mod patterns;
pub mod report;
pub mod requirements;
pub mod synonyms;
pub mod verdict;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{DetectionInput, ValidationReport};
use tracing::debug;

pub use aggregate::CategoryVerdicts;
pub use evidence::{EvidenceNormalizer, EvidenceSet};
pub use matcher::{MatchStrategy, Matcher};
pub use report::Evaluation;
pub use requirements::{
    ColumnMapping, Requirement, RequirementKind, RequirementSet, RequirementSource,
};
pub use synonyms::{SynonymFamily, SynonymTable, SynonymTableError};
pub use verdict::Verdict;

/// How layout requirements are judged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPolicy {
    /// Record every layout rule as satisfied. Placeholder until real layout
    /// rules (placement, size, contrast) are evaluated.
    #[default]
    AssumeSatisfied,
    /// Run layout targets through the matcher like texts
    MatchEvidence,
}

impl FromStr for LayoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assume-satisfied" | "assume" => Ok(LayoutPolicy::AssumeSatisfied),
            "match-evidence" | "match" => Ok(LayoutPolicy::MatchEvidence),
            other => Err(format!(
                "Unknown layout policy '{}'. Use 'assume-satisfied' or 'match-evidence'",
                other
            )),
        }
    }
}

impl fmt::Display for LayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutPolicy::AssumeSatisfied => f.write_str("assume-satisfied"),
            LayoutPolicy::MatchEvidence => f.write_str("match-evidence"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout_policy: LayoutPolicy,
    /// Symbol detections scored below this are ignored
    pub min_symbol_confidence: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout_policy: LayoutPolicy::AssumeSatisfied,
            min_symbol_confidence: 0.0,
        }
    }
}

/// ComplianceEngine entry point
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    config: EngineConfig,
    synonyms: Arc<SynonymTable>,
    normalizer: EvidenceNormalizer,
    matcher: Matcher,
}

impl ComplianceEngine {
    /// Engine with the default config and built-in synonym families
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default(), SynonymTable::builtin())
    }

    pub fn with_config(config: EngineConfig, synonyms: Arc<SynonymTable>) -> Self {
        let normalizer = EvidenceNormalizer::new(Arc::clone(&synonyms))
            .with_min_symbol_confidence(config.min_symbol_confidence);
        let matcher = Matcher::new(Arc::clone(&synonyms));
        Self {
            config,
            synonyms,
            normalizer,
            matcher,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn build_requirements(
        &self,
        source: &RequirementSource,
        overrides: Option<&ColumnMapping>,
    ) -> RequirementSet {
        RequirementSet::build(source, overrides)
    }

    pub fn normalize_evidence(&self, detections: &DetectionInput) -> EvidenceSet {
        self.normalizer.normalize(detections)
    }

    /// One verdict per requirement, grouped by kind
    pub fn judge(&self, requirements: &RequirementSet, evidence: &EvidenceSet) -> CategoryVerdicts {
        let judge_all = |group: &[Requirement]| -> Vec<Verdict> {
            group
                .iter()
                .map(|requirement| {
                    Verdict::from_match(
                        requirement,
                        self.matcher.match_requirement(requirement, evidence),
                    )
                })
                .collect()
        };

        let layout = match self.config.layout_policy {
            LayoutPolicy::AssumeSatisfied => requirements
                .layout_requirements
                .iter()
                .map(Verdict::assumed)
                .collect(),
            LayoutPolicy::MatchEvidence => judge_all(&requirements.layout_requirements),
        };

        CategoryVerdicts {
            text: judge_all(&requirements.required_texts),
            symbol: judge_all(&requirements.required_symbols),
            layout,
        }
    }

    /// Judge and score already-built requirements against raw detections
    pub fn evaluate(
        &self,
        requirements: &RequirementSet,
        detections: &DetectionInput,
    ) -> Evaluation {
        let evidence = self.normalize_evidence(detections);
        let verdicts = self.judge(requirements, &evidence);
        let score = aggregate::aggregate(&verdicts);

        debug!(
            overall = score.overall,
            passed = score.passed,
            text_ratio = score.text_ratio,
            symbol_ratio = score.symbol_ratio,
            layout_ratio = score.layout_ratio,
            "Scored validation run"
        );

        Evaluation { verdicts, score }
    }

    /// Full run: build requirements, normalize evidence, match, score, report
    pub fn validate(
        &self,
        source: &RequirementSource,
        detections: &DetectionInput,
    ) -> ValidationReport {
        let requirements = self.build_requirements(source, None);
        self.evaluate(&requirements, detections).report()
    }

    /// Full run over raw JSON; malformed parts degrade to empty input
    pub fn validate_value(&self, requirements: &Value, detections: &Value) -> ValidationReport {
        self.validate(
            &RequirementSource::from_value(requirements),
            &DetectionInput::from_value(detections),
        )
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}
