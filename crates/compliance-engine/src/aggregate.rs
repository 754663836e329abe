//! Category ratios and the weighted compliance score
//!
//! The aggregator only counts what it is given. It has no notion of how a
//! verdict was produced (matched, assumed, or skipped).

use shared_types::ComplianceScore;

use crate::requirements::RequirementKind;
use crate::verdict::Verdict;

pub const TEXT_WEIGHT: f64 = 0.4;
pub const SYMBOL_WEIGHT: f64 = 0.4;
pub const LAYOUT_WEIGHT: f64 = 0.2;

/// Overall score needed to pass
pub const COMPLIANCE_THRESHOLD: f64 = 0.9;

/// Verdicts split by requirement kind, each in requirement order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryVerdicts {
    pub text: Vec<Verdict>,
    pub symbol: Vec<Verdict>,
    pub layout: Vec<Verdict>,
}

impl CategoryVerdicts {
    pub fn partition(verdicts: impl IntoIterator<Item = Verdict>) -> Self {
        let mut categories = Self::default();
        for verdict in verdicts {
            match verdict.kind {
                RequirementKind::Text => categories.text.push(verdict),
                RequirementKind::Symbol => categories.symbol.push(verdict),
                RequirementKind::Layout => categories.layout.push(verdict),
            }
        }
        categories
    }

    pub fn iter(&self) -> impl Iterator<Item = &Verdict> {
        self.text
            .iter()
            .chain(self.symbol.iter())
            .chain(self.layout.iter())
    }
}

/// Found share of the required verdicts; 1.0 when nothing is required
pub fn category_ratio(verdicts: &[Verdict]) -> f64 {
    let required = verdicts.iter().filter(|v| v.required).count();
    if required == 0 {
        return 1.0;
    }
    let found = verdicts.iter().filter(|v| v.required && v.found).count();
    found as f64 / required as f64
}

pub fn weighted_overall(text_ratio: f64, symbol_ratio: f64, layout_ratio: f64) -> f64 {
    TEXT_WEIGHT * text_ratio + SYMBOL_WEIGHT * symbol_ratio + LAYOUT_WEIGHT * layout_ratio
}

/// Inclusive threshold check
pub fn meets_threshold(overall: f64) -> bool {
    overall >= COMPLIANCE_THRESHOLD
}

pub fn aggregate(verdicts: &CategoryVerdicts) -> ComplianceScore {
    let text_ratio = category_ratio(&verdicts.text);
    let symbol_ratio = category_ratio(&verdicts.symbol);
    let layout_ratio = category_ratio(&verdicts.layout);
    let overall = weighted_overall(text_ratio, symbol_ratio, layout_ratio);

    ComplianceScore {
        text_ratio,
        symbol_ratio,
        layout_ratio,
        overall,
        passed: meets_threshold(overall),
    }
}
