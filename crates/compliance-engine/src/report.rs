//! Report assembly
//!
//! Pure projection of verdicts and score into the presentation shape. Nothing
//! is recomputed here.

use shared_types::{
    ComplianceScore, LayoutValidation, SymbolValidation, TermValidation, ValidationReport,
};

use crate::aggregate::CategoryVerdicts;
use crate::verdict::Verdict;

pub const COMPLIANT_MESSAGE: &str = "Packaging meets all mandatory labeling requirements.";
pub const NON_COMPLIANT_MESSAGE: &str =
    "Packaging does not meet mandatory labeling requirements. Review the missing items below.";

/// Verdicts plus the score they produced
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdicts: CategoryVerdicts,
    pub score: ComplianceScore,
}

impl Evaluation {
    pub fn report(&self) -> ValidationReport {
        build_report(&self.verdicts, &self.score)
    }

    /// Plain-text rendering for reviewers, including which matcher layer
    /// confirmed each item
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("Packaging Compliance Report\n");
        output.push_str(&"=".repeat(60));
        output.push_str("\n\n");

        output.push_str(&format!(
            "Status: {}\n",
            if self.score.passed {
                "COMPLIANT"
            } else {
                "NON-COMPLIANT"
            }
        ));
        output.push_str(&format!(
            "Overall: {:.1}% (text {:.1}%, symbols {:.1}%, layout {:.1}%)\n\n",
            self.score.overall * 100.0,
            self.score.text_ratio * 100.0,
            self.score.symbol_ratio * 100.0,
            self.score.layout_ratio * 100.0
        ));

        for (title, verdicts) in [
            ("Texts", &self.verdicts.text),
            ("Symbols", &self.verdicts.symbol),
            ("Layout", &self.verdicts.layout),
        ] {
            if verdicts.is_empty() {
                continue;
            }
            output.push_str(&format!("{}\n", title));
            output.push_str(&"-".repeat(40));
            output.push('\n');
            for verdict in verdicts {
                output.push_str(&text_line(verdict));
            }
            output.push('\n');
        }

        output
    }
}

fn text_line(verdict: &Verdict) -> String {
    let mark = match (verdict.valid(), verdict.found) {
        (true, true) => "[OK]  ",
        (true, false) => "[--]  ",
        (false, _) => "[FAIL]",
    };
    let how = match (verdict.found, verdict.matched_by) {
        (true, Some(strategy)) => strategy.describe(),
        (true, None) => "assumed",
        (false, _) if verdict.required => "missing",
        (false, _) => "optional, not found",
    };
    format!("{} {} ({})\n", mark, verdict.description, how)
}

pub fn build_report(verdicts: &CategoryVerdicts, score: &ComplianceScore) -> ValidationReport {
    ValidationReport {
        is_compliant: score.passed,
        compliance_message: compliance_message(score.passed).to_string(),
        term_validations: verdicts
            .text
            .iter()
            .map(|v| TermValidation {
                term: v.description.clone(),
                required: v.required,
                found: v.found,
                valid: v.valid(),
            })
            .collect(),
        symbol_validations: verdicts
            .symbol
            .iter()
            .map(|v| SymbolValidation {
                symbol: v.description.clone(),
                required: v.required,
                found: v.found,
                valid: v.valid(),
            })
            .collect(),
        layout_validations: verdicts
            .layout
            .iter()
            .map(|v| LayoutValidation {
                rule: v.match_target.clone(),
                description: v.description.clone(),
                valid: v.valid(),
            })
            .collect(),
        score: *score,
    }
}

pub fn compliance_message(passed: bool) -> &'static str {
    if passed {
        COMPLIANT_MESSAGE
    } else {
        NON_COMPLIANT_MESSAGE
    }
}
