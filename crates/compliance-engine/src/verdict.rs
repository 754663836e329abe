use crate::matcher::MatchStrategy;
use crate::requirements::{Requirement, RequirementKind};

/// Outcome for one requirement
///
/// There is no stored `valid` flag; [`Verdict::valid`] derives it from
/// `found` and `required` every time.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub requirement_id: String,
    pub kind: RequirementKind,
    pub description: String,
    pub match_target: String,
    pub required: bool,
    pub found: bool,
    /// Matcher layer that confirmed the requirement, if one did
    pub matched_by: Option<MatchStrategy>,
}

impl Verdict {
    pub fn from_match(requirement: &Requirement, matched_by: Option<MatchStrategy>) -> Self {
        Self {
            requirement_id: requirement.id.clone(),
            kind: requirement.kind,
            description: requirement.description.clone(),
            match_target: requirement.match_target.clone(),
            required: requirement.required,
            found: matched_by.is_some(),
            matched_by,
        }
    }

    /// Placeholder verdict for layout rules that aren't evaluated yet
    pub fn assumed(requirement: &Requirement) -> Self {
        Self {
            found: true,
            ..Self::from_match(requirement, None)
        }
    }

    pub fn valid(&self) -> bool {
        self.found || !self.required
    }
}
