//! Evidence normalization
//!
//! Reduces raw OCR regions and symbol detections to two flat, lowercase sets
//! the matcher can compare against. OCR backends disagree on how region text
//! is shaped, so each region is first classified into a [`RegionContent`]
//! variant and then extracted by the function for that variant.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use shared_types::{DetectionInput, SymbolDetection, TextRegion};
use tracing::debug;

use crate::patterns::{canonical_key, underscore_form};
use crate::synonyms::SynonymTable;

/// Shape of a region's text as delivered by the OCR backend
#[derive(Debug, Clone, PartialEq)]
pub enum RegionContent {
    /// Direct `text` field
    Flat(String),
    /// `lines` in one of the shapes below
    Lines(LineShape),
    /// Only a `words` list
    Words(Vec<String>),
    /// Nothing extractable
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineShape {
    /// `"lines": "one string"`
    Single(String),
    /// `"lines": ["token", "token"]`
    Tokens(Vec<String>),
    /// `"lines": [{"text": ...}, {"words": [...]}, ["token", ...]]`
    Objects(Vec<LineObject>),
}

/// One line of a region; either its own text or its words
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineObject {
    pub text: Option<String>,
    pub words: Vec<String>,
}

impl RegionContent {
    pub fn classify(region: &TextRegion) -> Self {
        if let Some(text) = region.text.as_deref().filter(|text| !text.trim().is_empty()) {
            return Self::Flat(text.to_string());
        }
        if let Some(lines) = region.lines.as_ref().and_then(LineShape::from_value) {
            return Self::Lines(lines);
        }
        if let Some(words) = region.words.as_ref().map(word_list).filter(|w| !w.is_empty()) {
            return Self::Words(words);
        }
        Self::Empty
    }

    /// Joined text of the region, or `None` when nothing usable is present
    pub fn extract(&self) -> Option<String> {
        let joined = match self {
            Self::Flat(text) => text.trim().to_string(),
            Self::Lines(lines) => lines.extract(),
            Self::Words(words) => join_parts(words.iter().map(String::as_str)),
            Self::Empty => String::new(),
        };
        (!joined.is_empty()).then_some(joined)
    }
}

impl LineShape {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(Self::Single(text.clone())),
            Value::Array(items) if items.is_empty() => None,
            Value::Array(items) if items.iter().all(Value::is_string) => Some(Self::Tokens(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            )),
            Value::Array(items) => {
                Some(Self::Objects(items.iter().map(LineObject::from_value).collect()))
            }
            _ => None,
        }
    }

    fn extract(&self) -> String {
        match self {
            Self::Single(text) => text.trim().to_string(),
            Self::Tokens(tokens) => join_parts(tokens.iter().map(String::as_str)),
            Self::Objects(lines) => {
                let texts: Vec<String> = lines.iter().map(LineObject::extract).collect();
                join_parts(texts.iter().map(String::as_str))
            }
        }
    }
}

impl LineObject {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => Self {
                text: Some(text.clone()),
                words: Vec::new(),
            },
            Value::Array(_) => Self {
                text: None,
                words: word_list(value),
            },
            Value::Object(object) => Self {
                text: object
                    .get("text")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                words: object.get("words").map(word_list).unwrap_or_default(),
            },
            _ => Self::default(),
        }
    }

    fn extract(&self) -> String {
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => join_parts(self.words.iter().map(String::as_str)),
        }
    }
}

/// Words given as plain strings or as `{"text": ...}` objects
fn word_list(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(word) => Some(word.clone()),
            Value::Object(object) => object
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

fn join_parts<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text found in one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEvidence {
    /// What a reviewer sees: the extracted text or a `Region <n>` placeholder
    pub label: String,
    /// Lowercase text used for matching; empty for placeholders
    pub content: String,
}

impl TextEvidence {
    fn extracted(text: String) -> Self {
        Self {
            content: text.to_lowercase(),
            label: text,
        }
    }

    fn placeholder(position: usize) -> Self {
        Self {
            label: format!("Region {}", position),
            content: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.content.is_empty()
    }
}

/// Normalized evidence for one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSet {
    pub texts: BTreeSet<String>,
    pub symbol_classes: BTreeSet<String>,
    /// Every region in input order, placeholders included
    pub regions: Vec<TextEvidence>,
}

impl EvidenceSet {
    /// Evidence from already-normalized strings (lowercased, no synonym expansion)
    pub fn from_parts<T, S>(texts: T, symbols: S) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let regions: Vec<TextEvidence> = texts
            .into_iter()
            .map(|text| text.as_ref().trim().to_string())
            .filter(|text| !text.is_empty())
            .map(TextEvidence::extracted)
            .collect();

        Self {
            texts: regions.iter().map(|region| region.content.clone()).collect(),
            symbol_classes: symbols
                .into_iter()
                .map(|symbol| symbol.as_ref().trim().to_lowercase())
                .filter(|symbol| !symbol.is_empty())
                .collect(),
            regions,
        }
    }

    /// No comparable text and no symbols
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.symbol_classes.is_empty()
    }

    /// All comparable items, texts first
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.texts
            .iter()
            .chain(self.symbol_classes.iter())
            .map(String::as_str)
    }
}

/// Turns raw detections into an [`EvidenceSet`]
#[derive(Debug, Clone)]
pub struct EvidenceNormalizer {
    synonyms: Arc<SynonymTable>,
    min_symbol_confidence: f64,
}

impl EvidenceNormalizer {
    pub fn new(synonyms: Arc<SynonymTable>) -> Self {
        Self {
            synonyms,
            min_symbol_confidence: 0.0,
        }
    }

    /// Ignore symbol detections scored below `confidence`
    pub fn with_min_symbol_confidence(mut self, confidence: f64) -> Self {
        self.min_symbol_confidence = confidence;
        self
    }

    pub fn normalize(&self, detections: &DetectionInput) -> EvidenceSet {
        let regions = text_evidence(&detections.text_regions);
        let texts = regions
            .iter()
            .filter(|region| !region.is_placeholder())
            .map(|region| region.content.clone())
            .collect();

        let mut symbol_classes = BTreeSet::new();
        for detection in &detections.symbols {
            if detection.confidence < self.min_symbol_confidence {
                debug!(
                    class = %detection.class_name,
                    confidence = detection.confidence,
                    "Ignoring low-confidence symbol"
                );
                continue;
            }
            symbol_classes.extend(self.symbol_evidence(detection));
        }

        let evidence = EvidenceSet {
            texts,
            symbol_classes,
            regions,
        };
        debug!(
            texts = evidence.texts.len(),
            symbols = evidence.symbol_classes.len(),
            regions = evidence.regions.len(),
            "Normalized evidence"
        );
        evidence
    }

    /// Class name plus its separator variants and synonym family
    pub fn symbol_evidence(&self, detection: &SymbolDetection) -> Vec<String> {
        let name = detection.class_name.trim().to_lowercase();
        if name.is_empty() {
            return Vec::new();
        }

        let mut evidence = vec![name.clone(), underscore_form(&name), canonical_key(&name)];
        if let Some(family) = self.synonyms.family_of(&name) {
            evidence.extend(family.spellings().map(str::to_string));
        }
        evidence.retain(|item| !item.is_empty());
        evidence
    }
}

/// One evidence entry per region, in input order; regions with no text get a
/// `Region <n>` placeholder (1-based)
pub fn text_evidence(regions: &[TextRegion]) -> Vec<TextEvidence> {
    regions
        .iter()
        .enumerate()
        .map(|(position, region)| match RegionContent::classify(region).extract() {
            Some(text) => TextEvidence::extracted(text),
            None => TextEvidence::placeholder(position + 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn region(value: Value) -> TextRegion {
        serde_json::from_value(value).unwrap()
    }

    fn normalizer() -> EvidenceNormalizer {
        EvidenceNormalizer::new(SynonymTable::builtin())
    }

    #[test]
    fn test_flat_text_wins_over_lines() {
        let r = region(json!({"text": "Made in China", "lines": ["ignored"]}));
        assert_eq!(
            RegionContent::classify(&r),
            RegionContent::Flat("Made in China".to_string())
        );
    }

    #[test]
    fn test_line_shapes_extract_in_order() {
        let single = region(json!({"lines": "CHOKING HAZARD"}));
        let tokens = region(json!({"lines": ["Keep", "away", "from", "fire"]}));
        let objects = region(json!({"lines": [
            {"text": "WARNING:"},
            {"words": [{"text": "Small"}, "parts"]},
            ["Not", "for", "children"]
        ]}));

        assert_eq!(
            RegionContent::classify(&single).extract().as_deref(),
            Some("CHOKING HAZARD")
        );
        assert_eq!(
            RegionContent::classify(&tokens).extract().as_deref(),
            Some("Keep away from fire")
        );
        assert_eq!(
            RegionContent::classify(&objects).extract().as_deref(),
            Some("WARNING: Small parts Not for children")
        );
    }

    #[test]
    fn test_words_only_region() {
        let r = region(json!({"words": ["Age", "3+"]}));
        assert_eq!(
            RegionContent::classify(&r),
            RegionContent::Words(vec!["Age".to_string(), "3+".to_string()])
        );
    }

    #[test]
    fn test_empty_regions_become_placeholders() {
        let regions = vec![
            region(json!({"text": "Recyclable"})),
            region(json!({"text": "   "})),
            region(json!({"lines": 42})),
            region(json!({"lines": []})),
        ];
        let evidence = text_evidence(&regions);
        let labels: Vec<&str> = evidence.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Recyclable", "Region 2", "Region 3", "Region 4"]);
        assert!(evidence[1].is_placeholder());
        assert_eq!(evidence[0].content, "recyclable");
    }

    #[test]
    fn test_placeholders_never_reach_text_set() {
        let detections = DetectionInput::new(
            vec![region(json!({})), region(json!({"text": "Choking Hazard"}))],
            vec![],
        );
        let evidence = normalizer().normalize(&detections);
        assert_eq!(
            evidence.texts.iter().cloned().collect::<Vec<_>>(),
            vec!["choking hazard".to_string()]
        );
        assert_eq!(evidence.regions.len(), 2);
    }

    #[test]
    fn test_symbol_expansion_includes_separator_variants() {
        let evidence = normalizer().symbol_evidence(&SymbolDetection::new("Small-Parts", 0.9));
        assert!(evidence.contains(&"small-parts".to_string()));
        assert!(evidence.contains(&"small_parts".to_string()));
        assert!(evidence.contains(&"small parts".to_string()));
        assert!(evidence.contains(&"choking hazard".to_string()));
    }

    #[test]
    fn test_symbol_expansion_adds_synonym_family() {
        let detections = DetectionInput::new(vec![], vec![SymbolDetection::new("CE", 0.8)]);
        let evidence = normalizer().normalize(&detections);
        for expected in ["ce", "ce mark", "ce_mark", "ce marking"] {
            assert!(
                evidence.symbol_classes.contains(expected),
                "missing {:?} in {:?}",
                expected,
                evidence.symbol_classes
            );
        }
    }

    #[test]
    fn test_unknown_symbol_is_kept_without_family() {
        let detections = DetectionInput::new(vec![], vec![SymbolDetection::new("Logo", 0.5)]);
        let evidence = normalizer().normalize(&detections);
        assert_eq!(
            evidence.symbol_classes.iter().cloned().collect::<Vec<_>>(),
            vec!["logo".to_string()]
        );
    }

    #[test]
    fn test_min_confidence_filters_symbols() {
        let detections = DetectionInput::new(
            vec![],
            vec![
                SymbolDetection::new("ce", 0.2),
                SymbolDetection::new("mobius_loop", 0.75),
            ],
        );
        let evidence = normalizer()
            .with_min_symbol_confidence(0.5)
            .normalize(&detections);
        assert!(!evidence.symbol_classes.contains("ce"));
        assert!(evidence.symbol_classes.contains("recycle"));
    }

    #[test]
    fn test_blank_class_names_are_dropped() {
        let detections = DetectionInput::new(vec![], vec![SymbolDetection::new("  ", 1.0)]);
        assert!(normalizer().normalize(&detections).is_empty());
    }

    #[test]
    fn test_from_parts_lowercases() {
        let evidence = EvidenceSet::from_parts(["Choking Hazard", " "], ["AGE_GRADE"]);
        assert!(evidence.texts.contains("choking hazard"));
        assert_eq!(evidence.texts.len(), 1);
        assert!(evidence.symbol_classes.contains("age_grade"));
        assert_eq!(evidence.items().count(), 2);
    }
}
