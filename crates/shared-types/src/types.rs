use serde::de::DeserializeOwned;
use serde_json::Value;

/// Upstream detection output for one packaging image
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionInput {
    #[serde(default)]
    pub text_regions: Vec<TextRegion>,
    #[serde(default)]
    pub symbols: Vec<SymbolDetection>,
}

impl DetectionInput {
    pub fn new(text_regions: Vec<TextRegion>, symbols: Vec<SymbolDetection>) -> Self {
        Self {
            text_regions,
            symbols,
        }
    }

    /// Lenient loader for detection output of unknown quality.
    ///
    /// A missing or non-array field becomes an empty list and elements that
    /// don't deserialize are skipped, so partial evidence still validates.
    pub fn from_value(value: &Value) -> Self {
        Self {
            text_regions: lenient_list(value, &["textRegions", "text_regions"]),
            symbols: lenient_list(value, &["symbols"]),
        }
    }
}

fn lenient_list<T: DeserializeOwned>(value: &Value, keys: &[&str]) -> Vec<T> {
    let Some(items) = keys
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// One OCR text region
///
/// `lines` and `words` are kept as raw JSON because OCR backends disagree on
/// their shape (string, token array, array of line objects).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextRegion {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub lines: Option<Value>,
    #[serde(default)]
    pub words: Option<Value>,
    #[serde(default)]
    pub xmin: f64,
    #[serde(default)]
    pub ymin: f64,
    #[serde(default)]
    pub xmax: f64,
    #[serde(default)]
    pub ymax: f64,
}

impl TextRegion {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// One symbol-detection hit
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SymbolDetection {
    #[serde(rename = "class", default)]
    pub class_name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub xmin: f64,
    #[serde(default)]
    pub ymin: f64,
    #[serde(default)]
    pub xmax: f64,
    #[serde(default)]
    pub ymax: f64,
}

impl SymbolDetection {
    pub fn new(class_name: impl Into<String>, confidence: f64) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
            ..Self::default()
        }
    }
}

/// Category ratios and the weighted overall score
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceScore {
    pub text_ratio: f64,
    pub symbol_ratio: f64,
    pub layout_ratio: f64,
    pub overall: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TermValidation {
    pub term: String,
    pub required: bool,
    pub found: bool,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SymbolValidation {
    pub symbol: String,
    pub required: bool,
    pub found: bool,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutValidation {
    pub rule: String,
    pub description: String,
    pub valid: bool,
}

/// Final report handed to the presentation layer
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_compliant: bool,
    pub compliance_message: String,
    pub term_validations: Vec<TermValidation>,
    pub symbol_validations: Vec<SymbolValidation>,
    pub layout_validations: Vec<LayoutValidation>,
    pub score: ComplianceScore,
}
