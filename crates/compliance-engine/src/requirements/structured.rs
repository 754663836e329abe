//! Requirement trees already grouped into text, symbol and layout nodes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{RequirementKind, RequirementSet};

/// Property names that carry the expected wording of a text node
const PHRASE_PROPERTY_HINTS: &[&str] = &["text", "phrase", "wording", "content", "statement"];

/// Grouped requirement tree as delivered by the requirements backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRequirements {
    #[serde(default, alias = "text_requirement")]
    pub text_requirement: Vec<RequirementNode>,
    #[serde(default, alias = "symbol_requirement")]
    pub symbol_requirement: Vec<RequirementNode>,
    #[serde(default, alias = "layout_requirement")]
    pub layout_requirement: Vec<RequirementNode>,
}

/// One named requirement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementNode {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<NodeProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeProperty {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RequirementNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Wording the packaging must show, when a property spells it out.
    ///
    /// A property named like "text" or "phrase" wins; otherwise the first
    /// property with a non-empty description is used.
    pub fn expected_phrase(&self) -> Option<&str> {
        let described = || {
            self.properties
                .iter()
                .filter(|property| !property.description.trim().is_empty())
        };

        described()
            .find(|property| {
                let name = property.name.to_lowercase();
                PHRASE_PROPERTY_HINTS.iter().any(|hint| name.contains(hint))
            })
            .or_else(|| described().next())
            .map(|property| property.description.trim())
    }
}

impl StructuredRequirements {
    /// Lenient reader: a group that isn't a list is treated as empty and a
    /// node that doesn't deserialize is dropped.
    pub fn from_value(value: &Value) -> Self {
        Self {
            text_requirement: lenient_group(value, "textRequirement", "text_requirement"),
            symbol_requirement: lenient_group(value, "symbolRequirement", "symbol_requirement"),
            layout_requirement: lenient_group(value, "layoutRequirement", "layout_requirement"),
        }
    }

    /// True if the object carries any of the known group keys
    pub fn looks_structured(value: &Value) -> bool {
        [
            "textRequirement",
            "symbolRequirement",
            "layoutRequirement",
            "text_requirement",
            "symbol_requirement",
            "layout_requirement",
        ]
        .iter()
        .any(|key| value.get(*key).is_some())
    }
}

fn lenient_group(value: &Value, key: &str, alias: &str) -> Vec<RequirementNode> {
    let Some(group) = value.get(key).or_else(|| value.get(alias)) else {
        return Vec::new();
    };
    let Some(nodes) = group.as_array() else {
        warn!(group = key, "Requirement group is not a list, treating as empty");
        return Vec::new();
    };

    nodes
        .iter()
        .filter_map(|node| match serde_json::from_value(node.clone()) {
            Ok(node) => Some(node),
            Err(e) => {
                warn!(group = key, error = %e, "Dropping malformed requirement node");
                None
            }
        })
        .collect()
}

/// Flatten the tree into a requirement set.
///
/// Nodes without a usable target are skipped: an unnamed text node still
/// counts when a property spells out its wording.
pub fn build_from_tree(tree: &StructuredRequirements) -> RequirementSet {
    let mut set = RequirementSet::default();

    for node in &tree.text_requirement {
        let target = node.expected_phrase().unwrap_or(node.name.trim());
        if target.is_empty() {
            warn!(group = "textRequirement", "Skipping unnamed requirement node");
            continue;
        }
        let description = match label(node) {
            name if name.is_empty() => target.to_string(),
            name => name,
        };
        set.push(
            RequirementKind::Text,
            description,
            target.to_string(),
            node.required.unwrap_or(true),
            Vec::new(),
        );
    }

    for node in named_nodes(&tree.symbol_requirement, "symbolRequirement") {
        set.push(
            RequirementKind::Symbol,
            node_description(node),
            label(node),
            node.required.unwrap_or(true),
            node.synonyms.clone(),
        );
    }

    for node in named_nodes(&tree.layout_requirement, "layoutRequirement") {
        set.push(
            RequirementKind::Layout,
            node_description(node),
            label(node),
            node.required.unwrap_or(true),
            Vec::new(),
        );
    }

    set
}

fn named_nodes<'a>(
    nodes: &'a [RequirementNode],
    group: &'static str,
) -> impl Iterator<Item = &'a RequirementNode> {
    nodes.iter().filter(move |node| {
        let named = !node.name.trim().is_empty();
        if !named {
            warn!(group, "Skipping unnamed requirement node");
        }
        named
    })
}

fn label(node: &RequirementNode) -> String {
    node.name.trim().to_string()
}

/// Trimmed description, or the node name when it has none
fn node_description(node: &RequirementNode) -> String {
    node.description
        .as_deref()
        .map(str::trim)
        .filter(|description| !description.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| label(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_phrase_property_becomes_match_target() {
        let tree = StructuredRequirements::from_value(&json!({
            "textRequirement": [{
                "name": "Small parts warning",
                "properties": [
                    {"name": "placement", "description": "front panel"},
                    {"name": "required_text", "description": "CHOKING HAZARD -- Small parts"}
                ]
            }]
        }));

        let set = build_from_tree(&tree);
        assert_eq!(set.required_texts.len(), 1);
        let requirement = &set.required_texts[0];
        assert_eq!(requirement.id, "text_1");
        assert_eq!(requirement.description, "Small parts warning");
        assert_eq!(requirement.match_target, "CHOKING HAZARD -- Small parts");
        assert!(requirement.required);
    }

    #[test]
    fn test_first_described_property_is_the_fallback_phrase() {
        let node = RequirementNode {
            name: "Origin".to_string(),
            properties: vec![
                NodeProperty {
                    name: "a".to_string(),
                    description: " ".to_string(),
                },
                NodeProperty {
                    name: "b".to_string(),
                    description: "Made in".to_string(),
                },
            ],
            ..RequirementNode::default()
        };
        assert_eq!(node.expected_phrase(), Some("Made in"));
    }

    #[test]
    fn test_node_name_used_without_properties() {
        let tree = StructuredRequirements {
            text_requirement: vec![RequirementNode::named("Keep away from fire")],
            symbol_requirement: vec![RequirementNode::named("ce_mark")],
            layout_requirement: vec![],
        };

        let set = build_from_tree(&tree);
        assert_eq!(set.required_texts[0].match_target, "Keep away from fire");
        assert_eq!(set.required_symbols[0].id, "symbol_1");
        assert_eq!(set.required_symbols[0].match_target, "ce_mark");
        assert_eq!(set.required_symbols[0].description, "ce_mark");
    }

    #[test]
    fn test_optional_nodes_and_synonyms() {
        let tree = StructuredRequirements::from_value(&json!({
            "symbolRequirement": [
                {"name": "ukca", "required": false, "synonyms": ["ukca mark", "uk conformity"]}
            ],
            "layoutRequirement": [
                {"name": "warning_on_front", "description": "Warning printed on the front face"}
            ]
        }));

        let set = build_from_tree(&tree);
        let symbol = &set.required_symbols[0];
        assert!(!symbol.required);
        assert_eq!(symbol.synonyms, vec!["ukca mark", "uk conformity"]);
        assert_eq!(set.layout_requirements[0].id, "layout_1");
        assert_eq!(
            set.layout_requirements[0].description,
            "Warning printed on the front face"
        );
    }

    #[test]
    fn test_unnamed_nodes_are_skipped() {
        let tree = StructuredRequirements::from_value(&json!({
            "textRequirement": [
                {"name": "  "},
                {"properties": [{"name": "text", "description": "Made in"}]}
            ],
            "symbolRequirement": [{"name": "ce_mark"}, {}, {"name": ""}],
            "layoutRequirement": [{"description": "Warning on front"}]
        }));

        let set = build_from_tree(&tree);
        assert_eq!(set.len(), 2);
        assert_eq!(set.required_texts[0].match_target, "Made in");
        assert_eq!(set.required_texts[0].description, "Made in");
        assert_eq!(set.required_symbols.len(), 1);
        assert_eq!(set.required_symbols[0].match_target, "ce_mark");
        assert!(set.layout_requirements.is_empty());
    }

    #[test]
    fn test_blank_descriptions_fall_back_to_name() {
        let tree = StructuredRequirements::from_value(&json!({
            "symbolRequirement": [{"name": "ce_mark", "description": "  CE marking "}],
            "layoutRequirement": [
                {"name": "warning_on_front", "description": ""},
                {"name": "barcode_on_back", "description": "  Barcode on the back  "}
            ]
        }));

        let set = build_from_tree(&tree);
        assert_eq!(set.required_symbols[0].description, "CE marking");
        assert_eq!(set.layout_requirements[0].description, "warning_on_front");
        assert_eq!(set.layout_requirements[1].description, "Barcode on the back");
    }

    #[test]
    fn test_malformed_groups_degrade_to_empty() {
        let tree = StructuredRequirements::from_value(&json!({
            "textRequirement": "oops",
            "symbolRequirement": [{"name": "ce"}, 17, {"name": ["not", "a", "string"]}]
        }));
        assert!(tree.text_requirement.is_empty());
        assert_eq!(tree.symbol_requirement, vec![RequirementNode::named("ce")]);
    }

    #[test]
    fn test_looks_structured() {
        assert!(StructuredRequirements::looks_structured(
            &json!({"symbolRequirement": []})
        ));
        assert!(!StructuredRequirements::looks_structured(&json!({"rows": []})));
        assert!(!StructuredRequirements::looks_structured(&json!([1, 2])));
    }
}
