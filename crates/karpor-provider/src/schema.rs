//! Schema declarations for the provider, its resource and data source

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute value types for schema definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Bool,
}

/// Plan-time behaviour attached to an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    /// A change destroys and recreates the resource
    RequiresReplace,
    /// Keep the prior state value while the new one is unknown
    UseStateForUnknown,
}

/// Schema for a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub attr_type: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<PlanModifier>,
}

impl Attribute {
    fn new(attr_type: AttributeType, description: &str) -> Self {
        Self {
            attr_type,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: description.to_string(),
            plan_modifiers: Vec::new(),
        }
    }

    pub fn required_string(description: &str) -> Self {
        Self { required: true, ..Self::new(AttributeType::String, description) }
    }

    pub fn optional_string(description: &str) -> Self {
        Self { optional: true, ..Self::new(AttributeType::String, description) }
    }

    pub fn computed_string(description: &str) -> Self {
        Self { computed: true, ..Self::new(AttributeType::String, description) }
    }

    pub fn optional_bool(description: &str) -> Self {
        Self { optional: true, ..Self::new(AttributeType::Bool, description) }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    pub fn requires_replace(&self) -> bool {
        self.plan_modifiers.contains(&PlanModifier::RequiresReplace)
    }
}

/// Schema definition for a provider, resource or data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Attributes whose change forces replacement, in name order
    pub fn replace_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.requires_replace())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn sensitive_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.sensitive)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Provider schema information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSchema {
    /// Provider configuration schema
    pub provider: Schema,

    /// Resource schemas by type name
    pub resources: BTreeMap<String, Schema>,

    /// Data source schemas by type name
    pub data_sources: BTreeMap<String, Schema>,
}

impl ProviderSchema {
    pub fn resource_schema(&self, type_name: &str) -> Option<&Schema> {
        self.resources.get(type_name)
    }

    pub fn data_source_schema(&self, type_name: &str) -> Option<&Schema> {
        self.data_sources.get(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_builders() {
        let attr = Attribute::required_string("name");
        assert!(attr.required && !attr.optional && !attr.computed);

        let attr = Attribute::optional_string("creds").sensitive();
        assert!(attr.optional && attr.sensitive);

        let attr = Attribute::optional_bool("flag");
        assert_eq!(attr.attr_type, AttributeType::Bool);
    }

    #[test]
    fn test_replace_and_sensitive_attributes() {
        let schema = Schema::new("test")
            .with_attribute(
                "name",
                Attribute::required_string("n").with_plan_modifier(PlanModifier::RequiresReplace),
            )
            .with_attribute(
                "secret",
                Attribute::optional_string("s")
                    .sensitive()
                    .with_plan_modifier(PlanModifier::RequiresReplace),
            )
            .with_attribute("label", Attribute::optional_string("l"));

        assert_eq!(schema.replace_attributes(), vec!["name", "secret"]);
        assert_eq!(schema.sensitive_attributes(), vec!["secret"]);
        assert!(schema.attribute("label").is_some());
        assert!(schema.attribute("missing").is_none());
    }

    #[test]
    fn test_schema_json_shape() {
        let schema = Schema::new("s").with_attribute(
            "id",
            Attribute::computed_string("Unique identifier")
                .with_plan_modifier(PlanModifier::UseStateForUnknown),
        );
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["attributes"]["id"]["computed"], true);
        assert_eq!(value["attributes"]["id"]["plan_modifiers"][0], "use_state_for_unknown");
    }
}
