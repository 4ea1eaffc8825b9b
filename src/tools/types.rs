//! Declarative tool specs: name, description and typed parameter list.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Integer,
    Boolean,
}

/// One named parameter of a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
    pub required: bool,
}

/// Schema the backend uses to decide which tool to invoke and how.
///
/// Built once and never mutated after registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
}

impl ToolSpec {
    /// Start a spec with no parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a string parameter.
    pub fn string(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.param(name, ParameterKind::String, description, required)
    }

    /// Add a number parameter.
    pub fn number(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.param(name, ParameterKind::Number, description, required)
    }

    /// Add an integer parameter.
    pub fn integer(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.param(name, ParameterKind::Integer, description, required)
    }

    /// Add a boolean parameter.
    pub fn boolean(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.param(name, ParameterKind::Boolean, description, required)
    }

    fn param(
        mut self,
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.parameters.push(ToolParameter {
            name: name.into(),
            kind,
            description: description.into(),
            required,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[ToolParameter] {
        &self.parameters
    }

    /// Names of required parameters, in declaration order.
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Render the parameter list as a JSON Schema object.
    pub fn json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.kind.to_string(),
                    "description": param.description,
                }),
            );
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }
}
