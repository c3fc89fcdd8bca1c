//! Tool declarations for OpenAI function calling.
//!
//! Tools here are declared to the model and intercepted by the caller: the
//! client never runs them. A [`ToolSpec`] ties a tool name and description to
//! a typed argument struct whose schema is generated by `schemars`.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use openai_client::ToolSpec;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct SearchArgs {
//!     query: String,
//! }
//!
//! struct WebSearch;
//!
//! impl ToolSpec for WebSearch {
//!     const NAME: &'static str = "web_search";
//!     type Args = SearchArgs;
//!
//!     fn description(&self) -> &str {
//!         "Search the web for information"
//!     }
//! }
//! ```

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A function-like tool the model may propose to call.
pub trait ToolSpec: Send + Sync {
    /// The unique name of this tool.
    const NAME: &'static str;

    /// The argument type for this tool (must derive `Deserialize` and `JsonSchema`).
    type Args: DeserializeOwned + JsonSchema;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// Generate the tool definition for this tool.
    ///
    /// Unlike structured outputs, tool parameters keep optional fields
    /// optional so the model may omit them.
    fn definition(&self) -> ToolDefinition {
        let mut parameters = serde_json::to_value(schema_for!(Self::Args)).unwrap_or_default();
        if let serde_json::Value::Object(map) = &mut parameters {
            map.remove("$schema");
            map.remove("title");
        }
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: self.description().to_string(),
            parameters,
        }
    }
}

/// OpenAI tool definition format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// The name of the tool.
    pub name: String,

    /// A description of what the tool does.
    pub description: String,

    /// JSON schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Convert to OpenAI API format.
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters
            }
        })
    }
}

/// A complete tool call from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// The ID of this tool call.
    pub id: String,

    /// The name of the tool to call.
    pub name: String,

    /// The arguments as a JSON string.
    pub arguments: String,
}

impl ToolCall {
    /// Parse a tool call from OpenAI's response format.
    pub fn from_openai_value(value: &serde_json::Value) -> Option<Self> {
        let function = value.get("function")?;
        let arguments = match function.get("arguments")? {
            serde_json::Value::String(s) => s.clone(),
            // Some OpenAI-compatible servers (Ollama) send arguments as an object.
            other => other.to_string(),
        };
        Some(Self {
            id: value
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            name: function.get("name")?.as_str()?.to_string(),
            arguments,
        })
    }

    /// Parse arguments into a typed struct.
    pub fn parse_args<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }

    /// Whether this call targets the given tool.
    pub fn is<T: ToolSpec>(&self) -> bool {
        self.name == T::NAME
    }
}

/// A tool call fragment inside a streamed delta.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamToolCall {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub tool_type: Option<String>,
    #[serde(default)]
    pub function: Option<StreamFunctionCall>,
}

/// Function part of a streamed tool call fragment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamFunctionCall {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "arguments_as_string")]
    pub arguments: Option<String>,
}

fn arguments_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct LookupArgs {
        /// Identifier to look up
        query: String,
        limit: Option<u32>,
    }

    struct Lookup;

    impl ToolSpec for Lookup {
        const NAME: &'static str = "lookup";
        type Args = LookupArgs;

        fn description(&self) -> &str {
            "Look something up"
        }
    }

    #[test]
    fn test_tool_definition() {
        let def = Lookup.definition();

        assert_eq!(def.name, "lookup");
        assert_eq!(def.description, "Look something up");
        assert_eq!(def.parameters["type"], "object");
        assert!(def.parameters.get("$schema").is_none());

        let required = def.parameters["required"].as_array().unwrap();
        assert_eq!(required.len(), 1, "optional fields stay optional for tools");
        assert_eq!(required[0], "query");
    }

    #[test]
    fn test_tool_definition_openai_format() {
        let openai_format = Lookup.definition().to_openai_format();

        assert_eq!(openai_format["type"], "function");
        assert_eq!(openai_format["function"]["name"], "lookup");
    }

    #[test]
    fn test_tool_call_parsing() {
        let value = serde_json::json!({
            "id": "call_123",
            "function": {
                "name": "lookup",
                "arguments": "{\"query\": \"vpn\"}"
            }
        });

        let call = ToolCall::from_openai_value(&value).unwrap();
        assert_eq!(call.id, "call_123");
        assert!(call.is::<Lookup>());

        let args: LookupArgs = call.parse_args().unwrap();
        assert_eq!(args.query, "vpn");
        assert_eq!(args.limit, None);
    }

    #[test]
    fn test_tool_call_with_object_arguments() {
        let value = serde_json::json!({
            "function": {
                "name": "lookup",
                "arguments": {"query": "wifi", "limit": 2}
            }
        });

        let call = ToolCall::from_openai_value(&value).unwrap();
        assert_eq!(call.id, "");
        let args: LookupArgs = call.parse_args().unwrap();
        assert_eq!(args.limit, Some(2));
    }
}
