//! Tool trait — deterministic functions the model may ask for.
//!
//! The model requests a tool by answering with a JSON object carrying a
//! reserved `"tool"` field. The [`ToolRegistry`] maps that name to an
//! implementation and always hands back a string, so a failing tool is fed
//! back into the conversation instead of escaping to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use crate::error::ToolError;
use crate::parsed::{ARGS_FIELD, ParsedResult, TOOL_FIELD};

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments keyed by parameter name
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ToolCall {
    /// Extract a tool call from a parsed model answer.
    ///
    /// Only objects with a string `"tool"` field qualify. A missing or
    /// non-object `"args"` field yields empty arguments.
    pub fn from_parsed(parsed: &ParsedResult) -> Option<Self> {
        let map = parsed.as_object()?;
        let name = map.get(TOOL_FIELD)?.as_str()?.to_string();
        let args = match map.get(ARGS_FIELD) {
            Some(Value::Object(args)) => args.clone(),
            _ => Map::new(),
        };
        Some(Self { name, args })
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Human-readable outcome, fed back to the model
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name the model uses (e.g., "calculate_bmi").
    fn name(&self) -> &str;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: &Map<String, Value>) -> std::result::Result<ToolResult, ToolError>;
}

/// A fixed registry of available tools.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Execute a tool call, surfacing typed errors.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.execute(&call.args).await
    }

    /// Execute a tool call and flatten every outcome into a string.
    ///
    /// Unknown tools and argument failures become descriptive text; nothing
    /// propagates past this boundary.
    pub async fn dispatch(&self, call: &ToolCall) -> String {
        match self.execute(call).await {
            Ok(result) => {
                debug!(tool = %call.name, success = result.success, "Tool dispatched");
                result.output
            }
            Err(ToolError::NotFound(name)) => {
                warn!(tool = %name, "Model requested an unknown tool");
                format!("Unknown tool: {name}")
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                format!("Tool error: {e}")
            }
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        async fn execute(&self, args: &Map<String, Value>) -> std::result::Result<ToolResult, ToolError> {
            let text = args
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidArguments("missing 'text'".into()))?;
            Ok(ToolResult::ok(text))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            name: name.into(),
            args: args.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = registry();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[test]
    fn tool_call_from_parsed() {
        let parsed = ParsedResult::from_value(json!({
            "tool": "calculate_bmi",
            "args": {"weight_kg": 70, "height_m": 1.75}
        }));
        let call = ToolCall::from_parsed(&parsed).unwrap();
        assert_eq!(call.name, "calculate_bmi");
        assert_eq!(call.args["weight_kg"], 70);
    }

    #[test]
    fn tool_call_without_args_gets_empty_map() {
        let parsed = ParsedResult::from_value(json!({"tool": "echo", "args": "oops"}));
        let call = ToolCall::from_parsed(&parsed).unwrap();
        assert!(call.args.is_empty());
        assert!(ToolCall::from_parsed(&ParsedResult::from_value(json!({"response": "x"}))).is_none());
        assert!(ToolCall::from_parsed(&ParsedResult::Absent).is_none());
    }

    #[tokio::test]
    async fn dispatch_returns_output() {
        let out = registry().dispatch(&call("echo", json!({"text": "hello world"}))).await;
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_is_a_string() {
        let out = registry().dispatch(&call("nonexistent", json!({}))).await;
        assert_eq!(out, "Unknown tool: nonexistent");
    }

    #[tokio::test]
    async fn dispatch_argument_failure_is_a_string() {
        let out = registry().dispatch(&call("echo", json!({}))).await;
        assert!(out.starts_with("Tool error:"), "{out}");
        assert!(out.contains("missing 'text'"));
    }

    #[tokio::test]
    async fn execute_missing_tool_is_typed() {
        let err = ToolRegistry::new().execute(&call("nope", json!({}))).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
