//! Tool capabilities and the dispatch registry.
//!
//! Tools don't think — they execute. Each capability accepts a structured
//! JSON input and produces a [`ToolExecutionResult`]; failure is signalled
//! only through the result's `error` field, never by raising. The registry
//! routes model-issued tool requests by name; an unknown name is a local
//! error result the model can read and self-correct from.

pub mod computer;
pub mod edit;
pub mod shell;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// Outcome of one capability invocation.
///
/// At most one of `output`/`error` is authoritative. `system`, if set, is an
/// out-of-band annotation the translator prepends to the authoritative text.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionResult {
    pub output: Option<String>,
    pub error: Option<String>,
    pub base64_image: Option<String>,
    pub system: Option<String>,
}

impl ToolExecutionResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Default::default()
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A named capability invocable by the model.
///
/// A capability that touches a shared resource (one virtual display, one
/// shell) serializes access to it internally; the registry imposes no
/// mutual exclusion of its own.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model addresses this tool by.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Declaration entry for the request's tool list.
    fn spec(&self) -> Value;

    /// Run one invocation. Never raises; errors ride in the result.
    async fn invoke(&self, input: Value) -> ToolExecutionResult;
}

/// Fixed registry of capabilities, read-only after construction.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard computer-use set: screen/input control, shell, editor.
    pub fn computer_use() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(computer::ComputerTool::new()));
        registry.register(Arc::new(shell::BashTool::new()));
        registry.register(Arc::new(edit::EditTool::new()));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Route a tool request by name.
    pub async fn execute(&self, name: &str, input: Value) -> ToolExecutionResult {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => {
                tracing::debug!(tool = name, "dispatching tool invocation");
                tool.invoke(input).await
            }
            None => ToolExecutionResult::err(format!("unknown tool: {name}")),
        }
    }

    /// Tool declarations in registration order, so the request body stays
    /// byte-stable across calls.
    pub fn specs(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
