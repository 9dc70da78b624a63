use crate::error::{Result, ToolError};
use indexmap::IndexMap;
use ragline_core::{Content, Part, Tool, ToolDeclaration};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{Instrument, debug, info_span, warn};

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Call id assigned by the model client, echoed back in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolRequest {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self { id: None, name: name.into(), args }
    }

    /// Extract every tool call carried by a model message, in order.
    pub fn from_content(content: &Content) -> Vec<Self> {
        content
            .function_calls()
            .map(|(name, args, id)| Self {
                id: id.map(str::to_string),
                name: name.to_string(),
                args: args.clone(),
            })
            .collect()
    }
}

/// What happened to one [`ToolRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Completed { request: ToolRequest, response: Value },
    /// The tool is not registered; nothing was invoked.
    Skipped { request: ToolRequest, reason: String },
    Failed { request: ToolRequest, error: String },
}

impl ToolOutcome {
    pub fn request(&self) -> &ToolRequest {
        match self {
            ToolOutcome::Completed { request, .. }
            | ToolOutcome::Skipped { request, .. }
            | ToolOutcome::Failed { request, .. } => request,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ToolOutcome::Completed { .. })
    }

    /// The function response to send back to the model.
    ///
    /// Failures are reported to the model as `{"error": ..}`; skipped calls
    /// produce no response.
    pub fn response_part(&self) -> Option<Part> {
        let (request, response) = match self {
            ToolOutcome::Completed { request, response } => (request, response.clone()),
            ToolOutcome::Failed { request, error } => (request, json!({ "error": error })),
            ToolOutcome::Skipped { .. } => return None,
        };
        Some(Part::FunctionResponse {
            name: request.name.clone(),
            response,
            id: request.id.clone(),
        })
    }
}

/// The statically known set of tools a model may call, keyed by name.
///
/// Registration order is kept, so declarations are advertised to the model in
/// the order the tools were added.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any earlier tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools.get(name).cloned().ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn tools(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.values().map(|t| t.declaration()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run one request against its registered tool.
    pub async fn dispatch(&self, request: &ToolRequest) -> Result<Value> {
        let tool = self.resolve(&request.name)?;
        tool.execute(request.args.clone()).await.map_err(|e| ToolError::Execution {
            tool: request.name.clone(),
            message: e.to_string(),
        })
    }

    /// Run every request in order, one at a time.
    ///
    /// An unknown tool is skipped with a warning and a failing tool is
    /// recorded; neither stops the remaining requests.
    pub async fn dispatch_all(&self, requests: Vec<ToolRequest>) -> Vec<ToolOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let span = info_span!("tool.call", tool = %request.name, call_id = ?request.id);
            let outcome = match self.dispatch(&request).instrument(span).await {
                Ok(response) => {
                    debug!(tool = %request.name, "tool call completed");
                    ToolOutcome::Completed { request, response }
                }
                Err(err @ ToolError::UnknownTool(_)) => {
                    warn!(tool = %request.name, "skipping irrelevant or unknown tool");
                    ToolOutcome::Skipped { request, reason: err.to_string() }
                }
                Err(err) => {
                    warn!(tool = %request.name, error = %err, "tool call failed");
                    ToolOutcome::Failed { request, error: err.to_string() }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
