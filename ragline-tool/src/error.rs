use ragline_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// The model asked for a tool that is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

pub type Result<T> = std::result::Result<T, ToolError>;

impl From<ToolError> for CoreError {
    fn from(err: ToolError) -> Self {
        CoreError::Tool(err.to_string())
    }
}
