//! The tool abstraction a model can call into.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::model::ToolDeclaration;

/// A named function exposed to a generation model.
///
/// Implementations receive the model-supplied JSON arguments and return a
/// JSON result that is sent back to the model as a function response.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object, if the tool takes any.
    fn parameters_schema(&self) -> Option<Value> {
        None
    }

    async fn execute(&self, args: Value) -> Result<Value>;

    /// The declaration advertised to the model.
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self
                .parameters_schema()
                .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
        }
    }
}
