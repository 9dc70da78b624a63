use async_trait::async_trait;
use futures::future::BoxFuture;
use ragline_core::{Result, Tool};
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// A [`Tool`] backed by an async closure or function.
///
/// ```rust
/// use ragline_core::Tool;
/// use ragline_tool::FunctionTool;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
/// use serde_json::{Value, json};
///
/// #[derive(Deserialize, JsonSchema)]
/// struct EchoArgs {
///     /// Text to send back
///     text: String,
/// }
///
/// async fn echo(args: Value) -> ragline_core::Result<Value> {
///     let args: EchoArgs = serde_json::from_value(args)?;
///     Ok(json!({ "echo": args.text }))
/// }
///
/// let tool = FunctionTool::new("echo", "Repeat the given text", echo)
///     .with_parameters_schema::<EchoArgs>();
/// assert_eq!(tool.declaration().parameters["required"], json!(["text"]));
/// ```
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    handler: Handler,
    parameters_schema: Option<Value>,
}

impl FunctionTool {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            handler: Arc::new(move |args| Box::pin(handler(args))),
            parameters_schema: None,
        }
    }

    /// Advertise the JSON schema of `T` as this tool's arguments.
    pub fn with_parameters_schema<T: JsonSchema>(mut self) -> Self {
        self.parameters_schema = Some(schema_of::<T>());
        self
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Option<Value> {
        self.parameters_schema.clone()
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        (self.handler)(args).await
    }
}

/// Generate an inlined JSON schema for `T`, without the metadata keys local
/// model servers reject.
pub fn schema_of<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator();
    let mut schema =
        serde_json::to_value(generator.into_root_schema_for::<T>()).unwrap_or(Value::Null);
    sanitize_schema(&mut schema);
    schema
}

fn sanitize_schema(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("definitions");
            map.remove("title");
            map.values_mut().for_each(sanitize_schema);
        }
        Value::Array(items) => items.iter_mut().for_each(sanitize_schema),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct WeatherArgs {
        /// City name, e.g. 'Venice'
        city: String,
    }

    #[test]
    fn schema_is_inlined_and_stripped() {
        let schema = schema_of::<WeatherArgs>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["city"]));
        assert_eq!(schema["properties"]["city"]["type"], "string");
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
    }

    #[tokio::test]
    async fn closure_handlers_work() {
        let tool = FunctionTool::new("double", "Double a number", |args: Value| async move {
            let n = args["n"].as_i64().unwrap_or(0);
            Ok(json!(n * 2))
        });
        assert_eq!(tool.execute(json!({"n": 21})).await.unwrap(), json!(42));
        assert!(tool.parameters_schema().is_none());
        assert_eq!(tool.declaration().parameters, json!({"type": "object", "properties": {}}));
    }
}
