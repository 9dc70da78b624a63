//! # ragline-tool
//!
//! Tools a generation model can call.
//!
//! - [`FunctionTool`] wraps an async function with a `schemars`-generated
//!   argument schema.
//! - [`ToolRegistry`] is the closed set of tools offered to a model.
//!   [`ToolRegistry::dispatch_all`] runs the model's [`ToolRequest`]s in order,
//!   skipping names it does not know instead of failing.
//! - [`builtins`] has the `get_weather` and `multiply` demo tools.

pub mod builtins;
pub mod error;
pub mod function_tool;
pub mod registry;

pub use builtins::{multiply_tool, weather_tool};
pub use error::{Result, ToolError};
pub use function_tool::{FunctionTool, schema_of};
pub use registry::{ToolOutcome, ToolRegistry, ToolRequest};
