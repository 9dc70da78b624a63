//! Demo tools used by the tool-calling agent and its tests.

use crate::function_tool::FunctionTool;
use ragline_core::{CoreError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WeatherArgs {
    /// City to report on, e.g. 'Venice'
    pub city: String,
}

/// An operand that may arrive as a JSON number or as a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Text(String),
}

impl Operand {
    /// Integer value of the operand; fractions are truncated toward zero.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Operand::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            Operand::Number(_) => None,
            Operand::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>().ok().filter(|n| n.is_finite()).map(|n| n.trunc() as i64)
                })
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MultiplyArgs {
    pub a: Operand,
    pub b: Operand,
}

async fn get_weather(args: Value) -> Result<Value> {
    let args: WeatherArgs = serde_json::from_value(args)
        .map_err(|e| CoreError::Tool(format!("Invalid arguments: {e}")))?;

    Ok(json!({
        "city": args.city,
        "temperature": 25,
        "unit": "Celsius",
        "description": "The weather is sunny with a few clouds."
    }))
}

async fn multiply(args: Value) -> Result<Value> {
    let args: MultiplyArgs = serde_json::from_value(args)
        .map_err(|e| CoreError::Tool(format!("Invalid arguments: {e}")))?;

    let operand = |op: &Operand| {
        op.to_integer().ok_or_else(|| CoreError::Tool(format!("Not an integer: {op:?}")))
    };
    let (a, b) = (operand(&args.a)?, operand(&args.b)?);
    let product =
        a.checked_mul(b).ok_or_else(|| CoreError::Tool(format!("{a} * {b} overflows")))?;
    Ok(json!(product))
}

/// Dummy weather lookup that always reports 25 degrees and light clouds.
pub fn weather_tool() -> FunctionTool {
    FunctionTool::new(
        "get_weather",
        "Retrieve real time the current temperature in Celsius for a specified city for weather \
         forecast. Call this tool only if the user question is related to weather and contains \
         a city.",
        get_weather,
    )
    .with_parameters_schema::<WeatherArgs>()
}

pub fn multiply_tool() -> FunctionTool {
    FunctionTool::new(
        "multiply",
        "Multiply two numbers and return the result for mathematical operations",
        multiply,
    )
    .with_parameters_schema::<MultiplyArgs>()
}
