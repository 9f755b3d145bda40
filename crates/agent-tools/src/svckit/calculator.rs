//! Calculator Tool

use agent_core::{Arguments, ParameterSchema, Tool, ToolSpec};
use async_trait::async_trait;

use super::string_arg;
use crate::expr;

/// Evaluates arithmetic expressions with [`expr::evaluate`]
#[derive(Clone, Debug, Default)]
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("calculate", "Evaluate a mathematical expression").param(
            ParameterSchema::required(
                "expression",
                "string",
                "Arithmetic using + - * / ^ and parentheses, e.g. '(2 + 3) * 4'",
            ),
        )
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let expression = string_arg(arguments, "expression")?;
        let value = expr::evaluate(&expression)?;
        Ok(format!("Result: {}", expr::format_number(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_calculate() {
        let args = json!({"expression": "2 + 2 * 3"}).as_object().cloned().unwrap();
        assert_eq!(CalculatorTool.invoke(&args).await.unwrap(), "Result: 8");
    }

    #[tokio::test]
    async fn test_bad_expression_is_an_error() {
        let args = json!({"expression": "2 +"}).as_object().cloned().unwrap();
        let err = CalculatorTool.invoke(&args).await.unwrap_err();
        assert!(err.to_string().starts_with("Error calculating expression"));
    }
}
