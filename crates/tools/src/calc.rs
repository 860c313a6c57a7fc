//! Calc tool — binary arithmetic.

use async_trait::async_trait;
use ferrochat_core::error::ToolError;
use ferrochat_core::tool::Tool;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CalcOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Deserialize)]
struct CalcInput {
    a: f64,
    b: f64,
    op: CalcOp,
}

/// Apply a binary arithmetic operation to two numbers.
pub struct CalcTool;

#[async_trait]
impl Tool for CalcTool {
    fn name(&self) -> &str {
        "calc"
    }

    fn description(&self) -> &str {
        "Apply an arithmetic operation (add, sub, mul, div) to two numbers and return the result."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": "First operand" },
                "b": { "type": "number", "description": "Second operand" },
                "op": {
                    "type": "string",
                    "enum": ["add", "sub", "mul", "div"],
                    "description": "Operation to apply"
                }
            },
            "required": ["a", "b", "op"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let input: CalcInput = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let result = match input.op {
            CalcOp::Add => input.a + input.b,
            CalcOp::Sub => input.a - input.b,
            CalcOp::Mul => input.a * input.b,
            CalcOp::Div => {
                if input.b == 0.0 {
                    return Err(ToolError::ExecutionFailed {
                        tool_name: "calc".into(),
                        reason: "division by zero".into(),
                    });
                }
                input.a / input.b
            }
        };

        // Render whole numbers without a trailing ".0"
        if result.fract() == 0.0 && result.abs() < 1e15 {
            Ok(format!("{}", result as i64))
        } else {
            Ok(format!("{result}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn adds_two_numbers() {
        let result = CalcTool
            .execute(serde_json::json!({"a": 2, "b": 2, "op": "add"}))
            .await
            .unwrap();
        assert_eq!(result, "4");
    }

    #[tokio::test]
    async fn divides_with_fraction() {
        let result = CalcTool
            .execute(serde_json::json!({"a": 1, "b": 2, "op": "div"}))
            .await
            .unwrap();
        assert_eq!(result, "0.5");
    }

    #[tokio::test]
    async fn division_by_zero_fails() {
        let err = CalcTool
            .execute(serde_json::json!({"a": 1, "b": 0, "op": "div"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn unknown_op_is_invalid_arguments() {
        let err = CalcTool
            .execute(serde_json::json!({"a": 1, "b": 2, "op": "pow"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
