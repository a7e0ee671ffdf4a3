//! Math node operators

/// Operator carried by a MATH node
#[derive(Debug, Clone, PartialEq)]
pub enum MathOp {
    Multiply,
    Add,
    Subtract,
    Divide,
    /// Tag that names no known operator; always evaluates to 0
    Unrecognized(String),
}

impl MathOp {
    /// Parses an operator tag such as `"Multiply"`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Multiply" => MathOp::Multiply,
            "Add" => MathOp::Add,
            "Subtract" => MathOp::Subtract,
            "Divide" => MathOp::Divide,
            other => MathOp::Unrecognized(other.to_string()),
        }
    }

    /// Display name of the operator
    pub fn tag(&self) -> &str {
        match self {
            MathOp::Multiply => "Multiply",
            MathOp::Add => "Add",
            MathOp::Subtract => "Subtract",
            MathOp::Divide => "Divide",
            MathOp::Unrecognized(tag) => tag,
        }
    }

    /// Applies the operator. Division by zero and unknown operators give 0.
    pub fn apply(&self, a: f32, b: f32) -> f32 {
        match self {
            MathOp::Multiply => a * b,
            MathOp::Add => a + b,
            MathOp::Subtract => a - b,
            MathOp::Divide => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            MathOp::Unrecognized(_) => 0.0,
        }
    }
}
