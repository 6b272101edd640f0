use thiserror::Error;

#[derive(Debug, Error)]
pub enum RebalanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },
}

impl RebalanceError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RebalanceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
