#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot transition {entity} from '{from}' to '{to}'")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },

    /// Structurally invalid input from the record-management layer
    /// (wrong JSON type for a summed field, unknown enum label, non-object record).
    #[error("Contract violation: {0}")]
    ContractViolation(String),
}
