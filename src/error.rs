// ⚠️ Error types for the reconciliation core and the bundle collaborator
//
// Only STRUCTURAL problems are errors. Field-level coercion never fails a
// record (it falls back to defaults), and the auditor reports instead of
// raising.

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Canonical set or incoming batch is not a collection of entity records
    #[error("input shape error: expected {expected}, found {found}")]
    InputShape { expected: String, found: String },

    #[error("data block marker not found: {marker:?}")]
    MarkerNotFound { marker: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconcileError {
    pub fn input_shape(expected: &str, found: &serde_json::Value) -> Self {
        ReconcileError::InputShape {
            expected: expected.to_string(),
            found: json_kind(found).to_string(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
