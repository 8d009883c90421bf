use thiserror::Error;

/// Errors that can occur while validating, encoding or running an LSTM model.
#[derive(Debug, Error)]
pub enum LstmSegError {
    /// A weight tensor does not have the shape implied by the model topology.
    #[error("dimension mismatch for {tensor}: expected {expected:?}, but got {actual:?}")]
    DimensionMismatch {
        /// Tensor name (`mat1`..`mat9`).
        tensor: String,
        /// Shape required by the topology.
        expected: Vec<usize>,
        /// Shape found in the input.
        actual: Vec<usize>,
    },

    /// A tensor has too few dimensions to read a topology parameter from it.
    #[error("tensor {tensor} must have {expected_rank} dimension(s), but got {actual:?}")]
    RankMismatch {
        tensor: String,
        expected_rank: usize,
        actual: Vec<usize>,
    },

    /// The flat data of a tensor does not fill its declared shape.
    #[error("tensor {tensor} declares {expected} values, but holds {actual}")]
    TensorDataLength {
        tensor: String,
        expected: usize,
        actual: usize,
    },

    /// A declared shape or its element count does not fit in `usize`.
    #[error("shape of tensor {tensor} overflows: {reason}")]
    ShapeOverflow { tensor: String, reason: String },

    /// The model name carries neither `_codepoints_` nor `_graphclust_`.
    #[error("unknown model type in {model_name:?}: need to be either 'codepoints' or 'graphclust'")]
    UnknownModelType {
        /// The offending model name.
        model_name: String,
    },

    /// A dictionary value is not equal to the position of its entry.
    #[error("incorrect value for dictionary entry {key:?}: {actual_value}, expecting {expected_index}")]
    DictionaryIndexMismatch {
        key: String,
        expected_index: usize,
        actual_value: i64,
    },

    /// A grapheme cluster appears twice in the dictionary.
    #[error("duplicate dictionary entry {key:?}")]
    DuplicateDictionaryEntry { key: String },

    /// The caller broke a documented precondition (breakpoint alignment, id range, ...).
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A resource bundle could not be read back.
    #[error("malformed resource bundle at line {line}: {reason}")]
    MalformedBundle { line: usize, reason: String },

    /// The JSON weight dump is not well formed.
    #[error("failed to parse weight dump: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading or writing a model failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LstmSegError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        LstmSegError::MalformedBundle {
            line,
            reason: reason.into(),
        }
    }
}

/// Result type alias for lstmseg operations.
pub type Result<T> = std::result::Result<T, LstmSegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = LstmSegError::DimensionMismatch {
            tensor: "mat8".into(),
            expected: vec![4, 4],
            actual: vec![3, 4],
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch for mat8: expected [4, 4], but got [3, 4]"
        );

        let err = LstmSegError::UnknownModelType {
            model_name: "Thai_model".into(),
        };
        assert!(err.to_string().contains("Thai_model"));

        let err = LstmSegError::DictionaryIndexMismatch {
            key: "ก".into(),
            expected_index: 3,
            actual_value: 7,
        };
        assert!(err.to_string().contains("expecting 3"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LstmSegError>();
    }
}
