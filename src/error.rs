/// Error types that can occur during model operations
///
/// # Variants
///
/// - `NotFitted` - Indicates that the model has not been fitted yet
/// - `InputValidationError` - indicates the input data provided does not meet the expected format, type, or validation rules
/// - `InvalidConfiguration` - indicates the model was constructed with an unsupported feature type or hyperparameter
/// - `InternalInconsistency` - indicates the fitted tree disagrees with the declared feature types, which is a logic defect
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    NotFitted,
    InputValidationError(String),
    InvalidConfiguration(String),
    InternalInconsistency(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::NotFitted => {
                write!(
                    f,
                    "Model has not been fitted. Certain methods require the model to be fitted before use."
                )
            }
            ModelError::InputValidationError(msg) => write!(f, "Input validation error: {}", msg),
            ModelError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            ModelError::InternalInconsistency(msg) => {
                write!(f, "Internal inconsistency: {}", msg)
            }
        }
    }
}

/// Implements the standard error trait for ModelError
impl std::error::Error for ModelError {}
