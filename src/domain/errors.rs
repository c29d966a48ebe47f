use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error("storage failed: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl DomainError {
    /// Short stable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::MissingInput(_) => "missing_input",
            DomainError::PayloadTooLarge(_) => "payload_too_large",
            DomainError::Decode(_) => "decode",
            DomainError::Inference(_) => "inference",
            DomainError::Encode(_) => "encode",
            DomainError::Storage(_) => "storage",
            DomainError::NotFound(_) => "not_found",
            DomainError::InvalidInput(_) => "invalid_input",
            DomainError::OperationFailed(_) => "operation_failed",
        }
    }

    /// Errors the caller caused, as opposed to failures while processing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DomainError::MissingInput(_) | DomainError::PayloadTooLarge(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
