use thiserror::Error;

/// Error type shared by every service binary in the workspace.
///
/// Domain crates keep their own error enums and convert into `AppError` at
/// the edge where a caller needs one uniform failure shape.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    /// Stable, low-cardinality label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::InternalError(_) => "internal",
            AppError::BadGateway(_) => "bad_gateway",
            AppError::ServiceUnavailable => "service_unavailable",
            AppError::ConfigError(_) => "configuration",
        }
    }

    /// Whether a caller may retry the operation that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::BadGateway(_) | AppError::ServiceUnavailable
        )
    }

    /// Process exit code used by command-line entry points.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => 2,
            AppError::NotFound(_) => 3,
            AppError::ConfigError(_) => 4,
            AppError::BadGateway(_) | AppError::ServiceUnavailable => 5,
            AppError::InternalError(_) => 1,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            AppError::ServiceUnavailable
        } else {
            AppError::BadGateway(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_only_for_upstream_failures() {
        assert!(AppError::BadGateway("catalog returned 502".to_string()).is_retryable());
        assert!(AppError::ServiceUnavailable.is_retryable());
        assert!(!AppError::BadRequest(anyhow::anyhow!("window start after end")).is_retryable());
        assert!(!AppError::ValidationError("missing price".to_string()).is_retryable());
    }

    #[test]
    fn test_exit_codes_distinguish_kinds() {
        assert_eq!(AppError::ValidationError("x".into()).exit_code(), 2);
        assert_eq!(AppError::NotFound(anyhow::anyhow!("x")).exit_code(), 3);
        assert_eq!(AppError::ConfigError(anyhow::anyhow!("x")).exit_code(), 4);
        assert_eq!(AppError::ServiceUnavailable.exit_code(), 5);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(AppError::BadGateway("x".into()).kind(), "bad_gateway");
        assert_eq!(
            AppError::InternalError(anyhow::anyhow!("boom")).kind(),
            "internal"
        );
    }
}
