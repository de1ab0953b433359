//! Error taxonomy for pricing calculations.
//!
//! Validation problems are collected as itemized [`ValidationIssue`]s so that
//! several missing fields can be reported at once. Warning-severity issues are
//! logged and never turned into a failure.

use serde::Serialize;
use service_core::error::AppError;
use std::fmt;
use thiserror::Error;

/// Severity of a single validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One itemized validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulated validation issues for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationIssues(Vec<ValidationIssue>);

impl ValidationIssues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.0.push(issue);
    }

    pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationIssue::error(field, message));
    }

    pub fn warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationIssue::warning(field, message));
    }

    pub fn extend(&mut self, other: ValidationIssues) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Log warnings and fail with every error-severity issue, if any.
    pub fn into_result(self, entity: &str, entity_id: &str) -> Result<(), PricingError> {
        for issue in self.warnings() {
            tracing::warn!(
                entity = %entity,
                entity_id = %entity_id,
                field = %issue.field,
                "{}",
                issue.message
            );
        }

        if !self.has_errors() {
            return Ok(());
        }

        let errors = self
            .0
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        Err(PricingError::Validation(ValidationIssues(errors)))
    }
}

impl From<ValidationIssue> for ValidationIssues {
    fn from(issue: ValidationIssue) -> Self {
        Self(vec![issue])
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Failure of a pricing or billing-cycle computation.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Caller-supplied input is structurally invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Catalog or product data failed a required-field or consistency check.
    #[error("Validation failed: {0}")]
    Validation(ValidationIssues),

    /// The catalog encodes a shape or alteration kind the engine cannot interpret.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An external fetch failed. Callers decide whether to retry.
    #[error("{service} service unavailable: {message}")]
    DependencyUnavailable { service: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl PricingError {
    /// Single error-severity validation issue.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PricingError::Validation(ValidationIssue::error(field, message).into())
    }

    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        PricingError::DependencyUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PricingError::BadRequest(_) => "bad_request",
            PricingError::Validation(_) => "validation",
            PricingError::Configuration(_) => "configuration",
            PricingError::DependencyUnavailable { .. } => "dependency_unavailable",
            PricingError::NotFound(_) => "not_found",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, PricingError::DependencyUnavailable { .. })
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::BadRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            PricingError::Validation(issues) => AppError::ValidationError(issues.to_string()),
            PricingError::Configuration(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            PricingError::DependencyUnavailable { service, message } => {
                AppError::BadGateway(format!("{}: {}", service, message))
            }
            PricingError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_keeps_only_errors() {
        let mut issues = ValidationIssues::new();
        issues.warning("price.unit", "currency missing, defaulting to EUR");
        issues.error("lifecycleStatus", "lifecycle status is required");
        issues.error("price.value", "price value is required");

        let err = issues.into_result("price_plan", "pop-1").unwrap_err();
        match err {
            PricingError::Validation(issues) => {
                assert_eq!(issues.len(), 2);
                assert!(issues.iter().all(|i| i.severity == Severity::Error));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_warnings_alone_pass() {
        let mut issues = ValidationIssues::new();
        issues.warning("characteristics", "usage record has no characteristics");
        assert!(issues.into_result("usage_record", "u-1").is_ok());
    }

    #[test]
    fn test_display_joins_issues() {
        let mut issues = ValidationIssues::new();
        issues.error("id", "product id is required");
        issues.error("startDate", "product start date is required");
        assert_eq!(
            issues.to_string(),
            "id: product id is required; startDate: product start date is required"
        );
    }

    #[test]
    fn test_only_dependency_failures_are_retryable() {
        assert!(PricingError::unavailable("catalog", "503").is_retryable());
        assert!(!PricingError::Configuration("empty bundle".into()).is_retryable());
        assert!(!PricingError::validation("price", "missing").is_retryable());
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = PricingError::unavailable("usage", "connection refused").into();
        assert!(matches!(app, AppError::BadGateway(_)));
        let app: AppError = PricingError::Configuration("unknown unit".into()).into();
        assert!(matches!(app, AppError::ConfigError(_)));
        let app: AppError = PricingError::validation("price", "missing").into();
        assert!(matches!(app, AppError::ValidationError(_)));
    }
}
