use std::fmt;

use thiserror::Error;

/// Whether an issue blocks building the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        })
    }
}

/// One finding about a model document, located by JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: &'static str,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn error(
        code: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::with_severity(IssueSeverity::Error, code, path.into(), message.into())
    }

    pub fn warning(
        code: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::with_severity(IssueSeverity::Warning, code, path.into(), message.into())
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn with_severity(
        severity: IssueSeverity,
        code: &'static str,
        path: String,
        message: String,
    ) -> Self {
        Self {
            severity,
            code,
            path,
            message,
            hint: None,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<7} {} at {}: {}",
            self.severity, self.code, self.path, self.message
        )?;
        match &self.hint {
            Some(hint) => write!(f, " ({hint})"),
            None => Ok(()),
        }
    }
}

/// Errors and warnings collected over one document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when nothing blocks building the model.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// True when any error or warning carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.errors
            .iter()
            .chain(&self.warnings)
            .any(|issue| issue.code == code)
    }
}

/// Model loading and building errors.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("invalid model: {} error(s), first: {}", .0.errors.len(), first_error(.0))]
    Invalid(ValidationReport),
}

fn first_error(report: &ValidationReport) -> String {
    report
        .errors
        .first()
        .map(|issue| issue.to_string())
        .unwrap_or_default()
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
