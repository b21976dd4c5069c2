//! Typed error handling for the portal core
//!
//! Errors fall into three user-visible categories plus the plumbing around
//! them:
//!
//! - [`FetchError`]: loading a collection failed
//! - [`MutationError`]: create/update/delete/process failed
//! - [`ValidationError`]: local input or command validation failed
//! - [`ConfigError`]: configuration could not be loaded
//!
//! Transport problems are described by [`BackendError`]. Every
//! [`ConsoleError`] maps to at most one [`Notice`], the user-facing message
//! that never includes raw backend payloads.
//!
//! # Example
//!
//! ```rust,ignore
//! match view.refresh().await {
//!     Err(ConsoleError::Fetch(e)) => println!("{}", e.resource),
//!     Err(ConsoleError::Cancelled) => {}
//!     Err(e) => eprintln!("{}", e.error_code()),
//!     Ok(()) => {}
//! }
//! ```

use serde::Serialize;
use std::fmt;

/// The main error type of the portal core
#[derive(Debug)]
pub enum ConsoleError {
    /// Loading a collection (or a dashboard) failed
    Fetch(FetchError),

    /// A mutation was rejected or could not be sent
    Mutation(MutationError),

    /// Local validation failed; nothing reached the network
    Validation(ValidationError),

    /// Configuration errors
    Config(ConfigError),

    /// Login was rejected by the backend
    LoginFailed(BackendError),

    /// An operation required a session and none is active
    Unauthenticated,

    /// The owning view was torn down before the operation completed
    Cancelled,

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Fetch(e) => write!(f, "{}", e),
            ConsoleError::Mutation(e) => write!(f, "{}", e),
            ConsoleError::Validation(e) => write!(f, "{}", e),
            ConsoleError::Config(e) => write!(f, "{}", e),
            ConsoleError::LoginFailed(e) => write!(f, "Login failed: {}", e),
            ConsoleError::Unauthenticated => write!(f, "No active session"),
            ConsoleError::Cancelled => write!(f, "Operation cancelled"),
            ConsoleError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Fetch(e) => Some(e),
            ConsoleError::Mutation(e) => Some(e),
            ConsoleError::Validation(e) => Some(e),
            ConsoleError::Config(e) => Some(e),
            ConsoleError::LoginFailed(e) => Some(e),
            ConsoleError::Unauthenticated | ConsoleError::Cancelled | ConsoleError::Internal(_) => {
                None
            }
        }
    }
}

impl ConsoleError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Fetch(_) => "FETCH_FAILED",
            ConsoleError::Mutation(e) => e.kind.error_code(),
            ConsoleError::Validation(e) => e.error_code(),
            ConsoleError::Config(_) => "CONFIG_ERROR",
            ConsoleError::LoginFailed(_) => "LOGIN_FAILED",
            ConsoleError::Unauthenticated => "UNAUTHENTICATED",
            ConsoleError::Cancelled => "CANCELLED",
            ConsoleError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// User-facing notification for this error.
    ///
    /// Cancellation is silent: a torn-down view has nobody to notify.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            ConsoleError::Fetch(e) => Some(Notice::error(
                format!("Failed to load {}", e.resource),
                "Please check your connection and try again.",
            )),
            ConsoleError::Mutation(e) => Some(Notice::error(
                e.kind.describe_failure(e.resource),
                "The change was not saved. Please try again.",
            )),
            ConsoleError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(Notice::warning(
                    "Please correct the highlighted fields",
                    errors
                        .iter()
                        .map(|e| e.message.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                ))
            }
            ConsoleError::Validation(e) => Some(Notice::warning("Invalid request", e.to_string())),
            ConsoleError::Config(e) => Some(Notice::error("Configuration error", e.to_string())),
            ConsoleError::LoginFailed(_) => Some(Notice::error(
                "Login failed",
                "Invalid username or password.",
            )),
            ConsoleError::Unauthenticated => Some(Notice::warning(
                "Session expired",
                "Please log in to continue.",
            )),
            ConsoleError::Cancelled => None,
            ConsoleError::Internal(_) => Some(Notice::error(
                "Something went wrong",
                "Please try again.",
            )),
        }
    }
}

// =============================================================================
// Notices
// =============================================================================

/// Severity of a [`Notice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Backend Errors
// =============================================================================

/// Errors raised by a backend implementation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Whether the backend answered 401/403
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, BackendError::Status { status: 401 | 403, .. })
    }
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// A failed collection load
#[derive(Debug)]
pub struct FetchError {
    /// Plural resource name, e.g. "drivers" or "dashboard data"
    pub resource: &'static str,
    pub source: BackendError,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to load {}: {}", self.resource, self.source)
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<FetchError> for ConsoleError {
    fn from(err: FetchError) -> Self {
        ConsoleError::Fetch(err)
    }
}

// =============================================================================
// Mutation Errors
// =============================================================================

/// Kind of mutation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    UpdateStatus,
    UpdateRating,
    Delete,
    Process,
    Book,
    CalculateFare,
}

impl MutationKind {
    /// Notice title, e.g. "Failed to update driver status"
    pub fn describe_failure(self, resource: &str) -> String {
        match self {
            MutationKind::Create => format!("Failed to create {}", resource),
            MutationKind::Update => format!("Failed to update {}", resource),
            MutationKind::UpdateStatus => format!("Failed to update {} status", resource),
            MutationKind::UpdateRating => format!("Failed to rate {}", resource),
            MutationKind::Delete => format!("Failed to delete {}", resource),
            MutationKind::Process => format!("Failed to process {}", resource),
            MutationKind::Book => format!("Failed to book {}", resource),
            MutationKind::CalculateFare => "Failed to calculate fare".to_string(),
        }
    }

    pub fn error_code(self) -> &'static str {
        match self {
            MutationKind::Create => "CREATE_FAILED",
            MutationKind::Update => "UPDATE_FAILED",
            MutationKind::UpdateStatus => "STATUS_UPDATE_FAILED",
            MutationKind::UpdateRating => "RATING_FAILED",
            MutationKind::Delete => "DELETE_FAILED",
            MutationKind::Process => "PROCESS_FAILED",
            MutationKind::Book => "BOOKING_FAILED",
            MutationKind::CalculateFare => "FARE_CALCULATION_FAILED",
        }
    }
}

/// A failed mutation
#[derive(Debug)]
pub struct MutationError {
    /// Singular resource name, e.g. "driver"
    pub resource: &'static str,
    pub kind: MutationKind,
    pub source: BackendError,
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.kind.describe_failure(self.resource),
            self.source
        )
    }
}

impl std::error::Error for MutationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<MutationError> for ConsoleError {
    fn from(err: MutationError) -> Self {
        ConsoleError::Mutation(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// One or more form fields failed their rules
    FieldErrors(Vec<FieldError>),

    /// Sort key not declared by the entity kind
    UnknownSortKey { key: String, allowed: Vec<String> },

    /// The operation needs a persisted entity
    MissingId { entity: &'static str },

    /// Input could not be converted to or from JSON
    InvalidJson { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::UnknownSortKey { key, allowed } => {
                write!(
                    f,
                    "Unknown sort key '{}' (expected one of: {})",
                    key,
                    allowed.join(", ")
                )
            }
            ValidationError::MissingId { entity } => {
                write!(f, "{} has no id yet", entity)
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::FieldErrors(_) => "VALIDATION_ERROR",
            ValidationError::UnknownSortKey { .. } => "UNKNOWN_SORT_KEY",
            ValidationError::MissingId { .. } => "MISSING_ID",
            ValidationError::InvalidJson { .. } => "INVALID_JSON",
        }
    }

    /// Errors reported for one field
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        match self {
            ValidationError::FieldErrors(errors) => errors
                .iter()
                .filter(|e| e.field == field)
                .map(|e| e.message.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl From<ValidationError> for ConsoleError {
    fn from(err: ValidationError) -> Self {
        ConsoleError::Validation(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    FileNotFound { path: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ConsoleError {
    fn from(err: ConfigError) -> Self {
        ConsoleError::Config(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::InvalidJson {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

/// A specialized Result type for portal operations
pub type ConsoleResult<T> = Result<T, ConsoleError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> BackendError {
        BackendError::Unavailable("connection refused".to_string())
    }

    #[test]
    fn test_fetch_notice_names_resource_without_payload() {
        let err: ConsoleError = FetchError {
            resource: "drivers",
            source: BackendError::Status {
                status: 500,
                message: "{\"trace\":\"NullPointerException\"}".to_string(),
            },
        }
        .into();

        let notice = err.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Failed to load drivers");
        assert!(!notice.message.contains("NullPointerException"));
        assert_eq!(err.error_code(), "FETCH_FAILED");
    }

    #[test]
    fn test_mutation_notice_titles() {
        let err: ConsoleError = MutationError {
            resource: "driver",
            kind: MutationKind::UpdateStatus,
            source: unavailable(),
        }
        .into();
        assert_eq!(err.notice().unwrap().title, "Failed to update driver status");
        assert_eq!(err.error_code(), "STATUS_UPDATE_FAILED");

        assert_eq!(
            MutationKind::Process.describe_failure("payment"),
            "Failed to process payment"
        );
        assert_eq!(
            MutationKind::CalculateFare.describe_failure("ride"),
            "Failed to calculate fare"
        );
    }

    #[test]
    fn test_cancelled_is_silent() {
        assert!(ConsoleError::Cancelled.notice().is_none());
    }

    #[test]
    fn test_validation_error_multiple_fields() {
        let err = ValidationError::FieldErrors(vec![
            FieldError::new("name", "Name is required"),
            FieldError::new("email", "Email must be a valid email address"),
        ]);
        let display = err.to_string();
        assert!(display.contains("name"));
        assert!(display.contains("email"));
        assert_eq!(err.messages_for("email"), vec!["Email must be a valid email address"]);

        let notice = ConsoleError::from(err).notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("Name is required"));
    }

    #[test]
    fn test_unknown_sort_key_lists_allowed() {
        let err = ValidationError::UnknownSortKey {
            key: "shoeSize".to_string(),
            allowed: vec!["name".to_string(), "rating".to_string()],
        };
        assert!(err.to_string().contains("name, rating"));
        assert_eq!(err.error_code(), "UNKNOWN_SORT_KEY");
    }

    #[test]
    fn test_auth_rejection() {
        assert!(BackendError::Status {
            status: 401,
            message: String::new()
        }
        .is_auth_rejection());
        assert!(!unavailable().is_auth_rejection());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ValidationError = json_err.into();
        assert!(matches!(err, ValidationError::InvalidJson { .. }));
    }
}
