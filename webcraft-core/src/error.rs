//! Error handling for the WebCraft system

use thiserror::Error;

/// Result type alias for WebCraft operations
pub type Result<T> = std::result::Result<T, WebcraftError>;

/// Main error type for the WebCraft system
#[derive(Error, Debug)]
pub enum WebcraftError {
    /// The embedded document realm refused read or write access
    #[error("Access denied: {reason}. {remediation}")]
    AccessDenied { reason: String, remediation: String },

    /// Bad user input (file type, file size, empty required field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation is not valid for the selected element
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Upstream generation call failed or returned unusable content
    #[error("Generation error: {0}")]
    Generation(String),

    /// Download or serialization failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WebcraftError {
    /// Create a new access-denied error
    pub fn access_denied<R: Into<String>, M: Into<String>>(reason: R, remediation: M) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
            remediation: remediation.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new invalid-target error
    pub fn invalid_target<S: Into<String>>(msg: S) -> Self {
        Self::InvalidTarget(msg.into())
    }

    /// Create a new generation error
    pub fn generation<S: Into<String>>(msg: S) -> Self {
        Self::Generation(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Access denial needs a configuration change before a retry can succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            WebcraftError::AccessDenied { .. } => false,
            WebcraftError::Validation(_) => true,
            WebcraftError::InvalidTarget(_) => true,
            WebcraftError::Generation(_) => true,
            WebcraftError::Persistence(_) => true,
            WebcraftError::Config(_) => false,
            WebcraftError::Io(_) => true,
            WebcraftError::Json(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            WebcraftError::AccessDenied { .. } => ErrorSeverity::High,
            WebcraftError::Validation(_) => ErrorSeverity::Low,
            WebcraftError::InvalidTarget(_) => ErrorSeverity::Low,
            WebcraftError::Generation(_) => ErrorSeverity::Medium,
            WebcraftError::Persistence(_) => ErrorSeverity::Medium,
            WebcraftError::Config(_) => ErrorSeverity::High,
            WebcraftError::Io(_) => ErrorSeverity::Medium,
            WebcraftError::Json(_) => ErrorSeverity::Low,
        }
    }

    /// How the failure should be surfaced to the user
    pub fn notice_style(&self) -> NoticeStyle {
        match self {
            WebcraftError::AccessDenied { .. }
            | WebcraftError::Generation(_)
            | WebcraftError::Config(_) => NoticeStyle::Blocking,
            _ => NoticeStyle::Inline,
        }
    }

    /// Build the user-facing notice for this error
    pub fn to_notice(&self) -> Notice {
        Notice {
            style: self.notice_style(),
            message: self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Blocking notices interrupt the user; inline ones are transient confirmations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStyle {
    Blocking,
    Inline,
}

/// A message for the host UI to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub style: NoticeStyle,
    pub message: String,
}

impl Notice {
    pub fn inline<S: Into<String>>(message: S) -> Self {
        Self {
            style: NoticeStyle::Inline,
            message: message.into(),
        }
    }

    pub fn blocking<S: Into<String>>(message: S) -> Self {
        Self {
            style: NoticeStyle::Blocking,
            message: message.into(),
        }
    }
}
