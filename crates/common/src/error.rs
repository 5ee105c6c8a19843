//! Error types shared across otmlt crates.

/// Top-level error type for otmlt operations.
#[derive(Debug, thiserror::Error)]
pub enum OtmltError {
    #[error("Passed item must be Timeline, Track or Clip. Not {kind}")]
    InvalidRoot { kind: String },

    #[error("{message}")]
    UnsupportedConfiguration { message: String },

    #[error("Sorry, {format} doesn't support {function}.")]
    UnsupportedOperation { format: String, function: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("XML error: {message}")]
    Xml { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using OtmltError.
pub type OtmltResult<T> = Result<T, OtmltError>;

impl OtmltError {
    pub fn invalid_root(kind: impl Into<String>) -> Self {
        Self::InvalidRoot { kind: kind.into() }
    }

    pub fn unsupported_configuration(msg: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration {
            message: msg.into(),
        }
    }

    pub fn unsupported_operation(format: impl Into<String>, function: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            format: format.into(),
            function: function.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn xml(msg: impl Into<String>) -> Self {
        Self::Xml {
            message: msg.into(),
        }
    }

    /// Whether this error is the fixed "function not supported by this
    /// format" signal.
    pub fn is_unsupported_operation(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }
}
