use std::io;
use thiserror::Error;

/// Core error type for chunktrace.
#[derive(Error, Debug)]
pub enum ChunkTraceError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("git error: {message}")]
    Git { message: String },

    #[error("malformed diff line: {reason}")]
    Input { reason: String },

    #[error("broken chain: no accepted chunk reference starts at '{boundary}'")]
    BrokenChain { boundary: String },
}

impl ChunkTraceError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn git(message: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    pub fn input(reason: impl Into<String>) -> Self {
        Self::Input {
            reason: reason.into(),
        }
    }

    pub fn broken_chain(boundary: impl Into<String>) -> Self {
        Self::BrokenChain {
            boundary: boundary.into(),
        }
    }

    /// Returns true if this error is caused by user input (vs internal/system).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. } | Self::Validation { .. } | Self::Input { .. }
        )
    }

    /// Returns true if retrying the operation might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// The process exit code this error should map to.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BrokenChain { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChunkTraceError>;
