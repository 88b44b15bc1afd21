//! Shared error taxonomy.
//!
//! DESIGN
//! ======
//! Every module owns its own `thiserror` enum. They all project onto the
//! small `ErrorKind` taxonomy so route handlers and UI-facing stores can
//! branch on one machine-readable value instead of provider-specific shapes.

use serde::Serialize;

/// Machine-readable failure category shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSession,
    NetworkFailure,
    InvalidCredentials,
    RateLimited,
    NotFound,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidSession => "invalid_session",
            Self::NetworkFailure => "network",
            Self::InvalidCredentials => "invalid_credentials",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::Unknown => "unknown",
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grepable error code plus taxonomy kind for structured error responses.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn kind(&self) -> ErrorKind {
        ErrorKind::Unknown
    }
}
