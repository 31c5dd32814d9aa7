//! Client error types.

use thiserror::Error;

/// Failure categories carried by [`FlowError`].
///
/// Callers branch on the kind, never on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong lifecycle state, or not yet authenticated.
    InvalidStatus,
    /// Authenticated, but the specific capability is missing.
    PermissionError,
    /// The store had no matching data.
    RuntimeError,
    /// The facility is unsupported by design.
    NotImplemented,
}

/// Errors delivered through asynchronous operation callbacks.
///
/// Every request/response operation resolves with either its payload or
/// exactly one of these; nothing fails synchronously.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Operation issued in the wrong lifecycle state, or before
    /// authentication.
    #[error("invalid status: {reason}")]
    InvalidStatus {
        /// Description of the status violation.
        reason: String,
    },

    /// The granted permission lacks the required capability.
    #[error("permission error: {reason}")]
    Permission {
        /// Description of the missing capability.
        reason: String,
    },

    /// The store had no data matching the request.
    #[error("runtime error: {reason}")]
    Runtime {
        /// Description of the failure.
        reason: String,
    },

    /// The requested facility is unsupported by design.
    #[error("not implemented: {reason}")]
    NotImplemented {
        /// Description of the unsupported facility.
        reason: String,
    },
}

impl FlowError {
    /// Build an [`ErrorKind::InvalidStatus`] error.
    pub fn invalid_status(reason: impl Into<String>) -> Self {
        Self::InvalidStatus { reason: reason.into() }
    }

    /// Build an [`ErrorKind::PermissionError`] error.
    pub fn permission(reason: impl Into<String>) -> Self {
        Self::Permission { reason: reason.into() }
    }

    /// Build an [`ErrorKind::RuntimeError`] error.
    pub fn runtime(reason: impl Into<String>) -> Self {
        Self::Runtime { reason: reason.into() }
    }

    /// Build an [`ErrorKind::NotImplemented`] error.
    pub fn not_implemented(reason: impl Into<String>) -> Self {
        Self::NotImplemented { reason: reason.into() }
    }

    /// The failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidStatus { .. } => ErrorKind::InvalidStatus,
            Self::Permission { .. } => ErrorKind::PermissionError,
            Self::Runtime { .. } => ErrorKind::RuntimeError,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
        }
    }

    /// The human-readable reason. Diagnostic only.
    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidStatus { reason }
            | Self::Permission { reason }
            | Self::Runtime { reason }
            | Self::NotImplemented { reason } => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(FlowError::invalid_status("x").kind(), ErrorKind::InvalidStatus);
        assert_eq!(FlowError::permission("x").kind(), ErrorKind::PermissionError);
        assert_eq!(FlowError::runtime("x").kind(), ErrorKind::RuntimeError);
        assert_eq!(FlowError::not_implemented("x").kind(), ErrorKind::NotImplemented);
    }

    #[test]
    fn error_display() {
        let err = FlowError::runtime("No tick list");
        assert_eq!(err.to_string(), "runtime error: No tick list");
    }
}
