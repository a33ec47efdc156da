// crates/sponsormatch-core/src/error.rs
// ============================================================================
// Module: SponsorMatch Error Taxonomy
// Description: The unified error kinds the core distinguishes at its service
//   boundary.
// Purpose: Give every collaborator a single error type to translate into,
//   and give callers a stable kind tag for the error envelope.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Adapter boundaries (embedding provider, vector index, analytics store)
//! translate their own failures into [`MatchError`] before they reach the
//! match service. No control flow in this crate depends on downcasting a
//! foreign error type.

use std::fmt;

use thiserror::Error;

/// The error kinds the core must distinguish, per the error handling design.
///
/// # Invariants
/// - Validation errors (`InvalidInput`) are reported locally and never reach
///   the pipeline's dependency calls.
/// - `Internal` is reserved for invariant violations that are never expected
///   in a correctly wired deployment.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The request failed local validation before any dependency was called.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The embedding provider, vector index, or analytics store transport failed.
    #[error("dependency unavailable: {0}")]
    UnavailableDependency(String),

    /// The request's deadline elapsed before a response could be assembled.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// A lookup (explain, single-creative get) found no matching record.
    #[error("not found: {0}")]
    NotFound(String),

    /// An administrative operation was attempted without sufficient scope.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// An invariant the core relies on was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MatchError {
    /// Returns the short kind tag surfaced in the error envelope.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::UnavailableDependency(_) => ErrorKind::UnavailableDependency,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Stable, serializable tag naming a [`MatchError`] variant without its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`MatchError::InvalidInput`].
    InvalidInput,
    /// See [`MatchError::UnavailableDependency`].
    UnavailableDependency,
    /// See [`MatchError::Timeout`].
    Timeout,
    /// See [`MatchError::NotFound`].
    NotFound,
    /// See [`MatchError::PermissionDenied`].
    PermissionDenied,
    /// See [`MatchError::Internal`].
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidInput => "invalid_input",
            Self::UnavailableDependency => "unavailable_dependency",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Internal => "internal",
        };
        f.write_str(label)
    }
}
