//! Common error infrastructure for stellar-core.
//!
//! Domain-specific errors (`JsonError`, `RegistryError`, `ActionError`, ...)
//! live next to the code that raises them. This module provides the shared
//! severity classification they all report through [`GameError`].

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same input may succeed later (e.g. after a resync)
/// - **Validation**: well-formed input that the current state rejects
/// - **Internal**: the registry and its callers disagree; investigate
/// - **Fatal**: the operation cannot continue without corrupting state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// Recoverable error - may succeed on retry.
    ///
    /// Examples: integrity check failed, peer should retransmit
    Recoverable,

    /// Validation error - input rejected by the current state.
    ///
    /// Examples: insufficient resources, unknown target player
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: applying an action that passed validation failed
    Internal,

    /// Fatal error - registry invariant violated.
    ///
    /// Examples: double registration of an ID, deregistering a missing ID
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all stellar-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Error codes are stable SCREAMING_SNAKE identifiers for logs and tests
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
