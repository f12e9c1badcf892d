//! Trust evaluation contract.
//!
//! The cryptographic machinery that inspects a release's signatures lives
//! outside this crate. The pipeline only depends on the
//! [`TrustEvaluator`] trait, injected per call, so tests can script trust
//! outcomes and deployments can swap verification backends.
//!
//! # Failure Semantics
//!
//! An evaluator failure with category
//! [`ErrorCategory::NotSupported`](crate::error::ErrorCategory::NotSupported)
//! means "no signature infrastructure is available for this release"; the
//! pipeline logs it and continues with empty trust flags. Every other
//! failure aborts the pipeline and propagates unmodified.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorCategory;
use crate::metadata::Release;

bitflags! {
    /// What has been verified about a release.
    ///
    /// Empty means nothing has been verified, which is the state of every
    /// task before trust evaluation runs.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TrustFlags: u32 {
        /// The firmware payload is cryptographically verified.
        const PAYLOAD = 1 << 0;
        /// The release metadata is cryptographically verified.
        const METADATA = 1 << 1;
    }
}

/// Error reported by a trust evaluator.
///
/// Carries the same category taxonomy as the pipeline errors so that
/// fatal evaluator failures propagate to callers unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TrustError {
    category: ErrorCategory,
    message: String,
}

impl TrustError {
    /// Creates an error with an explicit category.
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// Creates the non-fatal "no signature infrastructure available"
    /// error.
    #[must_use]
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotSupported, message)
    }

    /// The error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the pipeline should treat this failure as
    /// non-fatal.
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        self.category == ErrorCategory::NotSupported
    }
}

/// Inspects a release and reports what can be trusted about it.
pub trait TrustEvaluator {
    /// Evaluates the release, returning the trust flags to adopt.
    ///
    /// # Errors
    ///
    /// Returns a [`TrustError`] with category `NotSupported` when no
    /// signature infrastructure exists for this release, or any other
    /// category for a hard verification failure.
    fn evaluate(&self, release: &Release<'_>) -> Result<TrustFlags, TrustError>;
}

/// Evaluator for deployments without any verification backend.
///
/// Always reports `NotSupported`, which the pipeline downgrades to a
/// warning, leaving trust flags empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableTrustEvaluator;

impl TrustEvaluator for UnavailableTrustEvaluator {
    fn evaluate(&self, _release: &Release<'_>) -> Result<TrustFlags, TrustError> {
        Err(TrustError::not_supported(
            "no verification backends configured",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MemoryNode, Release};

    #[test]
    fn default_flags_are_empty() {
        assert!(TrustFlags::default().is_empty());
    }

    #[test]
    fn not_supported_constructor_sets_category() {
        let err = TrustError::not_supported("no keyring");
        assert!(err.is_not_supported());
        assert_eq!(err.category(), ErrorCategory::NotSupported);
        assert_eq!(err.message(), "no keyring");
        assert_eq!(err.to_string(), "no keyring");
    }

    #[test]
    fn other_categories_are_fatal() {
        let err = TrustError::new(ErrorCategory::InvalidFile, "truncated signature");
        assert!(!err.is_not_supported());
    }

    #[test]
    fn unavailable_evaluator_reports_not_supported() {
        let node = MemoryNode::new("release");
        let release = Release::new(&node);
        let err = UnavailableTrustEvaluator.evaluate(&release).unwrap_err();
        assert!(err.is_not_supported());
    }
}
