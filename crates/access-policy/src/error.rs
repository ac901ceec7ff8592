//! # Error Types
//!
//! `PolicyError` covers failures while building, parsing or identifying a
//! policy. `ValidationError` carries user-facing messages for incomplete rule
//! input; it is returned before compilation and never raised by the compiler.

use access_core::{CanonicalizationError, CoreError};
use thiserror::Error;

/// Errors from policy construction and parsing.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Attribute or policy JSON is malformed.
    #[error("malformed policy: {0}")]
    Parse(String),

    /// The policy names a hash function that cannot be resolved.
    #[error("unsupported digest algorithm: {0:?}")]
    UnsupportedDigest(String),

    /// The policy payload could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A supplied policy id does not match the recomputed one.
    #[error("policy id mismatch: declared {declared}, computed {computed}")]
    IdentityMismatch {
        /// Id carried by the policy.
        declared: String,
        /// Id recomputed from the payload.
        computed: String,
    },

    /// User input was rejected before compilation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<CoreError> for PolicyError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnsupportedDigest(name) => Self::UnsupportedDigest(name),
            CoreError::Canonicalization(e) => Self::Canonicalization(e),
            other => Self::Parse(other.to_string()),
        }
    }
}

/// Rejected rule or delegation input, worded for the person editing it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Latitude left blank.
    #[error("Latitude cannot be empty")]
    EmptyLatitude,

    /// Longitude left blank.
    #[error("Longitude cannot be empty")]
    EmptyLongitude,

    /// Radius left blank.
    #[error("Radius cannot be empty")]
    EmptyRadius,

    /// A numeric field holds something else.
    #[error("{field} must be a number, got {input:?}")]
    NotANumber {
        /// Field label.
        field: &'static str,
        /// Rejected text.
        input: String,
    },

    /// A rule group has no members.
    #[error("Rule list is empty")]
    EmptyRuleGroup,

    /// A group references a rule that is not in the rule book.
    #[error("Unknown rule {0}")]
    UnknownRule(String),

    /// No rule kind was chosen in the editor.
    #[error("Select a rule type")]
    NoRuleKind,

    /// Delegation without users.
    #[error("No users selected")]
    NoUsers,

    /// Delegation without actions.
    #[error("No actions selected")]
    NoActions,

    /// Selected user is not in the catalog.
    #[error("Unknown user {0:?}")]
    UnknownUser(String),

    /// Selected action is not in the catalog.
    #[error("Unknown action {0:?}")]
    UnknownAction(String),

    /// Selected obligation is not in the catalog.
    #[error("Unknown obligation {0:?}")]
    UnknownObligation(String),

    /// Cost tier index past the catalog's tiers.
    #[error("Cost tier {index} out of range ({available} available)")]
    CostOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of tiers.
        available: usize,
    },
}
