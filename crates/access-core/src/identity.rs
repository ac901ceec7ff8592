//! # Identifier Newtypes
//!
//! `PolicyId` names a policy body by its content hash. `RuleId` names a
//! user-facing rule while it is being edited; it is an opaque UUIDv4 used to
//! reference rules from collections and never participates in the compiled
//! policy tree.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Content-derived identifier of a policy.
///
/// Normally the uppercase hex digest of the policy payload. A preview policy
/// carries [`PolicyId::OBFUSCATED`] instead and must never leave the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(String);

impl PolicyId {
    /// Redaction placeholder for preview policies and masked user ids.
    pub const OBFUSCATED: &'static str = "**********";

    /// Wrap an identifier string as received from the network.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The masked identifier used for previews.
    pub fn obfuscated() -> Self {
        Self(Self::OBFUSCATED.to_string())
    }

    /// Whether this is the redaction placeholder.
    pub fn is_obfuscated(&self) -> bool {
        self.0 == Self::OBFUSCATED
    }

    /// Access the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, as policy lists from servers may differ
    /// in hex case.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Display for PolicyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PolicyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier of an editable rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(Uuid);

impl RuleId {
    /// Generate a new random rule identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a rule identifier from its hyphenated UUID form.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| CoreError::InvalidIdentifier(format!("rule id {s:?}: {e}")))
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
