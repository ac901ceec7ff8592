//! # access-core — Foundational Types for Delegated Access Policies
//!
//! The leaf crate of the workspace. It owns the primitives that let a policy
//! store and an on-device enforcement point agree on a policy's identity
//! without a central allocator:
//!
//! 1. **`CanonicalBytes`.** Every byte string that is hashed into a policy
//!    identifier is produced by `CanonicalBytes::new()`. Keys are sorted and
//!    separators are compact (RFC 8785), so the same tree always yields the
//!    same bytes regardless of which process built it.
//!
//! 2. **Named digests.** Policies carry the name of their hash function as
//!    data (`"sha-256"`). `DigestAlgorithm::from_name()` resolves it to an
//!    audited implementation from `sha2`; unknown names are an error.
//!
//! 3. **Identifier newtypes.** `PolicyId` and `RuleId` cannot be confused
//!    with each other or with arbitrary strings.
//!
//! 4. **UTC-only timestamps** with second precision, the resolution policies
//!    are expressed in.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `access-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, CoreError};
pub use identity::{PolicyId, RuleId};
pub use temporal::Timestamp;
