//! # Named Content Digests
//!
//! A policy names its hash function as data (`"hash_function": "sha-256"`).
//! This module resolves that name to a `sha2` implementation and computes
//! digests over `CanonicalBytes` only.
//!
//! An unresolvable name is an error. There is no fallback algorithm: a
//! silent substitution would make two devices disagree on a policy id.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::canonical::CanonicalBytes;
use crate::error::CoreError;

/// Hash algorithms a policy may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256. The default for newly assembled policies.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// Resolve a data-driven algorithm name.
    ///
    /// Matching is case-insensitive and accepts both the hyphenated
    /// (`"sha-256"`) and compact (`"sha256"`) spellings.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnsupportedDigest` for any other name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sha-256" | "sha256" => Ok(Self::Sha256),
            "sha-384" | "sha384" => Ok(Self::Sha384),
            "sha-512" | "sha512" => Ok(Self::Sha512),
            _ => Err(CoreError::UnsupportedDigest(name.to_string())),
        }
    }

    /// The canonical name written into policies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
            Self::Sha384 => "sha-384",
            Self::Sha512 => "sha-512",
        }
    }

    /// Digest output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// A digest value tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// Raw digest bytes, `algorithm.output_len()` long.
    pub bytes: Vec<u8>,
}

impl ContentDigest {
    /// Render as uppercase hex, two digits per byte (leading zeros kept).
    pub fn to_upper_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02X}")).collect()
    }

    /// Render as lowercase hex, two digits per byte.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Compute a digest of canonical bytes with the given algorithm.
///
/// Accepts only `&CanonicalBytes`, so every digest in the workspace is taken
/// over JCS output.
pub fn digest(algorithm: DigestAlgorithm, data: &CanonicalBytes) -> ContentDigest {
    let bytes = match algorithm {
        DigestAlgorithm::Sha256 => Sha256::digest(data.as_bytes()).to_vec(),
        DigestAlgorithm::Sha384 => Sha384::digest(data.as_bytes()).to_vec(),
        DigestAlgorithm::Sha512 => Sha512::digest(data.as_bytes()).to_vec(),
    };
    ContentDigest { algorithm, bytes }
}
