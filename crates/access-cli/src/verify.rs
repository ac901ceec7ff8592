//! # Verify Subcommand
//!
//! Recomputes policy ids. The file holds one policy or an array of them
//! (the format `assemble --store` writes). Exits 1 if any id differs from
//! its recomputed value.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use access_policy::{Policy, PolicyError};

/// Arguments for the `access verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Policy JSON file.
    #[arg(long)]
    pub policy: PathBuf,
}

/// Outcome for one policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Declared id matches.
    Match(String),
    /// Declared id differs from the recomputed one.
    Mismatch { declared: String, computed: String },
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let text =
        std::fs::read_to_string(&args.policy).with_context(|| format!("failed to read {}", args.policy.display()))?;
    let verdicts = verify_text(&text).with_context(|| format!("failed to verify {}", args.policy.display()))?;

    let mut failed = 0usize;
    for verdict in &verdicts {
        match verdict {
            Verdict::Match(id) => println!("OK       {id}"),
            Verdict::Mismatch { declared, computed } => {
                failed += 1;
                println!("MISMATCH {declared} (computed {computed})");
            }
        }
    }
    if failed > 0 {
        tracing::warn!(failed, total = verdicts.len(), "policy id verification failed");
        return Ok(1);
    }
    Ok(0)
}

/// Parse one policy or an array of policies and check each id.
pub fn verify_text(text: &str) -> Result<Vec<Verdict>> {
    let value: Value = serde_json::from_str(text)?;
    let policies = match &value {
        Value::Array(items) => items.iter().map(Policy::from_value).collect::<Result<Vec<_>, _>>()?,
        _ => vec![Policy::from_value(&value)?],
    };
    policies.iter().map(verdict).collect()
}

fn verdict(policy: &Policy) -> Result<Verdict> {
    match policy.verify_id() {
        Ok(()) => Ok(Verdict::Match(policy.policy_id().to_string())),
        Err(PolicyError::IdentityMismatch { declared, computed }) => Ok(Verdict::Mismatch { declared, computed }),
        Err(e) => Err(e.into()),
    }
}
