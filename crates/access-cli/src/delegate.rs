//! # Delegate Subcommand
//!
//! Assembles a delegation and prints one signed delegate request per
//! policy, compact JSON, one per line. The owner's Ed25519 secret is read
//! from an environment variable as base64 (32-byte seed or 64-byte
//! seed and public key).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use access_crypto::{LocalSigner, PolicySigner};
use access_protocol::DelegatePolicyRequest;

use crate::assemble::assemble_file;
use crate::config::load_catalog;

/// Arguments for the `access delegate` subcommand.
#[derive(Args, Debug)]
pub struct DelegateArgs {
    /// Delegation YAML file.
    #[arg(long)]
    pub delegation: PathBuf,

    /// Catalog YAML file. Defaults to the built-in fixture catalog.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Public id of the delegating owner.
    #[arg(long)]
    pub owner_id: String,

    /// Environment variable holding the owner's base64 secret key.
    #[arg(long, default_value = "ACCESS_OWNER_KEY")]
    pub key_env: String,
}

/// Execute the delegate subcommand.
pub fn run_delegate(args: &DelegateArgs) -> Result<u8> {
    let signer = LocalSigner::from_env(&args.key_env)
        .with_context(|| format!("failed to load signing key from ${}", args.key_env))?;
    let requests = delegate_requests(&args.delegation, args.catalog.as_deref(), &args.owner_id, &signer)?;
    for request in &requests {
        println!("{}", request.to_json()?);
    }
    Ok(0)
}

/// Assemble the delegation and sign a request for every policy.
pub fn delegate_requests(
    delegation: &Path,
    catalog: Option<&Path>,
    owner_id: &str,
    signer: &dyn PolicySigner,
) -> Result<Vec<DelegatePolicyRequest>> {
    let catalog = load_catalog(catalog)?;
    let device_id = catalog.device_id.as_str();
    let policies = assemble_file(delegation, &catalog, false)?;
    let requests = policies
        .iter()
        .map(|policy| DelegatePolicyRequest::sign(policy, owner_id, device_id, signer))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(
        count = requests.len(),
        device_id = %device_id,
        signer = signer.provider_name(),
        "signed delegate requests"
    );
    Ok(requests)
}
