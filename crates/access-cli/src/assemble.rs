//! # Assemble Subcommand
//!
//! Turns a delegation file into policies, one per selected action.
//!
//! - `access assemble --delegation d.yaml` prints each policy as JSON.
//! - `--preview` masks user ids and the policy id for display.
//! - `--store cache.json` also writes the list through the file-backed
//!   policy store. Previews are never stored.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use access_policy::{assemble_per_action, Catalog, Policy};
use access_protocol::{JsonFilePolicyStore, PolicyStore};

use crate::config::{load_catalog, read_yaml, DelegationFile};

/// Arguments for the `access assemble` subcommand.
#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Delegation YAML file.
    #[arg(long)]
    pub delegation: PathBuf,

    /// Catalog YAML file. Defaults to the built-in fixture catalog.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Mask user ids and policy ids.
    #[arg(long)]
    pub preview: bool,

    /// Write the assembled policies to this JSON file.
    #[arg(long, conflicts_with = "preview")]
    pub store: Option<PathBuf>,
}

/// Execute the assemble subcommand.
pub fn run_assemble(args: &AssembleArgs) -> Result<u8> {
    if args.preview && args.store.is_some() {
        bail!("preview policies cannot be stored");
    }
    let catalog = load_catalog(args.catalog.as_deref())?;
    let policies = assemble_file(&args.delegation, &catalog, args.preview)?;
    for policy in &policies {
        println!("{}", serde_json::to_string_pretty(policy)?);
    }
    if let Some(path) = &args.store {
        let store = JsonFilePolicyStore::new(path);
        store
            .store(&policies)
            .with_context(|| format!("failed to store policies in {}", path.display()))?;
        tracing::info!(count = policies.len(), path = %path.display(), "stored policies");
    }
    Ok(0)
}

/// Load a delegation file, resolve it against `catalog` and assemble.
pub fn assemble_file(delegation: &Path, catalog: &Catalog, preview: bool) -> Result<Vec<Policy>> {
    let file: DelegationFile = read_yaml(delegation)?;
    let (delegation, book) = file.resolve(catalog)?;
    let policies = assemble_per_action(&delegation, &book, preview)?;
    tracing::info!(
        actions = delegation.actions.len(),
        users = delegation.users.len(),
        preview,
        "assembled policies"
    );
    Ok(policies)
}
