//! # access-cli — Delegated Access Policy Tool
//!
//! Provides the `access` command-line interface over the policy crates.
//!
//! ## Subcommands
//!
//! - `access compile`: Show the attribute tree a rule compiles to.
//! - `access assemble`: Build (or preview) one policy per delegated action.
//! - `access verify`: Recompute and check policy ids.
//! - `access delegate`: Emit signed delegate requests.
//!
//! ```bash
//! access compile --rule weekday.yaml
//! access assemble --delegation guest.yaml --preview
//! access assemble --delegation guest.yaml --store cache/policies.json
//! access verify --policy cache/policies.json
//! ACCESS_OWNER_KEY=... access delegate --delegation guest.yaml --owner-id 3c9d...
//! ```
//!
//! Handlers return the process exit code; errors propagate as
//! `anyhow::Error` and are logged by `main`.

pub mod assemble;
pub mod compile;
pub mod config;
pub mod delegate;
pub mod verify;
