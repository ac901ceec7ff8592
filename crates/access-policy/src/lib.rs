//! # access-policy — Policy Expression Model
//!
//! Builds, parses and identifies the policies a device owner delegates.
//!
//! - [`attribute`]: the attribute tree, its fixed JSON shape and the
//!   priority-ordered parser.
//! - [`policy`]: `PolicyObject` and `Policy`, with the content-derived
//!   `policy_id`.
//! - [`rule`]: user-facing rules and the pure compiler into attribute trees.
//! - [`editor`]: rule editing state and input validation.
//! - [`book`]: the caller-owned rule collection.
//! - [`catalog`]: users, actions, obligations and cost tiers on offer.
//! - [`assembler`]: one delegation in, policies out.
//!
//! Everything here is synchronous and free of shared state.

pub mod assembler;
pub mod attribute;
pub mod book;
pub mod catalog;
pub mod editor;
pub mod error;
pub mod policy;
pub mod rule;

pub use assembler::{assemble, assemble_per_action, Delegation, ResolvedRules};
pub use attribute::{AttributeNode, ComparisonOperator, LogicalOperator, ObligationList, SingleAttribute};
pub use book::RuleBook;
pub use catalog::{Catalog, DelegationAction, DelegationObligation, DelegationUser};
pub use editor::{DraftKind, Limitation, LocationDraft, RuleDraft, TimeWindow};
pub use error::{PolicyError, ValidationError};
pub use policy::{compute_policy_id, Policy, PolicyObject, DEFAULT_HASH_FUNCTION};
pub use rule::{
    compile, ExecuteCountRule, LocationRule, LocationUnit, MultipleRule, Rule, RuleKind, SatisfyType, TimeRule,
};
