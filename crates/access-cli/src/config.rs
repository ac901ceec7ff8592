//! # Input Files
//!
//! YAML documents the CLI reads:
//!
//! - a **catalog** of what can be delegated (device, users, actions,
//!   obligations, cost tiers); the built-in fixture is used when none is given.
//! - a **rule spec**, one rule tagged by `kind`.
//! - a **delegation file**, one owner selection referring to catalog entries
//!   by name or code.
//!
//! ```yaml
//! users: ["User #1", "User #3"]
//! actions: ["action#2"]
//! grant:
//!   kind: multiple
//!   satisfy: any
//!   rules:
//!     - { kind: time, from: "2024-01-01T08:00:00Z", until: "2024-01-01T18:00:00Z" }
//!     - { kind: location, latitude: 52.52, longitude: 13.40, radius: 500, unit: miles }
//! max_executions: 5
//! obligation_grant: obligation#1
//! cost_index: 2
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use access_core::{RuleId, Timestamp};
use access_policy::{
    Catalog, Delegation, ExecuteCountRule, LocationDraft, LocationUnit, MultipleRule, Rule, RuleBook, RuleKind,
    SatisfyType, TimeWindow, DEFAULT_HASH_FUNCTION,
};

/// Read and parse a YAML file.
pub fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// The catalog at `path`, or the built-in fixture.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(p) => {
            let catalog: Catalog = read_yaml(p)?;
            tracing::debug!(
                path = %p.display(),
                users = catalog.users.len(),
                actions = catalog.actions.len(),
                "loaded catalog"
            );
            Ok(catalog)
        }
        None => Ok(Catalog::default()),
    }
}

/// A YAML scalar that may be written as a number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberText {
    /// `52.52`
    Number(f64),
    /// `"52.52"`
    Text(String),
}

impl NumberText {
    fn into_text(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// One rule as written in a file. Unknown keys are rejected so a misspelt
/// field cannot drop a constraint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum RuleSpec {
    /// Time window; RFC 3339 UTC bounds.
    Time { from: String, until: String },
    /// Geofence.
    Location {
        latitude: NumberText,
        longitude: NumberText,
        radius: NumberText,
        #[serde(default)]
        unit: LocationUnit,
    },
    /// Execution cap.
    ExecuteCount { max: u32 },
    /// Group of nested rules.
    Multiple {
        #[serde(default)]
        satisfy: SatisfyType,
        rules: Vec<RuleSpec>,
    },
}

impl RuleSpec {
    /// Validate and build a rule with a fresh id.
    ///
    /// A time window whose `until` precedes `from` gets its start moved to
    /// one hour before `until`, as the rule editor does.
    pub fn to_rule(&self) -> Result<Rule> {
        let kind: RuleKind = match self {
            Self::Time { from, until } => {
                let from = Timestamp::parse(from).context("invalid `from`")?;
                let until = Timestamp::parse(until).context("invalid `until`")?;
                let mut window = TimeWindow::starting_at(from);
                window.set_until(until);
                window.to_rule().into()
            }
            Self::Location {
                latitude,
                longitude,
                radius,
                unit,
            } => LocationDraft {
                latitude: latitude.clone().into_text(),
                longitude: longitude.clone().into_text(),
                radius: radius.clone().into_text(),
                unit: *unit,
            }
            .validate()?
            .into(),
            Self::ExecuteCount { max } => ExecuteCountRule { max: *max }.into(),
            Self::Multiple { satisfy, rules } => {
                let members = rules.iter().map(RuleSpec::to_rule).collect::<Result<Vec<_>>>()?;
                MultipleRule::new(members, *satisfy)?.into()
            }
        };
        Ok(Rule::new(kind))
    }
}

/// One delegation as written in a file. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegationFile {
    /// User names or public ids.
    pub users: Vec<String>,
    /// Action names or codes.
    pub actions: Vec<String>,
    #[serde(default)]
    pub grant: Option<RuleSpec>,
    #[serde(default)]
    pub deny: Option<RuleSpec>,
    #[serde(default)]
    pub max_executions: Option<u32>,
    /// Obligation name or code.
    #[serde(default)]
    pub obligation_grant: Option<String>,
    #[serde(default)]
    pub obligation_deny: Option<String>,
    /// Index into the catalog's cost tiers.
    #[serde(default)]
    pub cost_index: usize,
    #[serde(default = "default_hash_function")]
    pub hash_function: String,
}

fn default_hash_function() -> String {
    DEFAULT_HASH_FUNCTION.to_string()
}

impl DelegationFile {
    /// Resolve names against `catalog` and build the rules the selection uses.
    pub fn resolve(&self, catalog: &Catalog) -> Result<(Delegation, RuleBook)> {
        let mut book = RuleBook::new();
        let mut place = |spec: &Option<RuleSpec>, role: &str| -> Result<Option<RuleId>> {
            let Some(spec) = spec else {
                return Ok(None);
            };
            let rule = spec.to_rule().with_context(|| format!("invalid {role} rule"))?;
            let id = rule.id();
            book.put(rule);
            Ok(Some(id))
        };
        let grant_rule = place(&self.grant, "grant")?;
        let deny_rule = place(&self.deny, "deny")?;

        let users = self
            .users
            .iter()
            .map(|u| catalog.user(u).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let actions = self
            .actions
            .iter()
            .map(|a| catalog.action(a).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let obligation = |key: &Option<String>| key.as_deref().map(|k| catalog.obligation(k).cloned()).transpose();

        let delegation = Delegation {
            grant_rule,
            deny_rule,
            users,
            actions,
            max_executions: self.max_executions,
            obligation_grant: obligation(&self.obligation_grant)?,
            obligation_deny: obligation(&self.obligation_deny)?,
            cost: catalog.cost(self.cost_index)?.to_string(),
            hash_function: self.hash_function.clone(),
        };
        Ok((delegation, book))
    }
}
