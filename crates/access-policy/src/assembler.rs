//! # Policy Assembly
//!
//! Turns one delegation (who, what, under which rules, with which
//! obligations and cost) into policies ready for signing.
//!
//! The grant predicate is the conjunction of whichever of these terms are
//! present, in this order:
//!
//! 1. the compiled grant rule,
//! 2. the users predicate (one user's attribute, or `or` over several),
//! 3. the action's attribute,
//! 4. the execution cap.
//!
//! No terms give `Empty`; a single term stands alone. The denial predicate is
//! the compiled deny rule or `Empty`.

use access_core::RuleId;

use crate::attribute::{AttributeNode, LogicalOperator, ObligationList};
use crate::book::RuleBook;
use crate::catalog::{DelegationAction, DelegationObligation, DelegationUser};
use crate::error::{PolicyError, ValidationError};
use crate::policy::{Policy, PolicyObject, DEFAULT_HASH_FUNCTION};
use crate::rule::{compile, ExecuteCountRule, Rule, RuleKind};

/// One delegation as selected by the owner.
#[derive(Debug, Clone)]
pub struct Delegation {
    /// Rule in the book guarding the grant.
    pub grant_rule: Option<RuleId>,
    /// Rule in the book driving denial.
    pub deny_rule: Option<RuleId>,
    /// Users receiving access.
    pub users: Vec<DelegationUser>,
    /// Actions delegated; one policy each.
    pub actions: Vec<DelegationAction>,
    /// Execution cap.
    pub max_executions: Option<u32>,
    /// Obligation on grant.
    pub obligation_grant: Option<DelegationObligation>,
    /// Obligation on denial.
    pub obligation_deny: Option<DelegationObligation>,
    /// Cost tier value.
    pub cost: String,
    /// Hash function for policy ids.
    pub hash_function: String,
}

impl Default for Delegation {
    fn default() -> Self {
        Self {
            grant_rule: None,
            deny_rule: None,
            users: Vec::new(),
            actions: Vec::new(),
            max_executions: None,
            obligation_grant: None,
            obligation_deny: None,
            cost: String::new(),
            hash_function: DEFAULT_HASH_FUNCTION.to_string(),
        }
    }
}

/// Grant and deny rules looked up from a [`RuleBook`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolvedRules<'a> {
    /// Grant rule.
    pub grant: Option<&'a Rule>,
    /// Deny rule.
    pub deny: Option<&'a Rule>,
}

impl Delegation {
    /// Look up the referenced rules.
    ///
    /// # Errors
    ///
    /// `ValidationError::UnknownRule` for an id missing from `book`.
    pub fn resolve<'a>(&self, book: &'a RuleBook) -> Result<ResolvedRules<'a>, ValidationError> {
        let lookup = |id: Option<RuleId>| {
            id.map(|id| book.get(id).ok_or_else(|| ValidationError::UnknownRule(id.to_string())))
                .transpose()
        };
        Ok(ResolvedRules {
            grant: lookup(self.grant_rule)?,
            deny: lookup(self.deny_rule)?,
        })
    }

    /// Users with duplicate public ids removed, first occurrence kept.
    fn distinct_users(&self) -> Vec<&DelegationUser> {
        let mut distinct: Vec<&DelegationUser> = Vec::with_capacity(self.users.len());
        for user in &self.users {
            if !distinct.iter().any(|d| d.public_id == user.public_id) {
                distinct.push(user);
            }
        }
        distinct
    }
}

fn obligation_slot(obligation: Option<&DelegationObligation>) -> Option<ObligationList> {
    obligation.map(|o| ObligationList::new(vec![o.attribute()]))
}

/// Build the policy for one action (or none).
///
/// # Errors
///
/// `PolicyError::Validation` when a rule id does not resolve and
/// `PolicyError::UnsupportedDigest` for an unknown hash function.
pub fn assemble(
    delegation: &Delegation,
    book: &RuleBook,
    action: Option<&DelegationAction>,
    obfuscate: bool,
) -> Result<Policy, PolicyError> {
    let rules = delegation.resolve(book)?;

    let mut goc_terms = Vec::with_capacity(4);
    if let Some(rule) = rules.grant {
        goc_terms.push(rule.compile());
    }
    let users: Vec<_> = delegation
        .distinct_users()
        .into_iter()
        .map(|u| u.attribute(obfuscate))
        .collect();
    if !users.is_empty() {
        goc_terms.push(AttributeNode::combine(LogicalOperator::Or, users));
    }
    if let Some(action) = action {
        goc_terms.push(action.attribute());
    }
    if let Some(max) = delegation.max_executions {
        goc_terms.push(compile(&RuleKind::ExecuteCount(ExecuteCountRule { max })));
    }

    let policy_object = PolicyObject {
        obligation_deny: obligation_slot(delegation.obligation_deny.as_ref()),
        obligation_grant: obligation_slot(delegation.obligation_grant.as_ref()),
        policy_doc: rules.deny.map(Rule::compile).unwrap_or_default(),
        policy_goc: AttributeNode::combine(LogicalOperator::And, goc_terms),
    };

    if obfuscate {
        Policy::obfuscated(&delegation.hash_function, policy_object, &delegation.cost)
    } else {
        Policy::new(&delegation.hash_function, policy_object, &delegation.cost)
    }
}

/// Build one policy per selected action.
///
/// # Errors
///
/// `ValidationError::NoUsers` or `ValidationError::NoActions` for an
/// incomplete delegation, plus everything [`assemble`] reports.
pub fn assemble_per_action(
    delegation: &Delegation,
    book: &RuleBook,
    obfuscate: bool,
) -> Result<Vec<Policy>, PolicyError> {
    if delegation.users.is_empty() {
        return Err(ValidationError::NoUsers.into());
    }
    if delegation.actions.is_empty() {
        return Err(ValidationError::NoActions.into());
    }
    delegation
        .actions
        .iter()
        .map(|action| assemble(delegation, book, Some(action), obfuscate))
        .collect()
}
