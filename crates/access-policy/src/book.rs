//! Caller-owned collection of rules keyed by id.
//!
//! Rule editors store finished rules here; groups and delegations refer to
//! them by [`RuleId`]. Iteration follows insertion order so rule lists render
//! the same way every time.

use std::collections::BTreeMap;

use access_core::RuleId;

use crate::rule::Rule;

/// Rules keyed by id, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: BTreeMap<RuleId, Rule>,
    order: Vec<RuleId>,
}

impl RuleBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a rule. A replaced rule keeps its position.
    pub fn put(&mut self, rule: Rule) -> Option<Rule> {
        let id = rule.id();
        let previous = self.rules.insert(id, rule);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Look up a rule.
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// Remove a rule.
    pub fn remove(&mut self, id: RuleId) -> Option<Rule> {
        let removed = self.rules.remove(&id)?;
        self.order.retain(|o| *o != id);
        Some(removed)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.order.iter().filter_map(|id| self.rules.get(id))
    }
}

impl FromIterator<Rule> for RuleBook {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut book = Self::new();
        for rule in iter {
            book.put(rule);
        }
        book
    }
}
