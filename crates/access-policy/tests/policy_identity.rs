//! # Policy Identity Vectors
//!
//! Policy ids must agree across devices and implementations. The expected
//! ids below were computed outside Rust: the payload
//! `{cost, hash_function, policy_object}` was serialized with sorted keys and
//! compact separators (`json.dumps(payload, sort_keys=True, separators=(',', ':'))`)
//! and hashed with `hashlib.sha256`, then upper-cased.
//!
//! If these fail, policies built here will not match ids computed by the
//! policy store.

use access_core::Timestamp;
use access_policy::{
    assemble, AttributeNode, Catalog, Delegation, LogicalOperator, ObligationList, Policy, PolicyObject, Rule,
    RuleBook, TimeRule,
};
use serde_json::json;

fn delegation_object() -> PolicyObject {
    let catalog = Catalog::default();
    PolicyObject {
        obligation_deny: None,
        obligation_grant: Some(ObligationList::new(vec![catalog.obligations[0].attribute()])),
        policy_doc: AttributeNode::Empty,
        policy_goc: AttributeNode::logical(
            LogicalOperator::And,
            vec![catalog.users[0].attribute(false), catalog.actions[0].attribute()],
        )
        .expect("two comparables"),
    }
}

#[test]
fn fixed_delegation_vector() {
    let policy = Policy::new("sha-256", delegation_object(), "0.0").expect("sha-256 resolves");
    assert_eq!(
        policy.policy_id().as_str(),
        "D56BB50B36853FDC202528FF7B2B038BEAA8DAA421E0EAB210C34556F45AB021"
    );
}

#[test]
fn assembler_reaches_the_same_vector() {
    let catalog = Catalog::default();
    let delegation = Delegation {
        users: vec![catalog.users[0].clone()],
        obligation_grant: Some(catalog.obligations[0].clone()),
        cost: catalog.cost(0).expect("tier 0").to_string(),
        ..Delegation::default()
    };
    let policy = assemble(&delegation, &RuleBook::new(), Some(&catalog.actions[0]), false).expect("assembles");
    assert_eq!(
        policy.policy_id().as_str(),
        "D56BB50B36853FDC202528FF7B2B038BEAA8DAA421E0EAB210C34556F45AB021"
    );
}

#[test]
fn time_rule_doc_vector() {
    let rule = Rule::new(
        TimeRule {
            from: Timestamp::from_epoch_secs(1000).expect("in range"),
            until: Timestamp::from_epoch_secs(2000).expect("in range"),
        }
        .into(),
    );
    let object = PolicyObject {
        policy_doc: rule.compile(),
        ..PolicyObject::default()
    };
    let policy = Policy::new("sha-256", object, "").expect("sha-256 resolves");
    assert_eq!(
        policy.policy_id().as_str(),
        "111E35D95AB24C0A95523E498C9F251BF46BD35B8CC878831B77CCC15758C57D"
    );
}

#[test]
fn id_is_stable_across_runs() {
    let ids: Vec<_> = (0..5)
        .map(|_| Policy::new("sha-256", delegation_object(), "0.0").expect("builds").policy_id().clone())
        .collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn key_order_of_input_does_not_matter() {
    // Same document with keys written in a different order.
    let reordered = json!({
        "cost": "0.0",
        "policy_object": {
            "policy_goc": delegation_object().policy_goc.to_value(),
            "policy_doc": {},
            "obligation_grant": {"obligations": [{"value": "obligation#1", "type": "obligation"}]},
            "obligation_deny": {}
        },
        "hash_function": "sha-256"
    });
    let policy = Policy::from_value(&reordered).expect("parses");
    assert_eq!(
        policy.policy_id().as_str(),
        "D56BB50B36853FDC202528FF7B2B038BEAA8DAA421E0EAB210C34556F45AB021"
    );
}

#[test]
fn one_leaf_change_changes_id() {
    let base = Policy::new("sha-256", delegation_object(), "0.0").expect("builds");
    let mut changed = delegation_object();
    changed.obligation_grant = Some(ObligationList::new(vec![Catalog::default().obligations[1].attribute()]));
    let other = Policy::new("sha-256", changed, "0.0").expect("builds");
    assert_ne!(base.policy_id(), other.policy_id());
}

#[test]
fn wire_roundtrip_verifies() {
    let policy = Policy::new("sha-256", delegation_object(), "0.0").expect("builds");
    let text = serde_json::to_string(&policy).expect("serializes");
    let parsed = Policy::from_json(&text).expect("parses");
    parsed.verify_id().expect("id matches payload");
    assert_eq!(parsed, policy);
}
