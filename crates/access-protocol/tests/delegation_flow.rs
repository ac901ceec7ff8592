//! End-to-end: assemble a delegation, sign it, cache it, then resolve the
//! cached ids through command messages.

use access_crypto::{Ed25519KeyPair, LocalSigner, PolicySigner};
use access_policy::{assemble_per_action, Catalog, Delegation, Rule, RuleBook, TimeRule};
use access_protocol::{
    command_name, extract_json_frame, Command, DelegatePolicyRequest, JsonFilePolicyStore, PolicyListEntry,
    PolicyStore,
};
use access_core::Timestamp;
use serde_json::json;

#[test]
fn delegate_cache_and_resolve() {
    let catalog = Catalog::default();
    let grant = Rule::new(
        TimeRule {
            from: Timestamp::from_epoch_secs(1_700_000_000).expect("in range"),
            until: Timestamp::from_epoch_secs(1_700_003_600).expect("in range"),
        }
        .into(),
    );
    let book: RuleBook = vec![grant.clone()].into_iter().collect();
    let delegation = Delegation {
        grant_rule: Some(grant.id()),
        users: catalog.users[..2].to_vec(),
        actions: catalog.actions[..2].to_vec(),
        max_executions: Some(10),
        obligation_deny: Some(catalog.obligations[2].clone()),
        cost: catalog.cost(3).expect("tier").to_string(),
        ..Delegation::default()
    };

    let policies = assemble_per_action(&delegation, &book, false).expect("assembles");
    assert_eq!(policies.len(), 2);

    let signer = LocalSigner::new(Ed25519KeyPair::from_seed(&[11u8; 32]));
    let owner = signer.public_key().to_hex();
    for policy in &policies {
        let request =
            DelegatePolicyRequest::sign(policy, owner.clone(), catalog.device_id.clone(), &signer).expect("signs");
        request.verify(&signer.public_key()).expect("verifies");
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonFilePolicyStore::new(dir.path().join("policies.json"));
    store.store(&policies).expect("stores");
    let cached = store.load().expect("loads");
    assert_eq!(cached, policies);

    for policy in &cached {
        policy.verify_id().expect("cached id still matches");
        let cmd = Command::Resolve {
            policy_id: policy.policy_id().clone(),
            user_id: "user-1".into(),
        };
        let text = cmd.to_json().expect("encodes");
        assert_eq!(command_name(&text).as_deref(), Some("resolve"));
        assert_eq!(Command::parse(&text).expect("decodes").policy_id(), Some(policy.policy_id()));
    }
}

#[test]
fn policy_list_from_stream_buffer() {
    let body = json!([
        {"policy_id": "AA", "action": "action#1", "cost": "0.0"},
        {"policy_id": "BB", "action": "action#2"}
    ]);
    let buffer = format!("{body}\n{{\"next\":");
    let frame = extract_json_frame(&buffer).expect("complete frame");
    let entries = PolicyListEntry::parse_list(&frame);
    assert_eq!(entries.len(), 2);
    assert!(!entries[0].is_paid());
    assert_eq!(entries[1].action, "action#2");
}
