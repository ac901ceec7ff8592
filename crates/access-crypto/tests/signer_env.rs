//! Loading a signer from the environment and signing a real policy id.

use access_core::PolicyId;
use access_crypto::{verify_policy_id, Ed25519KeyPair, Ed25519Signature, LocalSigner, PolicySigner};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[test]
fn env_secret_signs_policy_ids() {
    let seed = [0x5au8; 32];
    let var = "ACCESS_CRYPTO_SIGNER_ENV_TEST_KEY";
    std::env::set_var(var, STANDARD.encode(seed));

    let signer = LocalSigner::from_env(var).expect("key loads");
    assert_eq!(signer.public_key(), Ed25519KeyPair::from_seed(&seed).public_key());

    let id = PolicyId::new("111E35D95AB24C0A95523E498C9F251BF46BD35B8CC878831B77CCC15758C57D");
    let wire = signer.sign(&id).expect("signs").to_base64();
    let sig = Ed25519Signature::from_base64(&wire).expect("decodes");
    verify_policy_id(&id, &sig, &signer.public_key()).expect("verifies");

    std::env::remove_var(var);
}
