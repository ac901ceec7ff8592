//! # Policies and Policy Identity
//!
//! A [`Policy`] is the unit exchanged with the policy store:
//!
//! ```json
//! {
//!   "hash_function": "sha-256",
//!   "policy_id": "3F…",
//!   "policy_object": {
//!     "obligation_deny": {}, "obligation_grant": {"obligations": […]},
//!     "policy_doc": {}, "policy_goc": {"operation": "and", …}
//!   },
//!   "cost": "0.05"
//! }
//! ```
//!
//! The `policy_id` is derived from the rest of the document: the payload
//! `{hash_function, policy_object, cost}` is canonicalized with
//! [`CanonicalBytes`], digested with the named algorithm and rendered as
//! uppercase hex. Structurally equal payloads give equal ids on every device.
//!
//! Once constructed a policy is never mutated; accessors only.

use access_core::{digest, CanonicalBytes, DigestAlgorithm, PolicyId};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::attribute::{AttributeNode, ObligationList};
use crate::error::PolicyError;

/// Hash function written into newly assembled policies.
pub const DEFAULT_HASH_FUNCTION: &str = "sha-256";

const OBLIGATION_DENY: &str = "obligation_deny";
const OBLIGATION_GRANT: &str = "obligation_grant";
const POLICY_DOC: &str = "policy_doc";
const POLICY_GOC: &str = "policy_goc";

/// The decision body of a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PolicyObject {
    /// Obligations on denial; `None` serializes as `{}`.
    pub obligation_deny: Option<ObligationList>,
    /// Obligations on grant; `None` serializes as `{}`.
    pub obligation_grant: Option<ObligationList>,
    /// Denial-of-commitment predicate.
    pub policy_doc: AttributeNode,
    /// Grant-of-commitment predicate.
    pub policy_goc: AttributeNode,
}

impl PolicyObject {
    /// Parse leniently. Malformed slots become `Empty` and are logged; a
    /// forward-compatible reader must not reject a whole policy because one
    /// obligation list uses a shape it does not know.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or_else(|| {
            tracing::warn!("policy_object is not an object, treating all slots as empty");
            &empty
        });
        Self {
            obligation_deny: lenient_obligations(obj, OBLIGATION_DENY),
            obligation_grant: lenient_obligations(obj, OBLIGATION_GRANT),
            policy_doc: lenient_node(obj, POLICY_DOC),
            policy_goc: lenient_node(obj, POLICY_GOC),
        }
    }

    /// Parse strictly: every slot must be present and either `{}` or well-formed.
    ///
    /// # Errors
    ///
    /// `PolicyError::Parse` naming the first offending slot.
    pub fn from_value_strict(value: &Value) -> Result<Self, PolicyError> {
        let obj = value
            .as_object()
            .ok_or_else(|| PolicyError::Parse("policy_object must be an object".into()))?;
        Ok(Self {
            obligation_deny: strict_obligations(obj, OBLIGATION_DENY)?,
            obligation_grant: strict_obligations(obj, OBLIGATION_GRANT)?,
            policy_doc: strict_node(obj, POLICY_DOC)?,
            policy_goc: strict_node(obj, POLICY_GOC)?,
        })
    }

    /// Project into a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

fn lenient_node(obj: &Map<String, Value>, key: &str) -> AttributeNode {
    match obj.get(key) {
        None => AttributeNode::Empty,
        Some(v) if is_empty_object(v) => AttributeNode::Empty,
        Some(v) => AttributeNode::from_value(v).unwrap_or_else(|| {
            tracing::warn!(slot = key, "malformed policy attribute, substituting empty");
            AttributeNode::Empty
        }),
    }
}

fn lenient_obligations(obj: &Map<String, Value>, key: &str) -> Option<ObligationList> {
    let v = obj.get(key)?;
    if is_empty_object(v) {
        return None;
    }
    let parsed = ObligationList::from_value(v);
    if parsed.is_none() {
        tracing::warn!(slot = key, "malformed obligation list, substituting empty");
    }
    parsed
}

fn strict_slot<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<Option<&'a Value>, PolicyError> {
    let v = obj
        .get(key)
        .ok_or_else(|| PolicyError::Parse(format!("missing {key}")))?;
    Ok((!is_empty_object(v)).then_some(v))
}

fn strict_node(obj: &Map<String, Value>, key: &str) -> Result<AttributeNode, PolicyError> {
    match strict_slot(obj, key)? {
        None => Ok(AttributeNode::Empty),
        Some(v) => AttributeNode::from_value(v).ok_or_else(|| PolicyError::Parse(format!("malformed {key}"))),
    }
}

fn strict_obligations(obj: &Map<String, Value>, key: &str) -> Result<Option<ObligationList>, PolicyError> {
    match strict_slot(obj, key)? {
        None => Ok(None),
        Some(v) => ObligationList::from_value(v)
            .map(Some)
            .ok_or_else(|| PolicyError::Parse(format!("malformed {key}"))),
    }
}

struct ObligationSlot<'a>(&'a Option<ObligationList>);

impl Serialize for ObligationSlot<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(list) => list.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

impl Serialize for PolicyObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry(OBLIGATION_DENY, &ObligationSlot(&self.obligation_deny))?;
        map.serialize_entry(OBLIGATION_GRANT, &ObligationSlot(&self.obligation_grant))?;
        map.serialize_entry(POLICY_DOC, &self.policy_doc)?;
        map.serialize_entry(POLICY_GOC, &self.policy_goc)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for PolicyObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

#[derive(Serialize)]
struct IdentityPayload<'a> {
    hash_function: &'a str,
    policy_object: &'a PolicyObject,
    cost: &'a str,
}

/// Compute the id of a policy payload.
///
/// # Errors
///
/// `PolicyError::UnsupportedDigest` if `hash_function` is unknown.
pub fn compute_policy_id(
    hash_function: &str,
    policy_object: &PolicyObject,
    cost: &str,
) -> Result<PolicyId, PolicyError> {
    let algorithm = DigestAlgorithm::from_name(hash_function)?;
    let canonical = CanonicalBytes::new(&IdentityPayload {
        hash_function,
        policy_object,
        cost,
    })?;
    let id = digest(algorithm, &canonical).to_upper_hex();
    tracing::debug!(%algorithm, policy_id = %id, "computed policy id");
    Ok(PolicyId::new(id))
}

/// A policy with its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    hash_function: String,
    policy_id: PolicyId,
    policy_object: PolicyObject,
    cost: String,
}

impl Policy {
    /// Build a policy and derive its id.
    ///
    /// # Errors
    ///
    /// `PolicyError::UnsupportedDigest` for an unknown hash function.
    pub fn new(
        hash_function: impl Into<String>,
        policy_object: PolicyObject,
        cost: impl Into<String>,
    ) -> Result<Self, PolicyError> {
        let hash_function = hash_function.into();
        let cost = cost.into();
        let policy_id = compute_policy_id(&hash_function, &policy_object, &cost)?;
        Ok(Self {
            hash_function,
            policy_id,
            policy_object,
            cost,
        })
    }

    /// Keep an id supplied by the network. Use [`Policy::verify_id`] to check it.
    pub fn with_id(
        hash_function: impl Into<String>,
        policy_id: PolicyId,
        policy_object: PolicyObject,
        cost: impl Into<String>,
    ) -> Self {
        Self {
            hash_function: hash_function.into(),
            policy_id,
            policy_object,
            cost: cost.into(),
        }
    }

    /// Build a preview policy carrying the masked id.
    ///
    /// The hash function is still resolved so a preview fails exactly where
    /// the real submission would.
    pub fn obfuscated(
        hash_function: impl Into<String>,
        policy_object: PolicyObject,
        cost: impl Into<String>,
    ) -> Result<Self, PolicyError> {
        let hash_function = hash_function.into();
        DigestAlgorithm::from_name(&hash_function)?;
        Ok(Self {
            hash_function,
            policy_id: PolicyId::obfuscated(),
            policy_object,
            cost: cost.into(),
        })
    }

    /// Hash function name as carried in the document.
    pub fn hash_function(&self) -> &str {
        &self.hash_function
    }

    /// Policy id.
    pub fn policy_id(&self) -> &PolicyId {
        &self.policy_id
    }

    /// Decision body.
    pub fn policy_object(&self) -> &PolicyObject {
        &self.policy_object
    }

    /// Cost tier.
    pub fn cost(&self) -> &str {
        &self.cost
    }

    /// Whether this is a preview that must not leave the device.
    pub fn is_obfuscated(&self) -> bool {
        self.policy_id.is_obfuscated()
    }

    /// Recompute the id from the payload.
    pub fn recompute_id(&self) -> Result<PolicyId, PolicyError> {
        compute_policy_id(&self.hash_function, &self.policy_object, &self.cost)
    }

    /// Check the carried id against the payload. Hex case is ignored.
    ///
    /// # Errors
    ///
    /// `PolicyError::IdentityMismatch` when they differ.
    pub fn verify_id(&self) -> Result<(), PolicyError> {
        let computed = self.recompute_id()?;
        if self.policy_id.eq_ignore_case(computed.as_str()) {
            Ok(())
        } else {
            Err(PolicyError::IdentityMismatch {
                declared: self.policy_id.to_string(),
                computed: computed.to_string(),
            })
        }
    }

    /// Project into a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Parse a policy document.
    ///
    /// `hash_function` must be a string. A missing `policy_id` is computed, a
    /// missing `cost` defaults to `""`, and the object is parsed leniently.
    ///
    /// # Errors
    ///
    /// `PolicyError::Parse` for a non-object document or missing hash function;
    /// `PolicyError::UnsupportedDigest` if an id has to be computed with an
    /// unknown algorithm.
    pub fn from_value(value: &Value) -> Result<Self, PolicyError> {
        let obj = value
            .as_object()
            .ok_or_else(|| PolicyError::Parse("policy must be an object".into()))?;
        let hash_function = obj
            .get("hash_function")
            .and_then(Value::as_str)
            .ok_or_else(|| PolicyError::Parse("missing hash_function".into()))?;
        let policy_object = obj
            .get("policy_object")
            .map(PolicyObject::from_value)
            .unwrap_or_default();
        let cost = obj.get("cost").and_then(Value::as_str).unwrap_or_default();
        match obj.get("policy_id").and_then(Value::as_str) {
            Some(id) => Ok(Self::with_id(hash_function, PolicyId::new(id), policy_object, cost)),
            None => Self::new(hash_function, policy_object, cost),
        }
    }

    /// Parse a policy document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let value: Value = serde_json::from_str(json).map_err(|e| PolicyError::Parse(e.to_string()))?;
        Self::from_value(&value)
    }
}

impl<'de> Deserialize<'de> for Policy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{ComparisonOperator, SingleAttribute};
    use serde_json::json;

    fn sample_object() -> PolicyObject {
        PolicyObject {
            obligation_deny: None,
            obligation_grant: Some(ObligationList::new(vec![SingleAttribute::new("obligation", "obligation#1")])),
            policy_doc: AttributeNode::Empty,
            policy_goc: AttributeNode::compare(
                ComparisonOperator::Eq,
                AttributeNode::single("action", "action#1"),
                SingleAttribute::request_ref("action").into(),
            ),
        }
    }

    #[test]
    fn object_serializes_all_four_slots() {
        let v = sample_object().to_value();
        assert_eq!(v["obligation_deny"], json!({}));
        assert_eq!(v["policy_doc"], json!({}));
        assert_eq!(v["obligation_grant"]["obligations"][0]["value"], "obligation#1");
        assert_eq!(v["policy_goc"]["operation"], "eq");
    }

    #[test]
    fn new_computes_sha256_id() {
        let p = Policy::new(DEFAULT_HASH_FUNCTION, sample_object(), "0.0").unwrap();
        assert_eq!(p.policy_id().as_str().len(), 64);
        assert!(p.policy_id().as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        p.verify_id().unwrap();
    }

    #[test]
    fn sha512_id_length() {
        let p = Policy::new("sha-512", sample_object(), "").unwrap();
        assert_eq!(p.policy_id().as_str().len(), 128);
    }

    #[test]
    fn unknown_hash_function_is_fatal() {
        let err = Policy::new("md5", sample_object(), "0.0").unwrap_err();
        assert!(matches!(err, PolicyError::UnsupportedDigest(_)));
        assert!(Policy::obfuscated("md5", sample_object(), "0.0").is_err());
    }

    #[test]
    fn cost_participates_in_id() {
        let a = Policy::new("sha-256", sample_object(), "0.0").unwrap();
        let b = Policy::new("sha-256", sample_object(), "0.05").unwrap();
        assert_ne!(a.policy_id(), b.policy_id());
    }

    #[test]
    fn obfuscated_policy_never_verifies() {
        let p = Policy::obfuscated("sha-256", sample_object(), "0.0").unwrap();
        assert!(p.is_obfuscated());
        assert_eq!(p.policy_id().as_str(), PolicyId::OBFUSCATED);
        assert!(matches!(p.verify_id(), Err(PolicyError::IdentityMismatch { .. })));
    }

    #[test]
    fn roundtrip_keeps_id() {
        let p = Policy::new("sha-256", sample_object(), "0.1").unwrap();
        let back = Policy::from_value(&p.to_value()).unwrap();
        assert_eq!(back, p);
        back.verify_id().unwrap();
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let p = Policy::new("sha-256", sample_object(), "0.1").unwrap();
        let mut v = p.to_value();
        v["cost"] = json!("0.15");
        let tampered = Policy::from_value(&v).unwrap();
        assert!(matches!(tampered.verify_id(), Err(PolicyError::IdentityMismatch { .. })));
    }

    #[test]
    fn lowercase_id_still_verifies() {
        let p = Policy::new("sha-256", sample_object(), "0.1").unwrap();
        let lower = Policy::with_id(
            "sha-256",
            PolicyId::new(p.policy_id().as_str().to_ascii_lowercase()),
            sample_object(),
            "0.1",
        );
        lower.verify_id().unwrap();
    }

    #[test]
    fn missing_id_and_cost_are_filled() {
        let v = json!({"hash_function": "sha-256", "policy_object": sample_object().to_value()});
        let p = Policy::from_value(&v).unwrap();
        assert_eq!(p.cost(), "");
        assert_eq!(p.policy_id(), &compute_policy_id("sha-256", &sample_object(), "").unwrap());
    }

    #[test]
    fn missing_hash_function_rejected() {
        assert!(matches!(
            Policy::from_value(&json!({"policy_id": "AB"})),
            Err(PolicyError::Parse(_))
        ));
        assert!(Policy::from_json("not json").is_err());
    }

    #[test]
    fn malformed_grant_degrades_to_empty() {
        let mut v = sample_object().to_value();
        v["obligation_grant"] = json!({"obligations": [{"type": "obligation"}]});
        let obj = PolicyObject::from_value(&v);
        assert_eq!(obj.obligation_grant, None);
        assert_eq!(obj.policy_goc, sample_object().policy_goc);
    }

    #[test]
    fn malformed_goc_degrades_to_empty() {
        let mut v = sample_object().to_value();
        v["policy_goc"] = json!({"operation": "and", "attribute_list": []});
        assert_eq!(PolicyObject::from_value(&v).policy_goc, AttributeNode::Empty);
    }

    #[test]
    fn strict_parse_rejects_what_lenient_degrades() {
        let mut v = sample_object().to_value();
        assert_eq!(PolicyObject::from_value_strict(&v).unwrap(), sample_object());
        v["obligation_grant"] = json!({"obligations": "nope"});
        let err = PolicyObject::from_value_strict(&v).unwrap_err();
        assert!(err.to_string().contains("obligation_grant"));
    }

    #[test]
    fn strict_parse_requires_every_slot() {
        let mut v = sample_object().to_value();
        v.as_object_mut().unwrap().remove("policy_doc");
        assert!(PolicyObject::from_value_strict(&v).is_err());
        assert_eq!(PolicyObject::from_value(&v), sample_object());
    }

    #[test]
    fn serde_deserialize_uses_lenient_path() {
        let p = Policy::new("sha-256", sample_object(), "0.0").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: Policy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
