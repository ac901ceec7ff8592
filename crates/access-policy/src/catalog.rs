//! # Delegation Catalog
//!
//! What a device owner can delegate: the device id, the users who may
//! receive access, the actions the device exposes, the obligations it can
//! attach and the cost tiers it charges. Loaded from configuration; the
//! default is the reference device's fixture data.
//!
//! Each catalog entry knows the attribute it contributes to a policy.

use serde::{Deserialize, Serialize};

use access_core::PolicyId;

use crate::attribute::{AttributeNode, ComparisonOperator, SingleAttribute};
use crate::error::ValidationError;

/// A user who may receive delegated access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationUser {
    /// Display name.
    pub name: String,
    /// Public identity the enforcement point checks.
    pub public_id: String,
}

impl DelegationUser {
    /// `eq(public_id=<id>, request.subject)`. With `obfuscate` the id is masked.
    pub fn attribute(&self, obfuscate: bool) -> AttributeNode {
        let id = if obfuscate {
            PolicyId::OBFUSCATED
        } else {
            self.public_id.as_str()
        };
        AttributeNode::compare(
            ComparisonOperator::Eq,
            AttributeNode::single("public_id", id),
            SingleAttribute::request_ref("subject").into(),
        )
    }
}

/// An action the device exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationAction {
    /// Display name.
    pub name: String,
    /// Action code sent in requests.
    pub code: String,
}

impl DelegationAction {
    /// `eq(action=<code>, request.action)`.
    pub fn attribute(&self) -> AttributeNode {
        AttributeNode::compare(
            ComparisonOperator::Eq,
            AttributeNode::single("action", &self.code),
            SingleAttribute::request_ref("action").into(),
        )
    }
}

/// An obligation the device can execute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationObligation {
    /// Display name.
    pub name: String,
    /// Obligation code.
    pub code: String,
}

impl DelegationObligation {
    /// `{type: "obligation", value: <code>}`.
    pub fn attribute(&self) -> SingleAttribute {
        SingleAttribute::new("obligation", &self.code)
    }
}

/// Everything available for delegation on one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Device the policies are delegated on.
    pub device_id: String,
    /// Delegation targets.
    pub users: Vec<DelegationUser>,
    /// Device actions.
    pub actions: Vec<DelegationAction>,
    /// Attachable obligations.
    pub obligations: Vec<DelegationObligation>,
    /// Cost tiers as decimal strings.
    pub cost_tiers: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        let numbered = |prefix: &str, code: &str, n: usize| {
            (1..=n)
                .map(|i| (format!("{prefix} #{i}"), format!("{code}#{i}")))
                .collect::<Vec<_>>()
        };
        Self {
            device_id: "123".into(),
            users: FIXTURE_USER_IDS
                .iter()
                .enumerate()
                .map(|(i, id)| DelegationUser {
                    name: format!("User #{}", i + 1),
                    public_id: (*id).to_string(),
                })
                .collect(),
            actions: numbered("Action", "action", 4)
                .into_iter()
                .map(|(name, code)| DelegationAction { name, code })
                .collect(),
            obligations: numbered("Obligation", "obligation", 3)
                .into_iter()
                .map(|(name, code)| DelegationObligation { name, code })
                .collect(),
            cost_tiers: ["0.0", "0.05", "0.1", "0.15"].map(String::from).to_vec(),
        }
    }
}

const FIXTURE_USER_IDS: [&str; 4] = [
    "3c9d985c5d630e6e02f676997c5e9f03b45c6b7529b2491e8de03c18af3c9d87f0a65ecb5dd8f390dee13835354b222df414104684ce9f1079a059f052ca6e51",
    "d51d6d76a6002d34af849e52c22719bd2becfee5b0685acd67b0d16654284cf6d200189d22cdab0aafcfd46b055a2e4f5bde31cae849207fd820e03c32ac21f8",
    "df2b3fe3be9f6bd3deca19d275eb76b252389c4c4af2ce33745376357c955f1e0c9d1eb776beacd2bd917fc216787e57156edfb8077c816754a10a46b91a81b2",
    "90fb6a83806bc167d68d7eaf21e33fa1e8bb6a32ee536091728461e2655be3769cdc4062942ae87d7ed131e880c63914bf7774f282e3220796ffb30c7f3a6bd8",
];

impl Catalog {
    /// Find a user by display name or public id.
    pub fn user(&self, key: &str) -> Result<&DelegationUser, ValidationError> {
        self.users
            .iter()
            .find(|u| u.name == key || u.public_id == key)
            .ok_or_else(|| ValidationError::UnknownUser(key.to_string()))
    }

    /// Find an action by display name or code.
    pub fn action(&self, key: &str) -> Result<&DelegationAction, ValidationError> {
        self.actions
            .iter()
            .find(|a| a.name == key || a.code == key)
            .ok_or_else(|| ValidationError::UnknownAction(key.to_string()))
    }

    /// Find an obligation by display name or code.
    pub fn obligation(&self, key: &str) -> Result<&DelegationObligation, ValidationError> {
        self.obligations
            .iter()
            .find(|o| o.name == key || o.code == key)
            .ok_or_else(|| ValidationError::UnknownObligation(key.to_string()))
    }

    /// Cost tier by index.
    pub fn cost(&self, index: usize) -> Result<&str, ValidationError> {
        self.cost_tiers
            .get(index)
            .map(String::as_str)
            .ok_or(ValidationError::CostOutOfRange {
                index,
                available: self.cost_tiers.len(),
            })
    }
}
