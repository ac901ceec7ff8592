//! # Command Messages
//!
//! JSON objects exchanged with the device and the policy server, keyed by a
//! `cmd` field:
//!
//! ```json
//! {"cmd": "resolve", "policy_id": "3F…", "user_id": "u1"}
//! ```
//!
//! Policy list responses are arrays of `{policy_id, action, cost?}`.

use access_core::PolicyId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

const CMD: &str = "cmd";

/// A command message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Ask the device to enforce a policy for a user.
    Resolve {
        /// Policy to resolve.
        policy_id: PolicyId,
        /// Requesting user.
        user_id: String,
    },
    /// List the policies available to a user.
    GetPolicyList {
        /// Requesting user.
        user_id: String,
    },
    /// Enable a policy for a user.
    EnablePolicy {
        /// Policy to enable.
        policy_id: PolicyId,
        /// Requesting user.
        user_id: String,
    },
    /// Look up a user id by name.
    GetAuthUserId {
        /// Name to look up.
        username: String,
    },
    /// List every registered user.
    GetAllUsers,
    /// Remove every registered user.
    ClearAllUsers,
    /// Replace the device's data set.
    SetDataSet {
        /// Data set entries, passed through as sent.
        dataset_list: Vec<Value>,
    },
    /// Read the device's data set.
    GetDataSet,
    /// Fetch a registered user's profile.
    GetUser {
        /// Name to look up.
        username: String,
    },
    /// Register a new user.
    RegisterUser {
        /// Registration profile, passed through as sent.
        user: Value,
    },
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => "resolve",
            Self::GetPolicyList { .. } => "get_policy_list",
            Self::EnablePolicy { .. } => "enable_policy",
            Self::GetAuthUserId { .. } => "get_auth_user_id",
            Self::GetAllUsers => "get_all_users",
            Self::ClearAllUsers => "clear_all_users",
            Self::SetDataSet { .. } => "set_data_set",
            Self::GetDataSet => "get_data_set",
            Self::GetUser { .. } => "get_user",
            Self::RegisterUser { .. } => "register_user",
        }
    }

    /// Policy the command refers to, if any.
    pub fn policy_id(&self) -> Option<&PolicyId> {
        match self {
            Self::Resolve { policy_id, .. } | Self::EnablePolicy { policy_id, .. } => Some(policy_id),
            _ => None,
        }
    }

    /// User the command acts for, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Resolve { user_id, .. } | Self::GetPolicyList { user_id } | Self::EnablePolicy { user_id, .. } => {
                Some(user_id)
            }
            _ => None,
        }
    }

    /// Encode as compact JSON.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a command message.
    pub fn parse(message: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(message)?)
    }
}

/// The `cmd` field of any JSON message, recognised or not.
pub fn command_name(message: &str) -> Option<String> {
    let value: Value = serde_json::from_str(message).ok()?;
    value.get(CMD)?.as_str().map(str::to_string)
}

/// One row of a policy list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyListEntry {
    /// Policy granting the action.
    pub policy_id: PolicyId,
    /// Action code.
    pub action: String,
    /// Cost as sent by the server; absent for unpriced policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
}

impl PolicyListEntry {
    /// Parse one row. `policy_id` and `action` must be strings; `cost` may
    /// be a string or a number and is dropped otherwise.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let policy_id = obj.get("policy_id")?.as_str()?;
        let action = obj.get("action")?.as_str()?;
        let cost = match obj.get("cost") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Some(Self {
            policy_id: PolicyId::new(policy_id),
            action: action.to_string(),
            cost,
        })
    }

    /// Parse a response array, skipping malformed rows.
    pub fn parse_list(value: &Value) -> Vec<Self> {
        let Some(rows) = value.as_array() else {
            return Vec::new();
        };
        let entries: Vec<_> = rows.iter().filter_map(Self::from_value).collect();
        if entries.len() != rows.len() {
            tracing::warn!(
                skipped = rows.len() - entries.len(),
                "dropped malformed policy list rows"
            );
        }
        entries
    }

    /// Numeric cost, if present and numeric.
    pub fn cost_value(&self) -> Option<f64> {
        self.cost.as_deref()?.trim().parse().ok()
    }

    /// Whether using the policy costs anything. Unpriced rows count as paid.
    pub fn is_paid(&self) -> bool {
        self.cost_value().map_or(true, |c| c != 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_shape() {
        let cmd = Command::Resolve {
            policy_id: PolicyId::new("AB12"),
            user_id: "u1".into(),
        };
        let v: Value = serde_json::from_str(&cmd.to_json().unwrap()).unwrap();
        assert_eq!(v, json!({"cmd": "resolve", "policy_id": "AB12", "user_id": "u1"}));
        assert_eq!(cmd.policy_id().unwrap().as_str(), "AB12");
        assert_eq!(cmd.user_id(), Some("u1"));
    }

    #[test]
    fn unit_commands_carry_only_cmd() {
        assert_eq!(Command::ClearAllUsers.to_json().unwrap(), r#"{"cmd":"clear_all_users"}"#);
        assert_eq!(Command::parse(r#"{"cmd":"get_all_users"}"#).unwrap(), Command::GetAllUsers);
    }

    #[test]
    fn parse_each_named_command() {
        for cmd in [
            Command::GetPolicyList { user_id: "u".into() },
            Command::EnablePolicy {
                policy_id: PolicyId::new("FF"),
                user_id: "u".into(),
            },
            Command::GetAuthUserId { username: "alice".into() },
            Command::GetDataSet,
            Command::GetUser { username: "jamie".into() },
        ] {
            let text = cmd.to_json().unwrap();
            assert_eq!(command_name(&text).as_deref(), Some(cmd.name()));
            assert_eq!(Command::parse(&text).unwrap(), cmd);
        }
    }

    #[test]
    fn unknown_or_incomplete_commands_rejected() {
        assert!(Command::parse(r#"{"cmd":"reboot"}"#).is_err());
        assert!(Command::parse(r#"{"cmd":"set_data_set"}"#).is_err());
        assert!(Command::parse(r#"{"cmd":"resolve","user_id":"u"}"#).is_err());
        assert_eq!(command_name(r#"{"cmd":"reboot"}"#).as_deref(), Some("reboot"));
        assert_eq!(command_name("[]"), None);
        assert_eq!(command_name("garbage"), None);
    }

    #[test]
    fn data_set_and_registration_bodies_pass_through() {
        let set = Command::parse(r#"{"cmd":"set_data_set","dataset_list":[{"name":"door","value":"1"}]}"#).unwrap();
        assert_eq!(set.name(), "set_data_set");
        assert_eq!(
            set,
            Command::SetDataSet {
                dataset_list: vec![json!({"name": "door", "value": "1"})]
            }
        );

        let register = Command::RegisterUser {
            user: json!({"username": "jamie", "first_name": "Jamie"}),
        };
        let v: Value = serde_json::from_str(&register.to_json().unwrap()).unwrap();
        assert_eq!(v["cmd"], "register_user");
        assert_eq!(v["user"]["username"], "jamie");
        assert_eq!(register.user_id(), None);
    }

    #[test]
    fn policy_list_parsing() {
        let rows = json!([
            {"policy_id": "A1", "action": "action#1", "cost": "0.05"},
            {"policy_id": "A2", "action": "action#2", "cost": 0},
            {"policy_id": "A3", "action": "action#3"},
            {"action": "action#4"},
            "junk"
        ]);
        let entries = PolicyListEntry::parse_list(&rows);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_paid());
        assert_eq!(entries[0].cost_value(), Some(0.05));
        assert!(!entries[1].is_paid());
        assert_eq!(entries[2].cost, None);
        assert!(entries[2].is_paid());
        assert!(PolicyListEntry::parse_list(&json!({"not": "a list"})).is_empty());
    }
}
