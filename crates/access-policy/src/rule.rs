//! # Rule Compiler
//!
//! User-facing constraints compile into attribute trees. Compilation is a
//! pure function of the rule: no clamping, no validation, no side effects.
//! Inputs are checked beforehand by the editor (see [`crate::editor`]) or by
//! the constructors here that guard structural invariants.
//!
//! | Rule | Tree |
//! |---|---|
//! | time `[from, until]` | `and(leq(time=from, req), geq(time=until, req))` |
//! | location | `geq(geolocation="lat,lon,r", req)` |
//! | execution cap `n` | `gt(execution_num=n, req)` |
//! | group | the single member, or `and`/`or` over members |

use access_core::{RuleId, Timestamp};

use crate::attribute::{AttributeNode, ComparisonOperator, LogicalOperator, SingleAttribute};
use crate::error::ValidationError;

/// Distance unit for a geofence radius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationUnit {
    /// Kilometres.
    #[default]
    Kilometers,
    /// Statute miles.
    Miles,
}

impl LocationUnit {
    /// Abbreviation shown next to the radius.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Kilometers => "km",
            Self::Miles => "mi",
        }
    }

    /// Scale a radius into the unit enforcement points compare against.
    ///
    /// Kilometres are divided by 1000; miles are multiplied by `1.60934 / 1000`.
    /// Deployed enforcement points expect exactly these values, so the
    /// kilometre branch is not a conversion to metres.
    pub fn to_meters(&self, value: f32) -> f32 {
        match self {
            Self::Miles => value * 1.60934_f32 / 1000_f32,
            Self::Kilometers => value / 1000_f32,
        }
    }
}

impl std::fmt::Display for LocationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Kilometers => "kilometers",
            Self::Miles => "miles",
        })
    }
}

/// How a group combines its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SatisfyType {
    /// Every member must hold.
    #[default]
    All,
    /// Any member suffices.
    Any,
}

impl SatisfyType {
    /// The logical operator this maps to.
    pub fn operator(&self) -> LogicalOperator {
        match self {
            Self::All => LogicalOperator::And,
            Self::Any => LogicalOperator::Or,
        }
    }
}

/// Access allowed between two instants, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRule {
    /// Window start.
    pub from: Timestamp,
    /// Window end.
    pub until: Timestamp,
}

/// Access allowed inside a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRule {
    /// Centre latitude in degrees.
    pub latitude: f32,
    /// Centre longitude in degrees.
    pub longitude: f32,
    /// Radius in `unit`.
    pub radius: f32,
    /// Unit of `radius`.
    pub unit: LocationUnit,
}

impl LocationRule {
    /// The `"lat,lon,radius"` value written into the geolocation leaf.
    pub fn geolocation_value(&self) -> String {
        format!(
            "{:?},{:?},{:?}",
            self.latitude,
            self.longitude,
            self.unit.to_meters(self.radius)
        )
    }
}

/// Access allowed while the execution counter stays below a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteCountRule {
    /// Maximum number of executions.
    pub max: u32,
}

/// A non-empty group of rules.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleRule {
    members: Vec<Rule>,
    satisfy: SatisfyType,
}

impl MultipleRule {
    /// Group rules.
    ///
    /// # Errors
    ///
    /// `ValidationError::EmptyRuleGroup` when `members` is empty.
    pub fn new(members: Vec<Rule>, satisfy: SatisfyType) -> Result<Self, ValidationError> {
        if members.is_empty() {
            return Err(ValidationError::EmptyRuleGroup);
        }
        Ok(Self { members, satisfy })
    }

    /// Members in order.
    pub fn members(&self) -> &[Rule] {
        &self.members
    }

    /// Combination mode.
    pub fn satisfy(&self) -> SatisfyType {
        self.satisfy
    }
}

/// What a rule constrains.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Time window.
    Time(TimeRule),
    /// Geofence.
    Location(LocationRule),
    /// Execution cap.
    ExecuteCount(ExecuteCountRule),
    /// Group of rules.
    Multiple(MultipleRule),
}

/// A user-facing rule with a stable identity.
///
/// Two rules are equal when their ids are equal, whatever they constrain.
#[derive(Debug, Clone)]
pub struct Rule {
    id: RuleId,
    kind: RuleKind,
}

impl Rule {
    /// A rule with a fresh id.
    pub fn new(kind: RuleKind) -> Self {
        Self::with_id(RuleId::new(), kind)
    }

    /// A rule with a known id.
    pub fn with_id(id: RuleId, kind: RuleKind) -> Self {
        Self { id, kind }
    }

    /// Identifier.
    pub fn id(&self) -> RuleId {
        self.id
    }

    /// What the rule constrains.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Compile into an attribute tree.
    pub fn compile(&self) -> AttributeNode {
        compile(&self.kind)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Rule {}

impl std::hash::Hash for Rule {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<TimeRule> for RuleKind {
    fn from(rule: TimeRule) -> Self {
        Self::Time(rule)
    }
}

impl From<LocationRule> for RuleKind {
    fn from(rule: LocationRule) -> Self {
        Self::Location(rule)
    }
}

impl From<ExecuteCountRule> for RuleKind {
    fn from(rule: ExecuteCountRule) -> Self {
        Self::ExecuteCount(rule)
    }
}

impl From<MultipleRule> for RuleKind {
    fn from(rule: MultipleRule) -> Self {
        Self::Multiple(rule)
    }
}

/// Compile a rule into its attribute tree. Always yields a list-like node.
pub fn compile(kind: &RuleKind) -> AttributeNode {
    match kind {
        RuleKind::Time(rule) => compile_time(rule),
        RuleKind::Location(rule) => compile_location(rule),
        RuleKind::ExecuteCount(rule) => compile_execute_count(rule),
        RuleKind::Multiple(rule) => compile_multiple(rule),
    }
}

fn compile_time(rule: &TimeRule) -> AttributeNode {
    let bound = |op, at: Timestamp| {
        AttributeNode::compare(
            op,
            AttributeNode::single("time", at.epoch_secs().to_string()),
            SingleAttribute::request_ref("time").into(),
        )
    };
    AttributeNode::Logical {
        operator: LogicalOperator::And,
        operands: vec![
            bound(ComparisonOperator::Leq, rule.from),
            bound(ComparisonOperator::Geq, rule.until),
        ],
    }
}

fn compile_location(rule: &LocationRule) -> AttributeNode {
    AttributeNode::compare(
        ComparisonOperator::Geq,
        AttributeNode::single("geolocation", rule.geolocation_value()),
        SingleAttribute::request_ref("geolocation").into(),
    )
}

fn compile_execute_count(rule: &ExecuteCountRule) -> AttributeNode {
    AttributeNode::compare(
        ComparisonOperator::Gt,
        AttributeNode::single("execution_num", rule.max.to_string()),
        SingleAttribute::request_ref("execution_num").into(),
    )
}

fn compile_multiple(rule: &MultipleRule) -> AttributeNode {
    let compiled = rule.members.iter().map(Rule::compile).collect();
    // Members are non-empty, so this never collapses to Empty.
    AttributeNode::combine(rule.satisfy.operator(), compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn window(from: i64, until: i64) -> Rule {
        Rule::new(
            TimeRule {
                from: Timestamp::from_epoch_secs(from).unwrap(),
                until: Timestamp::from_epoch_secs(until).unwrap(),
            }
            .into(),
        )
    }

    #[test]
    fn time_rule_tree() {
        assert_eq!(
            window(1000, 2000).compile().to_value(),
            json!({
                "operation": "and",
                "attribute_list": [
                    {"operation": "leq", "attribute_list": [
                        {"type": "time", "value": "1000"},
                        {"type": "request.time.type", "value": "request.time.value"}
                    ]},
                    {"operation": "geq", "attribute_list": [
                        {"type": "time", "value": "2000"},
                        {"type": "request.time.type", "value": "request.time.value"}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn compiler_does_not_reorder_inverted_window() {
        let v = window(2000, 1000).compile().to_value();
        assert_eq!(v["attribute_list"][0]["attribute_list"][0]["value"], "2000");
        assert_eq!(v["attribute_list"][1]["attribute_list"][0]["value"], "1000");
    }

    #[test]
    fn location_kilometers_divides() {
        let rule = LocationRule {
            latitude: 45.5,
            longitude: -73.25,
            radius: 10.0,
            unit: LocationUnit::Kilometers,
        };
        assert_eq!(rule.geolocation_value(), "45.5,-73.25,0.01");
    }

    #[test]
    fn location_tree_shape() {
        let rule = Rule::new(
            LocationRule {
                latitude: 10.0,
                longitude: 20.0,
                radius: 1000.0,
                unit: LocationUnit::Kilometers,
            }
            .into(),
        );
        assert_eq!(
            rule.compile().to_value(),
            json!({
                "operation": "geq",
                "attribute_list": [
                    {"type": "geolocation", "value": "10.0,20.0,1.0"},
                    {"type": "request.geolocation.type", "value": "request.geolocation.value"}
                ]
            })
        );
    }

    #[test]
    fn execute_count_tree() {
        let node = compile(&ExecuteCountRule { max: 3 }.into());
        assert_eq!(
            node.to_value(),
            json!({
                "operation": "gt",
                "attribute_list": [
                    {"type": "execution_num", "value": "3"},
                    {"type": "request.execution_num.type", "value": "request.execution_num.value"}
                ]
            })
        );
    }

    #[test]
    fn group_of_two_uses_satisfy_operator() {
        let group = MultipleRule::new(vec![window(1, 2), window(3, 4)], SatisfyType::Any).unwrap();
        match compile(&group.into()) {
            AttributeNode::Logical { operator, operands } => {
                assert_eq!(operator, LogicalOperator::Or);
                assert_eq!(operands.len(), 2);
            }
            other => panic!("expected logical, got {other:?}"),
        }
    }

    #[test]
    fn empty_group_rejected() {
        assert_eq!(
            MultipleRule::new(vec![], SatisfyType::All).unwrap_err(),
            ValidationError::EmptyRuleGroup
        );
    }

    #[test]
    fn nested_groups_stay_list_like() {
        let inner = Rule::new(MultipleRule::new(vec![window(1, 2)], SatisfyType::All).unwrap().into());
        let outer = MultipleRule::new(vec![inner, window(5, 6)], SatisfyType::All).unwrap();
        let node = compile(&outer.into());
        assert!(AttributeNode::from_value(&node.to_value()).is_some());
    }

    #[test]
    fn rule_equality_is_by_id() {
        let id = RuleId::new();
        let a = Rule::with_id(id, ExecuteCountRule { max: 1 }.into());
        let b = Rule::with_id(id, ExecuteCountRule { max: 2 }.into());
        assert_eq!(a, b);
        assert_ne!(window(1, 2), window(1, 2));
    }

    #[test]
    fn unit_names() {
        assert_eq!(LocationUnit::Kilometers.short_name(), "km");
        assert_eq!(LocationUnit::Miles.short_name(), "mi");
        assert_eq!(LocationUnit::Miles.to_string(), "miles");
        assert_eq!(LocationUnit::Kilometers.to_string(), "kilometers");
    }

    #[test]
    fn compile_is_idempotent() {
        let rule = window(100, 200);
        assert_eq!(rule.compile(), rule.compile());
    }
}
