//! # Policy Attribute Trees
//!
//! A policy predicate is a tree of [`AttributeNode`]s. Leaves are
//! `{type, value}` facts or references into the incoming request
//! (`{"type": "request.time.type", "value": "request.time.value"}`); inner
//! nodes combine them with logical, comparison and conditional operators.
//!
//! ## Wire shape
//!
//! | Variant | JSON |
//! |---|---|
//! | `Empty` | `{}` |
//! | `Single` | `{"type", "value"}` |
//! | `Logical` | `{"operation": "and" \| "or", "attribute_list": [..≥2]}` |
//! | `Comparable` | `{"operation": "eq" \| "leq" \| "geq" \| "lt" \| "gt", "attribute_list": [left, right]}` |
//! | `ObligationList` | `{"obligations": [Single, ..]}` |
//! | `Conditional` | `{"operation": "if", "attribute_list": [condition, if_true, if_false]}` |
//!
//! ## Parsing
//!
//! Several shapes overlap, so [`AttributeNode::from_value`] tries the
//! variants in a fixed order: conditional, logical, comparable, obligation
//! list, single. Input matching none of them yields `None`.
//!
//! Inside a tree parsing is strict: one malformed child rejects the parent.
//! Skipping it instead would, for an `and`, silently widen a grant.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::PolicyError;

const OPERATION: &str = "operation";
const ATTRIBUTE_LIST: &str = "attribute_list";
const OBLIGATIONS: &str = "obligations";
const TYPE: &str = "type";
const VALUE: &str = "value";
const IF: &str = "if";

/// Boolean combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    /// All operands must hold.
    And,
    /// At least one operand must hold.
    Or,
}

impl LogicalOperator {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary comparisons. Operand order is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// `left == right`
    Eq,
    /// `left <= right`
    Leq,
    /// `left >= right`
    Geq,
    /// `left < right`
    Lt,
    /// `left > right`
    Gt,
}

impl ComparisonOperator {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Leq => "leq",
            Self::Geq => "geq",
            Self::Lt => "lt",
            Self::Gt => "gt",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(Self::Eq),
            "leq" => Some(Self::Leq),
            "geq" => Some(Self::Geq),
            "lt" => Some(Self::Lt),
            "gt" => Some(Self::Gt),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf fact or request reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SingleAttribute {
    /// Attribute type, e.g. `"time"` or `"request.time.type"`.
    #[serde(rename = "type")]
    pub attr_type: String,
    /// Attribute value, always carried as text.
    pub value: String,
}

impl SingleAttribute {
    /// Build a leaf.
    pub fn new(attr_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attr_type: attr_type.into(),
            value: value.into(),
        }
    }

    /// Reference to a field of the incoming request, e.g.
    /// `request_ref("time")` is `{"type": "request.time.type", "value": "request.time.value"}`.
    pub fn request_ref(field: &str) -> Self {
        Self::new(format!("request.{field}.type"), format!("request.{field}.value"))
    }

    /// Parse from a JSON object. Both fields must be strings.
    pub fn from_object(obj: &Map<String, Value>) -> Option<Self> {
        let attr_type = obj.get(TYPE)?.as_str()?;
        let value = obj.get(VALUE)?.as_str()?;
        Some(Self::new(attr_type, value))
    }
}

/// Obligations to execute on a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ObligationList {
    /// Obligations in execution order.
    pub obligations: Vec<SingleAttribute>,
}

impl ObligationList {
    /// Build a list.
    pub fn new(obligations: Vec<SingleAttribute>) -> Self {
        Self { obligations }
    }

    /// The empty list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the list holds no obligations.
    pub fn is_empty(&self) -> bool {
        self.obligations.is_empty()
    }

    /// Parse from a JSON object with an `obligations` array.
    pub fn from_object(obj: &Map<String, Value>) -> Option<Self> {
        let items = obj.get(OBLIGATIONS)?.as_array()?;
        items
            .iter()
            .map(|item| item.as_object().and_then(SingleAttribute::from_object))
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
    }

    /// Parse from any JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().and_then(Self::from_object)
    }
}

/// A node of a policy predicate tree. Every node owns its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeNode {
    /// No content. Only meaningful as a top-level policy slot.
    Empty,
    /// A leaf.
    Single(SingleAttribute),
    /// `and`/`or` over at least two list-like operands.
    Logical {
        /// Combinator.
        operator: LogicalOperator,
        /// Operands in order.
        operands: Vec<AttributeNode>,
    },
    /// A binary comparison.
    Comparable {
        /// Comparison.
        operator: ComparisonOperator,
        /// First operand.
        left: Box<AttributeNode>,
        /// Second operand.
        right: Box<AttributeNode>,
    },
    /// Obligations.
    ObligationList(ObligationList),
    /// `if condition then if_true else if_false`.
    Conditional {
        /// A list-like predicate.
        condition: Box<AttributeNode>,
        /// Obligations when the condition holds.
        if_true: ObligationList,
        /// Obligations otherwise.
        if_false: ObligationList,
    },
}

impl AttributeNode {
    /// Leaf shorthand.
    pub fn single(attr_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Single(SingleAttribute::new(attr_type, value))
    }

    /// Comparison shorthand.
    pub fn compare(operator: ComparisonOperator, left: AttributeNode, right: AttributeNode) -> Self {
        Self::Comparable {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Build a logical node, checking its invariants.
    ///
    /// # Errors
    ///
    /// `PolicyError::Parse` if fewer than two operands are given or an
    /// operand is not list-like.
    pub fn logical(operator: LogicalOperator, operands: Vec<AttributeNode>) -> Result<Self, PolicyError> {
        if operands.len() < 2 {
            return Err(PolicyError::Parse(format!(
                "'{operator}' needs at least 2 operands, got {}",
                operands.len()
            )));
        }
        if let Some(bad) = operands.iter().find(|op| !op.is_list_like()) {
            return Err(PolicyError::Parse(format!(
                "'{operator}' operand must be list-like, got {}",
                bad.kind()
            )));
        }
        Ok(Self::Logical { operator, operands })
    }

    /// Combine terms with `operator`, collapsing degenerate cases:
    /// no terms give `Empty`, one term is returned unchanged.
    pub fn combine(operator: LogicalOperator, mut terms: Vec<AttributeNode>) -> Self {
        match terms.len() {
            0 => Self::Empty,
            1 => terms.remove(0),
            _ => Self::Logical {
                operator,
                operands: terms,
            },
        }
    }

    /// Build a conditional node.
    ///
    /// # Errors
    ///
    /// `PolicyError::Parse` if `condition` is not list-like.
    pub fn conditional(
        condition: AttributeNode,
        if_true: ObligationList,
        if_false: ObligationList,
    ) -> Result<Self, PolicyError> {
        if !condition.is_list_like() {
            return Err(PolicyError::Parse(format!(
                "'if' condition must be list-like, got {}",
                condition.kind()
            )));
        }
        Ok(Self::Conditional {
            condition: Box::new(condition),
            if_true,
            if_false,
        })
    }

    /// Logical, comparable, conditional and obligation-list nodes may
    /// appear as operands of `and`/`or` and as an `if` condition.
    pub fn is_list_like(&self) -> bool {
        matches!(
            self,
            Self::Logical { .. } | Self::Comparable { .. } | Self::Conditional { .. } | Self::ObligationList(_)
        )
    }

    /// Whether this is the `Empty` node.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Short variant name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Single(_) => "single",
            Self::Logical { .. } => "logical",
            Self::Comparable { .. } => "comparable",
            Self::ObligationList(_) => "obligation list",
            Self::Conditional { .. } => "conditional",
        }
    }

    /// Parse a JSON value. `None` means the value is not a policy attribute.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        parse_conditional(obj)
            .or_else(|| parse_logical(obj))
            .or_else(|| parse_comparable(obj))
            .or_else(|| ObligationList::from_object(obj).map(Self::ObligationList))
            .or_else(|| SingleAttribute::from_object(obj).map(Self::Single))
    }

    /// Project into a JSON value.
    pub fn to_value(&self) -> Value {
        // Every variant serializes to a map of strings; this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Default for AttributeNode {
    fn default() -> Self {
        Self::Empty
    }
}

impl From<SingleAttribute> for AttributeNode {
    fn from(single: SingleAttribute) -> Self {
        Self::Single(single)
    }
}

impl From<ObligationList> for AttributeNode {
    fn from(list: ObligationList) -> Self {
        Self::ObligationList(list)
    }
}

fn operation<'a>(obj: &'a Map<String, Value>) -> Option<&'a str> {
    obj.get(OPERATION)?.as_str()
}

fn attribute_list<'a>(obj: &'a Map<String, Value>) -> Option<&'a Vec<Value>> {
    obj.get(ATTRIBUTE_LIST)?.as_array()
}

fn parse_list_like(value: &Value) -> Option<AttributeNode> {
    AttributeNode::from_value(value).filter(AttributeNode::is_list_like)
}

fn parse_conditional(obj: &Map<String, Value>) -> Option<AttributeNode> {
    if operation(obj)? != IF {
        return None;
    }
    let items = attribute_list(obj)?;
    if !(2..=3).contains(&items.len()) {
        return None;
    }
    let condition = parse_list_like(&items[0])?;
    let if_true = ObligationList::from_value(&items[1])?;
    let if_false = match items.get(2) {
        Some(item) => ObligationList::from_value(item)?,
        None => ObligationList::empty(),
    };
    Some(AttributeNode::Conditional {
        condition: Box::new(condition),
        if_true,
        if_false,
    })
}

fn parse_logical(obj: &Map<String, Value>) -> Option<AttributeNode> {
    let operator = LogicalOperator::from_name(operation(obj)?)?;
    let items = attribute_list(obj)?;
    if items.len() < 2 {
        return None;
    }
    let operands = items.iter().map(parse_list_like).collect::<Option<Vec<_>>>()?;
    Some(AttributeNode::Logical { operator, operands })
}

fn parse_comparable(obj: &Map<String, Value>) -> Option<AttributeNode> {
    let operator = ComparisonOperator::from_name(operation(obj)?)?;
    let items = attribute_list(obj)?;
    let [left, right] = items.as_slice() else {
        return None;
    };
    Some(AttributeNode::compare(
        operator,
        AttributeNode::from_value(left)?,
        AttributeNode::from_value(right)?,
    ))
}

impl Serialize for AttributeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_map(Some(0))?.end(),
            Self::Single(single) => single.serialize(serializer),
            Self::ObligationList(list) => list.serialize(serializer),
            Self::Logical { operator, operands } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(OPERATION, operator.as_str())?;
                map.serialize_entry(ATTRIBUTE_LIST, operands)?;
                map.end()
            }
            Self::Comparable { operator, left, right } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(OPERATION, operator.as_str())?;
                map.serialize_entry(ATTRIBUTE_LIST, &[left.as_ref(), right.as_ref()])?;
                map.end()
            }
            Self::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(OPERATION, IF)?;
                map.serialize_entry(ATTRIBUTE_LIST, &(condition.as_ref(), if_true, if_false))?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for AttributeNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).ok_or_else(|| D::Error::custom("malformed policy attribute"))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_single() -> impl Strategy<Value = SingleAttribute> {
        ("[a-z_.]{1,16}", "[a-zA-Z0-9#,. ]{0,16}").prop_map(|(t, v)| SingleAttribute::new(t, v))
    }

    fn arb_obligations() -> impl Strategy<Value = ObligationList> {
        prop::collection::vec(arb_single(), 0..3).prop_map(ObligationList::new)
    }

    fn arb_comparison() -> impl Strategy<Value = ComparisonOperator> {
        prop_oneof![
            Just(ComparisonOperator::Eq),
            Just(ComparisonOperator::Leq),
            Just(ComparisonOperator::Geq),
            Just(ComparisonOperator::Lt),
            Just(ComparisonOperator::Gt),
        ]
    }

    fn arb_list_like() -> impl Strategy<Value = AttributeNode> {
        let leaf = prop_oneof![
            (arb_comparison(), arb_single(), arb_single())
                .prop_map(|(op, l, r)| AttributeNode::compare(op, l.into(), r.into())),
            arb_obligations().prop_map(AttributeNode::ObligationList),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                (
                    prop_oneof![Just(LogicalOperator::And), Just(LogicalOperator::Or)],
                    prop::collection::vec(inner.clone(), 2..4)
                )
                    .prop_map(|(operator, operands)| AttributeNode::Logical { operator, operands }),
                (arb_comparison(), inner.clone(), inner.clone())
                    .prop_map(|(op, l, r)| AttributeNode::compare(op, l, r)),
                (inner, arb_obligations(), arb_obligations()).prop_map(|(c, t, f)| {
                    AttributeNode::Conditional {
                        condition: Box::new(c),
                        if_true: t,
                        if_false: f,
                    }
                }),
            ]
        })
    }

    fn arb_node() -> impl Strategy<Value = AttributeNode> {
        prop_oneof![arb_single().prop_map(AttributeNode::Single), arb_list_like()]
    }

    proptest! {
        #[test]
        fn parse_inverts_serialize(node in arb_node()) {
            let parsed = AttributeNode::from_value(&node.to_value());
            prop_assert_eq!(parsed, Some(node));
        }

        #[test]
        fn serialize_is_deterministic(node in arb_node()) {
            let a = access_core::CanonicalBytes::new(&node).unwrap();
            let b = access_core::CanonicalBytes::new(&node.clone()).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
