//! Conditional-visibility evaluation.
//!
//! Fields carry zero or more [`VisibilityCondition`] blocks. A field is
//! visible when *any* block is satisfied, and a block is satisfied when
//! *all* of its rules hold against the owning step's current value map.
//! Evaluation is pure and cheap enough to run on every keystroke.

use crate::value::{Value, ValueMap};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// The comparison applied by a single [`ConditionRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Equal,
    NotEqual,
    GreaterThan,
    SmallerThan,
    GreaterThanOrEqual,
    SmallerThanOrEqual,
    StartsWith,
    EndsWith,
    Contains,
    In,
    NotIn,
    Matches,
    Before,
    After,
    /// Operations the backend may emit that this engine does not know.
    Unknown,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Equal => "=",
            Operation::NotEqual => "!=",
            Operation::GreaterThan => ">",
            Operation::SmallerThan => "<",
            Operation::GreaterThanOrEqual => ">=",
            Operation::SmallerThanOrEqual => "<=",
            Operation::StartsWith => "startswith",
            Operation::EndsWith => "endswith",
            Operation::Contains => "contains",
            Operation::In => "in",
            Operation::NotIn => "not in",
            Operation::Matches => "matches",
            Operation::Before => "before",
            Operation::After => "after",
            Operation::Unknown => "unknown",
        }
    }
}

impl From<&str> for Operation {
    fn from(symbol: &str) -> Self {
        match symbol {
            "=" => Operation::Equal,
            "!=" => Operation::NotEqual,
            ">" => Operation::GreaterThan,
            "<" => Operation::SmallerThan,
            ">=" => Operation::GreaterThanOrEqual,
            "<=" => Operation::SmallerThanOrEqual,
            "startswith" => Operation::StartsWith,
            "endswith" => Operation::EndsWith,
            "contains" => Operation::Contains,
            "in" => Operation::In,
            "not in" => Operation::NotIn,
            "matches" => Operation::Matches,
            "before" => Operation::Before,
            "after" => Operation::After,
            _ => Operation::Unknown,
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Unrecognized symbols become `Unknown` instead of failing the schema load;
// the evaluator treats them as vacuously true.
impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Ok(Operation::from(symbol.as_str()))
    }
}

/// One comparison against a named field of the owning step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub field: String,
    pub operation: Operation,
    pub value: Value,
}

/// A conjunction of rules; the whole block holds iff every rule holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityCondition {
    pub condition_logic: Vec<ConditionRule>,
}

/// Evaluates a field's visibility against the current value map.
///
/// An empty condition list means the field is unconditionally visible; the
/// caller separately honors the field's own `is_hidden` flag, which always
/// wins. Otherwise the blocks are OR-ed and the rules within a block are
/// AND-ed.
pub fn is_visible(conditions: &[VisibilityCondition], values: &ValueMap) -> bool {
    if conditions.is_empty() {
        return true;
    }
    conditions.iter().any(|condition| {
        condition
            .condition_logic
            .iter()
            .all(|rule| rule_satisfied(rule, values))
    })
}

/// Evaluates a single rule. A rule naming an absent field reads `Null`.
pub fn rule_satisfied(rule: &ConditionRule, values: &ValueMap) -> bool {
    let current = values.get(&rule.field).unwrap_or(&Value::Null);
    let operand = &rule.value;

    match rule.operation {
        Operation::Equal => current.loose_eq(operand),
        Operation::NotEqual => !current.loose_eq(operand),
        Operation::GreaterThan => numeric_cmp(current, operand, |a, b| a > b),
        Operation::SmallerThan => numeric_cmp(current, operand, |a, b| a < b),
        Operation::GreaterThanOrEqual => numeric_cmp(current, operand, |a, b| a >= b),
        Operation::SmallerThanOrEqual => numeric_cmp(current, operand, |a, b| a <= b),
        Operation::StartsWith => current.coerce_text().starts_with(&operand.coerce_text()),
        Operation::EndsWith => current.coerce_text().ends_with(&operand.coerce_text()),
        Operation::Contains => current.coerce_text().contains(&operand.coerce_text()),
        Operation::In => membership(current, operand),
        Operation::NotIn => match operand {
            Value::List(_) => !membership(current, operand),
            // A non-list operand makes the rule false, not vacuously true.
            _ => false,
        },
        // Pattern and date comparisons are not interpreted; they fall back
        // to true so a schema using them does not hide its fields.
        Operation::Matches | Operation::Before | Operation::After | Operation::Unknown => true,
    }
}

/// Numeric comparison; either side failing coercion makes the rule false.
fn numeric_cmp(current: &Value, operand: &Value, cmp: fn(f64, f64) -> bool) -> bool {
    match (current.as_number(), operand.as_number()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// Membership test for `in`: the operand must be a list.
fn membership(current: &Value, operand: &Value) -> bool {
    match operand {
        Value::List(items) => items.iter().any(|item| item.loose_eq(current)),
        _ => false,
    }
}
