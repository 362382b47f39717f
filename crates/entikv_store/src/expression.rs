//! Typed condition, filter and update expressions.
//!
//! Expressions refer to attributes either by literal name or through a
//! `#name` placeholder resolved against an [`ExpressionNames`] map, and to
//! operands through `:value` placeholders resolved against an
//! [`ExpressionValues`] map. A request is validated as a whole before the
//! store touches any row, so an unresolved placeholder never produces a
//! partial result.

use crate::error::{StoreError, StoreResult};
use crate::key::{ItemKey, PARTITION_KEY};
use entikv_codec::{Item, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Placeholder (`#name`) to attribute name.
pub type ExpressionNames = BTreeMap<String, String>;

/// Placeholder (`:value`) to operand.
pub type ExpressionValues = BTreeMap<String, Value>;

fn resolve_name<'a>(reference: &'a str, names: &'a ExpressionNames) -> StoreResult<&'a str> {
    if reference.is_empty() {
        return Err(StoreError::validation("empty attribute reference"));
    }
    if reference.starts_with('#') {
        names
            .get(reference)
            .map(String::as_str)
            .ok_or_else(|| StoreError::validation(format!("undefined name placeholder {reference}")))
    } else {
        Ok(reference)
    }
}

fn resolve_value<'a>(reference: &str, values: &'a ExpressionValues) -> StoreResult<&'a Value> {
    if !reference.starts_with(':') {
        return Err(StoreError::validation(format!(
            "value reference {reference} must start with ':'"
        )));
    }
    values
        .get(reference)
        .ok_or_else(|| StoreError::validation(format!("undefined value placeholder {reference}")))
}

/// A precondition on the current state of a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The item does not have the attribute (true when the item is absent).
    AttributeNotExists(String),
    /// The item exists and has the attribute.
    AttributeExists(String),
}

impl Condition {
    /// Holds only when no item exists under the target key.
    pub fn item_absent() -> Self {
        Self::AttributeNotExists(PARTITION_KEY.to_string())
    }

    /// Holds only when an item exists under the target key.
    pub fn item_present() -> Self {
        Self::AttributeExists(PARTITION_KEY.to_string())
    }

    /// Evaluates the condition against the current item, if any.
    pub fn holds(&self, existing: Option<&Item>) -> bool {
        match self {
            Self::AttributeNotExists(name) => existing.map_or(true, |item| !item.contains_key(name)),
            Self::AttributeExists(name) => existing.map_or(false, |item| item.contains_key(name)),
        }
    }
}

/// A server-side scan predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `attribute = :value`
    Equals {
        /// Attribute reference.
        attribute: String,
        /// Value placeholder.
        value: String,
    },
    /// `attribute BETWEEN :low AND :high`, both bounds inclusive.
    Between {
        /// Attribute reference.
        attribute: String,
        /// Lower bound placeholder.
        low: String,
        /// Upper bound placeholder.
        high: String,
    },
    /// `begins_with(attribute, :prefix)`
    BeginsWith {
        /// Attribute reference.
        attribute: String,
        /// Prefix placeholder.
        prefix: String,
    },
    /// Conjunction of all inner filters.
    And(Vec<Filter>),
}

impl Filter {
    /// Builds an equality filter.
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Builds an inclusive range filter.
    pub fn between(
        attribute: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self::Between {
            attribute: attribute.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// Builds a prefix filter.
    pub fn begins_with(attribute: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::BeginsWith {
            attribute: attribute.into(),
            prefix: prefix.into(),
        }
    }

    /// Combines two filters, flattening nested conjunctions.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        let mut parts = match self {
            Self::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Self::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Self::And(parts)
    }

    /// Checks that every placeholder resolves and every operand is usable.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first problem found.
    pub fn validate(&self, names: &ExpressionNames, values: &ExpressionValues) -> StoreResult<()> {
        match self {
            Self::Equals { attribute, value } => {
                resolve_name(attribute, names)?;
                resolve_value(value, values)?;
            }
            Self::Between {
                attribute,
                low,
                high,
            } => {
                resolve_name(attribute, names)?;
                let low_value = resolve_value(low, values)?;
                let high_value = resolve_value(high, values)?;
                match low_value.compare(high_value) {
                    Some(Ordering::Less | Ordering::Equal) => {}
                    Some(Ordering::Greater) => {
                        return Err(StoreError::validation(format!(
                            "BETWEEN bounds out of order: {low} > {high}"
                        )))
                    }
                    None => {
                        return Err(StoreError::validation(format!(
                            "BETWEEN bounds {low} and {high} are not comparable"
                        )))
                    }
                }
            }
            Self::BeginsWith { attribute, prefix } => {
                resolve_name(attribute, names)?;
                match resolve_value(prefix, values)? {
                    Value::Text(_) | Value::Bytes(_) => {}
                    other => {
                        return Err(StoreError::validation(format!(
                            "begins_with operand must be text or bytes, found {}",
                            other.type_name()
                        )))
                    }
                }
            }
            Self::And(parts) => {
                if parts.is_empty() {
                    return Err(StoreError::validation("empty conjunction"));
                }
                for part in parts {
                    part.validate(names, values)?;
                }
            }
        }
        Ok(())
    }

    /// Evaluates the filter against one item.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a placeholder does not resolve.
    pub fn matches(
        &self,
        item: &Item,
        names: &ExpressionNames,
        values: &ExpressionValues,
    ) -> StoreResult<bool> {
        Ok(match self {
            Self::Equals { attribute, value } => {
                let expected = resolve_value(value, values)?;
                item.get(resolve_name(attribute, names)?) == Some(expected)
            }
            Self::Between {
                attribute,
                low,
                high,
            } => match item.get(resolve_name(attribute, names)?) {
                Some(actual) => {
                    let low = resolve_value(low, values)?;
                    let high = resolve_value(high, values)?;
                    matches!(
                        actual.compare(low),
                        Some(Ordering::Greater | Ordering::Equal)
                    ) && matches!(actual.compare(high), Some(Ordering::Less | Ordering::Equal))
                }
                None => false,
            },
            Self::BeginsWith { attribute, prefix } => {
                match (
                    item.get(resolve_name(attribute, names)?),
                    resolve_value(prefix, values)?,
                ) {
                    (Some(Value::Text(actual)), Value::Text(prefix)) => actual.starts_with(prefix.as_str()),
                    (Some(Value::Bytes(actual)), Value::Bytes(prefix)) => actual.starts_with(prefix),
                    _ => false,
                }
            }
            Self::And(parts) => {
                for part in parts {
                    if !part.matches(item, names, values)? {
                        return Ok(false);
                    }
                }
                true
            }
        })
    }
}

/// One clause of an update expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    /// `SET attribute = :value`
    Set {
        /// Attribute reference.
        attribute: String,
        /// Value placeholder.
        value: String,
    },
    /// `ADD attribute :delta`; a missing attribute starts from zero.
    Add {
        /// Attribute reference.
        attribute: String,
        /// Integer placeholder.
        value: String,
    },
    /// `REMOVE attribute`
    Remove {
        /// Attribute reference.
        attribute: String,
    },
}

impl UpdateAction {
    /// The attribute reference this action writes.
    pub fn attribute(&self) -> &str {
        match self {
            Self::Set { attribute, .. } | Self::Add { attribute, .. } | Self::Remove { attribute } => {
                attribute
            }
        }
    }
}

/// A single-item update: a list of actions plus the name placeholders
/// they use. Operand values travel separately as [`ExpressionValues`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateExpression {
    actions: Vec<UpdateAction>,
    names: ExpressionNames,
}

impl UpdateExpression {
    /// Creates an empty expression.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `SET` action.
    #[must_use]
    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.actions.push(UpdateAction::Set {
            attribute: attribute.into(),
            value: value.into(),
        });
        self
    }

    /// Appends an `ADD` action.
    #[must_use]
    pub fn add(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.actions.push(UpdateAction::Add {
            attribute: attribute.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a `REMOVE` action.
    #[must_use]
    pub fn remove(mut self, attribute: impl Into<String>) -> Self {
        self.actions.push(UpdateAction::Remove {
            attribute: attribute.into(),
        });
        self
    }

    /// Declares a `#name` placeholder.
    #[must_use]
    pub fn name(mut self, placeholder: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.names.insert(placeholder.into(), attribute.into());
        self
    }

    /// Returns the actions in order.
    pub fn actions(&self) -> &[UpdateAction] {
        &self.actions
    }

    /// Returns the declared name placeholders.
    pub fn names(&self) -> &ExpressionNames {
        &self.names
    }

    /// Resolves the attribute every action writes, in action order.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an undefined name placeholder.
    pub fn targets(&self) -> StoreResult<Vec<&str>> {
        self.actions
            .iter()
            .map(|action| resolve_name(action.attribute(), &self.names))
            .collect()
    }

    /// Checks the expression against its operand values.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the expression is empty, touches a
    /// key attribute, names the same attribute twice, leaves a
    /// placeholder unresolved or adds a non-integer.
    pub fn validate(&self, values: &ExpressionValues) -> StoreResult<()> {
        if self.actions.is_empty() {
            return Err(StoreError::validation("empty update expression"));
        }
        let mut seen = BTreeSet::new();
        for action in &self.actions {
            let attribute = match action {
                UpdateAction::Set { attribute, value } => {
                    resolve_value(value, values)?;
                    attribute
                }
                UpdateAction::Add { attribute, value } => {
                    let delta = resolve_value(value, values)?;
                    if delta.as_integer().is_none() {
                        return Err(StoreError::validation(format!(
                            "ADD operand {value} must be an integer, found {}",
                            delta.type_name()
                        )));
                    }
                    attribute
                }
                UpdateAction::Remove { attribute } => attribute,
            };
            let name = resolve_name(attribute, &self.names)?;
            if ItemKey::is_key_attribute(name) {
                return Err(StoreError::validation(format!(
                    "cannot update key attribute {name}"
                )));
            }
            if !seen.insert(name) {
                return Err(StoreError::validation(format!(
                    "attribute {name} appears in more than one action"
                )));
            }
        }
        Ok(())
    }

    /// Applies the expression to `item` in place.
    ///
    /// Returns the new values of every attribute written by `SET` or
    /// `ADD`. The expression must have been validated against `values`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `ADD` meets a non-integer attribute
    /// or overflows.
    pub fn apply(&self, item: &mut Item, values: &ExpressionValues) -> StoreResult<Item> {
        let mut updated = Item::new();
        for action in &self.actions {
            match action {
                UpdateAction::Set { attribute, value } => {
                    let name = resolve_name(attribute, &self.names)?.to_string();
                    let value = resolve_value(value, values)?.clone();
                    item.insert(name.clone(), value.clone());
                    updated.insert(name, value);
                }
                UpdateAction::Add { attribute, value } => {
                    let name = resolve_name(attribute, &self.names)?.to_string();
                    let delta = resolve_value(value, values)?
                        .as_integer()
                        .ok_or_else(|| StoreError::validation("ADD operand must be an integer"))?;
                    let current = match item.get(&name) {
                        None => 0,
                        Some(Value::Integer(n)) => *n,
                        Some(other) => {
                            return Err(StoreError::validation(format!(
                                "cannot ADD to {} attribute {name}",
                                other.type_name()
                            )))
                        }
                    };
                    let next = current.checked_add(delta).ok_or_else(|| {
                        StoreError::validation(format!("ADD overflows attribute {name}"))
                    })?;
                    item.insert(name.clone(), Value::Integer(next));
                    updated.insert(name, Value::Integer(next));
                }
                UpdateAction::Remove { attribute } => {
                    item.remove(resolve_name(attribute, &self.names)?);
                }
            }
        }
        Ok(updated)
    }
}

impl fmt::Display for UpdateExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match action {
                UpdateAction::Set { attribute, value } => write!(f, "SET {attribute} = {value}")?,
                UpdateAction::Add { attribute, value } => write!(f, "ADD {attribute} {value}")?,
                UpdateAction::Remove { attribute } => write!(f, "REMOVE {attribute}")?,
            }
        }
        Ok(())
    }
}

/// Keeps only the projected attributes of `item`.
///
/// An empty projection keeps the whole item.
///
/// # Errors
///
/// Returns a validation error if a placeholder does not resolve.
pub fn project(item: &Item, projection: &[String], names: &ExpressionNames) -> StoreResult<Item> {
    if projection.is_empty() {
        return Ok(item.clone());
    }
    let mut projected = Item::new();
    for reference in projection {
        let name = resolve_name(reference, names)?;
        if let Some(value) = item.get(name) {
            projected.insert(name.to_string(), value.clone());
        }
    }
    Ok(projected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pk: &str, sk: &str) -> Item {
        let mut item = ItemKey::new(pk, sk).to_item();
        item.insert("label".to_string(), Value::from("red"));
        item
    }

    fn values(pairs: &[(&str, Value)]) -> ExpressionValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn names(pairs: &[(&str, &str)]) -> ExpressionNames {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn conditions_on_absent_and_present_items() {
        let item = row("a", "a");
        assert!(Condition::item_absent().holds(None));
        assert!(!Condition::item_absent().holds(Some(&item)));
        assert!(!Condition::item_present().holds(None));
        assert!(Condition::item_present().holds(Some(&item)));
    }

    #[test]
    fn between_is_inclusive_and_resolves_placeholders() {
        let filter = Filter::between("#pk", ":start", ":end");
        let names = names(&[("#pk", "PK")]);
        let values = values(&[(":start", "w#".into()), (":end", "w#~".into())]);
        filter.validate(&names, &values).unwrap();

        assert!(filter.matches(&row("w#", "x"), &names, &values).unwrap());
        assert!(filter.matches(&row("w#abc", "x"), &names, &values).unwrap());
        assert!(filter.matches(&row("w#~", "x"), &names, &values).unwrap());
        assert!(!filter.matches(&row("w", "x"), &names, &values).unwrap());
        assert!(!filter.matches(&row("wx#1", "x"), &names, &values).unwrap());
    }

    #[test]
    fn between_rejects_reversed_bounds() {
        let filter = Filter::between("PK", ":start", ":end");
        let values = values(&[(":start", "b".into()), (":end", "a".into())]);
        assert!(filter.validate(&ExpressionNames::new(), &values).is_err());
    }

    #[test]
    fn unresolved_placeholders_fail_validation() {
        let filter = Filter::equals("#missing", ":v");
        let values = values(&[(":v", "x".into())]);
        assert!(filter.validate(&ExpressionNames::new(), &values).is_err());

        let filter = Filter::equals("PK", ":missing");
        assert!(filter.validate(&ExpressionNames::new(), &values).is_err());

        let filter = Filter::equals("PK", "no-colon");
        assert!(filter.validate(&ExpressionNames::new(), &values).is_err());
    }

    #[test]
    fn and_flattens_and_short_circuits() {
        let filter = Filter::equals("PK", ":pk")
            .and(Filter::begins_with("SK", ":prefix"))
            .and(Filter::equals("label", ":label"));
        match &filter {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }

        let values = values(&[
            (":pk", "a".into()),
            (":prefix", "w#".into()),
            (":label", "red".into()),
        ]);
        let names = ExpressionNames::new();
        filter.validate(&names, &values).unwrap();
        assert!(filter.matches(&row("a", "w#1"), &names, &values).unwrap());
        assert!(!filter.matches(&row("a", "x#1"), &names, &values).unwrap());
    }

    #[test]
    fn add_starts_from_zero_and_accumulates() {
        let expr = UpdateExpression::new().add("#val", ":inc").name("#val", "count");
        let values = values(&[(":inc", Value::Integer(1))]);
        expr.validate(&values).unwrap();

        let mut item = row("a", "a");
        let updated = expr.apply(&mut item, &values).unwrap();
        assert_eq!(updated.get("count"), Some(&Value::Integer(1)));
        expr.apply(&mut item, &values).unwrap();
        assert_eq!(item.get("count"), Some(&Value::Integer(2)));
    }

    #[test]
    fn add_to_text_attribute_fails() {
        let expr = UpdateExpression::new().add("label", ":inc");
        let values = values(&[(":inc", Value::Integer(1))]);
        let mut item = row("a", "a");
        assert!(expr.apply(&mut item, &values).is_err());
    }

    #[test]
    fn add_overflow_fails() {
        let expr = UpdateExpression::new().add("n", ":inc");
        let values = values(&[(":inc", Value::Integer(1))]);
        let mut item = row("a", "a");
        item.insert("n".to_string(), Value::Integer(i64::MAX));
        assert!(expr.apply(&mut item, &values).is_err());
    }

    #[test]
    fn set_and_remove_report_only_written_attributes() {
        let expr = UpdateExpression::new()
            .set("color", ":c")
            .remove("label");
        let values = values(&[(":c", "blue".into())]);
        expr.validate(&values).unwrap();

        let mut item = row("a", "a");
        let updated = expr.apply(&mut item, &values).unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(item.get("color"), Some(&Value::from("blue")));
        assert!(!item.contains_key("label"));
    }

    #[test]
    fn key_attributes_cannot_be_updated() {
        let expr = UpdateExpression::new().set("#pk", ":v").name("#pk", "PK");
        let values = values(&[(":v", "x".into())]);
        assert!(expr.validate(&values).is_err());
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let expr = UpdateExpression::new().set("a", ":v").remove("a");
        let values = values(&[(":v", "x".into())]);
        assert!(expr.validate(&values).is_err());
    }

    #[test]
    fn display_lists_actions() {
        let expr = UpdateExpression::new().add("#val", ":inc").remove("old");
        assert_eq!(expr.to_string(), "ADD #val :inc, REMOVE old");
    }

    #[test]
    fn projection_keeps_listed_attributes() {
        let item = row("a", "b");
        let names = names(&[("#l", "label")]);
        let projected = project(&item, &["#l".to_string(), "absent".to_string()], &names).unwrap();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.get("label"), Some(&Value::from("red")));
        assert_eq!(project(&item, &[], &names).unwrap(), item);
    }

    #[test]
    fn targets_resolve_name_placeholders() {
        let expression = UpdateExpression::new()
            .set("#c", ":v")
            .add("hits", ":one")
            .remove("old")
            .name("#c", "color");
        assert_eq!(expression.targets().unwrap(), vec!["color", "hits", "old"]);

        let undefined = UpdateExpression::new().remove("#gone");
        assert!(matches!(undefined.targets(), Err(StoreError::Validation(_))));
    }
}
