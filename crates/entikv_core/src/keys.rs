//! Entity key encoding.
//!
//! Every entity is stored under a partition key / sort key pair derived
//! from its type prefix and id:
//!
//! | kind                  | `PK`                            | `SK`        |
//! |-----------------------|---------------------------------|-------------|
//! | top-level entity      | `prefix#id`                     | `prefix#id` |
//! | child entity          | `parent#parentId/prefix#id`     | `prefix#id` |
//! | label shadow (global) | `@ul\prefix`                    | label       |
//! | label shadow (scoped) | `@ul\parent#parentId/prefix`    | label       |
//!
//! Prefixes and ids never contain `@`, `#`, `/` or `~`, so entity keys and
//! shadow keys cannot collide and every key of a scope sorts inside
//! `[start, start~]`.

use crate::error::{CoreError, CoreResult};
use entikv_store::ItemKey;

/// Separates a prefix from an id.
pub const ID_SEPARATOR: char = '#';

/// Separates a parent scope from a child's own key.
pub const SCOPE_SEPARATOR: char = '/';

/// Marks the partition key of a label shadow row.
pub const UNIQUE_LABEL_MARKER: &str = "@ul\\";

/// Sorts after every character allowed in prefixes and ids.
pub const SCAN_SENTINEL: char = '~';

/// An inclusive range of key strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Lowest key in the range.
    pub start: String,
    /// Highest key in the range.
    pub end: String,
}

impl KeyRange {
    fn prefixed(start: String) -> Self {
        let mut end = start.clone();
        end.push(SCAN_SENTINEL);
        Self { start, end }
    }

    /// Returns true if `key` lies within the range.
    pub fn contains(&self, key: &str) -> bool {
        self.start.as_str() <= key && key <= self.end.as_str()
    }
}

/// Immutable descriptor of one kind of entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    prefix: String,
    parent: Option<Box<EntityType>>,
}

impl EntityType {
    /// Declares a top-level entity type.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the prefix is malformed.
    pub fn new(prefix: impl Into<String>) -> CoreResult<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            prefix,
            parent: None,
        })
    }

    /// Declares an entity type whose instances live under a `parent`
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the prefix is malformed, the parent is
    /// itself composite, or both share a prefix.
    pub fn composite(prefix: impl Into<String>, parent: &EntityType) -> CoreResult<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        if parent.is_composite() {
            return Err(CoreError::validation(format!(
                "parent type {} of {prefix} is itself composite",
                parent.prefix
            )));
        }
        if parent.prefix == prefix {
            return Err(CoreError::validation(format!(
                "composite type {prefix} cannot share its parent's prefix"
            )));
        }
        Ok(Self {
            prefix,
            parent: Some(Box::new(parent.clone())),
        })
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if instances are stored under a parent.
    pub fn is_composite(&self) -> bool {
        self.parent.is_some()
    }

    /// Returns the parent type of a composite type.
    pub fn parent(&self) -> Option<&EntityType> {
        self.parent.as_deref()
    }
}

fn scoped(prefix: &str, id: &str) -> String {
    format!("{prefix}{ID_SEPARATOR}{id}")
}

fn parent_scope(parent: (&str, &str), prefix: &str) -> String {
    format!("{}{SCOPE_SEPARATOR}{prefix}", scoped(parent.0, parent.1))
}

/// Key of an entity instance.
///
/// `parent` is the `(prefix, id)` of the owning instance for child
/// entities.
pub fn instance_key(prefix: &str, id: &str, parent: Option<(&str, &str)>) -> ItemKey {
    let sort = scoped(prefix, id);
    match parent {
        Some(parent) => ItemKey::new(
            format!("{}{ID_SEPARATOR}{id}", parent_scope(parent, prefix)),
            sort,
        ),
        None => ItemKey::new(sort.clone(), sort),
    }
}

/// Key of a top-level instance addressed by its own prefix and id.
pub fn parent_self_key(prefix: &str, id: &str) -> ItemKey {
    let key = scoped(prefix, id);
    ItemKey::new(key.clone(), key)
}

/// Key of the shadow row reserving `label` within its scope.
pub fn unique_label_key(prefix: &str, parent: Option<(&str, &str)>, label: &str) -> ItemKey {
    let scope = match parent {
        Some(parent) => parent_scope(parent, prefix),
        None => prefix.to_string(),
    };
    ItemKey::new(format!("{UNIQUE_LABEL_MARKER}{scope}"), label)
}

/// Partition keys of every instance of `prefix` in the given scope.
pub fn scope_range(prefix: &str, parent: Option<(&str, &str)>) -> KeyRange {
    let start = match parent {
        Some(parent) => format!("{}{ID_SEPARATOR}", parent_scope(parent, prefix)),
        None => format!("{prefix}{ID_SEPARATOR}"),
    };
    KeyRange::prefixed(start)
}

/// Sort keys of every instance of `prefix`.
pub fn sort_range(prefix: &str) -> KeyRange {
    KeyRange::prefixed(format!("{prefix}{ID_SEPARATOR}"))
}

/// Sort keys of instances of `prefix` with ids in `[start, end]`.
pub fn sort_between(prefix: &str, start: &str, end: &str) -> KeyRange {
    KeyRange {
        start: scoped(prefix, start),
        end: scoped(prefix, end),
    }
}

/// Checks an entity type prefix.
///
/// # Errors
///
/// Returns a validation error unless the prefix is non-empty ASCII
/// alphanumerics, `_` and `-`.
pub fn validate_prefix(prefix: &str) -> CoreResult<()> {
    if prefix.is_empty() {
        return Err(CoreError::validation("entity prefix must not be empty"));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CoreError::validation(format!(
            "entity prefix {prefix:?} may only contain ASCII letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}

/// Checks an entity id.
///
/// # Errors
///
/// Returns a validation error unless the id is non-empty ASCII
/// alphanumerics, `_`, `-` and `.`.
pub fn validate_id(id: &str) -> CoreResult<()> {
    if id.is_empty() {
        return Err(CoreError::validation("entity id must not be empty"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(CoreError::validation(format!(
            "entity id {id:?} may only contain ASCII letters, digits, '_', '-' and '.'"
        )));
    }
    Ok(())
}

/// Checks an entity label.
///
/// # Errors
///
/// Returns a validation error if the label is empty or starts with the
/// shadow-row marker.
pub fn validate_label(label: &str) -> CoreResult<()> {
    if label.is_empty() {
        return Err(CoreError::validation("entity label must not be empty"));
    }
    if label.starts_with(UNIQUE_LABEL_MARKER) {
        return Err(CoreError::validation(format!(
            "entity label {label:?} starts with the reserved marker"
        )));
    }
    Ok(())
}
