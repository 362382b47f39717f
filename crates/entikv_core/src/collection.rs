//! Per-type entity access.
//!
//! An [`EntityCollection`] binds an [`EntityType`] to a [`StoreClient`] and
//! turns entity operations into store operations:
//!
//! - `create` writes the entity row and its label shadow row in one
//!   transaction, each guarded by "item must not exist", optionally bumping
//!   a counter on the parent row in the same transaction
//! - `get`, `update`, `increment` and `decrement` address one row by its
//!   instance key
//! - `all`, `some` and `count` scan the table with a key-range filter
//!
//! Nothing is retried. A failed create leaves no rows behind.

use crate::client::StoreClient;
use crate::error::{ConflictKind, CoreError, CoreResult};
use crate::id::resolve_id;
use crate::keys::{
    instance_key, parent_self_key, scope_range, sort_between, sort_range, unique_label_key,
    validate_id, EntityType, KeyRange, ID_SEPARATOR, SCOPE_SEPARATOR,
};
use crate::record::{AttributeRecord, ID_ATTRIBUTE, RESERVED_ATTRIBUTES};
use crate::scan::PagedScanner;
use entikv_codec::{Item, Value};
use entikv_store::{
    CancellationReason, Condition, ExpressionNames, ExpressionValues, Filter, ItemKey, StoreError,
    TransactOp, UpdateExpression, PARTITION_KEY, SORT_KEY,
};
use tracing::{debug, info};

/// Handle to one stored entity.
///
/// For top-level entities both halves name the entity itself. For child
/// entities the partition half names the parent and the sort half the
/// child.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityItem {
    /// Prefix of the partition owner.
    pub partition_prefix: String,
    /// Id of the partition owner.
    pub partition_id: String,
    /// Prefix of the entity's own type.
    pub sort_prefix: String,
    /// The entity's own id.
    pub sort_id: String,
    /// Attributes known when the handle was made.
    pub attributes: Item,
}

impl EntityItem {
    /// Returns the entity's own id.
    pub fn id(&self) -> &str {
        &self.sort_id
    }

    /// Returns true if the entity lives under a parent.
    pub fn is_composite(&self) -> bool {
        self.partition_prefix != self.sort_prefix
    }

    /// Returns the `(prefix, id)` of the parent of a child entity.
    pub fn parent(&self) -> Option<(&str, &str)> {
        self.is_composite()
            .then(|| (self.partition_prefix.as_str(), self.partition_id.as_str()))
    }

    /// Returns the key of the entity row.
    pub fn key(&self) -> ItemKey {
        instance_key(&self.sort_prefix, &self.sort_id, self.parent())
    }
}

/// Options for [`EntityCollection::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Use this id instead of generating one.
    pub override_id: Option<String>,
    /// Counter attribute on the parent row to increment with the create.
    pub parent_counter: Option<String>,
}

impl CreateOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id to use.
    #[must_use]
    pub fn with_override_id(mut self, id: impl Into<String>) -> Self {
        self.override_id = Some(id.into());
        self
    }

    /// Sets the parent counter to increment.
    #[must_use]
    pub fn with_parent_counter(mut self, counter: impl Into<String>) -> Self {
        self.parent_counter = Some(counter.into());
        self
    }
}

type Scope<'a> = Option<(&'a str, &'a str)>;

/// Entity operations for one [`EntityType`].
#[derive(Debug, Clone)]
pub struct EntityCollection {
    entity_type: EntityType,
    client: StoreClient,
}

impl EntityCollection {
    /// Binds `entity_type` to `client`.
    pub fn new(client: StoreClient, entity_type: EntityType) -> Self {
        Self {
            entity_type,
            client,
        }
    }

    /// Returns the entity type.
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Returns the client.
    pub fn client(&self) -> &StoreClient {
        &self.client
    }

    fn prefix(&self) -> &str {
        self.entity_type.prefix()
    }

    /// Resolves the parent scope, checking it against the type.
    fn scope<'p>(&self, parent: Option<&'p EntityItem>) -> CoreResult<Scope<'p>> {
        match (self.entity_type.parent(), parent) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(CoreError::validation(format!(
                "{} entities are top-level and take no parent",
                self.prefix()
            ))),
            (Some(parent_type), None) => Err(CoreError::validation(format!(
                "{} entities require a {} parent",
                self.prefix(),
                parent_type.prefix()
            ))),
            (Some(parent_type), Some(parent)) => {
                if parent.is_composite() || parent.sort_prefix != parent_type.prefix() {
                    return Err(CoreError::validation(format!(
                        "{} entities require a {} parent, got {}",
                        self.prefix(),
                        parent_type.prefix(),
                        parent.key().partition
                    )));
                }
                Ok(Some((parent.sort_prefix.as_str(), parent.sort_id.as_str())))
            }
        }
    }

    /// Returns the key of `item`, checking it belongs to this type.
    fn key_of(&self, item: &EntityItem) -> CoreResult<ItemKey> {
        let parent_prefix = self.entity_type.parent().map(EntityType::prefix);
        let item_parent = item.parent().map(|(prefix, _)| prefix);
        if item.sort_prefix != self.prefix() || item_parent != parent_prefix {
            return Err(CoreError::validation(format!(
                "{} is not a {} entity",
                item.key(),
                self.prefix()
            )));
        }
        Ok(item.key())
    }

    /// Makes a handle to an existing entity without reading it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the id is malformed or the parent
    /// does not fit the type.
    pub fn item(&self, parent: Option<&EntityItem>, id: &str) -> CoreResult<EntityItem> {
        validate_id(id)?;
        let scope = self.scope(parent)?;
        Ok(self.handle(scope, id.to_string(), Item::new()))
    }

    /// Makes a handle from a row returned by [`all`](Self::all) or
    /// [`some`](Self::some).
    ///
    /// # Errors
    ///
    /// Returns a validation error if the row is not an entity of this type
    /// or was projected without its key and `id` attributes.
    pub fn from_row(&self, row: Item) -> CoreResult<EntityItem> {
        let key = ItemKey::from_item(&row)?;
        let id = row
            .get(ID_ATTRIBUTE)
            .and_then(Value::as_text)
            .ok_or_else(|| CoreError::validation(format!("row {key} has no text id")))?
            .to_string();
        let parent_id = match self.entity_type.parent() {
            Some(parent_type) => key
                .partition
                .strip_prefix(parent_type.prefix())
                .and_then(|rest| rest.strip_prefix(ID_SEPARATOR))
                .and_then(|rest| rest.split(SCOPE_SEPARATOR).next())
                .map(|pid| (parent_type.prefix(), pid)),
            None => None,
        };
        let expected = instance_key(self.prefix(), &id, parent_id);
        if expected != key {
            return Err(CoreError::validation(format!(
                "row {key} is not a {} entity",
                self.prefix()
            )));
        }
        Ok(self.handle(parent_id, id, row))
    }

    fn handle(&self, scope: Scope<'_>, id: String, attributes: Item) -> EntityItem {
        let (partition_prefix, partition_id) = match scope {
            Some((prefix, pid)) => (prefix.to_string(), pid.to_string()),
            None => (self.prefix().to_string(), id.clone()),
        };
        EntityItem {
            partition_prefix,
            partition_id,
            sort_prefix: self.prefix().to_string(),
            sort_id: id,
            attributes,
        }
    }

    /// Creates an entity with a label unique within its scope.
    ///
    /// The entity row, its label shadow row and, with
    /// [`CreateOptions::parent_counter`], an increment of the parent's
    /// counter are written in one transaction.
    ///
    /// # Errors
    ///
    /// - `Conflict { DuplicateId }` if the id is taken
    /// - `Conflict { DuplicateLabel }` if the label is taken in the scope
    /// - `NotFound` if the parent counter targets a missing parent row
    /// - `Validation` for a malformed record, id or parent
    pub fn create(
        &self,
        parent: Option<&EntityItem>,
        mut record: AttributeRecord,
        options: CreateOptions,
    ) -> CoreResult<EntityItem> {
        record.validate()?;
        if let Some(id) = options.override_id.as_deref() {
            validate_id(id)?;
        }
        let scope = self.scope(parent)?;
        let prefix = self.prefix();

        let id = resolve_id(options.override_id.as_deref());
        let key = instance_key(prefix, &id, scope);
        let label_key = unique_label_key(prefix, scope, record.label());

        let mut primary = record.serialize();
        primary.extend(key.to_item());
        primary.insert(ID_ATTRIBUTE.to_string(), Value::Text(id.clone()));

        let mut shadow = label_key.to_item();
        shadow.insert(ID_ATTRIBUTE.to_string(), Value::Text(id.clone()));

        let table = self.client.table();
        let mut ops = vec![
            TransactOp::put(table, primary.clone(), Some(Condition::item_absent())),
            TransactOp::put(table, shadow, Some(Condition::item_absent())),
        ];

        let mut parent_key = None;
        if let Some(counter) = &options.parent_counter {
            let Some((parent_prefix, parent_id)) = scope else {
                return Err(CoreError::validation(format!(
                    "{prefix} entities have no parent counter to increment"
                )));
            };
            let target = parent_self_key(parent_prefix, parent_id);
            let (expression, values) = counter_update(counter, 1);
            ops.push(TransactOp::update(
                table,
                target.clone(),
                expression,
                values,
                Some(Condition::item_present()),
            ));
            parent_key = Some(target);
        }

        self.client.transact_write(ops).map_err(|err| {
            match err.first_cancelled() {
                Some((0, CancellationReason::ConditionalCheckFailed)) => {
                    CoreError::conflict(ConflictKind::DuplicateId, &key)
                }
                Some((1, CancellationReason::ConditionalCheckFailed)) => {
                    CoreError::conflict(ConflictKind::DuplicateLabel, &label_key)
                }
                Some((2, CancellationReason::ConditionalCheckFailed)) => match &parent_key {
                    Some(parent_key) => CoreError::not_found(parent_key),
                    None => CoreError::from(err),
                },
                Some((_, CancellationReason::ValidationError(message))) => {
                    CoreError::validation(message.clone())
                }
                _ => CoreError::from(err),
            }
        })?;

        info!(
            table = %table,
            pk = %key.partition,
            sk = %key.sort,
            label = %record.label(),
            "created entity"
        );
        Ok(self.handle(scope, id, primary))
    }

    /// Reads the entity row with a strongly consistent read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the row does not exist.
    pub fn get(&self, item: &EntityItem) -> CoreResult<Item> {
        let key = self.key_of(item)?;
        self.client.get(&key)?.ok_or_else(|| CoreError::not_found(&key))
    }

    /// Atomically adds one to `counter` on the entity row.
    ///
    /// A missing counter starts from zero.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the row does not exist, or a validation error
    /// if the counter holds a non-integer.
    pub fn increment(&self, item: &EntityItem, counter: &str) -> CoreResult<()> {
        self.add(item, counter, 1)
    }

    /// Atomically subtracts one from `counter` on the entity row.
    ///
    /// # Errors
    ///
    /// Same as [`increment`](Self::increment).
    pub fn decrement(&self, item: &EntityItem, counter: &str) -> CoreResult<()> {
        self.add(item, counter, -1)
    }

    fn add(&self, item: &EntityItem, counter: &str, delta: i64) -> CoreResult<()> {
        let key = self.key_of(item)?;
        let (expression, values) = counter_update(counter, delta);
        let op = TransactOp::update(
            self.client.table(),
            key.clone(),
            expression,
            values,
            Some(Condition::item_present()),
        );
        self.client
            .transact_write(vec![op])
            .map_err(|err| match err.first_cancelled() {
                Some((_, CancellationReason::ConditionalCheckFailed)) => CoreError::not_found(&key),
                Some((_, CancellationReason::ValidationError(message))) => {
                    CoreError::validation(message.clone())
                }
                _ => CoreError::from(err),
            })?;
        debug!(pk = %key.partition, sk = %key.sort, counter, delta, "counter updated");
        Ok(())
    }

    /// Applies `expression` to the entity row and returns the attributes
    /// it wrote.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the row does not exist, or a validation error
    /// if the expression writes a managed attribute (keys, `id`, `label`,
    /// timestamps) or references an undefined placeholder. Labels only
    /// change together with their shadow row, so `label` is never writable
    /// here.
    pub fn update(
        &self,
        item: &EntityItem,
        expression: UpdateExpression,
        values: ExpressionValues,
    ) -> CoreResult<Item> {
        let key = self.key_of(item)?;
        if let Some(name) = expression
            .targets()?
            .into_iter()
            .find(|name| RESERVED_ATTRIBUTES.contains(name))
        {
            return Err(CoreError::validation(format!(
                "cannot update managed attribute {name}"
            )));
        }
        self.client
            .update(&key, &expression, &values, Some(&Condition::item_present()))
            .map_err(|err| match err {
                StoreError::ConditionalCheckFailed => CoreError::not_found(&key),
                other => CoreError::from(other),
            })
    }

    /// Changes an entity's label.
    ///
    /// Not available: moving the label shadow row atomically is not
    /// implemented. Always fails without touching the store.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::Unsupported`].
    pub fn rename(&self, _item: &EntityItem, _new_label: &str) -> CoreResult<EntityItem> {
        Err(CoreError::unsupported("rename"))
    }

    /// Returns every entity of this type in the parent's scope.
    ///
    /// Runs a full-table scan; cost grows with the table, not the result.
    /// An empty `projection` returns whole rows.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the parent does not fit the type, or
    /// the first store error.
    pub fn all(&self, parent: Option<&EntityItem>, projection: &[&str]) -> CoreResult<Vec<Item>> {
        let scope = self.scope(parent)?;
        let sort = if scope.is_none() {
            Some(sort_range(self.prefix()))
        } else {
            None
        };
        self.scan_scope(scope, sort, projection)
    }

    /// Returns the entities of this type in the parent's scope whose ids
    /// lie in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the parent does not fit the type,
    /// either bound is not a well-formed id or `start > end`, or the first
    /// store error.
    pub fn some(
        &self,
        parent: Option<&EntityItem>,
        start: &str,
        end: &str,
        projection: &[&str],
    ) -> CoreResult<Vec<Item>> {
        validate_id(start)?;
        validate_id(end)?;
        let scope = self.scope(parent)?;
        let sort = sort_between(self.prefix(), start, end);
        self.scan_scope(scope, Some(sort), projection)
    }

    /// Returns the number of rows [`all`](Self::all) would return.
    ///
    /// # Errors
    ///
    /// Same as [`all`](Self::all).
    pub fn count(&self, parent: Option<&EntityItem>) -> CoreResult<usize> {
        Ok(self.all(parent, &[PARTITION_KEY])?.len())
    }

    fn scan_scope(
        &self,
        scope: Scope<'_>,
        sort: Option<KeyRange>,
        projection: &[&str],
    ) -> CoreResult<Vec<Item>> {
        let partition = scope_range(self.prefix(), scope);
        let mut names = ExpressionNames::new();
        let mut values = ExpressionValues::new();

        names.insert("#pk".to_string(), PARTITION_KEY.to_string());
        values.insert(":start".to_string(), Value::Text(partition.start));
        values.insert(":end".to_string(), Value::Text(partition.end));
        let mut filter = Filter::between("#pk", ":start", ":end");

        if let Some(sort) = sort {
            names.insert("#sk".to_string(), SORT_KEY.to_string());
            values.insert(":sk_start".to_string(), Value::Text(sort.start));
            values.insert(":sk_end".to_string(), Value::Text(sort.end));
            filter = filter.and(Filter::between("#sk", ":sk_start", ":sk_end"));
        }

        let projection = projection.iter().map(|name| (*name).to_string()).collect();
        PagedScanner::new(&self.client).scan(filter, names, values, projection)
    }
}

fn counter_update(counter: &str, delta: i64) -> (UpdateExpression, ExpressionValues) {
    let expression = UpdateExpression::new()
        .add("#val", ":inc")
        .name("#val", counter);
    let mut values = ExpressionValues::new();
    values.insert(":inc".to_string(), Value::Integer(delta));
    (expression, values)
}
