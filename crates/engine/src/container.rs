//! Container: the document store
//!
//! A [`Container`] owns every partition and document for one logical
//! collection. It is `Send + Sync`; share it behind an `Arc`.
//!
//! ## Write path
//!
//! 1. Normalize the body: must be an object, system properties stripped,
//!    id assigned or validated, limits checked, partition key extracted
//! 2. Lock the document's slot
//! 3. Check existence and the caller's version token
//! 4. Issue a fresh token and store the new document
//!
//! Steps 2 to 4 run inside one slot critical section, so a failed check
//! never leaves a partial write behind.

use quire_core::{
    strip_system_properties, Document, DocumentLimits, JsonValue, KeySchema, PartitionKey,
    PatchEngine, PatchOperation, QuireError, QuireResult, Timestamp, VersionGuard, VersionToken,
};
use quire_storage::PartitionedStore;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::ContainerConfig;
use crate::feed::FeedIterator;
use crate::query::{QueryDefinition, QueryOptions};

/// Per-request options for single-document writes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemOptions {
    /// Expected current version token
    pub if_match: Option<VersionToken>,
}

impl ItemOptions {
    /// No preconditions
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the stored token to equal `token`
    pub fn if_match(token: impl Into<VersionToken>) -> Self {
        Self {
            if_match: Some(token.into()),
        }
    }
}

/// Partition-keyed document store
#[derive(Debug)]
pub struct Container {
    name: String,
    schema: KeySchema,
    limits: DocumentLimits,
    page_size: usize,
    store: PartitionedStore,
    versions: VersionGuard,
    patcher: PatchEngine,
}

impl Container {
    /// Create an empty container
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Config`] if `config` does not validate.
    pub fn new(config: ContainerConfig) -> QuireResult<Self> {
        config.validate()?;
        let schema = config.key_schema()?;
        info!(
            target: "quire::container",
            container = %config.name,
            partition_key = %schema.partition_key_path(),
            id_field = %schema.id_field(),
            "Container created"
        );
        Ok(Self {
            patcher: PatchEngine::new(schema.clone(), config.limits),
            name: config.name,
            schema,
            limits: config.limits,
            page_size: config.default_page_size,
            store: PartitionedStore::new(),
            versions: VersionGuard::new(),
        })
    }

    /// Create an empty container from a `quire.toml` file
    pub fn from_file(path: &Path) -> QuireResult<Self> {
        Self::new(ContainerConfig::from_file(path)?)
    }

    /// Container name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id field and partition-key path
    pub fn key_schema(&self) -> &KeySchema {
        &self.schema
    }

    /// Limits enforced on writes
    pub fn limits(&self) -> &DocumentLimits {
        &self.limits
    }

    // ========================================================================
    // Single-document operations
    // ========================================================================

    /// Insert a new document
    ///
    /// A missing id is filled with a fresh UUID.
    ///
    /// # Errors
    ///
    /// - `Conflict` if (partition, id) is already occupied
    /// - `InvalidInput` if the body is not an object, the id or partition key
    ///   is invalid, or a limit is exceeded
    pub fn create_item(&self, document: impl Into<JsonValue>) -> QuireResult<Document> {
        let mut body = self.normalize(document)?;
        let id = match self.schema.extract_id(&body)? {
            Some(id) => id,
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                if let Some(obj) = body.as_object_mut() {
                    obj.insert(self.schema.id_field().to_string(), serde_json::Value::String(id.clone()));
                }
                id
            }
        };
        let key = self.check_body(&body)?;

        let stored = self.store.write(&key, &id, |state| {
            if state.document().is_some() {
                return Err(QuireError::conflict(id.clone(), &key));
            }
            let document = self.stamp(id.clone(), key.clone(), body);
            state.put(document.clone());
            Ok(document)
        })?;
        debug!(target: "quire::container", partition = %key, id = %id, etag = %stored.etag(), "Document created");
        Ok(stored)
    }

    /// Current document at (partition, id)
    pub fn read_item(&self, id: &str, partition_key: &PartitionKey) -> QuireResult<Document> {
        self.store
            .get(partition_key, id)
            .ok_or_else(|| QuireError::not_found(id, partition_key))
    }

    /// Insert or overwrite a document
    ///
    /// With `if_match` set, an existing document is only overwritten if its
    /// token matches; an absent document is created regardless.
    ///
    /// # Errors
    ///
    /// - `PreconditionFailed` if the stored token differs from `if_match`
    /// - `InvalidInput` as for [`Container::create_item`], or if the id is missing
    pub fn upsert_item(&self, document: impl Into<JsonValue>, options: &ItemOptions) -> QuireResult<Document> {
        let body = self.normalize(document)?;
        let id = self.schema.require_id(&body)?;
        let key = self.check_body(&body)?;

        let stored = self.store.write(&key, &id, |state| {
            if let (Some(current), Some(expected)) = (state.document(), &options.if_match) {
                if !VersionGuard::check(expected, current.etag()) {
                    return Err(QuireError::precondition_failed(id.clone(), &key));
                }
            }
            let document = self.stamp(id.clone(), key.clone(), body);
            state.put(document.clone());
            Ok(document)
        })?;
        debug!(target: "quire::container", partition = %key, id = %id, etag = %stored.etag(), "Document upserted");
        Ok(stored)
    }

    /// Overwrite an existing document
    ///
    /// The body's id and partition key must match the addressed slot.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing is stored at (partition, id)
    /// - `PreconditionFailed` if the stored token differs from `if_match`
    /// - `InvalidInput` if the body addresses a different slot
    pub fn replace_item(
        &self,
        id: &str,
        partition_key: &PartitionKey,
        document: impl Into<JsonValue>,
        options: &ItemOptions,
    ) -> QuireResult<Document> {
        let body = self.normalize(document)?;
        let body_id = self.schema.require_id(&body)?;
        let key = self.check_body(&body)?;
        if body_id != id || &key != partition_key {
            return Err(QuireError::invalid_input(format!(
                "replacement addresses '{}' in partition {}, expected '{}' in partition {}",
                body_id, key, id, partition_key
            )));
        }

        let stored = self
            .store
            .write_existing(partition_key, id, |state| {
                let current = state
                    .document()
                    .ok_or_else(|| QuireError::not_found(id, partition_key))?;
                self.check_precondition(current, options, id, partition_key)?;
                let document = self.stamp(id.to_string(), key.clone(), body);
                state.put(document.clone());
                Ok(document)
            })
            .unwrap_or_else(|| Err(QuireError::not_found(id, partition_key)))?;
        debug!(target: "quire::container", partition = %key, id = %id, etag = %stored.etag(), "Document replaced");
        Ok(stored)
    }

    /// Apply a patch batch atomically
    ///
    /// Either every operation applies and the result is stored with a new
    /// token, or the stored document is left untouched.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing is stored at (partition, id)
    /// - `PreconditionFailed` if the stored token differs from `if_match`
    /// - `InvalidPatch` naming the first operation that could not apply
    pub fn patch_item(
        &self,
        id: &str,
        partition_key: &PartitionKey,
        operations: &[PatchOperation],
        options: &ItemOptions,
    ) -> QuireResult<Document> {
        let stored = self
            .store
            .write_existing(partition_key, id, |state| {
                let current = state
                    .document()
                    .ok_or_else(|| QuireError::not_found(id, partition_key))?;
                self.check_precondition(current, options, id, partition_key)?;
                let mut patched = self.patcher.apply(current.body(), operations)?.into_inner();
                strip_system_properties(&mut patched);
                let document = self.stamp(id.to_string(), partition_key.clone(), patched);
                state.put(document.clone());
                Ok(document)
            })
            .unwrap_or_else(|| Err(QuireError::not_found(id, partition_key)))?;
        debug!(
            target: "quire::container",
            partition = %partition_key,
            id = %id,
            operations = operations.len(),
            etag = %stored.etag(),
            "Document patched"
        );
        Ok(stored)
    }

    /// Remove a document
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing is stored at (partition, id)
    /// - `PreconditionFailed` if the stored token differs from `if_match`
    pub fn delete_item(&self, id: &str, partition_key: &PartitionKey, options: &ItemOptions) -> QuireResult<()> {
        self.store
            .write_existing(partition_key, id, |state| {
                let current = state
                    .document()
                    .ok_or_else(|| QuireError::not_found(id, partition_key))?;
                self.check_precondition(current, options, id, partition_key)?;
                state.take();
                Ok(())
            })
            .unwrap_or_else(|| Err(QuireError::not_found(id, partition_key)))?;
        debug!(target: "quire::container", partition = %partition_key, id = %id, "Document deleted");
        Ok(())
    }

    /// Documents that exist among `items`, in request order
    pub fn read_many<S: AsRef<str>>(&self, items: &[(S, PartitionKey)]) -> Vec<Document> {
        items
            .iter()
            .filter_map(|(id, key)| self.store.get(key, id.as_ref()))
            .collect()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Run a filter inside one partition
    ///
    /// ```
    /// use quire_engine::{Container, ContainerConfig};
    /// use serde_json::json;
    ///
    /// let container = Container::new(ContainerConfig::new("people", "/pk")).unwrap();
    /// container.create_item(json!({"id": "A", "pk": "p", "name": "Ada"})).unwrap();
    /// let found: Vec<_> = container
    ///     .query(&"p".into(), "name = @n", [("@n", "Ada")])
    ///     .unwrap()
    ///     .collect();
    /// assert_eq!(found.len(), 1);
    /// ```
    pub fn query<I, K, V>(&self, partition_key: &PartitionKey, filter: &str, parameters: I) -> QuireResult<FeedIterator>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        let definition = parameters
            .into_iter()
            .fold(QueryDefinition::new(filter), |definition, (name, value)| {
                definition.with_parameter(name, value)
            });
        self.query_items(&definition, &QueryOptions::new().with_partition_key(partition_key.clone()))
    }

    /// Run a query with explicit scope and paging
    ///
    /// Without a partition key in `options`, a filter that pins the
    /// partition-key field is routed to that partition; anything else fans
    /// out over every partition in partition-key order.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` if the text is malformed or a parameter is unbound.
    pub fn query_items(&self, query: &QueryDefinition, options: &QueryOptions) -> QuireResult<FeedIterator> {
        let filter = query.compile()?;
        let page_size = options.max_item_count.unwrap_or(self.page_size);

        let routed = options.partition_key.clone().or_else(|| {
            filter
                .pinned(self.schema.partition_key_path())
                .and_then(PartitionKey::from_json)
        });
        let partitions = match routed {
            Some(key) => self.store.partition(&key).into_iter().collect(),
            None => {
                warn!(
                    target: "quire::container",
                    container = %self.name,
                    filter = %filter,
                    "Cross-partition query"
                );
                self.store.partitions_sorted()
            }
        };
        Ok(FeedIterator::new(partitions, filter, page_size))
    }

    // ========================================================================
    // Counts
    // ========================================================================

    /// Number of stored documents
    pub fn item_count(&self) -> usize {
        self.store.document_count()
    }

    /// Number of partitions holding at least one document
    pub fn partition_count(&self) -> usize {
        self.store.partition_count()
    }

    /// Partition-key values in sorted order
    pub fn partition_keys(&self) -> Vec<PartitionKey> {
        self.store.partition_keys()
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Object check and system-property stripping
    fn normalize(&self, document: impl Into<JsonValue>) -> QuireResult<serde_json::Value> {
        let mut body = document.into().into_inner();
        if !body.is_object() {
            return Err(QuireError::invalid_input(format!(
                "document must be a JSON object, found {}",
                quire_core::json::value_type_name(&body)
            )));
        }
        strip_system_properties(&mut body);
        Ok(body)
    }

    /// Limit check and partition-key extraction
    fn check_body(&self, body: &serde_json::Value) -> QuireResult<PartitionKey> {
        quire_core::json::validate_limits(body, &self.limits)
            .map_err(|e| QuireError::invalid_input(e.to_string()))?;
        self.schema.extract_partition_key(body)
    }

    fn check_precondition(
        &self,
        current: &Document,
        options: &ItemOptions,
        id: &str,
        partition_key: &PartitionKey,
    ) -> QuireResult<()> {
        match &options.if_match {
            Some(expected) if !VersionGuard::check(expected, current.etag()) => {
                Err(QuireError::precondition_failed(id, partition_key))
            }
            _ => Ok(()),
        }
    }

    fn stamp(&self, id: String, partition_key: PartitionKey, body: serde_json::Value) -> Document {
        let etag = self.versions.issue(&body);
        Document::new(id, partition_key, JsonValue::from(body), etag, Timestamp::now())
    }
}
