//! Document storage with revision-checked, all-or-nothing writes.

use std::collections::HashMap;
use std::fmt;

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use tuplegrid_codec::{from_cbor, to_canonical_cbor, Value};
use tuplegrid_core::{AssociationKey, EntityKey, IdSourceKey, NextValueRequest, Revision};

use crate::error::{MemoryError, MemoryResult};

/// Name of the collection shared by all globally stored associations.
pub const GLOBAL_ASSOCIATION_COLLECTION: &str = "Associations";

/// Prefix of per-association collection names.
pub const ASSOCIATION_COLLECTION_PREFIX: &str = "associations_";

/// Collection an association document lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssociationCollection {
    /// One collection per association table.
    Dedicated(String),
    /// The shared global collection.
    Global,
}

impl AssociationCollection {
    /// Dedicated collection of an association table.
    pub fn dedicated(table: &str) -> Self {
        Self::Dedicated(format!("{ASSOCIATION_COLLECTION_PREFIX}{table}"))
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        match self {
            Self::Dedicated(name) => name,
            Self::Global => GLOBAL_ASSOCIATION_COLLECTION,
        }
    }
}

/// Identity of one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentId {
    /// An entity document.
    Entity(EntityKey),
    /// An association document outside its owner.
    Association(AssociationCollection, AssociationKey),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Entity(key) => write!(f, "{key}"),
            DocumentId::Association(collection, key) => write!(f, "{}/{key}", collection.name()),
        }
    }
}

/// A document as stored: canonical CBOR bytes plus the revision they carry.
#[derive(Debug, Clone)]
pub(crate) struct StoredDocument {
    bytes: Vec<u8>,
    revision: Revision,
}

impl StoredDocument {
    pub(crate) fn decode(&self) -> MemoryResult<Value> {
        Ok(from_cbor(&self.bytes)?)
    }

    pub(crate) fn revision(&self) -> &Revision {
        &self.revision
    }
}

#[derive(Default)]
struct StoreState {
    entities: HashMap<EntityKey, StoredDocument>,
    association_tables: HashMap<String, HashMap<AssociationKey, StoredDocument>>,
    global_associations: HashMap<AssociationKey, StoredDocument>,
    // highest generation of any removed document; fresh inserts start above
    // it, so a re-inserted id never gets back a token it had before
    retired_generation: u64,
}

impl StoreState {
    fn get(&self, id: &DocumentId) -> Option<&StoredDocument> {
        match id {
            DocumentId::Entity(key) => self.entities.get(key),
            DocumentId::Association(AssociationCollection::Dedicated(name), key) => {
                self.association_tables.get(name).and_then(|docs| docs.get(key))
            }
            DocumentId::Association(AssociationCollection::Global, key) => {
                self.global_associations.get(key)
            }
        }
    }

    fn insert(&mut self, id: DocumentId, document: StoredDocument) {
        match id {
            DocumentId::Entity(key) => {
                self.entities.insert(key, document);
            }
            DocumentId::Association(AssociationCollection::Dedicated(name), key) => {
                self.association_tables
                    .entry(name)
                    .or_default()
                    .insert(key, document);
            }
            DocumentId::Association(AssociationCollection::Global, key) => {
                self.global_associations.insert(key, document);
            }
        }
    }

    fn remove(&mut self, id: &DocumentId) {
        let removed = match id {
            DocumentId::Entity(key) => self.entities.remove(key),
            DocumentId::Association(AssociationCollection::Dedicated(name), key) => {
                let removed = self.association_tables.get_mut(name).and_then(|docs| docs.remove(key));
                if self.association_tables.get(name).is_some_and(HashMap::is_empty) {
                    self.association_tables.remove(name);
                }
                removed
            }
            DocumentId::Association(AssociationCollection::Global, key) => {
                self.global_associations.remove(key)
            }
        };
        if let Some(document) = removed {
            self.retired_generation = self.retired_generation.max(document.revision.generation());
        }
    }
}

/// Thread-safe in-memory document store.
///
/// Entity documents are keyed by [`EntityKey`]; association documents live
/// either in a collection per association table or in the global
/// collection. Every document is held as canonical CBOR, so reads always
/// decode a fresh copy.
///
/// Writes go through [`WriteBatch`], which stages changes under the write
/// lock and applies them only on [`WriteBatch::commit`].
#[derive(Default)]
pub struct MapDatastore {
    state: RwLock<StoreState>,
    id_sources: Mutex<HashMap<IdSourceKey, i64>>,
}

impl MapDatastore {
    /// Creates an empty datastore.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a document and its revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored bytes do not decode.
    pub fn load(&self, id: &DocumentId) -> MemoryResult<Option<(Value, Revision)>> {
        let state = self.state.read();
        state
            .get(id)
            .map(|doc| doc.decode().map(|value| (value, doc.revision.clone())))
            .transpose()
    }

    /// Loads several documents under one read lock.
    ///
    /// # Errors
    ///
    /// Returns an error if any stored document does not decode.
    pub fn load_many<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a DocumentId>,
    ) -> MemoryResult<Vec<Option<(Value, Revision)>>> {
        let state = self.state.read();
        ids.into_iter()
            .map(|id| {
                state
                    .get(id)
                    .map(|doc| doc.decode().map(|value| (value, doc.revision.clone())))
                    .transpose()
            })
            .collect()
    }

    /// Current revision of a document.
    pub fn revision(&self, id: &DocumentId) -> Option<Revision> {
        self.state.read().get(id).map(|doc| doc.revision.clone())
    }

    /// Entity documents whose key satisfies `filter`.
    ///
    /// The lock is released before the result is returned, so callers may
    /// write to the store while consuming it.
    ///
    /// # Errors
    ///
    /// Returns an error if a matching document does not decode.
    pub fn scan_entities(
        &self,
        mut filter: impl FnMut(&EntityKey) -> bool,
    ) -> MemoryResult<Vec<(EntityKey, Value, Revision)>> {
        let state = self.state.read();
        state
            .entities
            .iter()
            .filter(|(key, _)| filter(key))
            .map(|(key, doc)| {
                doc.decode()
                    .map(|value| (key.clone(), value, doc.revision.clone()))
            })
            .collect()
    }

    /// Opens a write batch holding the write lock until it is dropped.
    pub fn begin(&self) -> WriteBatch<'_> {
        WriteBatch {
            state: self.state.write(),
            staged: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Atomically advances an id generator.
    ///
    /// The first call for a segment returns `initial_value`; every later call
    /// adds `increment` and returns the result.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::IdOverflow`] if the value would leave `i64`.
    pub fn next_value(&self, request: &NextValueRequest) -> MemoryResult<i64> {
        let mut sources = self.id_sources.lock();
        let next = match sources.get(request.key()) {
            None => request.initial_value(),
            Some(current) => current
                .checked_add(request.increment())
                .ok_or_else(|| MemoryError::IdOverflow {
                    source_key: request.key().to_string(),
                })?,
        };
        sources.insert(request.key().clone(), next);
        Ok(next)
    }

    /// Last value handed out for a generator segment.
    pub fn current_value(&self, key: &IdSourceKey) -> Option<i64> {
        self.id_sources.lock().get(key).copied()
    }

    /// Decoded entity document, for inspection.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not decode.
    pub fn entity_document(&self, key: &EntityKey) -> MemoryResult<Option<Value>> {
        Ok(self.load(&DocumentId::Entity(key.clone()))?.map(|(doc, _)| doc))
    }

    /// Decoded association document, for inspection.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not decode.
    pub fn association_document(
        &self,
        collection: &AssociationCollection,
        key: &AssociationKey,
    ) -> MemoryResult<Option<Value>> {
        let id = DocumentId::Association(collection.clone(), key.clone());
        Ok(self.load(&id)?.map(|(doc, _)| doc))
    }

    /// Number of entity documents.
    pub fn entity_count(&self) -> usize {
        self.state.read().entities.len()
    }

    /// Number of association documents across all collections.
    pub fn association_document_count(&self) -> usize {
        let state = self.state.read();
        state.global_associations.len()
            + state
                .association_tables
                .values()
                .map(HashMap::len)
                .sum::<usize>()
    }

    /// Names of non-empty association collections, sorted.
    pub fn association_collections(&self) -> Vec<String> {
        let state = self.state.read();
        let mut names: Vec<String> = state.association_tables.keys().cloned().collect();
        if !state.global_associations.is_empty() {
            names.push(GLOBAL_ASSOCIATION_COLLECTION.to_string());
        }
        names.sort();
        names
    }

    /// Removes every document and generator.
    pub fn clear(&self) {
        *self.state.write() = StoreState::default();
        self.id_sources.lock().clear();
    }
}

impl fmt::Debug for MapDatastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapDatastore")
            .field("entities", &self.entity_count())
            .field("association_documents", &self.association_document_count())
            .finish()
    }
}

/// Staged writes against a [`MapDatastore`].
///
/// Holds the write lock for its whole life. Revision checks compare with
/// [`WriteBatch::committed_revision`], the state before anything was
/// staged; reads through [`WriteBatch::current`] see staged changes.
/// Dropping the batch without committing discards every change.
pub struct WriteBatch<'a> {
    state: RwLockWriteGuard<'a, StoreState>,
    staged: HashMap<DocumentId, Option<StoredDocument>>,
    order: Vec<DocumentId>,
}

impl WriteBatch<'_> {
    /// Revision the document had when the batch was opened.
    pub fn committed_revision(&self, id: &DocumentId) -> Option<&Revision> {
        self.state.get(id).map(StoredDocument::revision)
    }

    /// Document including staged changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not decode.
    pub fn current(&self, id: &DocumentId) -> MemoryResult<Option<Value>> {
        self.current_document(id).map(StoredDocument::decode).transpose()
    }

    fn current_document(&self, id: &DocumentId) -> Option<&StoredDocument> {
        match self.staged.get(id) {
            Some(staged) => staged.as_ref(),
            None => self.state.get(id),
        }
    }

    fn stage(&mut self, id: DocumentId, document: Option<StoredDocument>) {
        if !self.staged.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.staged.insert(id, document);
    }

    /// Stages a new version of a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded.
    pub fn put(&mut self, id: DocumentId, document: &Value) -> MemoryResult<()> {
        let bytes = to_canonical_cbor(document)?;
        let previous = self
            .current_document(&id)
            .or_else(|| self.state.get(&id))
            .map(|doc| doc.revision.clone());
        let revision = match previous {
            Some(previous) => previous.successor(&bytes),
            None => Revision::following(self.state.retired_generation, &bytes),
        };
        self.stage(id, Some(StoredDocument { bytes, revision }));
        Ok(())
    }

    /// Stages the removal of a document.
    pub fn remove(&mut self, id: DocumentId) {
        self.stage(id, None);
    }

    /// Number of documents touched.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Applies every staged change and releases the lock.
    pub fn commit(mut self) {
        let mut staged = std::mem::take(&mut self.staged);
        for id in std::mem::take(&mut self.order) {
            match staged.remove(&id) {
                Some(Some(document)) => self.state.insert(id, document),
                Some(None) => self.state.remove(&id),
                None => {}
            }
        }
    }
}
