use std::sync::Arc;

use tuplegrid_codec::Value;
use tuplegrid_core::types::{
    BasicGridType, LogicalType, PassThroughDescriptor, PromotingDescriptor, SharedGridType,
};
use tuplegrid_core::{
    check_revision, Association, AssociationContext, AssociationKey, AssociationStorageStrategy,
    BatchExecutor, DialectCapabilities, EntityKey, EntityKeyMetadata, GridDialect, GridError,
    GridResult, Key, MapAssociationSnapshot, MultiGetDialect, NextValueRequest, Operation,
    OperationsQueue, Pending, Revision, Tuple, TupleConsumer, TupleContext,
};

use crate::datastore::{AssociationCollection, DocumentId, MapDatastore, WriteBatch};
use crate::document::{
    association_document, association_from_rows, columns_of, key_columns, merge_tuple,
    rows_from_value, rows_to_value, tuple_from_columns, tuple_from_document, ROWS_FIELD,
};
use crate::error::MemoryError;

/// Where an association's rows are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    /// Inside the owner's entity document.
    InEntity(DocumentId),
    /// In an association document of its own.
    Document(DocumentId),
}

/// Document-store dialect over a [`MapDatastore`].
///
/// Supports batches (applied atomically), multi-key reads and sequences.
/// Reads made with an open queue in their context see the queue's pending
/// writes.
#[derive(Debug, Clone)]
pub struct MapDialect {
    store: Arc<MapDatastore>,
    native_uuid: bool,
}

impl MapDialect {
    /// Dialect over `store`.
    pub fn new(store: Arc<MapDatastore>) -> Self {
        Self {
            store,
            native_uuid: true,
        }
    }

    /// Whether UUIDs are stored natively; when off they are stored as
    /// hyphenated strings.
    #[must_use]
    pub fn with_native_uuid(mut self, native: bool) -> Self {
        self.native_uuid = native;
        self
    }

    /// The underlying datastore.
    pub fn datastore(&self) -> &Arc<MapDatastore> {
        &self.store
    }

    fn location(&self, key: &AssociationKey, context: &AssociationContext) -> Location {
        let metadata = key.metadata();
        let type_context = context.association_type_context();
        if self.is_stored_in_entity_structure(metadata, type_context) {
            return Location::InEntity(DocumentId::Entity(key.owner().clone()));
        }
        let collection = match type_context.storage_strategy(metadata.kind()) {
            AssociationStorageStrategy::DedicatedCollection => {
                AssociationCollection::dedicated(metadata.table())
            }
            AssociationStorageStrategy::GlobalCollection | AssociationStorageStrategy::InEntity => {
                AssociationCollection::Global
            }
        };
        Location::Document(DocumentId::Association(collection, key.clone()))
    }

    fn stage(&self, batch: &mut WriteBatch<'_>, operation: &Operation) -> GridResult<()> {
        match operation {
            Operation::UpdateTuple { tuple, key, .. } => stage_update_tuple(batch, tuple, key),
            Operation::RemoveTuple { key, .. } => {
                batch.remove(DocumentId::Entity(key.clone()));
                Ok(())
            }
            Operation::UpdateAssociation {
                association,
                key,
                context,
            } => stage_update_association(batch, association, key, self.location(key, context)),
            Operation::RemoveAssociation { key, context } => {
                stage_remove_association(batch, key, self.location(key, context))
            }
        }
    }

    fn apply(&self, operation: &Operation) -> GridResult<()> {
        let mut batch = self.store.begin();
        self.stage(&mut batch, operation)?;
        batch.commit();
        Ok(())
    }

    fn load_tuple(&self, key: &EntityKey) -> GridResult<Option<Tuple>> {
        let id = DocumentId::Entity(key.clone());
        match self.store.load(&id)? {
            Some((document, revision)) => tuple_from_document(&document, revision, &id).map(Some),
            None => Ok(None),
        }
    }
}

fn pending_tuple(context: &TupleContext, key: &EntityKey) -> Option<Option<Tuple>> {
    let pending = context.open_queue()?.pending_tuple(key)?;
    Some(match pending {
        Pending::Updated(tuple) => {
            let revision = tuple.revision();
            let mut columns = tuple.to_columns();
            columns.extend(key_columns(key));
            Some(tuple_from_columns(columns, revision))
        }
        Pending::Removed => None,
    })
}

fn stage_update_tuple(batch: &mut WriteBatch<'_>, tuple: &Tuple, key: &EntityKey) -> GridResult<()> {
    let id = DocumentId::Entity(key.clone());
    let current = batch.current(&id)?;
    if tuple.is_new() {
        if current.is_some() {
            return Err(GridError::TupleAlreadyExists { key: key.clone() });
        }
    } else {
        check_revision(
            &Key::Entity(key.clone()),
            tuple.revision().as_ref(),
            batch.committed_revision(&id),
        )?;
        if current.is_some() && !tuple.has_operations() {
            return Ok(());
        }
    }
    let document = merge_tuple(current.as_ref(), tuple, key, &id)?;
    batch.put(id, &document)?;
    Ok(())
}

fn stage_update_association(
    batch: &mut WriteBatch<'_>,
    association: &Association,
    key: &AssociationKey,
    location: Location,
) -> GridResult<()> {
    let expected = association.revision();
    match location {
        // in-entity rows are guarded by the owner's revision
        Location::InEntity(owner) => {
            check_revision(
                &Key::Association(key.clone()),
                expected.as_ref(),
                batch.committed_revision(&owner),
            )?;
            let current = batch.current(&owner)?;
            if current.is_none() && association.is_empty() {
                return Ok(());
            }
            let mut columns = match &current {
                Some(document) => columns_of(document, &owner)?,
                None => key_columns(key.owner()),
            };
            let field = key.metadata().collection_role().to_string();
            if association.is_empty() {
                columns.remove(&field);
            } else {
                columns.insert(field, rows_to_value(key.metadata(), association));
            }
            batch.put(owner, &Value::text_map(columns))?;
        }
        // standalone documents carry their own revision
        Location::Document(id) => {
            check_revision(
                &Key::Association(key.clone()),
                expected.as_ref(),
                batch.committed_revision(&id),
            )?;
            if association.is_empty() {
                batch.remove(id);
            } else {
                batch.put(id, &association_document(key, association))?;
            }
        }
    }
    Ok(())
}

fn stage_remove_association(
    batch: &mut WriteBatch<'_>,
    key: &AssociationKey,
    location: Location,
) -> GridResult<()> {
    match location {
        Location::InEntity(owner) => {
            let Some(document) = batch.current(&owner)? else {
                return Ok(());
            };
            let mut columns = columns_of(&document, &owner)?;
            if columns.remove(key.metadata().collection_role()).is_some() {
                batch.put(owner, &Value::text_map(columns))?;
            }
        }
        Location::Document(id) => batch.remove(id),
    }
    Ok(())
}

impl GridDialect for MapDialect {
    fn get_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<Option<Tuple>> {
        if let Some(pending) = pending_tuple(context, key) {
            return Ok(pending);
        }
        self.load_tuple(key)
    }

    fn update_tuple(&self, tuple: Tuple, key: &EntityKey, context: &TupleContext) -> GridResult<()> {
        self.apply(&Operation::UpdateTuple {
            tuple,
            key: key.clone(),
            context: context.detached(),
        })
    }

    fn remove_tuple(&self, key: &EntityKey, context: &TupleContext) -> GridResult<()> {
        self.apply(&Operation::RemoveTuple {
            key: key.clone(),
            context: context.detached(),
        })
    }

    fn get_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Option<Association>> {
        if let Some(queue) = context.open_queue() {
            match queue.pending_association(key) {
                Some(Pending::Updated(association)) => return Ok(Some(association)),
                Some(Pending::Removed) => return Ok(None),
                None => {}
            }
        }
        match self.location(key, context) {
            Location::InEntity(owner) => {
                let Some((document, revision)) = self.store.load(&owner)? else {
                    return Ok(None);
                };
                let Some(rows) = document.get(key.metadata().collection_role()) else {
                    return Ok(None);
                };
                let rows = rows_from_value(key, rows, &owner)?;
                Ok(Some(association_from_rows(rows, Some(revision))))
            }
            Location::Document(id) => {
                let Some((document, revision)) = self.store.load(&id)? else {
                    return Ok(None);
                };
                let rows = document.get(ROWS_FIELD).ok_or_else(|| {
                    MemoryError::corrupted(&id, "association document has no rows")
                })?;
                let rows = rows_from_value(key, rows, &id)?;
                Ok(Some(association_from_rows(rows, Some(revision))))
            }
        }
    }

    fn create_association(
        &self,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<Association> {
        let revision: Option<Revision> = match self.location(key, context) {
            Location::InEntity(owner) => {
                let pending = context
                    .open_queue()
                    .and_then(|queue| queue.pending_tuple(key.owner()));
                match pending {
                    Some(Pending::Updated(tuple)) => tuple.revision(),
                    Some(Pending::Removed) => None,
                    None => self.store.revision(&owner),
                }
            }
            Location::Document(_) => None,
        };
        Ok(Association::from_snapshot(Arc::new(
            MapAssociationSnapshot::default().with_revision(revision),
        )))
    }

    fn update_association(
        &self,
        association: Association,
        key: &AssociationKey,
        context: &AssociationContext,
    ) -> GridResult<()> {
        self.apply(&Operation::UpdateAssociation {
            association,
            key: key.clone(),
            context: context.detached(),
        })
    }

    fn remove_association(&self, key: &AssociationKey, context: &AssociationContext) -> GridResult<()> {
        self.apply(&Operation::RemoveAssociation {
            key: key.clone(),
            context: context.detached(),
        })
    }

    fn next_value(&self, request: &NextValueRequest) -> GridResult<i64> {
        Ok(self.store.next_value(request)?)
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn for_each_tuple(
        &self,
        consumer: &mut TupleConsumer<'_>,
        metadata: &[Arc<EntityKeyMetadata>],
    ) -> GridResult<()> {
        let entries = self
            .store
            .scan_entities(|key| metadata.iter().any(|m| **m == **key.metadata()))?;
        for (key, document, revision) in entries {
            let tuple = tuple_from_document(&document, revision, &DocumentId::Entity(key.clone()))?;
            consumer(key.metadata(), tuple)?;
        }
        Ok(())
    }

    fn override_type(&self, logical: LogicalType) -> Option<SharedGridType> {
        if self.native_uuid || logical != LogicalType::Uuid {
            return None;
        }
        let text = PassThroughDescriptor::new(LogicalType::String).ok()?;
        let descriptor = PromotingDescriptor::new(LogicalType::Uuid, Arc::new(text)).ok()?;
        Some(Arc::new(BasicGridType::new(Arc::new(descriptor))))
    }

    fn capabilities(&self) -> DialectCapabilities<'_> {
        DialectCapabilities {
            batch: Some(self),
            multi_get: Some(self),
        }
    }
}

impl BatchExecutor for MapDialect {
    fn execute_batch(&self, queue: &OperationsQueue) -> GridResult<()> {
        let operations = queue.drain();
        if operations.is_empty() {
            return Ok(());
        }
        let mut batch = self.store.begin();
        for operation in &operations {
            if let Err(e) = self.stage(&mut batch, operation) {
                tracing::debug!(operation = operation.name(), error = %e, "batch aborted");
                return Err(e);
            }
        }
        let documents = batch.len();
        batch.commit();
        tracing::debug!(operations = operations.len(), documents, "batch committed");
        Ok(())
    }
}

impl MultiGetDialect for MapDialect {
    fn get_tuples(&self, keys: &[EntityKey], context: &TupleContext) -> GridResult<Vec<Option<Tuple>>> {
        let ids: Vec<DocumentId> = keys.iter().map(|k| DocumentId::Entity(k.clone())).collect();
        let loaded = self.store.load_many(&ids)?;
        keys.iter()
            .zip(ids.iter().zip(loaded))
            .map(|(key, (id, stored))| match pending_tuple(context, key) {
                Some(pending) => Ok(pending),
                None => stored
                    .map(|(document, revision)| tuple_from_document(&document, revision, id))
                    .transpose(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuplegrid_core::types::{TypeTranslator, TypedValue};

    fn dialect() -> MapDialect {
        MapDialect::new(Arc::new(MapDatastore::new()))
    }

    fn key(id: i64) -> EntityKey {
        let meta = Arc::new(EntityKeyMetadata::new("Person", ["id"]));
        EntityKey::new(meta, [Value::Integer(id)]).unwrap()
    }

    #[test]
    fn insert_then_get() {
        let dialect = dialect();
        let ctx = TupleContext::default();
        let mut tuple = dialect.create_tuple(&key(1), &ctx);
        tuple.put("name", "Alice");
        dialect.update_tuple(tuple, &key(1), &ctx).unwrap();

        let loaded = dialect.get_tuple(&key(1), &ctx).unwrap().unwrap();
        assert_eq!(loaded.get("name"), Some(Value::from("Alice")));
        assert_eq!(loaded.get("id"), Some(Value::Integer(1)));
        assert!(!loaded.is_new());
        assert!(loaded.revision().is_some());
    }

    #[test]
    fn update_without_changes_keeps_revision() {
        let dialect = dialect();
        let ctx = TupleContext::default();
        let mut tuple = Tuple::new();
        tuple.put("name", "Alice");
        dialect.update_tuple(tuple, &key(1), &ctx).unwrap();

        let loaded = dialect.get_tuple(&key(1), &ctx).unwrap().unwrap();
        let before = loaded.revision();
        dialect.update_tuple(loaded, &key(1), &ctx).unwrap();
        let after = dialect.get_tuple(&key(1), &ctx).unwrap().unwrap().revision();
        assert_eq!(before, after);
    }

    #[test]
    fn missing_tuple_is_none() {
        let dialect = dialect();
        assert!(dialect.get_tuple(&key(9), &TupleContext::default()).unwrap().is_none());
        dialect.remove_tuple(&key(9), &TupleContext::default()).unwrap();
    }

    #[test]
    fn capabilities_are_declared() {
        let dialect = dialect();
        let caps = dialect.capabilities();
        assert!(caps.supports_batch());
        assert!(caps.supports_multi_get());
        assert!(dialect.supports_sequences());
    }

    #[test]
    fn uuid_override_only_when_not_native() {
        assert!(dialect().override_type(LogicalType::Uuid).is_none());

        let dialect = dialect().with_native_uuid(false);
        assert!(dialect.override_type(LogicalType::Long).is_none());
        let translator = TypeTranslator::for_dialect(&dialect);
        let id = uuid::Uuid::nil();
        let mut tuple = Tuple::new();
        translator
            .bind(LogicalType::Uuid, &mut tuple, Some(&TypedValue::Uuid(id)), "uid")
            .unwrap();
        assert_eq!(
            tuple.get("uid"),
            Some(Value::from("00000000-0000-0000-0000-000000000000"))
        );
        assert_eq!(
            translator.extract(LogicalType::Uuid, &tuple, "uid").unwrap(),
            Some(TypedValue::Uuid(id))
        );
    }
}
