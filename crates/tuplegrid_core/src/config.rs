//! Mapping configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::batch::OperationsQueue;
use crate::context::{AssociationContext, AssociationTypeContext, TupleContext};
use crate::key::{AssociationKey, EntityKeyMetadata};
use crate::options::{OptionSet, OptionsContext};

/// Options for every level plus kernel switches.
///
/// Entity options are keyed by table name. Property options are keyed by
/// the owner's table, then by collection role, so two entities may use the
/// same role name with different options. Deserializes from the same shape
/// it is built with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Options applying to everything.
    pub global: OptionSet,

    /// Options per entity table.
    pub entities: HashMap<String, OptionSet>,

    /// Options per owner table and association collection role.
    pub properties: HashMap<String, HashMap<String, OptionSet>>,

    /// Whether mutations may be deferred into batches.
    pub batching: bool,
}

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the global options.
    #[must_use]
    pub fn global_options(mut self, options: OptionSet) -> Self {
        self.global = options;
        self
    }

    /// Sets the options of one entity table.
    #[must_use]
    pub fn entity_options(mut self, table: impl Into<String>, options: OptionSet) -> Self {
        self.entities.insert(table.into(), options);
        self
    }

    /// Sets the options of the association property `role` of `table`.
    #[must_use]
    pub fn property_options(
        mut self,
        table: impl Into<String>,
        role: impl Into<String>,
        options: OptionSet,
    ) -> Self {
        self.properties
            .entry(table.into())
            .or_default()
            .insert(role.into(), options);
        self
    }

    /// Sets whether batching is enabled.
    #[must_use]
    pub const fn batching(mut self, value: bool) -> Self {
        self.batching = value;
        self
    }

    fn entity_level(&self, table: &str) -> OptionSet {
        self.entities.get(table).cloned().unwrap_or_default()
    }

    fn property_level(&self, table: &str, role: &str) -> OptionSet {
        self.properties
            .get(table)
            .and_then(|roles| roles.get(role))
            .cloned()
            .unwrap_or_default()
    }

    /// Options context for an entity type.
    pub fn options_for_entity(&self, metadata: &EntityKeyMetadata) -> OptionsContext {
        OptionsContext::new(
            self.global.clone(),
            self.entity_level(metadata.table()),
            OptionSet::default(),
        )
    }

    /// Options context for an association, from the owner's entity level
    /// and the association's property level.
    pub fn options_for_association(&self, key: &AssociationKey) -> OptionsContext {
        let table = key.owner().table();
        OptionsContext::new(
            self.global.clone(),
            self.entity_level(table),
            self.property_level(table, key.metadata().collection_role()),
        )
    }

    /// Tuple context for an entity type.
    pub fn tuple_context(&self, metadata: &EntityKeyMetadata) -> TupleContext {
        TupleContext::new(self.options_for_entity(metadata))
    }

    /// Association context for an association.
    pub fn association_context(&self, key: &AssociationKey) -> AssociationContext {
        AssociationContext::new(AssociationTypeContext::new(
            self.options_for_association(key),
        ))
    }

    /// Tuple context carrying `queue`, if batching is enabled.
    pub fn batched_tuple_context(
        &self,
        metadata: &EntityKeyMetadata,
        queue: &OperationsQueue,
    ) -> TupleContext {
        let context = self.tuple_context(metadata);
        if self.batching {
            context.with_queue(queue.clone())
        } else {
            context
        }
    }

    /// Association context carrying `queue`, if batching is enabled.
    pub fn batched_association_context(
        &self,
        key: &AssociationKey,
        queue: &OperationsQueue,
    ) -> AssociationContext {
        let context = self.association_context(key);
        if self.batching {
            context.with_queue(queue.clone())
        } else {
            context
        }
    }
}
