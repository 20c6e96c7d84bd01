//! Mapping options and their precedence.

use serde::{Deserialize, Serialize};

use crate::association::{AssociationDocumentStorageType, AssociationStorageType};

/// Options set at one level (global, entity or property).
///
/// Unset options fall through to the next level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionSet {
    /// Where association rows are stored.
    pub association_storage: Option<AssociationStorageType>,
    /// Which collection holds association documents.
    pub association_document_storage: Option<AssociationDocumentStorageType>,
}

impl OptionSet {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the association storage type.
    #[must_use]
    pub const fn association_storage(mut self, value: AssociationStorageType) -> Self {
        self.association_storage = Some(value);
        self
    }

    /// Sets the association document storage type.
    #[must_use]
    pub const fn association_document_storage(
        mut self,
        value: AssociationDocumentStorageType,
    ) -> Self {
        self.association_document_storage = Some(value);
        self
    }

    /// True if no option is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Options resolved with precedence property > entity > global > default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsContext {
    property: OptionSet,
    entity: OptionSet,
    global: OptionSet,
}

impl OptionsContext {
    /// Built-in association storage.
    pub const DEFAULT_ASSOCIATION_STORAGE: AssociationStorageType =
        AssociationStorageType::InEntity;

    /// Built-in association document storage.
    pub const DEFAULT_ASSOCIATION_DOCUMENT_STORAGE: AssociationDocumentStorageType =
        AssociationDocumentStorageType::GlobalCollection;

    /// Creates a context from the three levels.
    pub fn new(global: OptionSet, entity: OptionSet, property: OptionSet) -> Self {
        Self {
            property,
            entity,
            global,
        }
    }

    /// A context holding only global options.
    pub fn global(global: OptionSet) -> Self {
        Self::new(global, OptionSet::default(), OptionSet::default())
    }

    fn resolve<T>(&self, pick: impl Fn(&OptionSet) -> Option<T>) -> Option<T> {
        pick(&self.property)
            .or_else(|| pick(&self.entity))
            .or_else(|| pick(&self.global))
    }

    /// Resolved association storage type.
    pub fn association_storage(&self) -> AssociationStorageType {
        self.resolve(|o| o.association_storage)
            .unwrap_or(Self::DEFAULT_ASSOCIATION_STORAGE)
    }

    /// Resolved association document storage type.
    pub fn association_document_storage(&self) -> AssociationDocumentStorageType {
        self.resolve(|o| o.association_document_storage)
            .unwrap_or(Self::DEFAULT_ASSOCIATION_DOCUMENT_STORAGE)
    }
}
