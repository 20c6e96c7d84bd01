//! Per-association storage layout resolution.

use serde::{Deserialize, Serialize};

use crate::key::AssociationKind;

/// Where association rows are stored, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationStorageType {
    /// Inside the owning entity's document.
    InEntity,
    /// In a separate association document.
    AssociationDocument,
}

/// Which collection holds association documents, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationDocumentStorageType {
    /// One collection shared by all associations.
    GlobalCollection,
    /// One collection per association table.
    CollectionPerAssociation,
}

/// Resolved physical layout of one association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationStorageStrategy {
    /// Rows are embedded in the owning entity.
    InEntity,
    /// Rows live in a document of a collection dedicated to the association.
    DedicatedCollection,
    /// Rows live in a document of the shared association collection.
    GlobalCollection,
}

impl AssociationStorageStrategy {
    /// Resolves the layout from already-resolved options.
    ///
    /// Embedded collections always live in the entity, whatever the storage
    /// options say. Otherwise `InEntity` storage wins, then the document
    /// storage option picks between a dedicated and the global collection.
    pub fn resolve(
        kind: AssociationKind,
        storage: AssociationStorageType,
        document_storage: AssociationDocumentStorageType,
    ) -> Self {
        if kind == AssociationKind::EmbeddedCollection
            || storage == AssociationStorageType::InEntity
        {
            Self::InEntity
        } else if document_storage == AssociationDocumentStorageType::CollectionPerAssociation {
            Self::DedicatedCollection
        } else {
            Self::GlobalCollection
        }
    }

    /// True if rows are stored inside the owning entity.
    pub fn is_embedded_in_entity(self) -> bool {
        self == Self::InEntity
    }
}
