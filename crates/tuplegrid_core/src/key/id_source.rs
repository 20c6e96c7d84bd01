use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tuplegrid_codec::Value;

use super::{KeyBody, KeyShape};
use crate::error::{GridError, GridResult};

/// How identifiers are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSourceType {
    /// A table holding one counter per segment.
    Table,
    /// A named sequence.
    Sequence,
}

/// Describes an identifier generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdSourceKeyMetadata {
    kind: IdSourceType,
    name: String,
    key_column_name: Option<String>,
    value_column_name: Option<String>,
    column_names: Arc<[String]>,
}

impl IdSourceKeyMetadata {
    /// A table-based generator: one row per segment, keyed by
    /// `key_column_name`, with the counter in `value_column_name`.
    pub fn for_table(
        table: impl Into<String>,
        key_column_name: impl Into<String>,
        value_column_name: impl Into<String>,
    ) -> Arc<Self> {
        let key_column_name = key_column_name.into();
        Arc::new(Self {
            kind: IdSourceType::Table,
            name: table.into(),
            column_names: Arc::from([key_column_name.clone()]),
            key_column_name: Some(key_column_name),
            value_column_name: Some(value_column_name.into()),
        })
    }

    /// A sequence-based generator.
    pub fn for_sequence(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            kind: IdSourceType::Sequence,
            name: name.into(),
            key_column_name: None,
            value_column_name: None,
            column_names: Arc::from([]),
        })
    }

    /// Table or sequence.
    pub fn kind(&self) -> IdSourceType {
        self.kind
    }

    /// Table or sequence name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Segment column of a table-based generator.
    pub fn key_column_name(&self) -> Option<&str> {
        self.key_column_name.as_deref()
    }

    /// Counter column of a table-based generator.
    pub fn value_column_name(&self) -> Option<&str> {
        self.value_column_name.as_deref()
    }
}

impl KeyShape for IdSourceKeyMetadata {
    fn key_column_names(&self) -> &[String] {
        &self.column_names
    }
}

/// Identifies one identifier generator segment.
///
/// Table-based keys carry the segment name as their single column value;
/// sequence-based keys carry no columns.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IdSourceKey {
    body: KeyBody<IdSourceKeyMetadata>,
}

impl IdSourceKey {
    /// Key of one segment of a table-based generator.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidOperation`] if `metadata` describes a sequence.
    pub fn for_table(
        metadata: Arc<IdSourceKeyMetadata>,
        segment: impl Into<String>,
    ) -> GridResult<Self> {
        if metadata.kind != IdSourceType::Table {
            return Err(GridError::invalid_operation(format!(
                "'{}' is a sequence, not a table-based id source",
                metadata.name
            )));
        }
        let values: Arc<[Value]> = Arc::from([Value::Text(segment.into())]);
        Ok(Self {
            body: KeyBody::new(metadata, values)?,
        })
    }

    /// Key of a sequence-based generator.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidOperation`] if `metadata` describes a table.
    pub fn for_sequence(metadata: Arc<IdSourceKeyMetadata>) -> GridResult<Self> {
        if metadata.kind != IdSourceType::Sequence {
            return Err(GridError::invalid_operation(format!(
                "'{}' is a table-based id source, not a sequence",
                metadata.name
            )));
        }
        Ok(Self {
            body: KeyBody::new(metadata, Arc::from([]))?,
        })
    }

    /// Returns the generator metadata.
    pub fn metadata(&self) -> &Arc<IdSourceKeyMetadata> {
        self.body.shape()
    }

    /// Returns the table or sequence name.
    pub fn name(&self) -> &str {
        self.body.shape().name()
    }

    /// Returns the segment name of a table-based key.
    pub fn segment(&self) -> Option<&str> {
        self.body.values().first().and_then(Value::as_text)
    }

    /// Returns the key column names.
    pub fn column_names(&self) -> &[String] {
        self.body.column_names()
    }

    /// Returns the key column values.
    pub fn column_values(&self) -> &[Value] {
        self.body.values()
    }
}

impl fmt::Display for IdSourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        self.body.fmt_columns(f)
    }
}

impl fmt::Debug for IdSourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdSourceKey({self})")
    }
}
