use std::fmt;
use std::sync::Arc;

use tuplegrid_codec::Value;

use super::KeyBody;
use crate::error::{GridError, GridResult};
use crate::tuple::Tuple;

/// Identifies one row inside an association.
///
/// A row key is independent of the association that holds it, so the same
/// row can be matched across snapshots of different loads.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    body: KeyBody<[String]>,
}

impl RowKey {
    /// Creates a row key from column names and parallel values.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::KeyShape`] if the lengths differ.
    pub fn new<S: Into<String>>(
        column_names: impl IntoIterator<Item = S>,
        values: impl Into<Arc<[Value]>>,
    ) -> GridResult<Self> {
        let names: Arc<[String]> = column_names.into_iter().map(Into::into).collect();
        Self::with_shared_names(names, values)
    }

    /// Creates a row key reusing an already shared column name sequence.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::KeyShape`] if the lengths differ.
    pub fn with_shared_names(
        column_names: Arc<[String]>,
        values: impl Into<Arc<[Value]>>,
    ) -> GridResult<Self> {
        Ok(Self {
            body: KeyBody::new(column_names, values.into())?,
        })
    }

    /// Returns the row key column names.
    pub fn column_names(&self) -> &[String] {
        self.body.column_names()
    }

    /// Returns the shared column name sequence.
    pub fn shared_column_names(&self) -> &Arc<[String]> {
        self.body.shape()
    }

    /// Returns the row key column values.
    pub fn column_values(&self) -> &[Value] {
        self.body.values()
    }

    /// Returns the value of one row key column.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnknownKeyColumn`] if `column` is not part of the key.
    pub fn column_value(&self, column: &str) -> GridResult<&Value> {
        self.body.value_of(column)
    }

    /// Returns true if `column` is part of the key.
    pub fn contains_column(&self, column: &str) -> bool {
        self.column_names().iter().any(|c| c == column)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Row")?;
        self.body.fmt_columns(f)
    }
}

impl fmt::Debug for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey({self})")
    }
}

/// Collects row key columns and builds keys from tuples.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RowKeyBuilder {
    columns: Vec<String>,
}

impl RowKeyBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds key columns, skipping ones already present.
    pub fn add_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        for column in columns {
            let column = column.into();
            if !self.columns.contains(&column) {
                self.columns.push(column);
            }
        }
        self
    }

    /// Returns the columns collected so far.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Builds the key of the row described by `tuple`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MissingColumn`] if the tuple has no value for one
    /// of the key columns.
    pub fn build(&self, tuple: &Tuple) -> GridResult<RowKey> {
        let values = self
            .columns
            .iter()
            .map(|column| tuple.get(column).ok_or_else(|| GridError::missing_column(column)))
            .collect::<GridResult<Vec<_>>>()?;
        RowKey::new(self.columns.iter().cloned(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_key_equality_is_value_based() {
        let a = RowKey::new(["person_id", "street"], [Value::Integer(1), Value::from("Main")])
            .unwrap();
        let b = RowKey::new(["person_id", "street"], [Value::Integer(1), Value::from("Main")])
            .unwrap();
        let c = RowKey::new(["person_id", "street"], [Value::Integer(1), Value::from("Side")])
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn column_names_participate_in_equality() {
        let a = RowKey::new(["a"], [Value::Integer(1)]).unwrap();
        let b = RowKey::new(["b"], [Value::Integer(1)]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn builder_picks_values_from_tuple() {
        let mut tuple = Tuple::new();
        tuple.put("person_id", Value::Integer(4));
        tuple.put("street", Value::from("Main"));
        tuple.put("city", Value::from("Springfield"));

        let key = RowKeyBuilder::new()
            .add_columns(["person_id", "street"])
            .add_columns(["street"])
            .build(&tuple)
            .unwrap();

        assert_eq!(key.column_names(), ["person_id", "street"]);
        assert_eq!(key.column_value("street").unwrap(), &Value::from("Main"));
        assert!(!key.contains_column("city"));
    }

    #[test]
    fn builder_fails_on_missing_column() {
        let mut tuple = Tuple::new();
        tuple.put("person_id", Value::Integer(4));

        let err = RowKeyBuilder::new()
            .add_columns(["person_id", "street"])
            .build(&tuple)
            .unwrap_err();
        assert!(matches!(err, GridError::MissingColumn { column } if column == "street"));
    }

    #[test]
    fn null_column_is_a_valid_key_value() {
        let mut tuple = Tuple::new();
        tuple.put_null("index");
        let key = RowKeyBuilder::new().add_columns(["index"]).build(&tuple).unwrap();
        assert_eq!(key.column_values(), [Value::Null]);
    }
}
