//! Grid types: write logical values into tuple columns and read them back.

use std::fmt;
use std::sync::Arc;

use super::descriptor::SharedDescriptor;
use super::value::{LogicalType, TypedValue};
use crate::error::{GridError, GridResult};
use crate::tuple::Tuple;

/// Writes one logical value into one tuple column.
pub trait GridValueBinder: fmt::Debug + Send + Sync {
    /// Binds `value` to `column`; `None` stores a null.
    fn bind(&self, tuple: &mut Tuple, value: Option<&TypedValue>, column: &str) -> GridResult<()>;
}

/// Reads one logical value from one tuple column.
pub trait GridValueExtractor: fmt::Debug + Send + Sync {
    /// Extracts the value of `column`; absent and null columns give `None`.
    fn extract(&self, tuple: &Tuple, column: &str) -> GridResult<Option<TypedValue>>;
}

/// Binder that unwraps through a descriptor.
#[derive(Debug, Clone)]
pub struct BasicGridBinder {
    descriptor: SharedDescriptor,
}

impl BasicGridBinder {
    /// Binder over `descriptor`.
    pub fn new(descriptor: SharedDescriptor) -> Self {
        Self { descriptor }
    }
}

impl GridValueBinder for BasicGridBinder {
    fn bind(&self, tuple: &mut Tuple, value: Option<&TypedValue>, column: &str) -> GridResult<()> {
        match value {
            None => tuple.put_null(column),
            Some(value) => tuple.put(column, self.descriptor.unwrap(value)?),
        }
        Ok(())
    }
}

/// Extractor that wraps through a descriptor.
#[derive(Debug, Clone)]
pub struct BasicGridExtractor {
    descriptor: SharedDescriptor,
}

impl BasicGridExtractor {
    /// Extractor over `descriptor`.
    pub fn new(descriptor: SharedDescriptor) -> Self {
        Self { descriptor }
    }
}

impl GridValueExtractor for BasicGridExtractor {
    fn extract(&self, tuple: &Tuple, column: &str) -> GridResult<Option<TypedValue>> {
        match tuple.get(column) {
            None => Ok(None),
            Some(value) if value.is_null() => Ok(None),
            Some(value) => self.descriptor.wrap(&value).map(Some),
        }
    }
}

/// A mapped type spanning one or more tuple columns.
pub trait GridType: fmt::Debug + Send + Sync {
    /// Name used in error messages.
    fn name(&self) -> &str;

    /// Number of columns the type occupies.
    fn column_span(&self) -> usize {
        1
    }

    /// Writes `value` into `columns`; `None` nulls every column.
    fn null_safe_set(
        &self,
        tuple: &mut Tuple,
        value: Option<&TypedValue>,
        columns: &[&str],
    ) -> GridResult<()>;

    /// Reads a value from `columns`; `None` if every column is null or absent.
    fn null_safe_get(&self, tuple: &Tuple, columns: &[&str]) -> GridResult<Option<TypedValue>>;
}

/// Shared grid type handle.
pub type SharedGridType = Arc<dyn GridType>;

fn check_span(name: &str, expected: usize, columns: &[&str]) -> GridResult<()> {
    if columns.len() == expected {
        Ok(())
    } else {
        Err(GridError::translation(
            name,
            format!("spans {expected} columns but {} were given", columns.len()),
        ))
    }
}

/// Single-column type made of a binder and an extractor.
#[derive(Debug)]
pub struct BasicGridType {
    logical: LogicalType,
    binder: Box<dyn GridValueBinder>,
    extractor: Box<dyn GridValueExtractor>,
}

impl BasicGridType {
    /// Type over `descriptor`, named after its logical type.
    pub fn new(descriptor: SharedDescriptor) -> Self {
        let logical = descriptor.logical_type();
        Self::from_parts(
            logical,
            Box::new(BasicGridBinder::new(Arc::clone(&descriptor))),
            Box::new(BasicGridExtractor::new(descriptor)),
        )
    }

    /// Type from a custom binder and extractor.
    pub fn from_parts(
        logical: LogicalType,
        binder: Box<dyn GridValueBinder>,
        extractor: Box<dyn GridValueExtractor>,
    ) -> Self {
        Self {
            logical,
            binder,
            extractor,
        }
    }

    /// Logical type handled.
    pub fn logical_type(&self) -> LogicalType {
        self.logical
    }
}

impl GridType for BasicGridType {
    fn name(&self) -> &str {
        self.logical.name()
    }

    fn null_safe_set(
        &self,
        tuple: &mut Tuple,
        value: Option<&TypedValue>,
        columns: &[&str],
    ) -> GridResult<()> {
        check_span(self.name(), 1, columns)?;
        self.binder.bind(tuple, value, columns[0])
    }

    fn null_safe_get(&self, tuple: &Tuple, columns: &[&str]) -> GridResult<Option<TypedValue>> {
        check_span(self.name(), 1, columns)?;
        self.extractor.extract(tuple, columns[0])
    }
}

/// Multi-column type whose value is a [`TypedValue::Component`].
///
/// Each part gets the next `column_span()` columns in order.
#[derive(Debug)]
pub struct ComponentGridType {
    name: String,
    parts: Vec<SharedGridType>,
}

impl ComponentGridType {
    /// Component named `name` made of `parts`.
    pub fn new(name: impl Into<String>, parts: Vec<SharedGridType>) -> Self {
        Self {
            name: name.into(),
            parts,
        }
    }

    /// Part types in column order.
    pub fn parts(&self) -> &[SharedGridType] {
        &self.parts
    }

    fn split<'a>(
        &'a self,
        columns: &'a [&'a str],
    ) -> impl Iterator<Item = (&'a SharedGridType, &'a [&'a str])> + 'a {
        let mut offset = 0;
        self.parts.iter().map(move |part| {
            let span = part.column_span();
            let slice = &columns[offset..offset + span];
            offset += span;
            (part, slice)
        })
    }
}

impl GridType for ComponentGridType {
    fn name(&self) -> &str {
        &self.name
    }

    fn column_span(&self) -> usize {
        self.parts.iter().map(|p| p.column_span()).sum()
    }

    fn null_safe_set(
        &self,
        tuple: &mut Tuple,
        value: Option<&TypedValue>,
        columns: &[&str],
    ) -> GridResult<()> {
        check_span(&self.name, self.column_span(), columns)?;
        match value {
            None => {
                for (part, slice) in self.split(columns) {
                    part.null_safe_set(tuple, None, slice)?;
                }
                Ok(())
            }
            Some(TypedValue::Component(values)) => {
                if values.len() != self.parts.len() {
                    return Err(GridError::translation(
                        &self.name,
                        format!("expected {} parts, found {}", self.parts.len(), values.len()),
                    ));
                }
                // parts bind into a copy so a failing part leaves `tuple` untouched
                let mut staged = tuple.clone();
                for ((part, slice), value) in self.split(columns).zip(values) {
                    part.null_safe_set(&mut staged, value.as_ref(), slice)?;
                }
                *tuple = staged;
                Ok(())
            }
            Some(other) => Err(GridError::translation(
                &self.name,
                format!("expected component, found {}", other.kind()),
            )),
        }
    }

    fn null_safe_get(&self, tuple: &Tuple, columns: &[&str]) -> GridResult<Option<TypedValue>> {
        check_span(&self.name, self.column_span(), columns)?;
        let mut values = Vec::with_capacity(self.parts.len());
        for (part, slice) in self.split(columns) {
            values.push(part.null_safe_get(tuple, slice)?);
        }
        if values.iter().all(Option::is_none) {
            Ok(None)
        } else {
            Ok(Some(TypedValue::Component(values)))
        }
    }
}
