use std::collections::HashMap;
use std::sync::Arc;

use super::descriptor::{
    IntegerDescriptor, PassThroughDescriptor, PromotingDescriptor, SharedDescriptor,
    UnitConvertingDescriptor,
};
use super::grid_type::{BasicGridType, ComponentGridType, SharedGridType};
use super::value::{LogicalType, TypedValue};
use crate::dialect::GridDialect;
use crate::error::GridResult;
use crate::tuple::Tuple;

/// Resolves logical types to grid types for one dialect.
///
/// Dialect overrides are consulted once, when the translator is built, and
/// win over the defaults.
#[derive(Debug, Clone)]
pub struct TypeTranslator {
    types: HashMap<LogicalType, SharedGridType>,
}

impl TypeTranslator {
    /// Translator using only the default mappings.
    pub fn new() -> Self {
        Self {
            types: LogicalType::ALL
                .into_iter()
                .map(|logical| (logical, default_grid_type(logical)))
                .collect(),
        }
    }

    /// Translator honouring `dialect`'s type overrides.
    pub fn for_dialect(dialect: &dyn GridDialect) -> Self {
        let mut translator = Self::new();
        for logical in LogicalType::ALL {
            if let Some(grid_type) = dialect.override_type(logical) {
                tracing::debug!(%logical, grid_type = grid_type.name(), "dialect overrides type");
                translator.types.insert(logical, grid_type);
            }
        }
        translator
    }

    /// Grid type used for `logical`.
    pub fn grid_type(&self, logical: LogicalType) -> SharedGridType {
        match self.types.get(&logical) {
            Some(grid_type) => Arc::clone(grid_type),
            None => default_grid_type(logical),
        }
    }

    /// Component type whose parts use this translator's mappings.
    pub fn component(&self, name: impl Into<String>, parts: &[LogicalType]) -> ComponentGridType {
        ComponentGridType::new(name, parts.iter().map(|p| self.grid_type(*p)).collect())
    }

    /// Binds `value` into `column` as `logical`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Translation`](crate::GridError::Translation) if
    /// the value does not match the type or cannot be stored losslessly.
    pub fn bind(
        &self,
        logical: LogicalType,
        tuple: &mut Tuple,
        value: Option<&TypedValue>,
        column: &str,
    ) -> GridResult<()> {
        self.grid_type(logical).null_safe_set(tuple, value, &[column])
    }

    /// Extracts `column` as `logical`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Translation`](crate::GridError::Translation) if
    /// the stored value cannot be converted.
    pub fn extract(
        &self,
        logical: LogicalType,
        tuple: &Tuple,
        column: &str,
    ) -> GridResult<Option<TypedValue>> {
        self.grid_type(logical).null_safe_get(tuple, &[column])
    }
}

impl Default for TypeTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Default descriptor for a logical type.
pub fn default_descriptor(logical: LogicalType) -> SharedDescriptor {
    use LogicalType as L;
    let pass_through =
        |l: LogicalType| -> SharedDescriptor { Arc::new(PassThroughDescriptor::native(l)) };
    let promote = |l: LogicalType, delegate: SharedDescriptor| -> SharedDescriptor {
        Arc::new(PromotingDescriptor::unchecked(l, delegate))
    };
    match logical {
        L::Boolean | L::Long | L::Double | L::String | L::Binary | L::Uuid | L::Timestamp => {
            pass_through(logical)
        }
        L::Integer => Arc::new(IntegerDescriptor),
        L::Byte | L::Short | L::NumericBoolean => promote(logical, Arc::new(IntegerDescriptor)),
        L::Float => promote(logical, pass_through(L::Double)),
        L::Character
        | L::Calendar
        | L::CalendarDate
        | L::BigDecimal
        | L::BigInteger
        | L::Url => promote(logical, pass_through(L::String)),
        L::YesNo | L::TrueFalse => {
            promote(logical, promote(L::Character, pass_through(L::String)))
        }
        L::Date => Arc::new(UnitConvertingDescriptor::epoch_days()),
        L::Time => Arc::new(UnitConvertingDescriptor::nanos_of_day()),
    }
}

/// Default grid type for a logical type.
pub fn default_grid_type(logical: LogicalType) -> SharedGridType {
    Arc::new(BasicGridType::new(default_descriptor(logical)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridType;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tuplegrid_codec::Value;
    use uuid::Uuid;

    fn samples() -> Vec<(LogicalType, TypedValue)> {
        vec![
            (LogicalType::Boolean, TypedValue::Boolean(true)),
            (LogicalType::YesNo, TypedValue::Boolean(false)),
            (LogicalType::TrueFalse, TypedValue::Boolean(true)),
            (LogicalType::NumericBoolean, TypedValue::Boolean(true)),
            (LogicalType::Byte, TypedValue::Byte(i8::MIN)),
            (LogicalType::Short, TypedValue::Short(i16::MAX)),
            (LogicalType::Integer, TypedValue::Integer(-42)),
            (LogicalType::Long, TypedValue::Long(i64::MAX)),
            (LogicalType::Float, TypedValue::Float(1.25)),
            (LogicalType::Double, TypedValue::Double(0.1)),
            (LogicalType::Character, TypedValue::Character('ß')),
            (LogicalType::String, TypedValue::String("hello".into())),
            (LogicalType::Binary, TypedValue::Binary(vec![0, 1, 255])),
            (LogicalType::Uuid, TypedValue::Uuid(Uuid::new_v4())),
            (
                LogicalType::Timestamp,
                TypedValue::Timestamp(Utc.timestamp_millis_opt(1_234_567).unwrap()),
            ),
            (
                LogicalType::Date,
                TypedValue::Date(NaiveDate::from_ymd_opt(2001, 9, 9).unwrap()),
            ),
            (
                LogicalType::Time,
                TypedValue::Time(chrono::NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap()),
            ),
            (
                LogicalType::Calendar,
                TypedValue::Calendar(
                    chrono::DateTime::parse_from_rfc3339("2020-02-29T12:00:00-05:00").unwrap(),
                ),
            ),
            (
                LogicalType::CalendarDate,
                TypedValue::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
            ),
            (
                LogicalType::BigDecimal,
                TypedValue::BigDecimal("-0.000000000000000000012345".parse().unwrap()),
            ),
            (
                LogicalType::BigInteger,
                TypedValue::BigInteger("98765432109876543210987654321".parse().unwrap()),
            ),
            (
                LogicalType::Url,
                TypedValue::Url(url::Url::parse("http://user@host:8080/p/q#frag").unwrap()),
            ),
        ]
    }

    #[test]
    fn every_logical_type_has_a_default() {
        let translator = TypeTranslator::new();
        for logical in LogicalType::ALL {
            assert_eq!(translator.grid_type(logical).name(), logical.name());
        }
    }

    #[test]
    fn defaults_round_trip_every_type() {
        let translator = TypeTranslator::new();
        for (logical, value) in samples() {
            let mut tuple = Tuple::new();
            translator.bind(logical, &mut tuple, Some(&value), "c").unwrap();
            let back = translator.extract(logical, &tuple, "c").unwrap();
            assert_eq!(back, Some(value), "{logical}");
        }
    }

    #[test]
    fn native_forms() {
        let translator = TypeTranslator::new();
        let day = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        let mut tuple = Tuple::new();
        translator
            .bind(LogicalType::YesNo, &mut tuple, Some(&TypedValue::Boolean(true)), "yn")
            .unwrap();
        translator
            .bind(LogicalType::Date, &mut tuple, Some(&TypedValue::Date(day)), "d")
            .unwrap();
        translator
            .bind(LogicalType::CalendarDate, &mut tuple, Some(&TypedValue::Date(day)), "cd")
            .unwrap();
        assert_eq!(tuple.get("yn"), Some(Value::from("Y")));
        assert_eq!(tuple.get("d"), Some(Value::Integer(1)));
        assert_eq!(tuple.get("cd"), Some(Value::from("1970-01-02")));
    }

    #[test]
    fn mismatched_value_is_a_translation_error() {
        let translator = TypeTranslator::new();
        let mut tuple = Tuple::new();
        let err = translator
            .bind(LogicalType::Integer, &mut tuple, Some(&TypedValue::String("x".into())), "c")
            .unwrap_err();
        assert!(matches!(err, crate::GridError::Translation { .. }));
        assert!(!tuple.has_operations());
    }

    #[test]
    fn component_uses_translator_mappings() {
        let translator = TypeTranslator::new();
        let component = translator.component("money", &[LogicalType::Long, LogicalType::Character]);
        let value = TypedValue::Component(vec![
            Some(TypedValue::Long(100)),
            Some(TypedValue::Character('€')),
        ]);
        let mut tuple = Tuple::new();
        component
            .null_safe_set(&mut tuple, Some(&value), &["amount", "currency"])
            .unwrap();
        assert_eq!(tuple.get("currency"), Some(Value::from("€")));
        assert_eq!(
            component.null_safe_get(&tuple, &["amount", "currency"]).unwrap(),
            Some(value)
        );
    }
}
