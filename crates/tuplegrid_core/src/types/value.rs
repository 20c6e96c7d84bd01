use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Logical (application-side) types the translation pipeline knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    /// `bool`.
    Boolean,
    /// `bool` stored as `'Y'` / `'N'`.
    YesNo,
    /// `bool` stored as `'T'` / `'F'`.
    TrueFalse,
    /// `bool` stored as `1` / `0`.
    NumericBoolean,
    /// `i8`.
    Byte,
    /// `i16`.
    Short,
    /// `i32`.
    Integer,
    /// `i64`.
    Long,
    /// `f32`.
    Float,
    /// `f64`.
    Double,
    /// A single `char`.
    Character,
    /// UTF-8 text.
    String,
    /// Byte array.
    Binary,
    /// UUID.
    Uuid,
    /// Instant with millisecond precision.
    Timestamp,
    /// Calendar date without time.
    Date,
    /// Time of day without date.
    Time,
    /// Instant with a UTC offset.
    Calendar,
    /// Calendar date stored as ISO 8601 text.
    CalendarDate,
    /// Arbitrary precision decimal.
    BigDecimal,
    /// Arbitrary precision integer.
    BigInteger,
    /// Absolute URL.
    Url,
}

impl LogicalType {
    /// Every logical type.
    pub const ALL: [LogicalType; 22] = [
        LogicalType::Boolean,
        LogicalType::YesNo,
        LogicalType::TrueFalse,
        LogicalType::NumericBoolean,
        LogicalType::Byte,
        LogicalType::Short,
        LogicalType::Integer,
        LogicalType::Long,
        LogicalType::Float,
        LogicalType::Double,
        LogicalType::Character,
        LogicalType::String,
        LogicalType::Binary,
        LogicalType::Uuid,
        LogicalType::Timestamp,
        LogicalType::Date,
        LogicalType::Time,
        LogicalType::Calendar,
        LogicalType::CalendarDate,
        LogicalType::BigDecimal,
        LogicalType::BigInteger,
        LogicalType::Url,
    ];

    /// Type name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            LogicalType::Boolean => "boolean",
            LogicalType::YesNo => "yes_no",
            LogicalType::TrueFalse => "true_false",
            LogicalType::NumericBoolean => "numeric_boolean",
            LogicalType::Byte => "byte",
            LogicalType::Short => "short",
            LogicalType::Integer => "integer",
            LogicalType::Long => "long",
            LogicalType::Float => "float",
            LogicalType::Double => "double",
            LogicalType::Character => "character",
            LogicalType::String => "string",
            LogicalType::Binary => "binary",
            LogicalType::Uuid => "uuid",
            LogicalType::Timestamp => "timestamp",
            LogicalType::Date => "date",
            LogicalType::Time => "time",
            LogicalType::Calendar => "calendar",
            LogicalType::CalendarDate => "calendar_date",
            LogicalType::BigDecimal => "big_decimal",
            LogicalType::BigInteger => "big_integer",
            LogicalType::Url => "url",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A strongly typed application value.
///
/// The boolean flavours (`YesNo`, `TrueFalse`, `NumericBoolean`) all use
/// [`TypedValue::Boolean`] and both date flavours use [`TypedValue::Date`];
/// the logical type decides the storage form.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Boolean.
    Boolean(bool),
    /// 8-bit integer.
    Byte(i8),
    /// 16-bit integer.
    Short(i16),
    /// 32-bit integer.
    Integer(i32),
    /// 64-bit integer.
    Long(i64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// One character.
    Character(char),
    /// Text.
    String(String),
    /// Bytes.
    Binary(Vec<u8>),
    /// UUID.
    Uuid(Uuid),
    /// UTC instant.
    Timestamp(DateTime<Utc>),
    /// Date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Instant with offset.
    Calendar(DateTime<FixedOffset>),
    /// Decimal.
    BigDecimal(BigDecimal),
    /// Integer of any size.
    BigInteger(BigInt),
    /// URL.
    Url(Url),
    /// Multi-column value, one entry per part; `None` parts are null.
    Component(Vec<Option<TypedValue>>),
}

impl TypedValue {
    /// Variant name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Boolean(_) => "boolean",
            TypedValue::Byte(_) => "byte",
            TypedValue::Short(_) => "short",
            TypedValue::Integer(_) => "integer",
            TypedValue::Long(_) => "long",
            TypedValue::Float(_) => "float",
            TypedValue::Double(_) => "double",
            TypedValue::Character(_) => "character",
            TypedValue::String(_) => "string",
            TypedValue::Binary(_) => "binary",
            TypedValue::Uuid(_) => "uuid",
            TypedValue::Timestamp(_) => "timestamp",
            TypedValue::Date(_) => "date",
            TypedValue::Time(_) => "time",
            TypedValue::Calendar(_) => "calendar",
            TypedValue::BigDecimal(_) => "big_decimal",
            TypedValue::BigInteger(_) => "big_integer",
            TypedValue::Url(_) => "url",
            TypedValue::Component(_) => "component",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_type_names_are_unique() {
        let mut names: Vec<_> = LogicalType::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), LogicalType::ALL.len());
    }

    #[test]
    fn logical_type_serde_uses_display_names() {
        for logical in LogicalType::ALL {
            let json = serde_json::to_string(&logical).unwrap();
            assert_eq!(json, format!("\"{logical}\""));
        }
    }
}
