//! Conversions between one logical value and one native [`Value`].

use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Timelike, Utc};
use num_bigint::BigInt;
use tuplegrid_codec::Value;
use url::Url;
use uuid::Uuid;

use super::value::{LogicalType, TypedValue};
use crate::error::{GridError, GridResult};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const MILLIS_PER_DAY: i64 = 86_400_000;
const NANOS_PER_DAY: i64 = MILLIS_PER_DAY * NANOS_PER_MILLI;

/// Converts a logical value into its native form and back.
///
/// `unwrap` goes application to store, `wrap` goes store to application.
/// Both fail with [`GridError::Translation`] rather than lose information.
pub trait GridTypeDescriptor: fmt::Debug + Send + Sync {
    /// Logical type this descriptor accepts.
    fn logical_type(&self) -> LogicalType;

    /// Converts a logical value into a native value.
    fn unwrap(&self, value: &TypedValue) -> GridResult<Value>;

    /// Converts a native value into a logical value.
    fn wrap(&self, value: &Value) -> GridResult<TypedValue>;
}

/// Shared descriptor handle.
pub type SharedDescriptor = Arc<dyn GridTypeDescriptor>;

fn mismatch(logical: LogicalType, expected: &str, found: &str) -> GridError {
    GridError::translation(logical.name(), format!("expected {expected}, found {found}"))
}

/// Identity mapping for types the store holds natively.
#[derive(Debug, Clone, Copy)]
pub struct PassThroughDescriptor {
    logical: LogicalType,
}

impl PassThroughDescriptor {
    /// Descriptor for a natively stored logical type.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Translation`] if the type has no native form.
    pub fn new(logical: LogicalType) -> GridResult<Self> {
        match logical {
            LogicalType::Boolean
            | LogicalType::Long
            | LogicalType::Double
            | LogicalType::String
            | LogicalType::Binary
            | LogicalType::Uuid
            | LogicalType::Timestamp => Ok(Self::native(logical)),
            other => Err(GridError::translation(
                other.name(),
                "no native representation",
            )),
        }
    }

    pub(super) const fn native(logical: LogicalType) -> Self {
        Self { logical }
    }
}

impl GridTypeDescriptor for PassThroughDescriptor {
    fn logical_type(&self) -> LogicalType {
        self.logical
    }

    fn unwrap(&self, value: &TypedValue) -> GridResult<Value> {
        match (self.logical, value) {
            (LogicalType::Boolean, TypedValue::Boolean(b)) => Ok(Value::Bool(*b)),
            (LogicalType::Long, TypedValue::Long(n)) => Ok(Value::Integer(*n)),
            (LogicalType::Double, TypedValue::Double(x)) => {
                if x.is_nan() {
                    Err(GridError::translation(self.logical.name(), "NaN cannot be stored"))
                } else {
                    Ok(Value::Float(*x))
                }
            }
            (LogicalType::String, TypedValue::String(s)) => Ok(Value::Text(s.clone())),
            (LogicalType::Binary, TypedValue::Binary(b)) => Ok(Value::Bytes(b.clone())),
            (LogicalType::Uuid, TypedValue::Uuid(u)) => Ok(Value::Uuid(*u)),
            (LogicalType::Timestamp, TypedValue::Timestamp(instant)) => {
                if instant.timestamp_subsec_nanos() % 1_000_000 != 0 {
                    return Err(GridError::translation(
                        self.logical.name(),
                        "sub-millisecond precision would be lost",
                    ));
                }
                Ok(Value::Timestamp(instant.timestamp_millis()))
            }
            (logical, other) => Err(mismatch(logical, logical.name(), other.kind())),
        }
    }

    fn wrap(&self, value: &Value) -> GridResult<TypedValue> {
        match (self.logical, value) {
            (LogicalType::Boolean, Value::Bool(b)) => Ok(TypedValue::Boolean(*b)),
            (LogicalType::Long, Value::Integer(n)) => Ok(TypedValue::Long(*n)),
            (LogicalType::Double, Value::Float(x)) => Ok(TypedValue::Double(*x)),
            // Integral doubles may come back from stores that normalise numbers.
            (LogicalType::Double, Value::Integer(n)) => {
                let x = *n as f64;
                // f64 -> i64 saturates, so compare in a wider type
                if x as i128 == i128::from(*n) {
                    Ok(TypedValue::Double(x))
                } else {
                    Err(GridError::translation(
                        self.logical.name(),
                        format!("{n} has no exact double representation"),
                    ))
                }
            }
            (LogicalType::String, Value::Text(s)) => Ok(TypedValue::String(s.clone())),
            (LogicalType::Binary, Value::Bytes(b)) => Ok(TypedValue::Binary(b.clone())),
            (LogicalType::Uuid, Value::Uuid(u)) => Ok(TypedValue::Uuid(*u)),
            (LogicalType::Timestamp, Value::Timestamp(ms)) => DateTime::<Utc>::from_timestamp_millis(*ms)
                .map(TypedValue::Timestamp)
                .ok_or_else(|| {
                    GridError::translation(self.logical.name(), format!("{ms} ms is out of range"))
                }),
            (logical, other) => Err(mismatch(logical, logical.name(), other.kind())),
        }
    }
}

/// Range-checked mapping of 32-bit integers onto native integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerDescriptor;

impl GridTypeDescriptor for IntegerDescriptor {
    fn logical_type(&self) -> LogicalType {
        LogicalType::Integer
    }

    fn unwrap(&self, value: &TypedValue) -> GridResult<Value> {
        match value {
            TypedValue::Integer(n) => Ok(Value::Integer(i64::from(*n))),
            other => Err(mismatch(LogicalType::Integer, "integer", other.kind())),
        }
    }

    fn wrap(&self, value: &Value) -> GridResult<TypedValue> {
        match value {
            Value::Integer(n) => i32::try_from(*n).map(TypedValue::Integer).map_err(|_| {
                GridError::translation(LogicalType::Integer.name(), format!("{n} is out of range"))
            }),
            other => Err(mismatch(LogicalType::Integer, "integer", other.kind())),
        }
    }
}

/// Which unit a [`UnitConvertingDescriptor`] stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Timestamps as integer milliseconds since the Unix epoch.
    EpochMillis,
    /// Dates as integer days since 1970-01-01.
    EpochDays,
    /// Times of day as integer nanoseconds since midnight.
    NanosOfDay,
}

/// Stores temporal values as plain integers in a fixed unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitConvertingDescriptor {
    unit: TimeUnit,
}

impl UnitConvertingDescriptor {
    /// Timestamps as epoch milliseconds.
    pub const fn epoch_millis() -> Self {
        Self {
            unit: TimeUnit::EpochMillis,
        }
    }

    /// Dates as days since the epoch.
    pub const fn epoch_days() -> Self {
        Self {
            unit: TimeUnit::EpochDays,
        }
    }

    /// Times as nanoseconds since midnight.
    pub const fn nanos_of_day() -> Self {
        Self {
            unit: TimeUnit::NanosOfDay,
        }
    }

    /// The stored unit.
    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    fn error(&self, message: impl Into<String>) -> GridError {
        GridError::translation(self.logical_type().name(), message)
    }
}

fn epoch_date() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

impl GridTypeDescriptor for UnitConvertingDescriptor {
    fn logical_type(&self) -> LogicalType {
        match self.unit {
            TimeUnit::EpochMillis => LogicalType::Timestamp,
            TimeUnit::EpochDays => LogicalType::Date,
            TimeUnit::NanosOfDay => LogicalType::Time,
        }
    }

    fn unwrap(&self, value: &TypedValue) -> GridResult<Value> {
        match (self.unit, value) {
            (TimeUnit::EpochMillis, TypedValue::Timestamp(instant)) => {
                if instant.timestamp_subsec_nanos() % 1_000_000 != 0 {
                    return Err(self.error("sub-millisecond precision would be lost"));
                }
                Ok(Value::Integer(instant.timestamp_millis()))
            }
            (TimeUnit::EpochDays, TypedValue::Date(date)) => {
                Ok(Value::Integer(date.signed_duration_since(epoch_date()).num_days()))
            }
            (TimeUnit::NanosOfDay, TypedValue::Time(time)) => {
                let nanos = i64::from(time.nanosecond());
                if nanos >= NANOS_PER_SECOND {
                    return Err(self.error("leap seconds cannot be stored"));
                }
                Ok(Value::Integer(
                    i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND + nanos,
                ))
            }
            // An instant bound to a time column keeps only its time of day.
            (TimeUnit::NanosOfDay, TypedValue::Timestamp(instant)) => Ok(Value::Integer(
                instant.timestamp_millis().rem_euclid(MILLIS_PER_DAY) * NANOS_PER_MILLI,
            )),
            (_, other) => Err(mismatch(
                self.logical_type(),
                self.logical_type().name(),
                other.kind(),
            )),
        }
    }

    fn wrap(&self, value: &Value) -> GridResult<TypedValue> {
        let Value::Integer(n) = value else {
            return Err(mismatch(self.logical_type(), "integer", value.kind()));
        };
        let n = *n;
        match self.unit {
            TimeUnit::EpochMillis => DateTime::<Utc>::from_timestamp_millis(n)
                .map(TypedValue::Timestamp)
                .ok_or_else(|| self.error(format!("{n} ms is out of range"))),
            TimeUnit::EpochDays => {
                let epoch = epoch_date();
                let days = Days::new(n.unsigned_abs());
                let date = if n >= 0 {
                    epoch.checked_add_days(days)
                } else {
                    epoch.checked_sub_days(days)
                };
                date.map(TypedValue::Date)
                    .ok_or_else(|| self.error(format!("{n} days is out of range")))
            }
            TimeUnit::NanosOfDay => {
                if !(0..NANOS_PER_DAY).contains(&n) {
                    return Err(self.error(format!("{n} ns is not a time of day")));
                }
                let secs = u32::try_from(n / NANOS_PER_SECOND)
                    .map_err(|_| self.error(format!("{n} ns is not a time of day")))?;
                let nanos = u32::try_from(n % NANOS_PER_SECOND)
                    .map_err(|_| self.error(format!("{n} ns is not a time of day")))?;
                NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                    .map(TypedValue::Time)
                    .ok_or_else(|| self.error(format!("{n} ns is not a time of day")))
            }
        }
    }
}

/// Widens a logical value into a broader logical type, then stores it with
/// that type's descriptor.
///
/// Reading narrows back and fails if the stored value does not fit.
#[derive(Debug, Clone)]
pub struct PromotingDescriptor {
    logical: LogicalType,
    delegate: SharedDescriptor,
}

impl PromotingDescriptor {
    /// Promotes `logical` through `delegate`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Translation`] if `logical` cannot be widened
    /// into the delegate's logical type.
    pub fn new(logical: LogicalType, delegate: SharedDescriptor) -> GridResult<Self> {
        let target = delegate.logical_type();
        if !Self::supports(logical, target) {
            return Err(GridError::translation(
                logical.name(),
                format!("cannot be promoted to {target}"),
            ));
        }
        Ok(Self::unchecked(logical, delegate))
    }

    pub(super) fn unchecked(logical: LogicalType, delegate: SharedDescriptor) -> Self {
        Self { logical, delegate }
    }

    /// True if `logical` can be widened into `target`.
    pub fn supports(logical: LogicalType, target: LogicalType) -> bool {
        use LogicalType as L;
        matches!(
            (logical, target),
            (L::Byte | L::Short, L::Integer | L::Long)
                | (L::Integer, L::Long)
                | (L::Float, L::Double)
                | (L::Character | L::Calendar | L::Uuid, L::String)
                | (L::CalendarDate | L::BigDecimal | L::BigInteger | L::Url, L::String)
                | (L::YesNo | L::TrueFalse, L::Character | L::String)
                | (L::NumericBoolean, L::Integer | L::Long)
        )
    }

    /// Logical type the value is widened into.
    pub fn target(&self) -> LogicalType {
        self.delegate.logical_type()
    }

    fn error(&self, message: impl Into<String>) -> GridError {
        GridError::translation(self.logical.name(), message)
    }

    fn widen(&self, value: &TypedValue) -> GridResult<TypedValue> {
        use LogicalType as L;
        let target = self.target();
        let widened = match (self.logical, value) {
            (L::Byte, TypedValue::Byte(n)) => self.integral(i64::from(*n))?,
            (L::Short, TypedValue::Short(n)) => self.integral(i64::from(*n))?,
            (L::Integer, TypedValue::Integer(n)) => self.integral(i64::from(*n))?,
            (L::NumericBoolean, TypedValue::Boolean(b)) => self.integral(i64::from(*b))?,
            (L::Float, TypedValue::Float(x)) => TypedValue::Double(f64::from(*x)),
            (L::Character, TypedValue::Character(c)) => TypedValue::String(c.to_string()),
            (L::Calendar, TypedValue::Calendar(dt)) => TypedValue::String(dt.to_rfc3339()),
            (L::Uuid, TypedValue::Uuid(u)) => TypedValue::String(u.hyphenated().to_string()),
            (L::CalendarDate, TypedValue::Date(date)) => TypedValue::String(date.to_string()),
            (L::BigDecimal, TypedValue::BigDecimal(d)) => TypedValue::String(d.to_string()),
            (L::BigInteger, TypedValue::BigInteger(n)) => TypedValue::String(n.to_string()),
            (L::Url, TypedValue::Url(url)) => TypedValue::String(url.as_str().to_string()),
            (L::YesNo, TypedValue::Boolean(b)) => textual(target, if *b { 'Y' } else { 'N' }),
            (L::TrueFalse, TypedValue::Boolean(b)) => textual(target, if *b { 'T' } else { 'F' }),
            (logical, other) => return Err(mismatch(logical, logical.name(), other.kind())),
        };
        Ok(widened)
    }

    fn narrow(&self, value: TypedValue) -> GridResult<TypedValue> {
        use LogicalType as L;
        match self.logical {
            L::Byte => {
                let n = integral_value(&value).ok_or_else(|| self.kind_error(&value))?;
                i8::try_from(n)
                    .map(TypedValue::Byte)
                    .map_err(|_| self.error(format!("{n} is out of range")))
            }
            L::Short => {
                let n = integral_value(&value).ok_or_else(|| self.kind_error(&value))?;
                i16::try_from(n)
                    .map(TypedValue::Short)
                    .map_err(|_| self.error(format!("{n} is out of range")))
            }
            L::Integer => {
                let n = integral_value(&value).ok_or_else(|| self.kind_error(&value))?;
                i32::try_from(n)
                    .map(TypedValue::Integer)
                    .map_err(|_| self.error(format!("{n} is out of range")))
            }
            L::NumericBoolean => {
                match integral_value(&value).ok_or_else(|| self.kind_error(&value))? {
                    0 => Ok(TypedValue::Boolean(false)),
                    1 => Ok(TypedValue::Boolean(true)),
                    n => Err(self.error(format!("{n} is neither 0 nor 1"))),
                }
            }
            L::Float => match value {
                TypedValue::Double(x) => {
                    let narrowed = x as f32;
                    if f64::from(narrowed) == x {
                        Ok(TypedValue::Float(narrowed))
                    } else {
                        Err(self.error(format!("{x} has no exact single precision form")))
                    }
                }
                other => Err(self.kind_error(&other)),
            },
            L::Character => {
                let c = single_char(&value).ok_or_else(|| self.error("expected exactly one character"))?;
                Ok(TypedValue::Character(c))
            }
            L::Calendar => match value {
                TypedValue::String(s) => DateTime::parse_from_rfc3339(&s)
                    .map(TypedValue::Calendar)
                    .map_err(|e| self.error(format!("'{s}': {e}"))),
                other => Err(self.kind_error(&other)),
            },
            L::Uuid => match value {
                TypedValue::String(s) => Uuid::parse_str(&s)
                    .map(TypedValue::Uuid)
                    .map_err(|e| self.error(format!("'{s}': {e}"))),
                other => Err(self.kind_error(&other)),
            },
            L::CalendarDate => {
                let s = self.text(value)?;
                s.parse::<NaiveDate>()
                    .map(TypedValue::Date)
                    .map_err(|e| self.error(format!("'{s}': {e}")))
            }
            L::BigDecimal => {
                let s = self.text(value)?;
                s.parse::<BigDecimal>()
                    .map(TypedValue::BigDecimal)
                    .map_err(|e| self.error(format!("'{s}': {e}")))
            }
            L::BigInteger => {
                let s = self.text(value)?;
                s.parse::<BigInt>()
                    .map(TypedValue::BigInteger)
                    .map_err(|e| self.error(format!("'{s}': {e}")))
            }
            L::Url => {
                let s = self.text(value)?;
                Url::parse(&s)
                    .map(TypedValue::Url)
                    .map_err(|e| self.error(format!("'{s}': {e}")))
            }
            L::YesNo | L::TrueFalse => {
                let (yes, no) = if self.logical == L::YesNo { ('Y', 'N') } else { ('T', 'F') };
                match single_char(&value) {
                    Some(c) if c == yes => Ok(TypedValue::Boolean(true)),
                    Some(c) if c == no => Ok(TypedValue::Boolean(false)),
                    _ => Err(self.error(format!("expected '{yes}' or '{no}'"))),
                }
            }
            other => Err(GridError::translation(other.name(), "not a promotable type")),
        }
    }

    fn kind_error(&self, value: &TypedValue) -> GridError {
        mismatch(self.logical, self.target().name(), value.kind())
    }

    fn text(&self, value: TypedValue) -> GridResult<String> {
        match value {
            TypedValue::String(s) => Ok(s),
            other => Err(self.kind_error(&other)),
        }
    }

    fn integral(&self, n: i64) -> GridResult<TypedValue> {
        match self.target() {
            LogicalType::Integer => i32::try_from(n)
                .map(TypedValue::Integer)
                .map_err(|_| self.error(format!("{n} does not fit in {}", LogicalType::Integer))),
            _ => Ok(TypedValue::Long(n)),
        }
    }
}

fn integral_value(value: &TypedValue) -> Option<i64> {
    match value {
        TypedValue::Integer(n) => Some(i64::from(*n)),
        TypedValue::Long(n) => Some(*n),
        _ => None,
    }
}

fn textual(target: LogicalType, c: char) -> TypedValue {
    match target {
        LogicalType::Character => TypedValue::Character(c),
        _ => TypedValue::String(c.to_string()),
    }
}

fn single_char(value: &TypedValue) -> Option<char> {
    match value {
        TypedValue::Character(c) => Some(*c),
        TypedValue::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }
        _ => None,
    }
}

impl GridTypeDescriptor for PromotingDescriptor {
    fn logical_type(&self) -> LogicalType {
        self.logical
    }

    fn unwrap(&self, value: &TypedValue) -> GridResult<Value> {
        let widened = self.widen(value)?;
        self.delegate.unwrap(&widened)
    }

    fn wrap(&self, value: &Value) -> GridResult<TypedValue> {
        let widened = self.delegate.wrap(value)?;
        self.narrow(widened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn string() -> SharedDescriptor {
        Arc::new(PassThroughDescriptor::new(LogicalType::String).unwrap())
    }

    fn integer() -> SharedDescriptor {
        Arc::new(IntegerDescriptor)
    }

    #[test]
    fn pass_through_rejects_non_native_types() {
        assert!(PassThroughDescriptor::new(LogicalType::Byte).is_err());
        assert!(PassThroughDescriptor::new(LogicalType::Calendar).is_err());
    }

    #[test]
    fn pass_through_rejects_wrong_variant() {
        let d = PassThroughDescriptor::new(LogicalType::Long).unwrap();
        assert!(d.unwrap(&TypedValue::String("1".into())).is_err());
        assert!(d.wrap(&Value::Text("1".into())).is_err());
    }

    #[test]
    fn double_accepts_integral_natives() {
        let d = PassThroughDescriptor::new(LogicalType::Double).unwrap();
        assert_eq!(d.wrap(&Value::Integer(3)).unwrap(), TypedValue::Double(3.0));
        assert!(d.unwrap(&TypedValue::Double(f64::NAN)).is_err());
    }

    #[test]
    fn double_rejects_integers_it_cannot_hold_exactly() {
        let d = PassThroughDescriptor::new(LogicalType::Double).unwrap();
        let two_53 = 1i64 << 53;
        assert_eq!(
            d.wrap(&Value::Integer(two_53)).unwrap(),
            TypedValue::Double(9_007_199_254_740_992.0)
        );
        assert!(d.wrap(&Value::Integer(two_53 + 1)).is_err());
        assert!(d.wrap(&Value::Integer(i64::MAX)).is_err());
        // -2^63 is a power of two, so it is exact
        assert!(d.wrap(&Value::Integer(i64::MIN)).is_ok());
    }

    #[test]
    fn timestamp_keeps_milliseconds_only() {
        let d = PassThroughDescriptor::new(LogicalType::Timestamp).unwrap();
        let exact = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            d.unwrap(&TypedValue::Timestamp(exact)).unwrap(),
            Value::Timestamp(1_700_000_000_123)
        );
        let fine = exact + chrono::Duration::nanoseconds(1);
        assert!(d.unwrap(&TypedValue::Timestamp(fine)).is_err());
    }

    #[test]
    fn integer_wrap_is_range_checked() {
        let d = IntegerDescriptor;
        assert_eq!(d.wrap(&Value::Integer(-5)).unwrap(), TypedValue::Integer(-5));
        let err = d.wrap(&Value::Integer(i64::from(i32::MAX) + 1)).unwrap_err();
        assert!(matches!(err, GridError::Translation { .. }));
    }

    #[test]
    fn byte_promotes_to_integer_and_narrows_back() {
        let d = PromotingDescriptor::new(LogicalType::Byte, integer()).unwrap();
        assert_eq!(d.unwrap(&TypedValue::Byte(-7)).unwrap(), Value::Integer(-7));
        assert_eq!(d.wrap(&Value::Integer(-7)).unwrap(), TypedValue::Byte(-7));
        assert!(d.wrap(&Value::Integer(300)).is_err());
    }

    #[test]
    fn float_narrowing_must_be_exact() {
        let double: SharedDescriptor =
            Arc::new(PassThroughDescriptor::new(LogicalType::Double).unwrap());
        let d = PromotingDescriptor::new(LogicalType::Float, double).unwrap();
        assert_eq!(d.wrap(&Value::Float(0.5)).unwrap(), TypedValue::Float(0.5));
        assert!(d.wrap(&Value::Float(0.1)).is_err());
    }

    #[test]
    fn character_must_be_one_char() {
        let d = PromotingDescriptor::new(LogicalType::Character, string()).unwrap();
        assert_eq!(d.unwrap(&TypedValue::Character('x')).unwrap(), Value::from("x"));
        assert_eq!(d.wrap(&Value::from("é")).unwrap(), TypedValue::Character('é'));
        assert!(d.wrap(&Value::from("xy")).is_err());
        assert!(d.wrap(&Value::from("")).is_err());
    }

    #[test]
    fn yes_no_through_character() {
        let character: SharedDescriptor =
            Arc::new(PromotingDescriptor::new(LogicalType::Character, string()).unwrap());
        let d = PromotingDescriptor::new(LogicalType::YesNo, character).unwrap();
        assert_eq!(d.unwrap(&TypedValue::Boolean(true)).unwrap(), Value::from("Y"));
        assert_eq!(d.wrap(&Value::from("N")).unwrap(), TypedValue::Boolean(false));
        assert!(d.wrap(&Value::from("T")).is_err());
    }

    #[test]
    fn numeric_boolean_accepts_only_zero_and_one() {
        let d = PromotingDescriptor::new(LogicalType::NumericBoolean, integer()).unwrap();
        assert_eq!(d.unwrap(&TypedValue::Boolean(true)).unwrap(), Value::Integer(1));
        assert_eq!(d.wrap(&Value::Integer(0)).unwrap(), TypedValue::Boolean(false));
        assert!(d.wrap(&Value::Integer(2)).is_err());
    }

    #[test]
    fn calendar_round_trips_offset() {
        let d = PromotingDescriptor::new(LogicalType::Calendar, string()).unwrap();
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        let native = d.unwrap(&TypedValue::Calendar(dt)).unwrap();
        assert_eq!(native, Value::from("2024-03-01T10:30:00+02:00"));
        assert_eq!(d.wrap(&native).unwrap(), TypedValue::Calendar(dt));
    }

    #[test]
    fn promotion_into_integer_is_range_checked() {
        let d = PromotingDescriptor::new(LogicalType::Short, integer()).unwrap();
        assert_eq!(d.integral(i64::from(i32::MIN)).unwrap(), TypedValue::Integer(i32::MIN));
        let err = d.integral(i64::from(i32::MAX) + 1).unwrap_err();
        assert!(matches!(err, GridError::Translation { .. }));
        let long: SharedDescriptor =
            Arc::new(PassThroughDescriptor::new(LogicalType::Long).unwrap());
        let wide = PromotingDescriptor::new(LogicalType::Integer, long).unwrap();
        assert_eq!(wide.integral(i64::MAX).unwrap(), TypedValue::Long(i64::MAX));
    }

    #[test]
    fn big_numbers_are_stored_as_text() {
        let d = PromotingDescriptor::new(LogicalType::BigInteger, string()).unwrap();
        let big: BigInt = "-123456789012345678901234567890".parse().unwrap();
        let native = d.unwrap(&TypedValue::BigInteger(big.clone())).unwrap();
        assert_eq!(native, Value::from("-123456789012345678901234567890"));
        assert_eq!(d.wrap(&native).unwrap(), TypedValue::BigInteger(big));
        assert!(d.wrap(&Value::from("12x")).is_err());

        let d = PromotingDescriptor::new(LogicalType::BigDecimal, string()).unwrap();
        let decimal: BigDecimal = "3.14159265358979323846264338327950288".parse().unwrap();
        let native = d.unwrap(&TypedValue::BigDecimal(decimal.clone())).unwrap();
        assert_eq!(d.wrap(&native).unwrap(), TypedValue::BigDecimal(decimal));
        assert!(d.wrap(&Value::from("pi")).is_err());
    }

    #[test]
    fn urls_and_calendar_dates_are_stored_as_text() {
        let d = PromotingDescriptor::new(LogicalType::Url, string()).unwrap();
        let url = Url::parse("https://example.org/a?b=c").unwrap();
        let native = d.unwrap(&TypedValue::Url(url.clone())).unwrap();
        assert_eq!(native, Value::from("https://example.org/a?b=c"));
        assert_eq!(d.wrap(&native).unwrap(), TypedValue::Url(url));
        assert!(d.wrap(&Value::from("not a url")).is_err());

        let d = PromotingDescriptor::new(LogicalType::CalendarDate, string()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let native = d.unwrap(&TypedValue::Date(date)).unwrap();
        assert_eq!(native, Value::from("2024-02-29"));
        assert_eq!(d.wrap(&native).unwrap(), TypedValue::Date(date));
        assert!(d.wrap(&Value::from("2023-02-29")).is_err());
        assert!(d.wrap(&Value::Integer(1)).is_err());
    }

    #[test]
    fn unsupported_promotion_is_rejected() {
        assert!(PromotingDescriptor::new(LogicalType::Binary, string()).is_err());
        assert!(PromotingDescriptor::new(LogicalType::Long, integer()).is_err());
    }

    #[test]
    fn dates_are_days_since_epoch() {
        let d = UnitConvertingDescriptor::epoch_days();
        let date = NaiveDate::from_ymd_opt(1970, 1, 11).unwrap();
        assert_eq!(d.unwrap(&TypedValue::Date(date)).unwrap(), Value::Integer(10));
        let before = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert_eq!(d.unwrap(&TypedValue::Date(before)).unwrap(), Value::Integer(-1));
        assert_eq!(d.wrap(&Value::Integer(-1)).unwrap(), TypedValue::Date(before));
        assert!(d.wrap(&Value::Integer(i64::MAX)).is_err());
    }

    #[test]
    fn times_are_nanos_since_midnight() {
        let d = UnitConvertingDescriptor::nanos_of_day();
        let time = NaiveTime::from_hms_nano_opt(1, 0, 0, 5).unwrap();
        let native = d.unwrap(&TypedValue::Time(time)).unwrap();
        assert_eq!(native, Value::Integer(3_600 * NANOS_PER_SECOND + 5));
        assert_eq!(d.wrap(&native).unwrap(), TypedValue::Time(time));
        assert!(d.wrap(&Value::Integer(NANOS_PER_DAY)).is_err());
        assert!(d.wrap(&Value::Integer(-1)).is_err());
    }

    #[test]
    fn instants_bound_as_time_keep_time_of_day() {
        let d = UnitConvertingDescriptor::nanos_of_day();
        // one day plus 1.5 seconds
        let instant = Utc.timestamp_millis_opt(MILLIS_PER_DAY + 1_500).unwrap();
        assert_eq!(
            d.unwrap(&TypedValue::Timestamp(instant)).unwrap(),
            Value::Integer(1_500 * NANOS_PER_MILLI)
        );
    }

    #[test]
    fn epoch_millis_stores_plain_integers() {
        let d = UnitConvertingDescriptor::epoch_millis();
        let instant = Utc.timestamp_millis_opt(-1_000).unwrap();
        assert_eq!(d.unwrap(&TypedValue::Timestamp(instant)).unwrap(), Value::Integer(-1_000));
        assert_eq!(d.wrap(&Value::Integer(-1_000)).unwrap(), TypedValue::Timestamp(instant));
        assert!(d.wrap(&Value::Timestamp(0)).is_err());
    }
}
