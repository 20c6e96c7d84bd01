//! Property-based test generators using proptest.
//!
//! Provides strategies for native values, columns and typed application
//! values. Typed values are always representable by their logical type, so
//! binding them must succeed.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use proptest::prelude::*;
use tuplegrid_codec::Value;
use tuplegrid_core::types::{BigDecimal, BigInt, LogicalType, TypedValue, Url};
use uuid::Uuid;

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Strategy for column names.
pub fn column_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for values usable as key columns.
pub fn key_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        "[a-zA-Z0-9]{1,12}".prop_map(Value::Text),
        any::<u128>().prop_map(|bits| Value::Uuid(Uuid::from_u128(bits))),
    ]
}

/// Strategy for scalar native values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        any::<f64>()
            .prop_filter("NaN is not storable", |f| !f.is_nan())
            .prop_map(Value::Float),
        any::<String>().prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bytes),
        any::<u128>().prop_map(|bits| Value::Uuid(Uuid::from_u128(bits))),
        any::<i64>().prop_map(Value::Timestamp),
    ]
}

/// Strategy for the columns of one tuple.
pub fn columns_strategy() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map(column_name_strategy(), scalar_value_strategy(), 0..8)
}

/// Strategy for the logical types.
pub fn logical_type_strategy() -> impl Strategy<Value = LogicalType> {
    prop::sample::select(LogicalType::ALL.to_vec())
}

fn timestamp_strategy() -> impl Strategy<Value = DateTime<chrono::Utc>> {
    (-8_000_000_000_000i64..8_000_000_000_000i64)
        .prop_filter_map("timestamp out of range", DateTime::from_timestamp_millis)
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (-200_000i32..200_000i32).prop_filter_map("date out of range", |days| {
        NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + days)
    })
}

fn time_strategy() -> impl Strategy<Value = NaiveTime> {
    (0u32..86_400, 0u32..1_000_000_000).prop_filter_map("time out of range", |(secs, nanos)| {
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
    })
}

fn calendar_strategy() -> impl Strategy<Value = DateTime<FixedOffset>> {
    // RFC 3339 offsets carry whole minutes only
    (timestamp_strategy(), -14 * 60..=14 * 60i32).prop_filter_map(
        "offset out of range",
        |(instant, minutes)| {
            FixedOffset::east_opt(minutes * 60).map(|offset| instant.with_timezone(&offset))
        },
    )
}

fn big_integer_strategy() -> impl Strategy<Value = BigInt> {
    // products of two i128s reach well past any fixed-width integer
    (any::<i128>(), any::<i128>()).prop_map(|(a, b)| BigInt::from(a) * BigInt::from(b))
}

fn big_decimal_strategy() -> impl Strategy<Value = BigDecimal> {
    (big_integer_strategy(), -40i64..40).prop_map(|(digits, scale)| BigDecimal::new(digits, scale))
}

fn url_strategy() -> impl Strategy<Value = Url> {
    ("(http|https|ftp)", "[a-z][a-z0-9]{0,10}", "[a-z0-9/]{0,12}").prop_filter_map(
        "url does not parse",
        |(scheme, host, path)| Url::parse(&format!("{scheme}://{host}.example/{path}")).ok(),
    )
}

/// Strategy for a value representable by `logical`.
pub fn typed_value_strategy(logical: LogicalType) -> BoxedStrategy<TypedValue> {
    match logical {
        LogicalType::Boolean
        | LogicalType::YesNo
        | LogicalType::TrueFalse
        | LogicalType::NumericBoolean => any::<bool>().prop_map(TypedValue::Boolean).boxed(),
        LogicalType::Byte => any::<i8>().prop_map(TypedValue::Byte).boxed(),
        LogicalType::Short => any::<i16>().prop_map(TypedValue::Short).boxed(),
        LogicalType::Integer => any::<i32>().prop_map(TypedValue::Integer).boxed(),
        LogicalType::Long => any::<i64>().prop_map(TypedValue::Long).boxed(),
        LogicalType::Float => any::<f32>()
            .prop_filter("NaN is not storable", |f| !f.is_nan())
            .prop_map(TypedValue::Float)
            .boxed(),
        LogicalType::Double => any::<f64>()
            .prop_filter("NaN is not storable", |f| !f.is_nan())
            .prop_map(TypedValue::Double)
            .boxed(),
        LogicalType::Character => any::<char>().prop_map(TypedValue::Character).boxed(),
        LogicalType::String => any::<String>().prop_map(TypedValue::String).boxed(),
        LogicalType::Binary => prop::collection::vec(any::<u8>(), 0..64)
            .prop_map(TypedValue::Binary)
            .boxed(),
        LogicalType::Uuid => any::<u128>()
            .prop_map(|bits| TypedValue::Uuid(Uuid::from_u128(bits)))
            .boxed(),
        LogicalType::Timestamp => timestamp_strategy().prop_map(TypedValue::Timestamp).boxed(),
        LogicalType::Date | LogicalType::CalendarDate => {
            date_strategy().prop_map(TypedValue::Date).boxed()
        }
        LogicalType::Time => time_strategy().prop_map(TypedValue::Time).boxed(),
        LogicalType::Calendar => calendar_strategy().prop_map(TypedValue::Calendar).boxed(),
        LogicalType::BigDecimal => big_decimal_strategy().prop_map(TypedValue::BigDecimal).boxed(),
        LogicalType::BigInteger => big_integer_strategy().prop_map(TypedValue::BigInteger).boxed(),
        LogicalType::Url => url_strategy().prop_map(TypedValue::Url).boxed(),
    }
}

/// Strategy for a logical type together with a value it can represent.
pub fn typed_pair_strategy() -> impl Strategy<Value = (LogicalType, TypedValue)> {
    logical_type_strategy()
        .prop_flat_map(|logical| (Just(logical), typed_value_strategy(logical)))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn key_values_are_never_null(value in key_value_strategy()) {
            prop_assert!(!value.is_null());
        }

        #[test]
        fn dates_stay_in_range(date in date_strategy()) {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            prop_assert!((date - epoch).num_days().abs() < 200_000);
        }

        #[test]
        fn urls_keep_their_generated_host(url in url_strategy()) {
            prop_assert!(url.host_str().is_some_and(|host| host.ends_with(".example")));
        }

        #[test]
        fn calendars_use_whole_minute_offsets(dt in calendar_strategy()) {
            prop_assert_eq!(dt.offset().local_minus_utc() % 60, 0);
        }
    }
}
