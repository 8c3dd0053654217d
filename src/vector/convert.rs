//! Pure conversions between host values and the physical slot
//! representation of engine vectors.

use chrono::DateTime;
use chrono::Days;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::catalog::r#type::LogicalType;
use crate::catalog::value::Value;
use crate::error::Error;
use crate::error::Result;
use crate::value_err;

const MICROS_PER_SEC: i64 = 1_000_000;

/// Integer width backing a DECIMAL or ENUM slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
}

/// DECIMALs are stored in the narrowest integer holding `width` digits.
pub fn decimal_storage(width: u8) -> Storage {
    match width {
        0..=4 => Storage::Int16,
        5..=9 => Storage::Int32,
        10..=18 => Storage::Int64,
        _ => Storage::Int128,
    }
}

/// ENUM codes use the narrowest unsigned integer indexing the dictionary.
pub fn enum_storage(size: usize) -> Storage {
    if size <= u8::MAX as usize {
        Storage::UInt8
    } else if size <= u16::MAX as usize {
        Storage::UInt16
    } else {
        Storage::UInt32
    }
}

/// Days since 1970-01-01, `NaiveDate::default()`.
pub fn date_to_days(date: &NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

pub fn date_from_days(days: i32) -> Result<NaiveDate> {
    let epoch = NaiveDate::default();
    let date = if days >= 0 {
        epoch.checked_add_days(Days::new(days as u64))
    } else {
        epoch.checked_sub_days(Days::new(days.unsigned_abs() as u64))
    };
    date.ok_or_else(|| value_err!("date out of range: {} days", days))
}

pub fn timestamp_to_micros(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

pub fn timestamp_from_micros(micros: i64) -> Result<NaiveDateTime> {
    let secs = micros.div_euclid(MICROS_PER_SEC);
    let nanos = (micros.rem_euclid(MICROS_PER_SEC) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| value_err!("timestamp out of range: {} micros", micros))
}

/// Splits a 128-bit integer into the `(lower, upper)` halves of a hugeint.
pub fn i128_to_hugeint(v: i128) -> (u64, i64) {
    (v as u64, (v >> 64) as i64)
}

pub fn i128_from_hugeint(lower: u64, upper: i64) -> i128 {
    ((upper as i128) << 64) | lower as i128
}

/// UUIDs are hugeints with the top bit flipped, so that signed order
/// matches the byte order of the UUID.
pub fn uuid_to_hugeint(uuid: &Uuid) -> (u64, i64) {
    let (lower, upper) = i128_to_hugeint(uuid.as_u128() as i128);
    (lower, upper ^ i64::MIN)
}

pub fn uuid_from_hugeint(lower: u64, upper: i64) -> Uuid {
    Uuid::from_u128(i128_from_hugeint(lower, upper ^ i64::MIN) as u128)
}

fn mismatch(value: &Value, ty: &LogicalType) -> Error {
    value_err!("cannot store value {:?} in a vector of type {}", value, ty)
}

/// Checks that `value`, including every nested element, can be stored in
/// a slot of type `ty`. No implicit conversion happens: the variant must
/// match the type, except that ENUM slots also take a VARCHAR naming a
/// member and ARRAY slots take a LIST of the exact size.
pub fn check_value(ty: &LogicalType, value: &Value) -> Result<()> {
    let matches = match (ty, value) {
        (_, Value::Null) => true,
        (LogicalType::Boolean, Value::Boolean(_))
        | (LogicalType::TinyInt, Value::TinyInt(_))
        | (LogicalType::SmallInt, Value::SmallInt(_))
        | (LogicalType::Integer, Value::Integer(_))
        | (LogicalType::BigInt, Value::BigInt(_))
        | (LogicalType::UTinyInt, Value::UTinyInt(_))
        | (LogicalType::USmallInt, Value::USmallInt(_))
        | (LogicalType::UInteger, Value::UInteger(_))
        | (LogicalType::UBigInt, Value::UBigInt(_))
        | (LogicalType::Float, Value::Float(_))
        | (LogicalType::Double, Value::Double(_))
        | (LogicalType::Varchar, Value::Varchar(_))
        | (LogicalType::Blob, Value::Blob(_))
        | (LogicalType::Date, Value::Date(_))
        | (LogicalType::Timestamp, Value::Timestamp(_))
        | (LogicalType::Uuid, Value::Uuid(_)) => true,
        (LogicalType::Decimal { width, scale }, Value::Decimal { value: v, scale: s, .. }) => {
            s == scale && v.unsigned_abs() < 10u128.pow(*width as u32)
        }
        (LogicalType::Enum(values), Value::Enum(x) | Value::Varchar(x)) => {
            if !values.contains(x) {
                return Err(value_err!("'{}' is not a member of {}", x, ty));
            }
            true
        }
        (LogicalType::List(child), Value::List(items)) => {
            items.iter().try_for_each(|item| check_value(child, item))?;
            true
        }
        (LogicalType::Array(child, size), Value::List(items)) => {
            if items.len() != *size {
                return Err(value_err!(
                    "array of size {} cannot hold {} elements",
                    size,
                    items.len()
                ));
            }
            items.iter().try_for_each(|item| check_value(child, item))?;
            true
        }
        (LogicalType::Struct(fields), Value::Struct(items)) => {
            let same_names = fields.len() == items.len()
                && fields.iter().zip(items).all(|((a, _), (b, _))| a.eq_ignore_ascii_case(b));
            if same_names {
                fields
                    .iter()
                    .zip(items)
                    .try_for_each(|((_, ty), (_, item))| check_value(ty, item))?;
            }
            same_names
        }
        (LogicalType::Map(k, v), Value::Map(pairs)) => {
            for (key, value) in pairs {
                if key.is_null() {
                    return Err(value_err!("map keys must not be NULL"));
                }
                check_value(k, key)?;
                check_value(v, value)?;
            }
            true
        }
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(mismatch(value, ty))
    }
}
