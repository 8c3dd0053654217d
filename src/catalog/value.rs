use std::fmt::Display;
use std::fmt::Formatter;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Timelike;
use uuid::Uuid;

/// A host value crossing the function boundary, one per row and column.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    UTinyInt(u8),
    USmallInt(u16),
    UInteger(u32),
    UBigInt(u64),
    Float(f32),
    Double(f64),
    Varchar(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    Decimal { value: i128, width: u8, scale: u8 },
    Enum(String),
    List(Vec<Value>),
    Struct(Vec<(String, Value)>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload widened to i128, `None` for non-integers.
    pub fn as_i128(&self) -> Option<i128> {
        let v = match self {
            Value::TinyInt(v) => *v as i128,
            Value::SmallInt(v) => *v as i128,
            Value::Integer(v) => *v as i128,
            Value::BigInt(v) => *v as i128,
            Value::UTinyInt(v) => *v as i128,
            Value::USmallInt(v) => *v as i128,
            Value::UInteger(v) => *v as i128,
            Value::UBigInt(v) => *v as i128,
            _ => return None,
        };
        Some(v)
    }
}

fn fmt_float(f: &mut Formatter<'_>, v: f64) -> std::fmt::Result {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        write!(f, "{:.1}", v)
    } else {
        write!(f, "{}", v)
    }
}

fn fmt_decimal(f: &mut Formatter<'_>, value: i128, scale: u8) -> std::fmt::Result {
    if scale == 0 {
        return write!(f, "{}", value);
    }
    let pow = 10i128.pow(scale as u32);
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let pow = pow as u128;
    write!(f, "{}{}.{:0width$}", sign, abs / pow, abs % pow, width = scale as usize)
}

fn fmt_blob(f: &mut Formatter<'_>, bytes: &[u8]) -> std::fmt::Result {
    for b in bytes {
        if (b.is_ascii_graphic() && *b != b'\\') || *b == b' ' {
            write!(f, "{}", *b as char)?;
        } else {
            write!(f, "\\x{}", hex::encode_upper([*b]))?;
        }
    }
    Ok(())
}

/// Renders the VARCHAR cast form of the value.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::UTinyInt(v) => write!(f, "{}", v),
            Value::USmallInt(v) => write!(f, "{}", v),
            Value::UInteger(v) => write!(f, "{}", v),
            Value::UBigInt(v) => write!(f, "{}", v),
            Value::Float(v) => fmt_float(f, *v as f64),
            Value::Double(v) => fmt_float(f, *v),
            Value::Varchar(s) | Value::Enum(s) => f.write_str(s),
            Value::Blob(b) => fmt_blob(f, b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => {
                write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S"))?;
                let micros = ts.nanosecond() / 1_000;
                if micros != 0 {
                    write!(f, ".{:06}", micros)?;
                }
                Ok(())
            }
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Value::Decimal { value, scale, .. } => fmt_decimal(f, *value, *scale),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Struct(fields) => {
                f.write_str("{")?;
                for (i, (name, item)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}': {}", name, item)?;
                }
                f.write_str("}")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Boolean,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Integer,
    i64 => BigInt,
    u8 => UTinyInt,
    u16 => USmallInt,
    u32 => UInteger,
    u64 => UBigInt,
    f32 => Float,
    f64 => Double,
    String => Varchar,
    Vec<u8> => Blob,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    Uuid => Uuid,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Varchar(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
