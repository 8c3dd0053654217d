use std::fmt::Display;
use std::fmt::Formatter;

/// The tag of a logical type, without any type parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Invalid,
    SqlNull,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    UTinyInt,
    USmallInt,
    UInteger,
    UBigInt,
    Float,
    Double,
    Varchar,
    Blob,
    Date,
    Timestamp,
    Uuid,
    Decimal,
    Enum,
    List,
    Array,
    Struct,
    Map,
    Any,
}

impl Type {
    /// Types carrying parameters need a dedicated constructor.
    pub fn is_parameterized(&self) -> bool {
        matches!(self, Type::Decimal | Type::Enum | Type::List | Type::Array | Type::Struct | Type::Map)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Type::Invalid => "INVALID",
            Type::SqlNull => "NULL",
            Type::Boolean => "BOOLEAN",
            Type::TinyInt => "TINYINT",
            Type::SmallInt => "SMALLINT",
            Type::Integer => "INTEGER",
            Type::BigInt => "BIGINT",
            Type::UTinyInt => "UTINYINT",
            Type::USmallInt => "USMALLINT",
            Type::UInteger => "UINTEGER",
            Type::UBigInt => "UBIGINT",
            Type::Float => "FLOAT",
            Type::Double => "DOUBLE",
            Type::Varchar => "VARCHAR",
            Type::Blob => "BLOB",
            Type::Date => "DATE",
            Type::Timestamp => "TIMESTAMP",
            Type::Uuid => "UUID",
            Type::Decimal => "DECIMAL",
            Type::Enum => "ENUM",
            Type::List => "LIST",
            Type::Array => "ARRAY",
            Type::Struct => "STRUCT",
            Type::Map => "MAP",
            Type::Any => "ANY",
        })
    }
}

/// A logical SQL type as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalType {
    SqlNull,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    UTinyInt,
    USmallInt,
    UInteger,
    UBigInt,
    Float,
    Double,
    Varchar,
    Blob,
    Date,
    Timestamp,
    Uuid,
    Decimal { width: u8, scale: u8 },
    Enum(Vec<String>),
    List(Box<LogicalType>),
    Array(Box<LogicalType>, usize),
    Struct(Vec<(String, LogicalType)>),
    Map(Box<LogicalType>, Box<LogicalType>),
    /// Wildcard, only valid as a parameter type.
    Any,
}

impl LogicalType {
    /// Maps a primitive tag to its logical type, `None` for parameterized
    /// tags and `INVALID`.
    pub fn from_primitive(id: Type) -> Option<LogicalType> {
        let ty = match id {
            Type::SqlNull => LogicalType::SqlNull,
            Type::Boolean => LogicalType::Boolean,
            Type::TinyInt => LogicalType::TinyInt,
            Type::SmallInt => LogicalType::SmallInt,
            Type::Integer => LogicalType::Integer,
            Type::BigInt => LogicalType::BigInt,
            Type::UTinyInt => LogicalType::UTinyInt,
            Type::USmallInt => LogicalType::USmallInt,
            Type::UInteger => LogicalType::UInteger,
            Type::UBigInt => LogicalType::UBigInt,
            Type::Float => LogicalType::Float,
            Type::Double => LogicalType::Double,
            Type::Varchar => LogicalType::Varchar,
            Type::Blob => LogicalType::Blob,
            Type::Date => LogicalType::Date,
            Type::Timestamp => LogicalType::Timestamp,
            Type::Uuid => LogicalType::Uuid,
            Type::Any => LogicalType::Any,
            _ => return None,
        };
        Some(ty)
    }

    pub fn id(&self) -> Type {
        match self {
            LogicalType::SqlNull => Type::SqlNull,
            LogicalType::Boolean => Type::Boolean,
            LogicalType::TinyInt => Type::TinyInt,
            LogicalType::SmallInt => Type::SmallInt,
            LogicalType::Integer => Type::Integer,
            LogicalType::BigInt => Type::BigInt,
            LogicalType::UTinyInt => Type::UTinyInt,
            LogicalType::USmallInt => Type::USmallInt,
            LogicalType::UInteger => Type::UInteger,
            LogicalType::UBigInt => Type::UBigInt,
            LogicalType::Float => Type::Float,
            LogicalType::Double => Type::Double,
            LogicalType::Varchar => Type::Varchar,
            LogicalType::Blob => Type::Blob,
            LogicalType::Date => Type::Date,
            LogicalType::Timestamp => Type::Timestamp,
            LogicalType::Uuid => Type::Uuid,
            LogicalType::Decimal { .. } => Type::Decimal,
            LogicalType::Enum(_) => Type::Enum,
            LogicalType::List(_) => Type::List,
            LogicalType::Array(_, _) => Type::Array,
            LogicalType::Struct(_) => Type::Struct,
            LogicalType::Map(_, _) => Type::Map,
            LogicalType::Any => Type::Any,
        }
    }

    /// True if `ANY` appears anywhere in the type.
    pub fn contains_any(&self) -> bool {
        match self {
            LogicalType::Any => true,
            LogicalType::List(child) | LogicalType::Array(child, _) => child.contains_any(),
            LogicalType::Struct(fields) => fields.iter().any(|(_, ty)| ty.contains_any()),
            LogicalType::Map(k, v) => k.contains_any() || v.contains_any(),
            _ => false,
        }
    }
}

impl Display for LogicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalType::Decimal { width, scale } => write!(f, "DECIMAL({},{})", width, scale),
            LogicalType::Enum(values) => {
                let values = values.iter().map(|v| format!("'{}'", v)).collect::<Vec<_>>();
                write!(f, "ENUM({})", values.join(", "))
            }
            LogicalType::List(child) => write!(f, "{}[]", child),
            LogicalType::Array(child, size) => write!(f, "{}[{}]", child, size),
            LogicalType::Struct(fields) => {
                let fields =
                    fields.iter().map(|(name, ty)| format!("{} {}", name, ty)).collect::<Vec<_>>();
                write!(f, "STRUCT({})", fields.join(", "))
            }
            LogicalType::Map(k, v) => write!(f, "MAP({}, {})", k, v),
            other => write!(f, "{}", other.id()),
        }
    }
}
