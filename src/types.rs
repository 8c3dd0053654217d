use std::collections::HashSet;

use crate::catalog::r#type::LogicalType;
pub use crate::catalog::r#type::Type;
use crate::error::Error;
use crate::error::Result;

/// Describes the SQL type of a scalar function parameter or result.
///
/// Immutable once created. Primitive types come from [`TypeInfo::new`],
/// parameterized ones from their dedicated constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    logical_type: LogicalType,
}

/// A named field of a STRUCT type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructEntry {
    info: TypeInfo,
    name: String,
}

impl StructEntry {
    pub fn new(info: TypeInfo, name: &str) -> Result<StructEntry> {
        if name.is_empty() {
            return Err(invalid("STRUCT entry name must not be empty"));
        }
        Ok(StructEntry { info, name: name.to_string() })
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::api(Error::value(msg))
}

impl TypeInfo {
    /// Creates a primitive type, including `ANY`.
    pub fn new(id: Type) -> Result<TypeInfo> {
        if id.is_parameterized() {
            return Err(invalid(format!("{} requires its dedicated constructor", id)));
        }
        let logical_type = LogicalType::from_primitive(id)
            .ok_or_else(|| invalid(format!("unsupported type {}", id)))?;
        Ok(TypeInfo { logical_type })
    }

    pub fn decimal(width: u8, scale: u8) -> Result<TypeInfo> {
        if !(1..=38).contains(&width) {
            return Err(invalid(format!("DECIMAL width must be in [1, 38], got {}", width)));
        }
        if scale > width {
            return Err(invalid(format!(
                "DECIMAL scale {} must not exceed the width {}",
                scale, width
            )));
        }
        Ok(TypeInfo { logical_type: LogicalType::Decimal { width, scale } })
    }

    pub fn enumeration<S: AsRef<str>>(values: &[S]) -> Result<TypeInfo> {
        if values.is_empty() {
            return Err(invalid("ENUM needs at least one value"));
        }
        let mut seen = HashSet::new();
        for v in values {
            if !seen.insert(v.as_ref()) {
                return Err(invalid(format!("duplicate ENUM value '{}'", v.as_ref())));
            }
        }
        let values = values.iter().map(|v| v.as_ref().to_string()).collect();
        Ok(TypeInfo { logical_type: LogicalType::Enum(values) })
    }

    pub fn list(child: TypeInfo) -> Result<TypeInfo> {
        Ok(TypeInfo { logical_type: LogicalType::List(Box::new(child.logical_type)) })
    }

    pub fn array(child: TypeInfo, size: usize) -> Result<TypeInfo> {
        if size == 0 {
            return Err(invalid("ARRAY size must be greater than zero"));
        }
        Ok(TypeInfo { logical_type: LogicalType::Array(Box::new(child.logical_type), size) })
    }

    pub fn map(key: TypeInfo, value: TypeInfo) -> Result<TypeInfo> {
        Ok(TypeInfo {
            logical_type: LogicalType::Map(Box::new(key.logical_type), Box::new(value.logical_type)),
        })
    }

    pub fn structure(entries: Vec<StructEntry>) -> Result<TypeInfo> {
        if entries.is_empty() {
            return Err(invalid("STRUCT needs at least one entry"));
        }
        let mut seen = HashSet::new();
        for e in &entries {
            if !seen.insert(e.name.to_lowercase()) {
                return Err(invalid(format!("duplicate STRUCT entry name '{}'", e.name)));
            }
        }
        let fields = entries.into_iter().map(|e| (e.name, e.info.logical_type)).collect();
        Ok(TypeInfo { logical_type: LogicalType::Struct(fields) })
    }

    pub fn internal_type(&self) -> Type {
        self.logical_type.id()
    }

    pub(crate) fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }
}

impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.logical_type)
    }
}
