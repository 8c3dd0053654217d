use std::ffi::c_char;
use std::ffi::c_void;
use std::ffi::CStr;
use std::ffi::CString;

use libduckdb_sys as ffi;

use crate::catalog::r#type::LogicalType;
use crate::error::Error;
use crate::error::Result;
use crate::value_err;

/// An engine logical type, destroyed on drop.
pub(crate) struct NativeType(ffi::duckdb_logical_type);

impl NativeType {
    /// Builds the engine counterpart of `ty`, recursively for nested types.
    pub fn new(ty: &LogicalType) -> Result<NativeType> {
        let ptr = unsafe {
            match ty {
                LogicalType::Decimal { width, scale } => {
                    ffi::duckdb_create_decimal_type(*width, *scale)
                }
                LogicalType::Enum(values) => {
                    let names = c_strings(values.iter().map(String::as_str))?;
                    let mut ptrs = names.iter().map(|n| n.as_ptr()).collect::<Vec<_>>();
                    ffi::duckdb_create_enum_type(ptrs.as_mut_ptr(), ptrs.len() as ffi::idx_t)
                }
                LogicalType::List(child) => {
                    let child = NativeType::new(child)?;
                    ffi::duckdb_create_list_type(child.0)
                }
                LogicalType::Array(child, size) => {
                    let child = NativeType::new(child)?;
                    ffi::duckdb_create_array_type(child.0, *size as ffi::idx_t)
                }
                LogicalType::Map(k, v) => {
                    let k = NativeType::new(k)?;
                    let v = NativeType::new(v)?;
                    ffi::duckdb_create_map_type(k.0, v.0)
                }
                LogicalType::Struct(fields) => {
                    let names = c_strings(fields.iter().map(|(name, _)| name.as_str()))?;
                    let children =
                        fields.iter().map(|(_, ty)| NativeType::new(ty)).collect::<Result<Vec<_>>>()?;
                    let mut name_ptrs = names.iter().map(|n| n.as_ptr()).collect::<Vec<_>>();
                    let mut types = children.iter().map(|c| c.0).collect::<Vec<_>>();
                    ffi::duckdb_create_struct_type(
                        types.as_mut_ptr(),
                        name_ptrs.as_mut_ptr(),
                        types.len() as ffi::idx_t,
                    )
                }
                primitive => ffi::duckdb_create_logical_type(primitive_id(primitive)?),
            }
        };
        if ptr.is_null() {
            return Err(Error::internal(format!("could not create engine type {}", ty)));
        }
        Ok(NativeType(ptr))
    }

    /// Takes ownership of a type handed out by the engine.
    ///
    /// # Safety
    ///
    /// `ptr` must be a logical type the caller is responsible for destroying.
    pub unsafe fn from_raw(ptr: ffi::duckdb_logical_type) -> NativeType {
        NativeType(ptr)
    }

    pub fn as_raw(&self) -> ffi::duckdb_logical_type {
        self.0
    }

    /// Reads the engine type back into a [`LogicalType`]. Types the bridge
    /// has no value representation for are rejected.
    pub fn to_logical(&self) -> Result<LogicalType> {
        let ty = unsafe {
            match ffi::duckdb_get_type_id(self.0) {
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_SQLNULL => LogicalType::SqlNull,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_BOOLEAN => LogicalType::Boolean,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_TINYINT => LogicalType::TinyInt,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_SMALLINT => LogicalType::SmallInt,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_INTEGER => LogicalType::Integer,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_BIGINT => LogicalType::BigInt,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_UTINYINT => LogicalType::UTinyInt,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_USMALLINT => LogicalType::USmallInt,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_UINTEGER => LogicalType::UInteger,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_UBIGINT => LogicalType::UBigInt,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_FLOAT => LogicalType::Float,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_DOUBLE => LogicalType::Double,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_VARCHAR => LogicalType::Varchar,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_BLOB => LogicalType::Blob,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_DATE => LogicalType::Date,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_TIMESTAMP => LogicalType::Timestamp,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_UUID => LogicalType::Uuid,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_ANY => LogicalType::Any,
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_DECIMAL => LogicalType::Decimal {
                    width: ffi::duckdb_decimal_width(self.0),
                    scale: ffi::duckdb_decimal_scale(self.0),
                },
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_ENUM => {
                    let size = ffi::duckdb_enum_dictionary_size(self.0);
                    let values = (0..size)
                        .map(|i| take_string(ffi::duckdb_enum_dictionary_value(self.0, i as ffi::idx_t)))
                        .collect::<Result<Vec<_>>>()?;
                    LogicalType::Enum(values)
                }
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_LIST => {
                    let child = NativeType::from_raw(ffi::duckdb_list_type_child_type(self.0));
                    LogicalType::List(Box::new(child.to_logical()?))
                }
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_ARRAY => {
                    let child = NativeType::from_raw(ffi::duckdb_array_type_child_type(self.0));
                    let size = ffi::duckdb_array_type_array_size(self.0) as usize;
                    LogicalType::Array(Box::new(child.to_logical()?), size)
                }
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_MAP => {
                    let k = NativeType::from_raw(ffi::duckdb_map_type_key_type(self.0));
                    let v = NativeType::from_raw(ffi::duckdb_map_type_value_type(self.0));
                    LogicalType::Map(Box::new(k.to_logical()?), Box::new(v.to_logical()?))
                }
                ffi::DUCKDB_TYPE_DUCKDB_TYPE_STRUCT => {
                    let count = ffi::duckdb_struct_type_child_count(self.0);
                    let mut fields = Vec::with_capacity(count as usize);
                    for i in 0..count {
                        let name = take_string(ffi::duckdb_struct_type_child_name(self.0, i))?;
                        let child = NativeType::from_raw(ffi::duckdb_struct_type_child_type(self.0, i));
                        fields.push((name, child.to_logical()?));
                    }
                    LogicalType::Struct(fields)
                }
                other => return Err(value_err!("unsupported engine type id {}", other)),
            }
        };
        Ok(ty)
    }
}

impl Drop for NativeType {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_logical_type(&mut self.0) }
    }
}

fn primitive_id(ty: &LogicalType) -> Result<ffi::duckdb_type> {
    let id = match ty {
        LogicalType::SqlNull => ffi::DUCKDB_TYPE_DUCKDB_TYPE_SQLNULL,
        LogicalType::Boolean => ffi::DUCKDB_TYPE_DUCKDB_TYPE_BOOLEAN,
        LogicalType::TinyInt => ffi::DUCKDB_TYPE_DUCKDB_TYPE_TINYINT,
        LogicalType::SmallInt => ffi::DUCKDB_TYPE_DUCKDB_TYPE_SMALLINT,
        LogicalType::Integer => ffi::DUCKDB_TYPE_DUCKDB_TYPE_INTEGER,
        LogicalType::BigInt => ffi::DUCKDB_TYPE_DUCKDB_TYPE_BIGINT,
        LogicalType::UTinyInt => ffi::DUCKDB_TYPE_DUCKDB_TYPE_UTINYINT,
        LogicalType::USmallInt => ffi::DUCKDB_TYPE_DUCKDB_TYPE_USMALLINT,
        LogicalType::UInteger => ffi::DUCKDB_TYPE_DUCKDB_TYPE_UINTEGER,
        LogicalType::UBigInt => ffi::DUCKDB_TYPE_DUCKDB_TYPE_UBIGINT,
        LogicalType::Float => ffi::DUCKDB_TYPE_DUCKDB_TYPE_FLOAT,
        LogicalType::Double => ffi::DUCKDB_TYPE_DUCKDB_TYPE_DOUBLE,
        LogicalType::Varchar => ffi::DUCKDB_TYPE_DUCKDB_TYPE_VARCHAR,
        LogicalType::Blob => ffi::DUCKDB_TYPE_DUCKDB_TYPE_BLOB,
        LogicalType::Date => ffi::DUCKDB_TYPE_DUCKDB_TYPE_DATE,
        LogicalType::Timestamp => ffi::DUCKDB_TYPE_DUCKDB_TYPE_TIMESTAMP,
        LogicalType::Uuid => ffi::DUCKDB_TYPE_DUCKDB_TYPE_UUID,
        LogicalType::Any => ffi::DUCKDB_TYPE_DUCKDB_TYPE_ANY,
        other => return Err(Error::internal(format!("{} is not a primitive type", other))),
    };
    Ok(id)
}

fn c_strings<'a>(items: impl Iterator<Item = &'a str>) -> Result<Vec<CString>> {
    Ok(items.map(CString::new).collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Copies and frees a string allocated by the engine.
unsafe fn take_string(ptr: *mut c_char) -> Result<String> {
    if ptr.is_null() {
        return Err(Error::internal("engine returned a null string"));
    }
    let s = CStr::from_ptr(ptr).to_string_lossy().into_owned();
    ffi::duckdb_free(ptr as *mut c_void);
    Ok(s)
}
