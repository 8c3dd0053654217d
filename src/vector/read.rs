use libduckdb_sys as ffi;

use super::convert::date_from_days;
use super::convert::decimal_storage;
use super::convert::enum_storage;
use super::convert::i128_from_hugeint;
use super::convert::timestamp_from_micros;
use super::convert::uuid_from_hugeint;
use super::convert::Storage;
use crate::catalog::r#type::LogicalType;
use crate::catalog::value::Value;
use crate::error::Error;
use crate::error::Result;
use crate::value_err;

unsafe fn slot<T: Copy>(vector: ffi::duckdb_vector, row: usize) -> T {
    *(ffi::duckdb_vector_get_data(vector) as *const T).add(row)
}

unsafe fn row_is_valid(vector: ffi::duckdb_vector, row: usize) -> bool {
    let validity = ffi::duckdb_vector_get_validity(vector);
    validity.is_null() || ffi::duckdb_validity_row_is_valid(validity, row as ffi::idx_t)
}

unsafe fn read_int(vector: ffi::duckdb_vector, storage: Storage, row: usize) -> i128 {
    match storage {
        Storage::Int16 => slot::<i16>(vector, row) as i128,
        Storage::Int32 => slot::<i32>(vector, row) as i128,
        Storage::Int64 => slot::<i64>(vector, row) as i128,
        Storage::Int128 => {
            let h = slot::<ffi::duckdb_hugeint>(vector, row);
            i128_from_hugeint(h.lower, h.upper)
        }
        Storage::UInt8 => slot::<u8>(vector, row) as i128,
        Storage::UInt16 => slot::<u16>(vector, row) as i128,
        Storage::UInt32 => slot::<u32>(vector, row) as i128,
    }
}

unsafe fn read_bytes(vector: ffi::duckdb_vector, row: usize) -> Vec<u8> {
    let s = (ffi::duckdb_vector_get_data(vector) as *mut ffi::duckdb_string_t).add(row);
    let len = ffi::duckdb_string_t_length(*s) as usize;
    if len == 0 {
        return vec![];
    }
    let data = ffi::duckdb_string_t_data(s);
    std::slice::from_raw_parts(data as *const u8, len).to_vec()
}

/// Decodes slot `row` of a flat vector.
///
/// # Safety
///
/// `vector` must be a flat vector of type `ty` holding more than `row` rows.
pub(super) unsafe fn read_value(
    vector: ffi::duckdb_vector,
    ty: &LogicalType,
    row: usize,
) -> Result<Value> {
    if !row_is_valid(vector, row) {
        return Ok(Value::Null);
    }
    let value = match ty {
        LogicalType::SqlNull => Value::Null,
        LogicalType::Boolean => Value::Boolean(slot::<u8>(vector, row) != 0),
        LogicalType::TinyInt => Value::TinyInt(slot(vector, row)),
        LogicalType::SmallInt => Value::SmallInt(slot(vector, row)),
        LogicalType::Integer => Value::Integer(slot(vector, row)),
        LogicalType::BigInt => Value::BigInt(slot(vector, row)),
        LogicalType::UTinyInt => Value::UTinyInt(slot(vector, row)),
        LogicalType::USmallInt => Value::USmallInt(slot(vector, row)),
        LogicalType::UInteger => Value::UInteger(slot(vector, row)),
        LogicalType::UBigInt => Value::UBigInt(slot(vector, row)),
        LogicalType::Float => Value::Float(slot(vector, row)),
        LogicalType::Double => Value::Double(slot(vector, row)),
        LogicalType::Varchar => Value::Varchar(
            String::from_utf8(read_bytes(vector, row)).map_err(|e| Error::value(e.to_string()))?,
        ),
        LogicalType::Blob => Value::Blob(read_bytes(vector, row)),
        LogicalType::Date => Value::Date(date_from_days(slot(vector, row))?),
        LogicalType::Timestamp => Value::Timestamp(timestamp_from_micros(slot(vector, row))?),
        LogicalType::Uuid => {
            let h = slot::<ffi::duckdb_hugeint>(vector, row);
            Value::Uuid(uuid_from_hugeint(h.lower, h.upper))
        }
        LogicalType::Decimal { width, scale } => Value::Decimal {
            value: read_int(vector, decimal_storage(*width), row),
            width: *width,
            scale: *scale,
        },
        LogicalType::Enum(values) => {
            let code = read_int(vector, enum_storage(values.len()), row) as usize;
            let member = values
                .get(code)
                .ok_or_else(|| value_err!("enum code {} out of range for {}", code, ty))?;
            Value::Enum(member.clone())
        }
        LogicalType::List(child_ty) => {
            let entry = slot::<ffi::duckdb_list_entry>(vector, row);
            let child = ffi::duckdb_list_vector_get_child(vector);
            let items = (entry.offset..entry.offset + entry.length)
                .map(|i| read_value(child, child_ty, i as usize))
                .collect::<Result<Vec<_>>>()?;
            Value::List(items)
        }
        LogicalType::Array(child_ty, size) => {
            let child = ffi::duckdb_array_vector_get_child(vector);
            let items = (row * size..(row + 1) * size)
                .map(|i| read_value(child, child_ty, i))
                .collect::<Result<Vec<_>>>()?;
            Value::List(items)
        }
        LogicalType::Struct(fields) => {
            let mut items = Vec::with_capacity(fields.len());
            for (i, (name, field_ty)) in fields.iter().enumerate() {
                let child = ffi::duckdb_struct_vector_get_child(vector, i as ffi::idx_t);
                items.push((name.clone(), read_value(child, field_ty, row)?));
            }
            Value::Struct(items)
        }
        LogicalType::Map(k, v) => {
            let entry = slot::<ffi::duckdb_list_entry>(vector, row);
            let entries = ffi::duckdb_list_vector_get_child(vector);
            let keys = ffi::duckdb_struct_vector_get_child(entries, 0);
            let values = ffi::duckdb_struct_vector_get_child(entries, 1);
            let pairs = (entry.offset as usize..(entry.offset + entry.length) as usize)
                .map(|i| Ok((read_value(keys, k, i)?, read_value(values, v, i)?)))
                .collect::<Result<Vec<_>>>()?;
            Value::Map(pairs)
        }
        LogicalType::Any => return Err(Error::internal("a vector never has type ANY")),
    };
    Ok(value)
}
