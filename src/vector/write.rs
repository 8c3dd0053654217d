use libduckdb_sys as ffi;

use super::convert::date_to_days;
use super::convert::decimal_storage;
use super::convert::enum_storage;
use super::convert::i128_to_hugeint;
use super::convert::timestamp_to_micros;
use super::convert::uuid_to_hugeint;
use super::convert::Storage;
use crate::catalog::r#type::LogicalType;
use crate::catalog::value::Value;
use crate::error::Error;
use crate::error::Result;
use crate::value_err;

unsafe fn set_slot<T>(vector: ffi::duckdb_vector, row: usize, v: T) {
    *(ffi::duckdb_vector_get_data(vector) as *mut T).add(row) = v;
}

unsafe fn write_int(vector: ffi::duckdb_vector, storage: Storage, row: usize, v: i128) {
    match storage {
        Storage::Int16 => set_slot(vector, row, v as i16),
        Storage::Int32 => set_slot(vector, row, v as i32),
        Storage::Int64 => set_slot(vector, row, v as i64),
        Storage::Int128 => {
            let (lower, upper) = i128_to_hugeint(v);
            set_slot(vector, row, ffi::duckdb_hugeint { lower, upper })
        }
        Storage::UInt8 => set_slot(vector, row, v as u8),
        Storage::UInt16 => set_slot(vector, row, v as u16),
        Storage::UInt32 => set_slot(vector, row, v as u32),
    }
}

unsafe fn write_bytes(vector: ffi::duckdb_vector, row: usize, bytes: &[u8]) {
    ffi::duckdb_vector_assign_string_element_len(
        vector,
        row as ffi::idx_t,
        bytes.as_ptr() as *const _,
        bytes.len() as ffi::idx_t,
    );
}

unsafe fn mark_valid(vector: ffi::duckdb_vector, row: usize) {
    let validity = ffi::duckdb_vector_get_validity(vector);
    if !validity.is_null() {
        ffi::duckdb_validity_set_row_valid(validity, row as ffi::idx_t);
    }
}

/// Marks slot `row` NULL, together with the struct fields and array
/// elements it owns.
pub(super) unsafe fn set_null(vector: ffi::duckdb_vector, ty: &LogicalType, row: usize) {
    ffi::duckdb_vector_ensure_validity_writable(vector);
    let validity = ffi::duckdb_vector_get_validity(vector);
    ffi::duckdb_validity_set_row_invalid(validity, row as ffi::idx_t);
    match ty {
        LogicalType::Struct(fields) => {
            for (i, (_, field_ty)) in fields.iter().enumerate() {
                set_null(ffi::duckdb_struct_vector_get_child(vector, i as ffi::idx_t), field_ty, row);
            }
        }
        LogicalType::Array(child_ty, size) => {
            let child = ffi::duckdb_array_vector_get_child(vector);
            for i in row * size..(row + 1) * size {
                set_null(child, child_ty, i);
            }
        }
        _ => {}
    }
}

/// Grows a list vector by `len` child rows and returns the offset of the
/// first new row.
unsafe fn grow_list(vector: ffi::duckdb_vector, len: usize) -> Result<u64> {
    let offset = ffi::duckdb_list_vector_get_size(vector);
    let size = offset + len as u64;
    if ffi::duckdb_list_vector_reserve(vector, size) != ffi::duckdb_state_DuckDBSuccess {
        return Err(Error::internal(format!("could not reserve {} list entries", size)));
    }
    if ffi::duckdb_list_vector_set_size(vector, size) != ffi::duckdb_state_DuckDBSuccess {
        return Err(Error::internal(format!("could not resize list to {} entries", size)));
    }
    Ok(offset)
}

/// Encodes `value` into slot `row` of a flat vector. The value must have
/// passed [`check_value`](super::convert::check_value) against `ty`, so
/// every variant below lines up with its type.
///
/// # Safety
///
/// `vector` must be a writable flat vector of type `ty` with capacity for
/// `row`.
pub(super) unsafe fn write_value(
    vector: ffi::duckdb_vector,
    ty: &LogicalType,
    row: usize,
    value: &Value,
) -> Result<()> {
    if value.is_null() {
        set_null(vector, ty, row);
        return Ok(());
    }
    mark_valid(vector, row);
    match (ty, value) {
        (LogicalType::Boolean, Value::Boolean(v)) => set_slot(vector, row, *v as u8),
        (LogicalType::TinyInt, Value::TinyInt(v)) => set_slot(vector, row, *v),
        (LogicalType::SmallInt, Value::SmallInt(v)) => set_slot(vector, row, *v),
        (LogicalType::Integer, Value::Integer(v)) => set_slot(vector, row, *v),
        (LogicalType::BigInt, Value::BigInt(v)) => set_slot(vector, row, *v),
        (LogicalType::UTinyInt, Value::UTinyInt(v)) => set_slot(vector, row, *v),
        (LogicalType::USmallInt, Value::USmallInt(v)) => set_slot(vector, row, *v),
        (LogicalType::UInteger, Value::UInteger(v)) => set_slot(vector, row, *v),
        (LogicalType::UBigInt, Value::UBigInt(v)) => set_slot(vector, row, *v),
        (LogicalType::Float, Value::Float(v)) => set_slot(vector, row, *v),
        (LogicalType::Double, Value::Double(v)) => set_slot(vector, row, *v),
        (LogicalType::Varchar, Value::Varchar(s)) => write_bytes(vector, row, s.as_bytes()),
        (LogicalType::Blob, Value::Blob(b)) => write_bytes(vector, row, b),
        (LogicalType::Date, Value::Date(d)) => set_slot(vector, row, date_to_days(d)),
        (LogicalType::Timestamp, Value::Timestamp(ts)) => {
            set_slot(vector, row, timestamp_to_micros(ts))
        }
        (LogicalType::Uuid, Value::Uuid(u)) => {
            let (lower, upper) = uuid_to_hugeint(u);
            set_slot(vector, row, ffi::duckdb_hugeint { lower, upper })
        }
        (LogicalType::Decimal { width, .. }, Value::Decimal { value, .. }) => {
            write_int(vector, decimal_storage(*width), row, *value)
        }
        (LogicalType::Enum(values), Value::Enum(x) | Value::Varchar(x)) => {
            let code = values
                .iter()
                .position(|v| v == x)
                .ok_or_else(|| value_err!("'{}' is not a member of {}", x, ty))?;
            write_int(vector, enum_storage(values.len()), row, code as i128)
        }
        (LogicalType::List(child_ty), Value::List(items)) => {
            let offset = grow_list(vector, items.len())?;
            let child = ffi::duckdb_list_vector_get_child(vector);
            for (i, item) in items.iter().enumerate() {
                write_value(child, child_ty, offset as usize + i, item)?;
            }
            let entry = ffi::duckdb_list_entry { offset, length: items.len() as u64 };
            set_slot(vector, row, entry)
        }
        (LogicalType::Array(child_ty, size), Value::List(items)) => {
            let child = ffi::duckdb_array_vector_get_child(vector);
            for (i, item) in items.iter().enumerate() {
                write_value(child, child_ty, row * size + i, item)?;
            }
        }
        (LogicalType::Struct(fields), Value::Struct(items)) => {
            for (i, ((_, field_ty), (_, item))) in fields.iter().zip(items).enumerate() {
                let child = ffi::duckdb_struct_vector_get_child(vector, i as ffi::idx_t);
                write_value(child, field_ty, row, item)?;
            }
        }
        (LogicalType::Map(k, v), Value::Map(pairs)) => {
            let offset = grow_list(vector, pairs.len())?;
            let entries = ffi::duckdb_list_vector_get_child(vector);
            let keys = ffi::duckdb_struct_vector_get_child(entries, 0);
            let values = ffi::duckdb_struct_vector_get_child(entries, 1);
            for (i, (key, value)) in pairs.iter().enumerate() {
                let slot = offset as usize + i;
                mark_valid(entries, slot);
                write_value(keys, k, slot, key)?;
                write_value(values, v, slot, value)?;
            }
            let entry = ffi::duckdb_list_entry { offset, length: pairs.len() as u64 };
            set_slot(vector, row, entry)
        }
        (ty, value) => {
            return Err(value_err!("cannot store value {:?} in a vector of type {}", value, ty));
        }
    }
    Ok(())
}
