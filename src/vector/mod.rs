//! Typed access to the engine's columnar data chunks.
//!
//! A [`DataChunk`] wraps a `duckdb_data_chunk` and hands out its columns as
//! [`FlatVector`]s. Values are decoded into host [`Value`]s on read and
//! encoded back into the physical slot layout on write; the layout rules
//! live in [`convert`].

use std::marker::PhantomData;

use libduckdb_sys as ffi;

use crate::catalog::r#type::LogicalType;
use crate::catalog::value::Value;
use crate::error::Error;
use crate::error::Result;

pub use validity::Validity;

pub mod convert;
pub(crate) mod logical;
mod read;
mod validity;
mod write;

use logical::NativeType;

/// A chunk of rows, destroyed on drop when owned.
pub(crate) struct DataChunk {
    ptr: ffi::duckdb_data_chunk,
    owned: bool,
}

impl DataChunk {
    /// Wraps a chunk the engine keeps ownership of.
    ///
    /// # Safety
    ///
    /// `ptr` must stay valid for the lifetime of the wrapper.
    pub unsafe fn borrowed(ptr: ffi::duckdb_data_chunk) -> DataChunk {
        DataChunk { ptr, owned: false }
    }

    /// Takes a chunk the caller has to destroy, as fetched from a result.
    ///
    /// # Safety
    ///
    /// `ptr` must be a valid chunk not destroyed elsewhere.
    pub unsafe fn owned(ptr: ffi::duckdb_data_chunk) -> DataChunk {
        DataChunk { ptr, owned: true }
    }

    /// An empty chunk with one column per type.
    #[cfg(test)]
    pub fn new(types: &[LogicalType]) -> Result<DataChunk> {
        let natives = types.iter().map(NativeType::new).collect::<Result<Vec<_>>>()?;
        let mut raw = natives.iter().map(NativeType::as_raw).collect::<Vec<_>>();
        let ptr = unsafe { ffi::duckdb_create_data_chunk(raw.as_mut_ptr(), raw.len() as ffi::idx_t) };
        if ptr.is_null() {
            return Err(Error::internal("could not create a data chunk"));
        }
        Ok(DataChunk { ptr, owned: true })
    }

    pub fn size(&self) -> usize {
        unsafe { ffi::duckdb_data_chunk_get_size(self.ptr) as usize }
    }

    #[cfg(test)]
    pub fn set_size(&mut self, size: usize) {
        unsafe { ffi::duckdb_data_chunk_set_size(self.ptr, size as ffi::idx_t) }
    }

    pub fn column_count(&self) -> usize {
        unsafe { ffi::duckdb_data_chunk_get_column_count(self.ptr) as usize }
    }

    pub fn column(&self, index: usize) -> Result<FlatVector<'_>> {
        if index >= self.column_count() {
            return Err(Error::internal(format!(
                "column {} out of range for a chunk of {} columns",
                index,
                self.column_count()
            )));
        }
        unsafe { FlatVector::from_raw(ffi::duckdb_data_chunk_get_vector(self.ptr, index as ffi::idx_t)) }
    }

    pub fn columns(&self) -> Result<Vec<FlatVector<'_>>> {
        (0..self.column_count()).map(|i| self.column(i)).collect()
    }
}

impl Drop for DataChunk {
    fn drop(&mut self) {
        if self.owned {
            unsafe { ffi::duckdb_destroy_data_chunk(&mut self.ptr) }
        }
    }
}

/// One flat column of a chunk, typed by its engine logical type.
pub(crate) struct FlatVector<'a> {
    ptr: ffi::duckdb_vector,
    ty: LogicalType,
    _chunk: PhantomData<&'a DataChunk>,
}

impl<'a> FlatVector<'a> {
    /// # Safety
    ///
    /// `ptr` must be a flat vector that outlives `'a`.
    pub unsafe fn from_raw(ptr: ffi::duckdb_vector) -> Result<FlatVector<'a>> {
        if ptr.is_null() {
            return Err(Error::internal("null vector"));
        }
        let ty = NativeType::from_raw(ffi::duckdb_vector_get_column_type(ptr)).to_logical()?;
        Ok(FlatVector { ptr, ty, _chunk: PhantomData })
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    /// Validity of the first `len` rows.
    pub fn validity(&self, len: usize) -> Validity {
        unsafe { Validity::from_raw(ffi::duckdb_vector_get_validity(self.ptr), len) }
    }

    pub fn get(&self, row: usize) -> Result<Value> {
        unsafe { read::read_value(self.ptr, &self.ty, row) }
    }

    /// Stores `value` at `row`. The whole value, nested elements included,
    /// is checked against the vector type first; on mismatch nothing is
    /// written.
    pub fn set(&mut self, row: usize, value: &Value) -> Result<()> {
        convert::check_value(&self.ty, value)?;
        unsafe { write::write_value(self.ptr, &self.ty, row, value) }
    }

    pub fn set_null(&mut self, row: usize) {
        unsafe { write::set_null(self.ptr, &self.ty, row) }
    }

    /// Rows appended to the child of a LIST or MAP vector so far.
    #[cfg(test)]
    fn list_size(&self) -> usize {
        unsafe { ffi::duckdb_list_vector_get_size(self.ptr) as usize }
    }
}
