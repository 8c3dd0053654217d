//! Owned handles over the engine's C API, each closed on drop.

use std::ffi::c_char;
use std::ffi::c_void;
use std::ffi::CStr;
use std::ffi::CString;
use std::ptr;

use libduckdb_sys as ffi;

use crate::config::Config;
use crate::driver::Rows;
use crate::error::Error;
use crate::error::Result;
use crate::value_err;
use crate::vector::logical::NativeType;
use crate::vector::DataChunk;

const IN_MEMORY: &str = ":memory:";

struct RawConfig(ffi::duckdb_config);

impl RawConfig {
    fn new() -> Result<RawConfig> {
        let mut config = ptr::null_mut();
        if unsafe { ffi::duckdb_create_config(&mut config) } != ffi::duckdb_state_DuckDBSuccess {
            return Err(Error::internal("could not allocate the engine config"));
        }
        Ok(RawConfig(config))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (c_key, c_value) = (CString::new(key)?, CString::new(value)?);
        let state = unsafe { ffi::duckdb_set_config(self.0, c_key.as_ptr(), c_value.as_ptr()) };
        if state != ffi::duckdb_state_DuckDBSuccess {
            return Err(value_err!("invalid engine option {}={}", key, value));
        }
        Ok(())
    }
}

impl Drop for RawConfig {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_config(&mut self.0) }
    }
}

pub(crate) struct RawDatabase(ffi::duckdb_database);

// The engine synchronizes access to a database instance internally.
unsafe impl Send for RawDatabase {}
unsafe impl Sync for RawDatabase {}

impl RawDatabase {
    pub fn open(cfg: &Config) -> Result<RawDatabase> {
        let path = CString::new(if cfg.path.is_empty() { IN_MEMORY } else { cfg.path.as_str() })?;
        let mut config = RawConfig::new()?;
        if cfg.threads > 0 {
            config.set("threads", &cfg.threads.to_string())?;
        }

        let mut db = ptr::null_mut();
        let mut err: *mut c_char = ptr::null_mut();
        let state = unsafe { ffi::duckdb_open_ext(path.as_ptr(), &mut db, config.0, &mut err) };
        if state != ffi::duckdb_state_DuckDBSuccess {
            return Err(Error::engine(unsafe { take_message(err) }));
        }
        Ok(RawDatabase(db))
    }

    pub fn as_raw(&self) -> ffi::duckdb_database {
        self.0
    }

    pub fn connect(&self) -> Result<RawConnection> {
        let mut con = ptr::null_mut();
        if unsafe { ffi::duckdb_connect(self.0, &mut con) } != ffi::duckdb_state_DuckDBSuccess {
            return Err(Error::Engine("could not connect to the database".to_string()));
        }
        Ok(RawConnection(con))
    }
}

impl Drop for RawDatabase {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_close(&mut self.0) }
    }
}

pub(crate) struct RawConnection(ffi::duckdb_connection);

unsafe impl Send for RawConnection {}

impl RawConnection {
    pub fn as_raw(&self) -> ffi::duckdb_connection {
        self.0
    }

    /// Runs `sql` and materializes the result of its last statement.
    pub fn query(&self, sql: &str) -> Result<Rows> {
        let sql = CString::new(sql)?;
        let mut result = QueryResult(unsafe { std::mem::zeroed() });
        let state = unsafe { ffi::duckdb_query(self.0, sql.as_ptr(), &mut result.0) };
        if state != ffi::duckdb_state_DuckDBSuccess {
            return Err(Error::engine(result.error()));
        }
        result.materialize()
    }
}

impl Drop for RawConnection {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_disconnect(&mut self.0) }
    }
}

struct QueryResult(ffi::duckdb_result);

impl QueryResult {
    fn error(&mut self) -> String {
        let err = unsafe { ffi::duckdb_result_error(&mut self.0) };
        if err.is_null() {
            return "query failed".to_string();
        }
        unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned()
    }

    fn materialize(&mut self) -> Result<Rows> {
        let count = unsafe { ffi::duckdb_column_count(&mut self.0) };
        let mut columns = Vec::with_capacity(count as usize);
        let mut types = Vec::with_capacity(count as usize);
        for i in 0..count {
            let name = unsafe { ffi::duckdb_column_name(&mut self.0, i) };
            columns.push(if name.is_null() {
                String::new()
            } else {
                unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned()
            });
            let ty = unsafe { NativeType::from_raw(ffi::duckdb_column_logical_type(&mut self.0, i)) };
            types.push(ty.to_logical()?);
        }

        let mut rows = vec![];
        loop {
            let chunk = unsafe { ffi::duckdb_fetch_chunk(self.0) };
            if chunk.is_null() {
                break;
            }
            let chunk = unsafe { DataChunk::owned(chunk) };
            let vectors = chunk.columns()?;
            for row in 0..chunk.size() {
                rows.push(vectors.iter().map(|c| c.get(row)).collect::<Result<Vec<_>>>()?);
            }
        }
        Ok(Rows::new(columns, types, rows))
    }
}

impl Drop for QueryResult {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_destroy_result(&mut self.0) }
    }
}

/// Copies and frees an error message allocated by the engine.
unsafe fn take_message(err: *mut c_char) -> String {
    if err.is_null() {
        return "unknown engine error".to_string();
    }
    let msg = CStr::from_ptr(err).to_string_lossy().into_owned();
    ffi::duckdb_free(err as *mut c_void);
    msg
}
