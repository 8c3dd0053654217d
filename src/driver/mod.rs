//! Host-facing connection API. A [`Database`] owns one engine instance,
//! every [`Connection`] opened on it sees the same registered functions.

use std::sync::Arc;

use libduckdb_sys as ffi;
use log::debug;

use crate::catalog::value::Value;
use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::udf::HandleRegistry;
use crate::value_err;

pub use rows::Rows;

mod display;
mod raw;
mod rows;

use raw::RawConnection;
use raw::RawDatabase;

const FUNCTION_EXISTS: &str =
    "SELECT count(*) FROM duckdb_functions() WHERE lower(function_name) = lower(?)";

pub struct Database {
    raw: RawDatabase,
    handles: Arc<HandleRegistry>,
}

impl Database {
    pub fn open(cfg: &Config) -> Result<Database> {
        let raw = RawDatabase::open(cfg)?;
        debug!(
            "opened database {}, {} threads",
            if cfg.path.is_empty() { "in memory" } else { &cfg.path },
            if cfg.threads == 0 { "default".to_string() } else { cfg.threads.to_string() }
        );
        Ok(Database { raw, handles: Arc::new(HandleRegistry::new()) })
    }

    pub fn open_in_memory() -> Result<Database> {
        Database::open(&Config::default())
    }

    pub fn connect(&self) -> Result<Connection> {
        // Shares the instance; the engine keeps it alive while connected.
        let conn = unsafe { duckdb::Connection::open_from_raw(self.raw.as_raw().cast())? };
        let raw = self.raw.connect()?;
        Ok(Connection { inner: Some(Inner { conn, raw }), handles: Arc::clone(&self.handles) })
    }

    /// Runs `sql` on a fresh connection.
    pub fn query(&self, sql: &str) -> Result<Rows> {
        self.connect()?.query(sql)
    }

    pub fn query_row(&self, sql: &str) -> Result<Vec<Value>> {
        self.connect()?.query_row(sql)
    }

    pub fn execute(&self, sql: &str) -> Result<()> {
        self.connect()?.execute(sql)
    }
}

struct Inner {
    conn: duckdb::Connection,
    raw: RawConnection,
}

pub struct Connection {
    inner: Option<Inner>,
    handles: Arc<HandleRegistry>,
}

impl Connection {
    pub fn query(&self, sql: &str) -> Result<Rows> {
        self.inner()?.raw.query(sql)
    }

    /// Returns the first row of the result, an error if there is none.
    pub fn query_row(&self, sql: &str) -> Result<Vec<Value>> {
        self.query(sql)?
            .into_iter()
            .next()
            .ok_or_else(|| value_err!("query returned no rows: {}", sql))
    }

    /// Runs one or more statements, discarding their results.
    pub fn execute(&self, sql: &str) -> Result<()> {
        self.inner()?.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Closes the connection, later calls fail with
    /// [`Error::ConnectionClosed`]. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.inner.take().is_some() {
            debug!("connection closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn inner(&self) -> Result<&Inner> {
        self.inner.as_ref().ok_or(Error::ConnectionClosed)
    }

    /// The engine connection functions are registered through.
    pub(crate) fn raw(&self) -> Result<ffi::duckdb_connection> {
        Ok(self.inner()?.raw.as_raw())
    }

    /// True if the catalog already has a function called `name`, builtins
    /// included. Names compare case-insensitively.
    pub(crate) fn function_exists(&self, name: &str) -> Result<bool> {
        let count: i64 =
            self.inner()?.conn.query_row(FUNCTION_EXISTS, duckdb::params![name], |row| row.get(0))?;
        Ok(count > 0)
    }

    pub(crate) fn handles(&self) -> &Arc<HandleRegistry> {
        &self.handles
    }
}
