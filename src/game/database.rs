//! Parameterized statement runner over a single SQLite file.
//!
//! Every call opens its own connection and closes it before returning. Named
//! parameters use the `@name` form and are checked before anything touches the
//! file, so a malformed name surfaces as [`StoreError::InvalidParameter`] rather
//! than a backend error.

use log::trace;
use rusqlite::types::FromSql;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, Transaction};
use std::path::{Path, PathBuf};

pub const PARAMETER_MARKER: char = '@';

/// A named statement parameter, e.g. `("@level", &3)`.
pub type NamedParam<'a> = (&'a str, &'a dyn ToSql);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parameter names must be non-empty and start with '@', got {0:?}")]
    InvalidParameter(String),
    #[error("query is empty")]
    EmptyQuery,
}

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn validate_params(params: &[NamedParam]) -> Result<(), StoreError> {
        for (name, _) in params {
            let tagged = name
                .strip_prefix(PARAMETER_MARKER)
                .map(|rest| !rest.trim().is_empty())
                .unwrap_or(false);
            if !tagged {
                return Err(StoreError::InvalidParameter(name.to_string()));
            }
        }
        Ok(())
    }

    fn check(sql: &str, params: &[NamedParam]) -> Result<(), StoreError> {
        if sql.trim().is_empty() {
            return Err(StoreError::EmptyQuery);
        }
        Self::validate_params(params)
    }

    fn open(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        trace!(target: "database", "Opening {}", self.path.display());
        Ok(Connection::open(&self.path)?)
    }

    /// Runs one statement, returning the number of affected rows.
    pub fn execute(&self, sql: &str, params: &[NamedParam]) -> Result<usize, StoreError> {
        Self::check(sql, params)?;
        let conn = self.open()?;
        Ok(conn.execute(sql, params)?)
    }

    /// Runs a batch of parameterless statements, used for schema setup.
    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        Self::check(sql, &[])?;
        let conn = self.open()?;
        Ok(conn.execute_batch(sql)?)
    }

    /// First column of the first row. `None` when there is no row or the value is NULL.
    pub fn query_scalar<T: FromSql>(
        &self,
        sql: &str,
        params: &[NamedParam],
    ) -> Result<Option<T>, StoreError> {
        Self::check(sql, params)?;
        let conn = self.open()?;
        let value = conn
            .query_row(sql, params, |row| row.get::<_, Option<T>>(0))
            .optional()?;
        Ok(value.flatten())
    }

    pub fn query_rows<T, F>(
        &self,
        sql: &str,
        params: &[NamedParam],
        map: F,
    ) -> Result<Vec<T>, StoreError>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        Self::check(sql, params)?;
        let conn = self.open()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
    }

    /// Runs `f` inside one transaction on one connection. Rolled back when `f` fails.
    pub fn transaction<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&TransactionScope<'_>) -> Result<R, StoreError>,
    {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let result = f(&TransactionScope { tx: &tx })?;
        tx.commit()?;
        Ok(result)
    }
}

/// Statement access inside [`Database::transaction`], with the same parameter checks.
pub struct TransactionScope<'a> {
    tx: &'a Transaction<'a>,
}

impl TransactionScope<'_> {
    pub fn execute(&self, sql: &str, params: &[NamedParam]) -> Result<usize, StoreError> {
        Database::check(sql, params)?;
        Ok(self.tx.execute(sql, params)?)
    }
}
