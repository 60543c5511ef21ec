//! Postgres [`Database`] implementation.

mod impls;

use std::{future::Future, time::Duration};

use deadpool_postgres::{Pool, Runtime};
use derive_more::{Display, Error as StdError, From};
use tokio::time;
use tokio_postgres::{error::SqlState, types::ToSql, NoTls, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use deadpool_postgres::Config;
pub use refinery::embed_migrations;

/// Postgres [`Database`] client.
///
/// Every operation takes its own connection from the pool and is bounded by
/// the configured timeout.
#[derive(Clone, Debug)]
pub struct Postgres {
    /// Pool of connections to the database.
    pool: Pool,

    /// Maximum duration of a single operation.
    timeout: Duration,
}

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`] and
    /// operation `timeout`.
    ///
    /// # Errors
    ///
    /// If failed to create a new [`Postgres`] client.
    pub fn new(
        conf: &Config,
        timeout: Duration,
    ) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self { pool, timeout })
    }

    /// Awaits the provided `operation` no longer than the configured timeout.
    async fn timed<T, E>(
        &self,
        operation: impl Future<Output = Result<T, E>>,
    ) -> Result<T, Traced<database::Error>>
    where
        Error: From<E>,
    {
        time::timeout(self.timeout, operation)
            .await
            .map_err(|_| tracerr::new!(Error::Timeout(self.timeout)))
            .map_err(tracerr::map_from)?
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }

    /// Queries the provided statement with the given parameters and returns the
    /// resulting rows.
    ///
    /// # Errors
    ///
    /// If failed to query the statement.
    pub(crate) async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let client =
            self.timed(self.pool.get()).await.map_err(tracerr::wrap!())?;
        self.timed(client.query(stmt, params))
            .await
            .map_err(tracerr::wrap!())
    }

    /// Queries the provided statement with the given parameters and returns the
    /// optional resulting row.
    ///
    /// # Errors
    ///
    /// If failed to query the statement.
    pub(crate) async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let client =
            self.timed(self.pool.get()).await.map_err(tracerr::wrap!())?;
        self.timed(client.query_opt(stmt, params))
            .await
            .map_err(tracerr::wrap!())
    }

    /// Executes the provided statement with the given parameters and returns
    /// the number of affected rows.
    ///
    /// # Errors
    ///
    /// If failed to execute the statement.
    pub(crate) async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let client =
            self.timed(self.pool.get()).await.map_err(tracerr::wrap!())?;
        self.timed(client.execute(stmt, params))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Connection error.
    #[display("Connection error: {_0}")]
    Connection(tokio_postgres::Error),

    /// Error of creating a new connection [`Pool`].
    #[display("Failed to create a new connection `Pool`: {_0}")]
    PoolCreationError(deadpool_postgres::CreatePoolError),

    /// Connection [`Pool`] error.
    #[display("Connection `Pool` error: {_0}")]
    PoolError(deadpool_postgres::PoolError),

    /// Operation didn't complete in time.
    #[display("Operation timed out after {_0:?}")]
    #[from(ignore)]
    Timeout(#[error(not(source))] Duration),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::Connection(e) => {
                e.code() == Some(&SqlState::UNIQUE_VIOLATION)
                    && constraint.map_or(true, |c| {
                        e.as_db_error().and_then(|e| e.constraint()) == Some(c)
                    })
            }
            Self::PoolError(..)
            | Self::PoolCreationError(..)
            | Self::Timeout(..) => false,
        }
    }
}
