//! The transactional store adapter.
//!
//! `Db` unifies "single statement against the pool" and "statement inside a
//! caller-managed transaction". Data-access code routes every statement
//! through [`Db::resolve`] (via the statement helpers) instead of holding
//! its own connection handle; whether the statement joins a transaction is
//! decided entirely by the [`RequestContext`] it receives.

use std::future::Future;
use std::sync::Arc;

use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgQueryResult, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, Postgres};
use tokio::sync::Mutex;
use tracing::warn;

use crate::context::{RequestContext, TxHandle};
use crate::store::StoreError;

/// A light wrapper over the shared connection pool.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

/// What a statement will execute against.
pub enum DbHandle<'a> {
    /// The transaction bound by the nearest enclosing `with_transaction`.
    Transaction(&'a TxHandle),
    /// The shared pool; each statement checks out its own connection.
    Pool(&'a PgPool),
}

impl Db {
    /// Connects to the database, failing fast if it is unreachable.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Db { pool })
    }

    /// Wraps an existing pool. Mostly useful for tests.
    pub fn from_pool(pool: PgPool) -> Self {
        Db { pool }
    }

    /// Resolves the execution handle for a context: the active transaction
    /// when one is bound, the pool otherwise. Never begins a transaction
    /// itself.
    pub fn resolve<'a>(&'a self, ctx: &'a RequestContext) -> DbHandle<'a> {
        match ctx.transaction() {
            Some(tx) => DbHandle::Transaction(tx),
            None => DbHandle::Pool(&self.pool),
        }
    }

    /// Begins a transaction, binds it to a derived child context and runs
    /// `work(child)`.
    ///
    /// On a work error the transaction is rolled back and the error is
    /// propagated unchanged; on success it is committed. At most one
    /// transaction may be open per context: callers needing atomic
    /// composition call this once at the outermost point and pass the child
    /// context down. Nested calls are not detected.
    pub async fn with_transaction<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        work: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = Result<T, StoreError>> + Send,
    {
        let tx = self.pool.begin().await.map_err(StoreError::Begin)?;
        let handle: TxHandle = Arc::new(Mutex::new(Some(tx)));
        let child = ctx.with_transaction(handle.clone());

        let result = work(child).await;

        let tx = handle.lock().await.take();
        match (result, tx) {
            (Ok(value), Some(tx)) => {
                // A failed commit rolls the connection back when it returns
                // to the pool.
                tx.commit().await.map_err(StoreError::Commit)?;
                Ok(value)
            }
            (Err(err), Some(tx)) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback after failed work returned an error");
                }
                Err(err)
            }
            (result, None) => {
                warn!("transaction handle consumed before with_transaction completed");
                result.and(Err(StoreError::TransactionClosed))
            }
        }
    }

    /// Executes a statement against the resolved handle.
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        query: Query<'_, Postgres, PgArguments>,
    ) -> Result<PgQueryResult, StoreError> {
        match self.resolve(ctx) {
            DbHandle::Transaction(handle) => {
                let mut guard = handle.lock().await;
                let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
                Ok(query.execute(&mut **tx).await?)
            }
            DbHandle::Pool(pool) => Ok(query.execute(pool).await?),
        }
    }

    /// Fetches at most one row against the resolved handle.
    pub async fn fetch_optional<O>(
        &self,
        ctx: &RequestContext,
        query: QueryAs<'_, Postgres, O, PgArguments>,
    ) -> Result<Option<O>, StoreError>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        match self.resolve(ctx) {
            DbHandle::Transaction(handle) => {
                let mut guard = handle.lock().await;
                let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
                Ok(query.fetch_optional(&mut **tx).await?)
            }
            DbHandle::Pool(pool) => Ok(query.fetch_optional(pool).await?),
        }
    }

    /// Fetches exactly one row against the resolved handle; a missing row
    /// is an error.
    pub async fn fetch_one<O>(
        &self,
        ctx: &RequestContext,
        query: QueryAs<'_, Postgres, O, PgArguments>,
    ) -> Result<O, StoreError>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        match self.resolve(ctx) {
            DbHandle::Transaction(handle) => {
                let mut guard = handle.lock().await;
                let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
                Ok(query.fetch_one(&mut **tx).await?)
            }
            DbHandle::Pool(pool) => Ok(query.fetch_one(pool).await?),
        }
    }

    /// Fetches all rows against the resolved handle.
    pub async fn fetch_all<O>(
        &self,
        ctx: &RequestContext,
        query: QueryAs<'_, Postgres, O, PgArguments>,
    ) -> Result<Vec<O>, StoreError>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        match self.resolve(ctx) {
            DbHandle::Transaction(handle) => {
                let mut guard = handle.lock().await;
                let tx = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
                Ok(query.fetch_all(&mut **tx).await?)
            }
            DbHandle::Pool(pool) => Ok(query.fetch_all(pool).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_db() -> Db {
        // connect_lazy never touches the network, so resolve() can be
        // exercised without a running database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/creamery_test")
            .expect("lazy pool");
        Db::from_pool(pool)
    }

    /// Without a bound transaction, resolve falls back to the pool.
    #[tokio::test]
    async fn test_resolve_returns_pool_without_transaction() {
        let db = lazy_db();
        let ctx = RequestContext::new("req");

        assert!(matches!(db.resolve(&ctx), DbHandle::Pool(_)));
    }

    /// With a bound transaction, resolve returns that exact handle.
    #[tokio::test]
    async fn test_resolve_returns_bound_transaction_handle() {
        let db = lazy_db();
        let handle: TxHandle = Arc::new(Mutex::new(None));
        let ctx = RequestContext::new("req").with_transaction(handle.clone());

        match db.resolve(&ctx) {
            DbHandle::Transaction(resolved) => assert!(Arc::ptr_eq(resolved, &handle)),
            DbHandle::Pool(_) => panic!("expected the bound transaction handle"),
        }
    }

    /// A consumed transaction handle surfaces a distinct error instead of
    /// silently running against the pool.
    #[tokio::test]
    async fn test_consumed_transaction_is_an_error() {
        let db = lazy_db();
        let handle: TxHandle = Arc::new(Mutex::new(None));
        let ctx = RequestContext::new("req").with_transaction(handle);

        let result = db.execute(&ctx, sqlx::query("SELECT 1")).await;
        assert!(matches!(result, Err(StoreError::TransactionClosed)));
    }

    /// Row fetches check the handle the same way statements do.
    #[tokio::test]
    async fn test_fetch_one_on_consumed_transaction_is_an_error() {
        let db = lazy_db();
        let handle: TxHandle = Arc::new(Mutex::new(None));
        let ctx = RequestContext::new("req").with_transaction(handle);

        let result = db
            .fetch_one(&ctx, sqlx::query_as::<_, (i64,)>("SELECT 1"))
            .await;
        assert!(matches!(result, Err(StoreError::TransactionClosed)));
    }
}
