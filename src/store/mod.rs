//! Record storage.
//!
//! The [`IceCreamStore`] trait is what handlers and the seed importer talk
//! to; the postgres implementation routes every statement through the
//! transactional adapter in [`db`].

pub mod db;
pub mod postgres;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::context::RequestContext;
use crate::models::IceCream;

/// Errors the storage layer reports upward.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] sqlx::Error),
    #[error("failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),
    /// The transaction bound to the context was already committed or rolled
    /// back. Indicates a handle leaked past its `with_transaction` call.
    #[error("transaction already closed")]
    TransactionClosed,
}

/// Work to run inside a transaction: receives the child context with the
/// transaction bound and must route all statements through it.
pub type TxWork = Box<dyn FnOnce(RequestContext) -> BoxFuture<'static, Result<(), StoreError>> + Send>;

/// The operations the record store exposes.
#[async_trait::async_trait]
pub trait IceCreamStore: Send + Sync {
    /// Inserts a record; an existing record with the same name is left
    /// untouched.
    async fn create(&self, ctx: &RequestContext, ice_cream: IceCream) -> Result<(), StoreError>;

    async fn get(&self, ctx: &RequestContext, name: &str) -> Result<Option<IceCream>, StoreError>;

    async fn get_all(&self, ctx: &RequestContext) -> Result<Vec<IceCream>, StoreError>;

    /// Updates a record keyed by name; empty fields leave the stored columns
    /// unchanged.
    async fn update(&self, ctx: &RequestContext, ice_cream: IceCream) -> Result<(), StoreError>;

    async fn delete(&self, ctx: &RequestContext, name: &str) -> Result<(), StoreError>;

    /// Runs `work` inside a single transaction bound to a derived context.
    /// Call once at the outermost point of an atomic composition; nested
    /// calls within the same context are not supported.
    async fn with_transaction(&self, ctx: &RequestContext, work: TxWork) -> Result<(), StoreError>;
}
