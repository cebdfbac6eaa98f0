//! One-shot seed data import.
//!
//! Reads the record dump shipped with the service, strips non-ASCII noise
//! and stores every record inside a single transaction, so a failed import
//! leaves nothing behind.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::context::RequestContext;
use crate::models::IceCream;
use crate::store::{IceCreamStore, StoreError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read seed file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to store seed data: {0}")]
    Store(#[from] StoreError),
}

/// Imports the seed records from `path` into the store, atomically.
pub async fn import_seed_data(
    store: Arc<dyn IceCreamStore>,
    path: &str,
) -> Result<(), ImportError> {
    let raw = tokio::fs::read_to_string(path).await?;
    // The upstream dump contains stray non-ASCII bytes.
    let cleaned: String = raw.chars().filter(char::is_ascii).collect();

    let records: Vec<IceCream> = serde_json::from_str(&cleaned)?;
    info!(count = records.len(), path, "importing seed records");

    let ctx = RequestContext::default();
    let tx_store = store.clone();
    store
        .with_transaction(
            &ctx,
            Box::new(move |ctx| {
                Box::pin(async move {
                    for record in records {
                        tx_store.create(&ctx, record).await?;
                    }
                    Ok(())
                })
            }),
        )
        .await?;

    Ok(())
}
