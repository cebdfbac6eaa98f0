//! Application startup and server initialization.
//!
//! Connects to the database, builds the authentication chain from the
//! static token table, optionally runs the seed import, and starts serving.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::auth::static_token::StaticTokenHandler;
use crate::auth::Authenticator;
use crate::config::ConfigV1;
use crate::importer;
use crate::routes;
use crate::state::AppState;
use crate::store::db::Db;
use crate::store::postgres::PostgresIceCreamStore;
use crate::store::IceCreamStore;

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the database is unreachable, the seed import fails,
/// or the server cannot bind to the configured address.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::connect(&config.database_url, config.max_connections).await?;
    let store: Arc<dyn IceCreamStore> = Arc::new(PostgresIceCreamStore::new(db));

    if config.load_data {
        importer::import_seed_data(store.clone(), &config.seed_data_path).await?;
    }

    let authenticator = Arc::new(Authenticator::new(vec![Box::new(StaticTokenHandler::new(
        config.static_tokens.clone(),
    ))]));

    info!("Starting server on {}", config.bind_address);

    let state = AppState {
        config: config.clone(),
        store,
    };

    let app = routes::create_router(state, authenticator);

    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
