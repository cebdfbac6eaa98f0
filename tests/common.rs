use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::RwLock;

use creamery::auth::static_token::StaticTokenHandler;
use creamery::auth::Authenticator;
use creamery::config::{ConfigV1, LoggingConfig, TokenTable};
use creamery::context::RequestContext;
use creamery::models::IceCream;
use creamery::routes::create_router;
use creamery::state::AppState;
use creamery::store::{IceCreamStore, StoreError, TxWork};

/// An in-memory store standing in for postgres in router-level tests.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, IceCream>>,
}

#[async_trait::async_trait]
impl IceCreamStore for MemoryStore {
    async fn create(&self, _ctx: &RequestContext, ice_cream: IceCream) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records
            .entry(ice_cream.name.clone())
            .or_insert(ice_cream);
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, name: &str) -> Result<Option<IceCream>, StoreError> {
        Ok(self.records.read().await.get(name).cloned())
    }

    async fn get_all(&self, _ctx: &RequestContext) -> Result<Vec<IceCream>, StoreError> {
        let mut all: Vec<IceCream> = self.records.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn update(&self, _ctx: &RequestContext, ice_cream: IceCream) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get_mut(&ice_cream.name) {
            *existing = ice_cream;
        }
        Ok(())
    }

    async fn delete(&self, _ctx: &RequestContext, name: &str) -> Result<(), StoreError> {
        self.records.write().await.remove(name);
        Ok(())
    }

    async fn with_transaction(&self, ctx: &RequestContext, work: TxWork) -> Result<(), StoreError> {
        work(ctx.clone()).await
    }
}

pub fn test_config(tokens: &str) -> ConfigV1 {
    ConfigV1 {
        bind_address: "127.0.0.1:0".to_string(),
        database_url: "postgres://localhost/unused".to_string(),
        max_connections: 1,
        load_data: false,
        seed_data_path: "icecream.json".to_string(),
        static_tokens: tokens.parse::<TokenTable>().expect("token table"),
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "console".to_string(),
        },
    }
}

pub fn build_app(tokens: &str) -> Router {
    let config = Arc::new(test_config(tokens));
    let store: Arc<dyn IceCreamStore> = Arc::new(MemoryStore::default());
    let authenticator = Arc::new(Authenticator::new(vec![Box::new(StaticTokenHandler::new(
        config.static_tokens.clone(),
    ))]));

    let state = AppState {
        config,
        store,
    };
    create_router(state, authenticator)
}

pub fn request_with_bearer(path: &str, token: &str, method: Method) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn json_request_with_bearer(
    path: &str,
    token: &str,
    method: Method,
    body: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
