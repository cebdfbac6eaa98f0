//! Library exports for creamery, shared between the binary and tests.

pub mod auth;
pub mod config;
pub mod context;
pub mod importer;
pub mod models;
pub mod routes;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
