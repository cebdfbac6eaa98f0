use std::sync::Arc;

use creamery::config::{init_logging, load_config, print_schema};
use creamery::startup;

#[tokio::main]
async fn main() {
    // `--schema` dumps the config JSON schema and exits.
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = Arc::new(load_config());
    init_logging(&config.logging);

    if let Err(e) = startup::run(config).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
