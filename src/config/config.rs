use std::collections::HashMap;
use std::str::FromStr;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::logging::LoggingConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Run the one-shot seed import at startup.
    #[serde(default)]
    pub load_data: bool,
    #[serde(default = "default_seed_data_path")]
    pub seed_data_path: String,
    pub static_tokens: TokenTable,
    pub logging: LoggingConfig,
}

fn default_max_connections() -> u32 {
    6
}

fn default_seed_data_path() -> String {
    "icecream.json".to_string()
}

/// Load config from "config.yaml" in the current directory, with
/// CREAMERY_-prefixed environment variables taking precedence.
pub fn load_config() -> ConfigV1 {
    let figment = Figment::new()
        .merge(Yaml::file("./config.yaml"))
        .merge(Env::prefixed("CREAMERY_"));
    let config = match figment.extract::<Config>() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    match config {
        Config::ConfigV1(c) => c,
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}

/// Errors produced while parsing the static token table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenTableError {
    #[error("invalid static token entry: {0}")]
    InvalidEntry(String),
    #[error("duplicate bearer token: {0}")]
    DuplicateToken(String),
}

/// The static bearer-token table: token -> granted scopes.
///
/// Built once at startup from `token=scope1,scope2;token2=scope3` style
/// text and immutable thereafter, so concurrent lookups need no locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTable {
    tokens: HashMap<String, Vec<String>>,
}

impl TokenTable {
    pub fn scopes_for(&self, token: &str) -> Option<&[String]> {
        self.tokens.get(token).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn serialized(&self) -> String {
        let entries: Vec<String> = self
            .tokens
            .iter()
            .map(|(token, scopes)| format!("{}={}", token, scopes.join(",")))
            .collect();
        entries.join(";")
    }
}

impl FromStr for TokenTable {
    type Err = TokenTableError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut tokens = HashMap::new();
        for entry in value.split(';') {
            let (token, scopes) = entry
                .split_once('=')
                .filter(|(_, scopes)| !scopes.contains('='))
                .ok_or_else(|| TokenTableError::InvalidEntry(entry.to_string()))?;
            if tokens.contains_key(token) {
                return Err(TokenTableError::DuplicateToken(token.to_string()));
            }
            let scopes: Vec<String> = scopes.split(',').map(str::to_string).collect();
            tokens.insert(token.to_string(), scopes);
        }
        Ok(TokenTable { tokens })
    }
}

impl<'de> Deserialize<'de> for TokenTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for TokenTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.serialized())
    }
}

impl JsonSchema for TokenTable {
    fn schema_name() -> String {
        "TokenTable".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}
