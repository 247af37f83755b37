use serde::{Deserialize, Serialize};

/// PostgreSQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_pool_size: usize,
    /// Upper bound for any single store operation; expiry surfaces as
    /// `DomainError::StoreTimeout`.
    pub query_timeout_secs: u64,
    pub migrations_dir: String,
    pub goose_binary_path: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "registry".to_string(),
            username: "registry".to_string(),
            password: "registry".to_string(),
            max_pool_size: 10,
            query_timeout_secs: 5,
            migrations_dir: "crates/registry-postgres/migrations".to_string(),
            goose_binary_path: "goose".to_string(),
        }
    }
}
