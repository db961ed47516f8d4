use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Empty selects the in-memory store.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_seconds: u64,
    pub refresh_token_seconds: u64,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
}

fn default_hash_memory_kib() -> u32 {
    19_456
}

fn default_hash_iterations() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    pub default_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_page_size: 20 }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `RENTLINE__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("RENTLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_deserializes() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let cfg: Config = s.try_deserialize().unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert!(cfg.database.url.is_empty());
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.auth.access_token_seconds, 300);
        assert_eq!(cfg.pagination.default_page_size, 20);
    }

    #[test]
    fn test_pagination_section_is_optional() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 9000
                [database]
                url = "postgres://localhost/rentline"
                [auth]
                jwt_secret = "s"
                access_token_seconds = 60
                refresh_token_seconds = 120
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let cfg: Config = s.try_deserialize().unwrap();
        assert_eq!(cfg.pagination.default_page_size, 20);
        assert_eq!(cfg.database.url, "postgres://localhost/rentline");
        assert_eq!(cfg.auth.hash_memory_kib, 19_456);
        assert_eq!(cfg.auth.hash_iterations, 2);
    }
}
