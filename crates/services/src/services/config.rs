//! Environment-driven server configuration, read once at startup.

use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite:snipstash.db?mode=rwc";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3431;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Absent key disables the explain endpoint rather than failing startup.
    pub anthropic_api_key: Option<String>,
    pub explain_model: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            explain_model: env::var("EXPLAIN_MODEL").ok().filter(|m| !m.is_empty()),
        }
    }
}
