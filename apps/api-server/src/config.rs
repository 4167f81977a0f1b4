//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

/// Where cache entries and AI quota counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBackend {
    Memory,
    Redis,
}

impl FromStr for StateBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown state backend '{}'", other)),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub state_backend: StateBackend,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let state_backend = env::var("STATE_BACKEND")
            .unwrap_or_default()
            .parse::<StateBackend>()
            .map_err(anyhow::Error::msg)?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            state_backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_backend_parsing() {
        assert_eq!("".parse::<StateBackend>().unwrap(), StateBackend::Memory);
        assert_eq!("Redis".parse::<StateBackend>().unwrap(), StateBackend::Redis);
        assert!("postgres".parse::<StateBackend>().is_err());
    }
}
