/// Service configuration loader
///
/// Settings come from three layers, later ones winning: built-in
/// defaults, an optional service.toml in the working directory, and
/// environment variables (PORT, WORKERS). DATABASE_URL is handled by the
/// db module, not here.

use serde::Deserialize;
use std::env;
use std::fs;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WORKERS: usize = 4;

/// Resolved runtime settings for the HTTP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// TCP port the API listens on
    pub port: u16,
    /// Request worker threads; each owns one database connection
    pub workers: usize,
}

/// Root structure for service.toml parsing
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerSection,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    port: Option<u16>,
    workers: Option<usize>,
}

impl ServiceConfig {
    /// Loads configuration from service.toml (if present) and the
    /// environment.
    ///
    /// # Panics
    /// Panics if service.toml exists but is malformed, or if PORT or
    /// WORKERS is set but not a valid number. This is intentional — the
    /// service should not start with settings it cannot honor.
    pub fn load() -> ServiceConfig {
        let config_path = "service.toml";

        let file = match fs::read_to_string(config_path) {
            Ok(contents) => toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("Failed to parse {}: {}", config_path, e)),
            Err(_) => ConfigFile::default(),
        };

        resolve(file, env::var("PORT").ok(), env::var("WORKERS").ok())
    }
}

/// Apply layering: defaults, then file values, then environment values.
fn resolve(file: ConfigFile, env_port: Option<String>, env_workers: Option<String>) -> ServiceConfig {
    let mut port = file.server.port.unwrap_or(DEFAULT_PORT);
    let mut workers = file.server.workers.unwrap_or(DEFAULT_WORKERS);

    if let Some(raw) = env_port {
        port = raw
            .parse()
            .unwrap_or_else(|_| panic!("Invalid PORT environment variable: {}", raw));
    }
    if let Some(raw) = env_workers {
        workers = raw
            .parse()
            .unwrap_or_else(|_| panic!("Invalid WORKERS environment variable: {}", raw));
    }

    if workers == 0 {
        panic!("WORKERS must be at least 1");
    }

    ServiceConfig { port, workers }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = resolve(ConfigFile::default(), None, None);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let file: ConfigFile = toml::from_str(
            "[server]\n\
             port = 8080\n\
             workers = 8\n",
        )
        .unwrap();

        let config = resolve(file, None, None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.workers, 8);
    }

    #[test]
    fn test_env_overrides_file() {
        let file: ConfigFile = toml::from_str("[server]\nport = 8080\n").unwrap();
        let config = resolve(file, Some("9000".to_string()), None);
        assert_eq!(config.port, 9000);
        // Workers untouched by env stays at default
        assert_eq!(config.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_empty_file_section_is_valid() {
        let file: ConfigFile = toml::from_str("").unwrap();
        let config = resolve(file, None, None);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    #[should_panic(expected = "Invalid PORT")]
    fn test_non_numeric_port_panics() {
        resolve(ConfigFile::default(), Some("not-a-port".to_string()), None);
    }

    #[test]
    #[should_panic(expected = "WORKERS must be at least 1")]
    fn test_zero_workers_panics() {
        resolve(ConfigFile::default(), None, Some("0".to_string()));
    }
}
