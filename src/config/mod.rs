// Configuration module entry point
// Loads the immutable process configuration and the shared request state

mod state;
mod types;

use std::env;
use std::net::SocketAddr;

use crate::logger;

// Re-export public types
pub use state::AppState;
pub use types::{Config, CorsConfig, UploadConfig};
#[cfg(test)]
pub use types::UploadMessages;

/// Plain environment variables understood for `.env` compatibility:
/// `PORT`, `AllowOrigins` (comma separated) and `URL`
#[derive(Debug, Default, Clone)]
pub struct LegacyEnv {
    pub port: Option<String>,
    pub allow_origins: Option<String>,
    pub url: Option<String>,
}

impl LegacyEnv {
    pub fn from_process() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            port: var("PORT"),
            allow_origins: var("AllowOrigins"),
            url: var("URL"),
        }
    }
}

impl Config {
    /// Load configuration for this process.
    ///
    /// Reads `.env` if present, then the config file named by the first
    /// CLI argument (default "config", extension optional).
    pub fn load() -> Result<Self, config::ConfigError> {
        if let Err(e) = dotenv::dotenv() {
            if !e.not_found() {
                logger::log_warning(&format!("Ignoring unreadable .env file: {e}"));
            }
        }
        let config_path = env::args().nth(1).unwrap_or_else(|| "config".to_string());
        Self::load_from(&config_path, &LegacyEnv::from_process())
    }

    /// Load configuration from the specified file path (without extension).
    ///
    /// Precedence, lowest first: defaults, file, `PICBED_*` variables,
    /// `legacy` variables.
    pub fn load_from(config_path: &str, legacy: &LegacyEnv) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("PICBED")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "picbed")?
            .set_default("http.max_body_size", 12_582_912)? // 12MB, file plus multipart framing
            .set_default("cors.allow_origins", Vec::<String>::new())?
            .set_default("cors.allow_credentials", true)?
            .set_default("cors.max_age_secs", 12 * 60 * 60)?
            .set_default("upload.max_file_size", 10_485_760)? // 10MB
            .set_default("upload.url_prefix", "")?
            .set_default("upload.return_url", true)?
            .set_default("storage.root", "static")?
            .set_default("storage.public_path", "/static")?
            .set_override_option("server.port", legacy.port.clone())?
            .set_override_option("upload.url_prefix", legacy.url.clone())?;

        if let Some(origins) = &legacy.allow_origins {
            builder = builder.set_override("cors.allow_origins", parse_origins(origins))?;
        }

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        cfg.upload.url_prefix = if cfg.upload.url_prefix.is_empty() {
            format!("http://127.0.0.1:{}", cfg.server.port)
        } else {
            cfg.upload.url_prefix.trim_end_matches('/').to_string()
        };
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Split a comma separated origin list, dropping blank entries
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_FILE: &str = "/nonexistent/picbed-test-config";

    #[test]
    fn test_defaults() {
        let cfg = Config::load_from(NO_FILE, &LegacyEnv::default()).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.upload.max_file_size, 10 << 20);
        assert_eq!(cfg.upload.url_prefix, "http://127.0.0.1:8080");
        assert!(cfg.upload.return_url);
        assert_eq!(cfg.upload.messages, UploadMessages::default());
        assert_eq!(cfg.storage.root, "static");
        assert_eq!(cfg.storage.public_path, "/static");
        assert!(cfg.cors.allow_origins.is_empty());
    }

    #[test]
    fn test_legacy_variables_override() {
        let legacy = LegacyEnv {
            port: Some("9090".to_string()),
            allow_origins: Some("https://a.example, https://b.example,".to_string()),
            url: None,
        };
        let cfg = Config::load_from(NO_FILE, &legacy).unwrap();
        assert_eq!(cfg.server.port, 9090);
        // URL defaults to the effective port
        assert_eq!(cfg.upload.url_prefix, "http://127.0.0.1:9090");
        assert_eq!(
            cfg.cors.allow_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_url_trailing_slash_trimmed() {
        let legacy = LegacyEnv {
            url: Some("https://img.example.com/".to_string()),
            ..LegacyEnv::default()
        };
        let cfg = Config::load_from(NO_FILE, &legacy).unwrap();
        assert_eq!(cfg.upload.url_prefix, "https://img.example.com");
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let legacy = LegacyEnv {
            port: Some("not-a-port".to_string()),
            ..LegacyEnv::default()
        };
        assert!(Config::load_from(NO_FILE, &legacy).is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins(""), Vec::<String>::new());
        assert_eq!(parse_origins("*"), vec!["*".to_string()]);
    }
}
