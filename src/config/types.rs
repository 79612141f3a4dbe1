// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub cors: CorsConfig,
    pub upload: UploadConfig,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    /// Whole request body limit, checked against `Content-Length`
    pub max_body_size: u64,
}

/// Cross-origin policy
#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Exact origins allowed; `*` allows any
    pub allow_origins: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

/// Upload endpoint settings
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Largest accepted file, in bytes
    pub max_file_size: u64,
    /// Prepended to the public path of a stored image
    pub url_prefix: String,
    /// Include `{name, url}` in the success envelope
    pub return_url: bool,
    #[serde(default)]
    pub messages: UploadMessages,
}

/// Client facing upload messages
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadMessages {
    #[serde(default = "default_too_large")]
    pub too_large: String,
    #[serde(default = "default_not_image")]
    pub not_image: String,
    #[serde(default = "default_success")]
    pub success: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_too_large() -> String {
    "please compress the image to at most 10MB".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_not_image() -> String {
    "only image uploads are allowed".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_success() -> String {
    "image uploaded successfully".to_string()
}

impl Default for UploadMessages {
    fn default() -> Self {
        Self {
            too_large: default_too_large(),
            not_image: default_not_image(),
            success: default_success(),
        }
    }
}

/// Where stored images live and where they are served from
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the date-partitioned tree
    pub root: String,
    /// URL path the static server mounts `root` on
    pub public_path: String,
}
