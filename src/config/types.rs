use serde::Deserialize;

/// ================================
/// Service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub vendor: VendorConfig,
    pub credentials: CredentialsConfig,
    pub settings: SettingsConfig,
}

/// Vendor cloud API access.
#[derive(Debug, Deserialize, Clone)]
pub struct VendorConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Bound on every outbound vendor call. A timed-out call is a
    /// transport failure and must never invalidate a stored token.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

/// Durable credential storage.
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    pub path: String,
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    pub safety_margin_seconds: Option<u64>,
    pub retry: Option<RetryConfig>,
    /// Cap on concurrent per-lock vendor calls during fan-out.
    #[serde(default = "default_fanout_concurrency")]
    pub fanout_concurrency: usize,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be multiplied by 2 on every attempt until max_delay_ms
    pub base_delay_ms: Option<u64>,
    /// max delay for retrying
    /// invariant: >= base_delay_ms.
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_fanout_concurrency() -> usize {
    8
}
