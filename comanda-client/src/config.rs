//! Client configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | GATEWAY_URL | http://localhost:54321 | Hosted data gateway endpoint |
//! | GATEWAY_API_KEY | (empty) | Gateway API key |
//! | ENVIRONMENT | development | development / staging / production |
//! | LOG_LEVEL | info | tracing level filter |
//! | LOG_DIR | (unset) | daily-rolling log file directory |
//! | TOAST_TTL_MS | 3000 | how long toasts stay on screen |
//! | BAR_CATEGORY | Bar | product category routed to the bar station |

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosted data gateway endpoint
    pub gateway_url: String,
    /// Gateway API key
    pub gateway_api_key: String,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// tracing level filter
    pub log_level: String,
    /// Optional directory for daily-rolling log files
    pub log_dir: Option<String>,
    /// Toast lifetime in milliseconds
    pub toast_ttl_ms: u64,
    /// Product category whose lines are prepared by the bar station
    pub bar_category: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            gateway_url: std::env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:54321".into()),
            gateway_api_key: std::env::var("GATEWAY_API_KEY").unwrap_or_default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            toast_ttl_ms: std::env::var("TOAST_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            bar_category: std::env::var("BAR_CATEGORY").unwrap_or_else(|_| "Bar".into()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
