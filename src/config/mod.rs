use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Conversion service base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Delay between status refresh ticks, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upload size cap in bytes. The backend enforces the same 50 MB limit.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_max_upload_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
