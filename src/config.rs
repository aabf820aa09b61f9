//! Connection settings for the quiz API.

use std::time::Duration;

use clap::Args;

use crate::services::{ApiContext, ServiceError};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// API settings, read from flags or the environment (a `.env` file is
/// loaded first when present).
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Base URL of the quiz API
    #[arg(long, env = "QUIZ_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "QUIZ_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "QUIZ_API_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_context(&self) -> Result<ApiContext, ServiceError> {
        ApiContext::new(&self.api_url, self.token.clone(), self.request_timeout())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: 10,
        }
    }
}
