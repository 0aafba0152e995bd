//! Lookup endpoint configuration.

use engine_core::Dimension;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoints and timeout for the three lookup services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Age service URL, called as `GET <url>?name=<name>`
    #[serde(default = "default_age_url")]
    pub age_url: String,
    /// Gender service URL
    #[serde(default = "default_gender_url")]
    pub gender_url: String,
    /// Nationality service URL
    #[serde(default = "default_nationality_url")]
    pub nationality_url: String,
    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_age_url() -> String {
    "https://api.agify.io/".to_string()
}

fn default_gender_url() -> String {
    "https://api.genderize.io/".to_string()
}

fn default_nationality_url() -> String {
    "https://api.nationalize.io/".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            age_url: default_age_url(),
            gender_url: default_gender_url(),
            nationality_url: default_nationality_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl LookupConfig {
    /// Points every dimension at the same base URL, using `/age`, `/gender`
    /// and `/nationality` paths.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            age_url: format!("{}/age", base),
            gender_url: format!("{}/gender", base),
            nationality_url: format!("{}/nationality", base),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn url_for(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Age => &self.age_url,
            Dimension::Gender => &self.gender_url,
            Dimension::Nationality => &self.nationality_url,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
