//! Provider configuration
//!
//! Configuration surface consumed by one sync run. Scheduling cadence
//! and run timeouts are owned by the external scheduler, not by this
//! crate.

use serde::{Deserialize, Serialize};

/// Configuration for one catalogue provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the catalogue search endpoint; the page loop appends
    /// `?start=<n>&rows=<n>` query parameters.
    pub base_url: String,

    /// Environment tag used only to namespace the provider name and the
    /// sink partition key.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Hosts trusted to serve API definitions, matched
    /// case-insensitively. A non-member host is logged, never dropped.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// Umbrella authority the root group is named after.
    #[serde(default = "default_authority")]
    pub authority: String,
}

fn default_environment() -> String {
    "prod".to_string()
}

fn default_authority() -> String {
    "data-custodians".to_string()
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            environment: default_environment(),
            allowed_hosts: Vec::new(),
            authority: default_authority(),
        }
    }

    /// Partition key identifying this provider's full-replace set at
    /// the sink.
    pub fn provider_name(&self) -> String {
        format!("catalogue-{}", self.environment)
    }

    /// Case-insensitive allowlist membership check.
    pub fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}
