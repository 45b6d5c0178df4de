use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::collector::Target;

pub mod settings;

pub use settings::{PollingSettings, Settings, StepTiming};

/// Config file used when `SNMP_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "./config/poller.yaml";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub settings: Settings,
}

impl AppConfig {
    /// Reads a YAML config file. Keys left out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file means defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Path from `SNMP_CONFIG`, else [`DEFAULT_CONFIG_PATH`].
    pub fn config_path() -> String {
        env::var("SNMP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Target from the environment, falling back to the config file.
    pub fn get_target(&self) -> Target {
        self.target_from(|key| env::var(key).ok())
    }

    /// Target with `SNMP_*` overrides looked up through `lookup`. Values that
    /// do not parse are ignored.
    pub fn target_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Target {
        let connection = &self.settings.connection;
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let address = lookup("SNMP_TARGET").unwrap_or_else(|| connection.target.clone());
        let port = parsed("SNMP_PORT")
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(connection.port);
        let community =
            lookup("SNMP_COMMUNITY").unwrap_or_else(|| self.settings.auth.v2c.community.clone());
        let timeout = parsed("SNMP_TIMEOUT").unwrap_or(connection.timeout);
        let retries = parsed("SNMP_RETRIES")
            .and_then(|r| u32::try_from(r).ok())
            .unwrap_or(connection.retries);

        Target::new(address)
            .with_port(port)
            .with_community(community)
            .with_timeout(Duration::from_secs(timeout))
            .with_retries(retries)
    }

    /// HTTP listen address, `SNMP_LISTEN` first.
    pub fn listen_addr(&self) -> String {
        env::var("SNMP_LISTEN").unwrap_or_else(|_| self.settings.http.listen.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.http.request_timeout)
    }

    pub fn debug_config(&self) {
        let target = self.get_target();
        let polling = &self.settings.polling;
        debug!(
            host = %target,
            timeout = ?target.timeout,
            retries = target.retries,
            walk_page_size = polling.walk_page_size,
            vlan_page_size = polling.vlan_page_size,
            power_page_size = polling.power_page_size,
            vlan_coverage_threshold = polling.vlan_coverage_threshold,
            "configuration loaded"
        );
    }
}
