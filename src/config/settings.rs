use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::snmp::SessionOptions;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default target and its session budget
    pub connection: ConnectionSettings,
    /// Credentials
    pub auth: AuthSettings,
    /// Polling engine tunables
    pub polling: PollingSettings,
    /// HTTP surface
    pub http: HttpSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Device address polled by the one-shot CLI
    pub target: String,
    pub port: u16,
    /// Timeout per SNMP request (seconds)
    pub timeout: u64,
    /// Retries after a timed-out request
    pub retries: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            target: "127.0.0.1".to_string(),
            port: 161,
            timeout: 2,
            retries: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub v2c: SnmpV2cSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpV2cSettings {
    /// Community string
    pub community: String,
}

impl Default for SnmpV2cSettings {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub listen: String,
    /// Upper bound on one `/interfaces` request (seconds)
    pub request_timeout: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            request_timeout: 60,
        }
    }
}

/// Timeout and retries of one fetch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
    pub timeout_ms: u64,
    pub retries: u32,
}

impl StepTiming {
    pub const fn new(timeout_ms: u64, retries: u32) -> Self {
        Self {
            timeout_ms,
            retries,
        }
    }

    pub fn options(&self) -> SessionOptions {
        SessionOptions::new(Duration::from_millis(self.timeout_ms), self.retries)
    }
}

/// Tunables of the polling engine. Page sizes are per table and independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// ifTable column walks
    pub walk_page_size: u32,
    /// dot1qPvid / vmVlan walks
    pub vlan_page_size: u32,
    /// VLAN name table walks
    pub vlan_name_page_size: u32,
    /// PoE table walks
    pub power_page_size: u32,
    /// Row bound for VLAN and power tables, which are not keyed by ifIndex alone
    pub auxiliary_max_rows: usize,
    /// PVID coverage below this share of interfaces triggers the vendor VLAN table
    pub vlan_coverage_threshold: f64,
    pub probe: StepTiming,
    /// ifDescr walk used when ifNumber cannot be read
    pub estimate_fallback: StepTiming,
    pub vlan: StepTiming,
    pub power: StepTiming,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            walk_page_size: 10,
            vlan_page_size: 20,
            vlan_name_page_size: 50,
            power_page_size: 20,
            auxiliary_max_rows: 256,
            vlan_coverage_threshold: 0.5,
            probe: StepTiming::new(2000, 1),
            estimate_fallback: StepTiming::new(1000, 0),
            vlan: StepTiming::new(2000, 1),
            power: StepTiming::new(1000, 0),
        }
    }
}
