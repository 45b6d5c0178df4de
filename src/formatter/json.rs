use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::collector::types::{NOT_AVAILABLE, status_label};
use crate::collector::{InterfaceRecord, Target};
use crate::error::FetchError;

/// JSON report handed to callers of the CLI and the HTTP surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceReport {
    pub host: String,
    pub protocol: String,
    pub timestamp: String,
    pub summary: ResultSummary,
    pub interfaces: Vec<InterfaceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_interfaces: usize,
    pub oper_up: usize,
    pub admin_up: usize,
    pub vlan_resolved: usize,
    pub power_resolved: usize,
    /// Interfaces per ifOperStatus label
    pub oper_status: BTreeMap<String, usize>,
}

impl ResultSummary {
    pub fn from_records(records: &[InterfaceRecord]) -> Self {
        let resolved = |value: &str| value != NOT_AVAILABLE;
        let mut oper_status = BTreeMap::new();
        for record in records {
            *oper_status
                .entry(status_label(record.op_status).to_string())
                .or_insert(0) += 1;
        }
        Self {
            total_interfaces: records.len(),
            oper_up: records.iter().filter(|r| r.is_oper_up()).count(),
            admin_up: records.iter().filter(|r| r.is_admin_up()).count(),
            vlan_resolved: records.iter().filter(|r| resolved(&r.vlan)).count(),
            power_resolved: records.iter().filter(|r| resolved(&r.power)).count(),
            oper_status,
        }
    }
}

/// Builds [`InterfaceReport`]s from fetch results.
pub struct JsonFormatter;

impl JsonFormatter {
    const PROTOCOL: &'static str = "SNMPv2c";

    pub fn format_records(target: &Target, records: Vec<InterfaceRecord>) -> InterfaceReport {
        InterfaceReport {
            host: target.to_string(),
            protocol: Self::PROTOCOL.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: ResultSummary::from_records(&records),
            interfaces: records,
            error: None,
        }
    }

    pub fn format_error(target: &Target, error: &dyn fmt::Display) -> InterfaceReport {
        InterfaceReport {
            host: target.to_string(),
            protocol: Self::PROTOCOL.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: ResultSummary::default(),
            interfaces: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Report for either outcome of a fetch.
    pub fn format_result(
        target: &Target,
        result: Result<Vec<InterfaceRecord>, FetchError>,
    ) -> InterfaceReport {
        match result {
            Ok(records) => Self::format_records(target, records),
            Err(e) => Self::format_error(target, &e),
        }
    }

    pub fn to_json_string(report: &InterfaceReport) -> anyhow::Result<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| anyhow::anyhow!("failed to serialize report: {}", e))
    }

    pub fn to_json_compact(report: &InterfaceReport) -> anyhow::Result<String> {
        serde_json::to_string(report)
            .map_err(|e| anyhow::anyhow!("failed to serialize report: {}", e))
    }
}
