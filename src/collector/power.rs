use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::Target;
use super::table_walker::BulkTableWalker;
use super::types::NOT_AVAILABLE;
use crate::config::PollingSettings;
use crate::snmp::{Connector, ObjectId};

/// PoE draw tables in the order they are tried.
const POWER_TABLES: &[(&str, &[u64])] = &[
    ("cethPsePortPower", &[1, 3, 6, 1, 4, 1, 9, 9, 402, 1, 2, 1, 7]),
    ("pethPsePortPower", &[1, 3, 6, 1, 2, 1, 105, 1, 1, 1, 4]),
];

/// Milliwatts to `"15.4W"`; zero or negative readings are `"0W"`.
pub fn format_milliwatts(milliwatts: i64) -> String {
    if milliwatts > 0 {
        format!("{:.1}W", milliwatts as f64 / 1000.0)
    } else {
        "0W".to_string()
    }
}

/// Per-port PoE draw. Optional telemetry: short timeout, no retries.
pub struct PowerResolver<'a> {
    connector: &'a dyn Connector,
    settings: &'a PollingSettings,
}

impl<'a> PowerResolver<'a> {
    pub fn new(connector: &'a dyn Connector, settings: &'a PollingSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    /// Always returns one entry per requested index.
    pub async fn resolve(&self, target: &Target, indices: &[u32]) -> BTreeMap<u32, String> {
        let mut power = self.readings(target, indices).await;
        for &index in indices {
            power
                .entry(index)
                .or_insert_with(|| NOT_AVAILABLE.to_string());
        }
        power
    }

    /// Readings from the first table that has any for the requested indices.
    async fn readings(&self, target: &Target, indices: &[u32]) -> BTreeMap<u32, String> {
        let options = target
            .session_options()
            .capped_by(self.settings.power.options());
        let mut transport = match self.connector.connect(target, options).await {
            Ok(transport) => transport,
            Err(e) => {
                debug!(host = %target, error = %e, "power data not available");
                return BTreeMap::new();
            }
        };

        let wanted: BTreeSet<u32> = indices.iter().copied().collect();
        let walker = BulkTableWalker::new(self.settings.power_page_size);

        for &(name, table) in POWER_TABLES {
            let readings = walker
                .walk(
                    transport.as_mut(),
                    &ObjectId::from_arcs(table),
                    self.settings.auxiliary_max_rows,
                )
                .await
                .integers_where(|index| wanted.contains(&index));

            if !readings.is_empty() {
                debug!(host = %target, table = name, ports = readings.len(), "power readings found");
                return readings
                    .into_iter()
                    .map(|(index, milliwatts)| (index, format_milliwatts(milliwatts)))
                    .collect();
            }
        }

        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::RawValue;
    use crate::snmp::testing::{MockAgent, MockConnector, target};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const CISCO: &[u64] = &[1, 3, 6, 1, 4, 1, 9, 9, 402, 1, 2, 1, 7];
    const STANDARD: &[u64] = &[1, 3, 6, 1, 2, 1, 105, 1, 1, 1, 4];

    async fn resolve(connector: &MockConnector, indices: &[u32]) -> BTreeMap<u32, String> {
        let settings = PollingSettings::default();
        PowerResolver::new(connector, &settings)
            .resolve(&target(), indices)
            .await
    }

    #[test]
    fn test_format_milliwatts() {
        assert_eq!(format_milliwatts(15400), "15.4W");
        assert_eq!(format_milliwatts(0), "0W");
        assert_eq!(format_milliwatts(-5), "0W");
        assert_eq!(format_milliwatts(7260), "7.3W");
        assert_eq!(format_milliwatts(30000), "30.0W");
    }

    #[tokio::test]
    async fn test_first_table_with_data_wins() {
        let agent = MockAgent::new()
            .with_column(CISCO, [(1, RawValue::Integer(15400)), (2, RawValue::Integer(0))])
            .with_column(STANDARD, [(1, RawValue::Unsigned(9999)), (3, RawValue::Unsigned(7000))]);
        let power = resolve(&MockConnector::new(agent), &[1, 2, 3]).await;
        assert_eq!(
            power,
            BTreeMap::from([
                (1, "15.4W".to_string()),
                (2, "0W".to_string()),
                (3, "N/A".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_falls_through_to_standard_table() {
        // Cisco rows exist but none for a requested index.
        let agent = MockAgent::new()
            .with_column(CISCO, [(40, RawValue::Integer(1000))])
            .with_column(STANDARD, [(2, RawValue::Unsigned(6500))]);
        let power = resolve(&MockConnector::new(agent), &[1, 2]).await;
        assert_eq!(power[&1], "N/A");
        assert_eq!(power[&2], "6.5W");
    }

    #[tokio::test]
    async fn test_multi_arc_index_uses_last_arc() {
        // cethPsePortTable is indexed by (module, port).
        let oid: Vec<u64> = CISCO.iter().copied().chain([1, 4]).collect();
        let agent = MockAgent::new().with(&oid, RawValue::Integer(12300));
        let power = resolve(&MockConnector::new(agent), &[4]).await;
        assert_eq!(power[&4], "12.3W");
    }

    #[tokio::test]
    async fn test_nothing_available() {
        let power = resolve(&MockConnector::new(MockAgent::new()), &[1, 2]).await;
        assert!(power.values().all(|p| p == "N/A"));
        assert_eq!(power.len(), 2);

        let power = resolve(&MockConnector::new(MockAgent::new().unreachable()), &[9]).await;
        assert_eq!(power[&9], "N/A");
    }

    #[tokio::test]
    async fn test_short_timeout_no_retries() {
        let connector = MockConnector::new(MockAgent::new());
        resolve(&connector, &[1]).await;
        let seen = connector.seen_options();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].timeout, Duration::from_secs(1));
        assert_eq!(seen[0].retries, 0);
    }
}
