//! Port VLAN lookup from the 802.1Q MIB with Cisco fallbacks.
//!
//! Evidence is gathered from up to three tables and reconciled by precedence:
//! the standard PVID wins, Cisco membership only fills gaps, and names only
//! decorate ids that were already found.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::Target;
use super::table_walker::BulkTableWalker;
use super::types::NOT_AVAILABLE;
use crate::config::PollingSettings;
use crate::snmp::{Connector, ObjectId, SnmpTransport};

/// Q-BRIDGE-MIB dot1qPvid, indexed by bridge port (taken as ifIndex)
const DOT1Q_PVID: &[u64] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 5, 1, 1];
/// CISCO-VLAN-MEMBERSHIP-MIB vmVlan
const CISCO_VM_VLAN: &[u64] = &[1, 3, 6, 1, 4, 1, 9, 9, 68, 1, 2, 2, 1, 2];
/// Q-BRIDGE-MIB dot1qVlanStaticName
const DOT1Q_VLAN_STATIC_NAME: &[u64] = &[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 1];
/// CISCO-VTP-MIB vtpVlanName, management domain 1
const CISCO_VTP_VLAN_NAME: &[u64] = &[1, 3, 6, 1, 4, 1, 9, 9, 46, 1, 3, 1, 1, 4, 1];

/// Partial VLAN knowledge from each source, keyed by interface index
/// (`pvid`, `vendor`) or VLAN id (`names`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VlanEvidence {
    pub pvid: BTreeMap<u32, u32>,
    pub vendor: BTreeMap<u32, u32>,
    pub names: BTreeMap<u32, String>,
}

impl VlanEvidence {
    /// Whether PVID coverage is low enough to consult the vendor table.
    pub fn needs_vendor_fallback(&self, requested: usize, threshold: f64) -> bool {
        self.pvid.is_empty() || (self.pvid.len() as f64) < requested as f64 * threshold
    }

    pub fn has_vlan_ids(&self) -> bool {
        !self.pvid.is_empty() || !self.vendor.is_empty()
    }

    /// Label for every index in `indices`: `"<id> (<name>)"`, `"<id>"` or `"N/A"`.
    pub fn reconcile(&self, indices: &[u32]) -> BTreeMap<u32, String> {
        indices
            .iter()
            .map(|&index| {
                let label = self
                    .pvid
                    .get(&index)
                    .or_else(|| self.vendor.get(&index))
                    .map_or_else(
                        || NOT_AVAILABLE.to_string(),
                        |id| match self.names.get(id) {
                            Some(name) => format!("{} ({})", id, name),
                            None => id.to_string(),
                        },
                    );
                (index, label)
            })
            .collect()
    }
}

pub struct VlanResolver<'a> {
    connector: &'a dyn Connector,
    settings: &'a PollingSettings,
}

impl<'a> VlanResolver<'a> {
    pub fn new(connector: &'a dyn Connector, settings: &'a PollingSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    /// Always returns one entry per requested index.
    pub async fn resolve(&self, target: &Target, indices: &[u32]) -> BTreeMap<u32, String> {
        let evidence = self.gather(target, indices).await;
        debug!(
            host = %target,
            pvid = evidence.pvid.len(),
            vendor = evidence.vendor.len(),
            names = evidence.names.len(),
            "VLAN evidence gathered"
        );
        evidence.reconcile(indices)
    }

    async fn gather(&self, target: &Target, indices: &[u32]) -> VlanEvidence {
        let mut evidence = VlanEvidence::default();
        let options = target
            .session_options()
            .capped_by(self.settings.vlan.options());
        let mut transport = match self.connector.connect(target, options).await {
            Ok(transport) => transport,
            Err(e) => {
                debug!(host = %target, error = %e, "VLAN data not available");
                return evidence;
            }
        };
        let wanted: BTreeSet<u32> = indices.iter().copied().collect();

        evidence.pvid = self
            .vlan_ids(transport.as_mut(), DOT1Q_PVID, &wanted)
            .await;

        if evidence.needs_vendor_fallback(wanted.len(), self.settings.vlan_coverage_threshold) {
            let mut vendor = self
                .vlan_ids(transport.as_mut(), CISCO_VM_VLAN, &wanted)
                .await;
            vendor.retain(|index, _| !evidence.pvid.contains_key(index));
            evidence.vendor = vendor;
        }

        if evidence.has_vlan_ids() {
            evidence.names = self.vlan_names(transport.as_mut()).await;
        }
        evidence
    }

    /// Interface index → VLAN id from one membership table.
    async fn vlan_ids(
        &self,
        transport: &mut dyn SnmpTransport,
        table: &[u64],
        wanted: &BTreeSet<u32>,
    ) -> BTreeMap<u32, u32> {
        BulkTableWalker::new(self.settings.vlan_page_size)
            .walk(
                transport,
                &ObjectId::from_arcs(table),
                self.settings.auxiliary_max_rows,
            )
            .await
            .integers_where(|index| wanted.contains(&index))
            .into_iter()
            .filter_map(|(index, id)| {
                let id = u32::try_from(id).ok().filter(|&id| id > 0)?;
                Some((index, id))
            })
            .collect()
    }

    /// VLAN id → name, standard table first, Cisco VTP if that has nothing.
    async fn vlan_names(&self, transport: &mut dyn SnmpTransport) -> BTreeMap<u32, String> {
        let names = self.name_table(transport, DOT1Q_VLAN_STATIC_NAME).await;
        if !names.is_empty() {
            return names;
        }
        self.name_table(transport, CISCO_VTP_VLAN_NAME).await
    }

    async fn name_table(
        &self,
        transport: &mut dyn SnmpTransport,
        table: &[u64],
    ) -> BTreeMap<u32, String> {
        BulkTableWalker::new(self.settings.vlan_name_page_size)
            .walk(
                transport,
                &ObjectId::from_arcs(table),
                self.settings.auxiliary_max_rows,
            )
            .await
            .rows
            .into_iter()
            .filter_map(|(id, raw)| {
                let name = raw.to_string().trim().to_string();
                (!name.is_empty()).then_some((id, name))
            })
            .collect()
    }
}
