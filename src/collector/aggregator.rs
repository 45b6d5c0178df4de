use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::join_all;
use tracing::{debug, warn};

use super::Target;
use super::codec;
use super::table_walker::{BulkTableWalker, TableWalkResult};
use super::types::{FieldId, InterfaceData};
use crate::error::SnmpError;
use crate::snmp::Connector;

/// Walks several ifTable columns at once and merges them by interface index.
pub struct InterfaceDataAggregator<'a> {
    connector: &'a dyn Connector,
    walker: BulkTableWalker,
}

impl<'a> InterfaceDataAggregator<'a> {
    pub fn new(connector: &'a dyn Connector, walker: BulkTableWalker) -> Self {
        Self { connector, walker }
    }

    /// One concurrent walk per field, each on its own session. A failed walk
    /// leaves its field out; if every walk fails the result is empty.
    pub async fn aggregate(
        &self,
        target: &Target,
        fields: &[FieldId],
        max_rows: usize,
    ) -> InterfaceData {
        let walks = fields.iter().map(|&field| {
            AssertUnwindSafe(self.walk_field(target, field, max_rows)).catch_unwind()
        });
        let results = join_all(walks).await;

        let mut data = InterfaceData::new();
        for (&field, result) in fields.iter().zip(results) {
            let walk = match result {
                Ok(Ok(walk)) => walk,
                Ok(Err(e)) => {
                    warn!(host = %target, %field, error = %e, "failed to fetch column");
                    continue;
                }
                Err(_) => {
                    warn!(host = %target, %field, "column walk panicked");
                    continue;
                }
            };

            if let Some(e) = walk.failure() {
                warn!(host = %target, %field, error = %e, "failed to fetch column");
                continue;
            }
            debug!(host = %target, %field, rows = walk.len(), end = ?walk.end, "column fetched");
            for (index, raw) in &walk.rows {
                data.entry(*index)
                    .or_default()
                    .insert(field, codec::convert(field, raw));
            }
        }

        debug!(host = %target, interfaces = data.len(), "aggregation complete");
        data
    }

    async fn walk_field(
        &self,
        target: &Target,
        field: FieldId,
        max_rows: usize,
    ) -> Result<TableWalkResult, SnmpError> {
        let mut transport = self
            .connector
            .connect(target, target.session_options())
            .await?;
        Ok(self
            .walker
            .walk(transport.as_mut(), &field.oid(), max_rows)
            .await)
    }
}
