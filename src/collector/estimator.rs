use tracing::debug;

use super::Target;
use super::table_walker::BulkTableWalker;
use super::types::FieldId;
use crate::config::StepTiming;
use crate::error::SnmpError;
use crate::snmp::{Connector, ObjectId};

/// ifNumber.0
const IF_NUMBER: &[u64] = &[1, 3, 6, 1, 2, 1, 2, 1, 0];

/// Added to ifNumber, since some agents under-report it.
pub const COUNT_BUFFER: i64 = 5;
/// Upper bound on an estimate derived from ifNumber.
pub const MAX_ESTIMATE: usize = 64;
/// ifDescr rows read when ifNumber is unavailable.
pub const FALLBACK_WALK_ROWS: usize = 32;
/// Lower bound on an estimate derived from the ifDescr walk.
pub const FALLBACK_MIN_ESTIMATE: usize = 10;
/// Used when neither source answers.
pub const DEFAULT_ESTIMATE: usize = 20;

/// Guesses how many rows each column walk should be allowed to read.
///
/// The result only bounds later walks. It can be wrong either way.
pub struct InterfaceCountEstimator<'a> {
    connector: &'a dyn Connector,
    walker: BulkTableWalker,
    fallback_timing: StepTiming,
}

impl<'a> InterfaceCountEstimator<'a> {
    pub fn new(
        connector: &'a dyn Connector,
        walker: BulkTableWalker,
        fallback_timing: StepTiming,
    ) -> Self {
        Self {
            connector,
            walker,
            fallback_timing,
        }
    }

    pub async fn estimate(&self, target: &Target) -> usize {
        match self.read_if_number(target).await {
            Ok(count) => {
                let estimate = usize::try_from(count.max(0).saturating_add(COUNT_BUFFER))
                    .unwrap_or(MAX_ESTIMATE)
                    .min(MAX_ESTIMATE);
                debug!(host = %target, if_number = count, estimate, "interface count from ifNumber");
                estimate
            }
            Err(e) => {
                debug!(host = %target, error = %e, "ifNumber unavailable, walking ifDescr");
                self.estimate_by_walk(target).await
            }
        }
    }

    async fn read_if_number(&self, target: &Target) -> Result<i64, SnmpError> {
        let mut transport = self
            .connector
            .connect(target, target.session_options())
            .await?;
        let vb = transport.get(&ObjectId::from_arcs(IF_NUMBER)).await?;
        vb.value
            .as_integer()
            .ok_or_else(|| SnmpError::UnexpectedValue(format!("ifNumber = {}", vb.value)))
    }

    async fn estimate_by_walk(&self, target: &Target) -> usize {
        let options = target
            .session_options()
            .capped_by(self.fallback_timing.options());
        let mut transport = match self.connector.connect(target, options).await {
            Ok(transport) => transport,
            Err(e) => {
                debug!(host = %target, error = %e, "ifDescr walk could not start");
                return DEFAULT_ESTIMATE;
            }
        };

        let walk = self
            .walker
            .walk(
                transport.as_mut(),
                &FieldId::Description.oid(),
                FALLBACK_WALK_ROWS,
            )
            .await;

        if walk.is_empty() {
            debug!(host = %target, end = ?walk.end, "ifDescr walk found nothing, using default");
            return DEFAULT_ESTIMATE;
        }
        walk.len().max(FALLBACK_MIN_ESTIMATE)
    }
}
