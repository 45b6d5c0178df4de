use tracing::{debug, warn};

use super::Target;
use crate::config::StepTiming;
use crate::snmp::{Connector, ObjectId};

/// sysDescr.0
const SYS_DESCR: &[u64] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];

/// Checks that the agent answers at all before anything heavier is tried.
pub struct ConnectivityProbe<'a> {
    connector: &'a dyn Connector,
    timing: StepTiming,
}

impl<'a> ConnectivityProbe<'a> {
    pub fn new(connector: &'a dyn Connector, timing: StepTiming) -> Self {
        Self { connector, timing }
    }

    /// `true` if a GET of sysDescr.0 gets any answer without an error status.
    pub async fn test(&self, target: &Target) -> bool {
        let options = target.session_options().capped_by(self.timing.options());
        let mut transport = match self.connector.connect(target, options).await {
            Ok(transport) => transport,
            Err(e) => {
                warn!(host = %target, error = %e, "SNMP session could not be opened");
                return false;
            }
        };

        match transport.get(&ObjectId::from_arcs(SYS_DESCR)).await {
            Ok(vb) => {
                let descr: String = vb.value.to_string().chars().take(100).collect();
                debug!(host = %target, sys_descr = %descr, "SNMP connectivity ok");
                true
            }
            Err(e) => {
                warn!(host = %target, error = %e, "SNMP connectivity test failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollingSettings;
    use crate::snmp::testing::{MockAgent, MockConnector, octets, target};
    use std::time::Duration;

    fn probe_timing() -> StepTiming {
        PollingSettings::default().probe
    }

    #[tokio::test]
    async fn test_reachable() {
        let connector =
            MockConnector::new(MockAgent::new().with(SYS_DESCR, octets("Cisco IOS Software")));
        assert!(ConnectivityProbe::new(&connector, probe_timing()).test(&target()).await);
    }

    #[tokio::test]
    async fn test_answer_without_sys_descr_still_counts() {
        let connector = MockConnector::new(MockAgent::new());
        assert!(ConnectivityProbe::new(&connector, probe_timing()).test(&target()).await);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let connector = MockConnector::new(MockAgent::new().unreachable());
        assert!(!ConnectivityProbe::new(&connector, probe_timing()).test(&target()).await);
    }

    #[tokio::test]
    async fn test_error_status() {
        let connector = MockConnector::new(MockAgent::new().failing(&[1, 3, 6, 1, 2, 1, 1]));
        assert!(!ConnectivityProbe::new(&connector, probe_timing()).test(&target()).await);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let connector = MockConnector::refusing();
        assert!(!ConnectivityProbe::new(&connector, probe_timing()).test(&target()).await);
    }

    #[tokio::test]
    async fn test_uses_short_timeout() {
        let connector = MockConnector::new(MockAgent::new());
        let slow = target().with_timeout(Duration::from_secs(10)).with_retries(3);
        ConnectivityProbe::new(&connector, StepTiming::new(1000, 0))
            .test(&slow)
            .await;
        let seen = connector.seen_options();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].timeout, Duration::from_secs(1));
        assert_eq!(seen[0].retries, 0);
    }
}
