use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::PollingSettings;
use crate::error::FetchError;
use crate::snmp::{Connector, V2cConnector};

pub mod aggregator;
pub mod codec;
pub mod estimator;
pub mod handle;
pub mod power;
pub mod probe;
pub mod table_walker;
pub mod types;
pub mod vlan;

pub use aggregator::InterfaceDataAggregator;
pub use estimator::InterfaceCountEstimator;
pub use handle::{FetchEvent, FetchHandle, FetchState};
pub use power::PowerResolver;
pub use probe::ConnectivityProbe;
pub use table_walker::{BulkTableWalker, TableWalkResult, WalkEnd};
pub use types::{FieldId, FieldValue, InterfaceData, InterfaceRecord, Target};
pub use vlan::VlanResolver;

use handle::FinishedGuard;

/// Interface table poller.
///
/// Holds no per-device state, so one instance serves any number of fetches,
/// concurrently or not.
pub struct InterfacePoller {
    connector: Arc<dyn Connector>,
    settings: PollingSettings,
}

impl InterfacePoller {
    pub fn new(connector: Arc<dyn Connector>, settings: PollingSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    /// Poller speaking SNMPv2c over UDP.
    pub fn v2c(settings: PollingSettings) -> Self {
        Self::new(Arc::new(V2cConnector), settings)
    }

    /// Full interface table of `target`, ascending by index.
    pub async fn fetch_interface_data(
        &self,
        target: &Target,
    ) -> Result<Vec<InterfaceRecord>, FetchError> {
        self.fetch_with_progress(target, |_| {}).await
    }

    /// Same as [`fetch_interface_data`](Self::fetch_interface_data), reporting
    /// every state transition to `progress`.
    pub async fn fetch_with_progress(
        &self,
        target: &Target,
        mut progress: impl FnMut(FetchState) + Send,
    ) -> Result<Vec<InterfaceRecord>, FetchError> {
        let result = self.run(target, &mut progress).await;
        match &result {
            Ok(records) => {
                info!(host = %target, interfaces = records.len(), "interface data fetched");
                progress(FetchState::Succeeded);
            }
            Err(e) => {
                warn!(host = %target, error = %e, "interface fetch failed");
                progress(FetchState::Failed);
            }
        }
        result
    }

    async fn run(
        &self,
        target: &Target,
        progress: &mut (impl FnMut(FetchState) + Send),
    ) -> Result<Vec<InterfaceRecord>, FetchError> {
        let connector = self.connector.as_ref();
        let walker = BulkTableWalker::new(self.settings.walk_page_size);
        info!(host = %target, "fetching interface data");

        progress(FetchState::Probing);
        if !ConnectivityProbe::new(connector, self.settings.probe)
            .test(target)
            .await
        {
            return Err(FetchError::Unreachable);
        }

        progress(FetchState::Counting);
        let estimate = InterfaceCountEstimator::new(
            connector,
            walker,
            self.settings.estimate_fallback,
        )
        .estimate(target)
        .await;

        progress(FetchState::Aggregating);
        let data = InterfaceDataAggregator::new(connector, walker)
            .aggregate(target, &FieldId::CORE, estimate)
            .await;
        if data.is_empty() {
            return Err(FetchError::NoInterfaces);
        }

        progress(FetchState::ResolvingAuxiliary);
        let indices: Vec<u32> = data.keys().copied().collect();
        let vlan_resolver = VlanResolver::new(connector, &self.settings);
        let power_resolver = PowerResolver::new(connector, &self.settings);
        let (vlans, power) = tokio::join!(
            best_effort(target, "VLAN", vlan_resolver.resolve(target, &indices)),
            best_effort(target, "power", power_resolver.resolve(target, &indices)),
        );

        progress(FetchState::Assembling);
        Ok(data
            .iter()
            .map(|(&index, fields)| {
                InterfaceRecord::assemble(index, fields, vlans.get(&index), power.get(&index))
            })
            .collect())
    }

    /// Runs a fetch on its own task. The handle yields progress, then the
    /// result, then `Finished` on every exit path.
    pub fn spawn_fetch(self: &Arc<Self>, target: Target) -> FetchHandle {
        let (events, receiver) = mpsc::unbounded_channel();
        let _ = events.send(FetchEvent::State(FetchState::Idle));
        let poller = Arc::clone(self);

        tokio::spawn(async move {
            let _finished = FinishedGuard::new(events.clone());
            let states = events.clone();
            let fetch = poller.fetch_with_progress(&target, move |state| {
                let _ = states.send(FetchEvent::State(state));
            });

            let event = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(Ok(records)) => FetchEvent::Success(records),
                Ok(Err(e)) => FetchEvent::Error(e),
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    error!(host = %target, reason = %reason, "fetch worker panicked");
                    let _ = events.send(FetchEvent::State(FetchState::Failed));
                    FetchEvent::Error(FetchError::Failed(reason))
                }
            };
            let _ = events.send(event);
        });

        FetchHandle::new(receiver)
    }
}

/// Awaits an optional resolver; a panic inside it counts as "nothing found".
async fn best_effort<F>(target: &Target, what: &str, resolver: F) -> BTreeMap<u32, String>
where
    F: Future<Output = BTreeMap<u32, String>>,
{
    match AssertUnwindSafe(resolver).catch_unwind().await {
        Ok(resolved) => resolved,
        Err(panic) => {
            warn!(
                host = %target,
                resolver = what,
                reason = %panic_message(panic.as_ref()),
                "resolver panicked, continuing without it"
            );
            BTreeMap::new()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
