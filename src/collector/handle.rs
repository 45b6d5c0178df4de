use std::fmt;

use tokio::sync::mpsc;

use super::types::InterfaceRecord;
use crate::error::FetchError;

/// Progress of one fetch. A spawned fetch reports `Idle` while it waits for
/// its task to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Probing,
    Counting,
    Aggregating,
    ResolvingAuxiliary,
    Assembling,
    Succeeded,
    Failed,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchState::Idle => "idle",
            FetchState::Probing => "probing",
            FetchState::Counting => "counting",
            FetchState::Aggregating => "aggregating",
            FetchState::ResolvingAuxiliary => "resolving VLAN and power",
            FetchState::Assembling => "assembling",
            FetchState::Succeeded => "succeeded",
            FetchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a background fetch reports, in order: any number of `State`, then
/// `Success` or `Error`, then exactly one `Finished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    State(FetchState),
    Success(Vec<InterfaceRecord>),
    Error(FetchError),
    Finished,
}

/// Sends `Finished` when dropped, whichever way the worker exits.
pub(crate) struct FinishedGuard {
    events: mpsc::UnboundedSender<FetchEvent>,
}

impl FinishedGuard {
    pub(crate) fn new(events: mpsc::UnboundedSender<FetchEvent>) -> Self {
        Self { events }
    }
}

impl Drop for FinishedGuard {
    fn drop(&mut self) {
        let _ = self.events.send(FetchEvent::Finished);
    }
}

/// Receiving end of a background fetch.
#[derive(Debug)]
pub struct FetchHandle {
    events: mpsc::UnboundedReceiver<FetchEvent>,
}

impl FetchHandle {
    pub(crate) fn new(events: mpsc::UnboundedReceiver<FetchEvent>) -> Self {
        Self { events }
    }

    /// Next event, `None` once the worker is gone and everything was read.
    pub async fn next_event(&mut self) -> Option<FetchEvent> {
        self.events.recv().await
    }

    /// Waits for `Finished` and returns the delivered result.
    pub async fn outcome(mut self) -> Result<Vec<InterfaceRecord>, FetchError> {
        let mut outcome = None;
        while let Some(event) = self.next_event().await {
            match event {
                FetchEvent::Success(records) => outcome = Some(Ok(records)),
                FetchEvent::Error(e) => outcome = Some(Err(e)),
                FetchEvent::State(_) => {}
                FetchEvent::Finished => break,
            }
        }
        outcome.unwrap_or_else(|| {
            Err(FetchError::Failed(
                "worker exited without a result".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_sends_finished_on_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let _guard = FinishedGuard::new(tx.clone());
            tx.send(FetchEvent::Error(FetchError::NoInterfaces)).unwrap();
        }
        drop(tx);
        let mut handle = FetchHandle::new(rx);
        assert_eq!(
            handle.next_event().await,
            Some(FetchEvent::Error(FetchError::NoInterfaces))
        );
        assert_eq!(handle.next_event().await, Some(FetchEvent::Finished));
        assert_eq!(handle.next_event().await, None);
    }

    #[tokio::test]
    async fn test_outcome_without_result() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(FinishedGuard::new(tx));
        let outcome = FetchHandle::new(rx).outcome().await;
        assert!(matches!(outcome, Err(FetchError::Failed(_))));
    }
}
