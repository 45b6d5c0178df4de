use std::sync::Arc;
use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use tokio::time::timeout;
use tracing::warn;

use crate::collector::{InterfacePoller, Target};
use crate::formatter::{InterfaceReport, JsonFormatter};
use crate::models::InterfaceRequest;

/// Shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<InterfacePoller>,
    /// Community, port and session budget for fields a request leaves out
    pub defaults: Target,
    pub request_timeout: Duration,
}

type ReportResponse = Result<Json<InterfaceReport>, (StatusCode, Json<InterfaceReport>)>;

pub async fn handle_interfaces(
    State(state): State<AppState>,
    Json(request): Json<InterfaceRequest>,
) -> ReportResponse {
    let target = request.into_target(&state.defaults);
    let handle = state.poller.spawn_fetch(target.clone());

    match timeout(state.request_timeout, handle.outcome()).await {
        Ok(Ok(records)) => Ok(Json(JsonFormatter::format_records(&target, records))),
        Ok(Err(e)) => Err((
            StatusCode::BAD_GATEWAY,
            Json(JsonFormatter::format_error(&target, &e)),
        )),
        Err(_) => {
            warn!(host = %target, deadline = ?state.request_timeout, "interface request timed out");
            Err((
                StatusCode::GATEWAY_TIMEOUT,
                Json(JsonFormatter::format_error(&target, &"SNMP request timeout")),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollingSettings;
    use crate::error::SnmpError;
    use crate::snmp::testing::{MockAgent, MockConnector, octets};
    use crate::snmp::{Connector, SessionOptions, SnmpTransport};
    use async_trait::async_trait;

    const SYS_DESCR: &[u64] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];
    const IF_DESCR: &[u64] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];

    fn state(agent: MockAgent, request_timeout: Duration) -> AppState {
        AppState {
            poller: Arc::new(InterfacePoller::new(
                Arc::new(MockConnector::new(agent)),
                PollingSettings::default(),
            )),
            defaults: Target::new("127.0.0.1"),
            request_timeout,
        }
    }

    fn request(ip: &str) -> Json<InterfaceRequest> {
        Json(InterfaceRequest {
            ip: ip.to_string(),
            community: Some("lab".to_string()),
            port: None,
        })
    }

    #[tokio::test]
    async fn test_report_for_reachable_device() {
        let agent = MockAgent::new()
            .with(SYS_DESCR, octets("switch"))
            .with_column(IF_DESCR, [(1, octets("Gi0/1")), (2, octets("Gi0/2"))]);
        let Json(report) = handle_interfaces(
            State(state(agent, Duration::from_secs(5))),
            request("192.0.2.20"),
        )
        .await
        .unwrap();

        assert_eq!(report.host, "192.0.2.20:161");
        assert_eq!(report.interfaces.len(), 2);
        assert_eq!(report.summary.total_interfaces, 2);
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_bad_gateway() {
        let agent = MockAgent::new().unreachable();
        let (status, Json(report)) = handle_interfaces(
            State(state(agent, Duration::from_secs(5))),
            request("192.0.2.21"),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(report.error.as_deref(), Some("No interface data retrieved"));
    }

    /// Accepts the connection but never answers.
    struct SilentConnector;

    #[async_trait]
    impl Connector for SilentConnector {
        async fn connect(
            &self,
            _target: &Target,
            _options: SessionOptions,
        ) -> Result<Box<dyn SnmpTransport>, SnmpError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_deadline_is_gateway_timeout() {
        let state = AppState {
            poller: Arc::new(InterfacePoller::new(
                Arc::new(SilentConnector),
                PollingSettings::default(),
            )),
            defaults: Target::new("127.0.0.1"),
            request_timeout: Duration::from_millis(20),
        };
        let (status, Json(report)) = handle_interfaces(State(state), request("192.0.2.22"))
            .await
            .unwrap_err();

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(report.error.as_deref(), Some("SNMP request timeout"));
    }
}
