use async_trait::async_trait;
use snmp2::{AsyncSession, Pdu};
use tokio::time::timeout;
use tracing::debug;

use super::{Connector, ObjectId, RawValue, SessionOptions, SnmpTransport, VarBind};
use crate::collector::Target;
use crate::error::SnmpError;

/// SNMPv2c session over `snmp2`, with a per-request timeout and retry budget.
pub struct SnmpClientV2c {
    session: AsyncSession,
    options: SessionOptions,
    peer: String,
}

impl SnmpClientV2c {
    pub async fn new(
        peer: &str,
        community: &[u8],
        options: SessionOptions,
    ) -> Result<Self, SnmpError> {
        let session = AsyncSession::new_v2c(peer, community, 2)
            .await
            .map_err(|e| SnmpError::Connect(format!("{}: {}", peer, e)))?;

        Ok(Self {
            session,
            options,
            peer: peer.to_string(),
        })
    }
}

/// Counts a timed-out attempt; errors once the retry budget is spent.
fn retry_or_give_up(
    options: &SessionOptions,
    peer: &str,
    attempt: &mut u32,
    request: &str,
) -> Result<(), SnmpError> {
    if *attempt >= options.retries {
        return Err(SnmpError::Timeout {
            attempts: *attempt + 1,
        });
    }
    *attempt += 1;
    debug!(peer, request, attempt = *attempt, "SNMP request timed out, retrying");
    Ok(())
}

/// Non-zero error-status of a response as an error.
fn check_status(status: u32, index: u32) -> Result<(), SnmpError> {
    if status == 0 {
        Ok(())
    } else {
        Err(SnmpError::ErrorStatus { status, index })
    }
}

fn into_varbinds(pdu: Pdu<'_>) -> Result<Vec<VarBind>, SnmpError> {
    check_status(pdu.error_status, pdu.error_index)?;

    Ok(pdu
        .varbinds
        .map(|(oid, value)| VarBind::new(ObjectId::from_snmp2(&oid), RawValue::from(&value)))
        .collect())
}

#[async_trait]
impl SnmpTransport for SnmpClientV2c {
    async fn get(&mut self, oid: &ObjectId) -> Result<VarBind, SnmpError> {
        let wire_oid = oid.to_snmp2()?;
        let mut attempt = 0;

        loop {
            match timeout(self.options.timeout, self.session.get(&wire_oid)).await {
                Ok(Ok(pdu)) => {
                    return into_varbinds(pdu)?
                        .into_iter()
                        .next()
                        .ok_or(SnmpError::EmptyResponse);
                }
                Ok(Err(e)) => return Err(SnmpError::Transport(format!("GET {}: {}", oid, e))),
                Err(_) => retry_or_give_up(&self.options, &self.peer, &mut attempt, "GET")?,
            }
        }
    }

    async fn get_bulk(
        &mut self,
        oid: &ObjectId,
        max_repetitions: u32,
    ) -> Result<Vec<VarBind>, SnmpError> {
        let wire_oid = oid.to_snmp2()?;
        let mut attempt = 0;

        loop {
            match timeout(
                self.options.timeout,
                self.session.getbulk(&[&wire_oid], 0, max_repetitions),
            )
            .await
            {
                Ok(Ok(pdu)) => return into_varbinds(pdu),
                Ok(Err(e)) => {
                    return Err(SnmpError::Transport(format!("GETBULK {}: {}", oid, e)));
                }
                Err(_) => {
                    retry_or_give_up(&self.options, &self.peer, &mut attempt, "GETBULK")?
                }
            }
        }
    }
}

/// Opens a fresh [`SnmpClientV2c`] per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct V2cConnector;

#[async_trait]
impl Connector for V2cConnector {
    async fn connect(
        &self,
        target: &Target,
        options: SessionOptions,
    ) -> Result<Box<dyn SnmpTransport>, SnmpError> {
        let client =
            SnmpClientV2c::new(&target.socket_addr(), target.community.as_bytes(), options).await?;
        Ok(Box::new(client))
    }
}
