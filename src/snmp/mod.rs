use std::time::Duration;

use async_trait::async_trait;

use crate::collector::Target;
use crate::error::SnmpError;

pub mod oid;
pub mod v2c;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use oid::ObjectId;
pub use v2c::{SnmpClientV2c, V2cConnector};
pub use value::RawValue;

/// One object identifier with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: ObjectId,
    pub value: RawValue,
}

impl VarBind {
    pub fn new(oid: ObjectId, value: RawValue) -> Self {
        Self { oid, value }
    }
}

/// Timeout and retry budget of one transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub timeout: Duration,
    pub retries: u32,
}

impl SessionOptions {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    /// Takes the tighter timeout and retry budget of the two.
    pub fn capped_by(self, other: SessionOptions) -> Self {
        Self {
            timeout: self.timeout.min(other.timeout),
            retries: self.retries.min(other.retries),
        }
    }
}

/// Request/response access to one agent.
///
/// Implementations apply their own timeout and retry budget to every call.
#[async_trait]
pub trait SnmpTransport: Send {
    async fn get(&mut self, oid: &ObjectId) -> Result<VarBind, SnmpError>;

    /// One GETBULK page rooted at `oid` with zero non-repeaters.
    async fn get_bulk(
        &mut self,
        oid: &ObjectId,
        max_repetitions: u32,
    ) -> Result<Vec<VarBind>, SnmpError>;
}

/// Opens transport sessions towards a target.
///
/// Every sub-operation of a fetch opens its own session, so concurrent walks
/// never share a socket.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        target: &Target,
        options: SessionOptions,
    ) -> Result<Box<dyn SnmpTransport>, SnmpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capped_by() {
        let target = SessionOptions::new(Duration::from_secs(5), 2);
        let step = SessionOptions::new(Duration::from_secs(1), 3);
        assert_eq!(
            target.capped_by(step),
            SessionOptions::new(Duration::from_secs(1), 2)
        );
    }
}
