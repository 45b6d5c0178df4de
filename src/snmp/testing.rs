//! In-memory SNMP agent for exercising the collector without a network.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Connector, ObjectId, RawValue, SessionOptions, SnmpTransport, VarBind};
use crate::collector::Target;
use crate::error::SnmpError;

#[derive(Debug, Default)]
pub(crate) struct MockAgent {
    objects: BTreeMap<ObjectId, RawValue>,
    failing: Vec<ObjectId>,
    panicking: Vec<ObjectId>,
    unreachable: bool,
    bulk_requests: AtomicUsize,
}

impl MockAgent {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, oid: &[u64], value: RawValue) -> Self {
        self.objects.insert(ObjectId::from_arcs(oid), value);
        self
    }

    /// Adds one table column: `prefix.<index>` for every row.
    pub(crate) fn with_column<I>(mut self, prefix: &[u64], rows: I) -> Self
    where
        I: IntoIterator<Item = (u32, RawValue)>,
    {
        let prefix = ObjectId::from_arcs(prefix);
        for (index, value) in rows {
            self.objects.insert(prefix.child(u64::from(index)), value);
        }
        self
    }

    /// Requests rooted in this subtree answer with error-status genErr.
    pub(crate) fn failing(mut self, prefix: &[u64]) -> Self {
        self.failing.push(ObjectId::from_arcs(prefix));
        self
    }

    /// Requests rooted in this subtree panic.
    pub(crate) fn panicking(mut self, prefix: &[u64]) -> Self {
        self.panicking.push(ObjectId::from_arcs(prefix));
        self
    }

    /// Every request times out.
    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub(crate) fn bulk_requests(&self) -> usize {
        self.bulk_requests.load(Ordering::SeqCst)
    }

    fn check(&self, oid: &ObjectId) -> Result<(), SnmpError> {
        if self.unreachable {
            return Err(SnmpError::Timeout { attempts: 1 });
        }
        if self.panicking.iter().any(|p| oid.starts_with(p)) {
            panic!("agent crashed while serving {}", oid);
        }
        if self.failing.iter().any(|p| oid.starts_with(p)) {
            return Err(SnmpError::ErrorStatus {
                status: 5,
                index: 1,
            });
        }
        Ok(())
    }

    fn get(&self, oid: &ObjectId) -> Result<VarBind, SnmpError> {
        self.check(oid)?;
        let value = self
            .objects
            .get(oid)
            .cloned()
            .unwrap_or(RawValue::NoSuchObject);
        Ok(VarBind::new(oid.clone(), value))
    }

    fn get_bulk(&self, oid: &ObjectId, max_repetitions: u32) -> Result<Vec<VarBind>, SnmpError> {
        self.bulk_requests.fetch_add(1, Ordering::SeqCst);
        self.check(oid)?;

        let limit = max_repetitions as usize;
        let mut page: Vec<VarBind> = self
            .objects
            .range((Excluded(oid.clone()), Unbounded))
            .take(limit)
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .collect();

        if page.len() < limit {
            let last = page.last().map_or_else(|| oid.clone(), |vb| vb.oid.clone());
            page.push(VarBind::new(last, RawValue::EndOfMibView));
        }
        Ok(page)
    }
}

struct MockSession {
    agent: Arc<MockAgent>,
}

#[async_trait]
impl SnmpTransport for MockSession {
    async fn get(&mut self, oid: &ObjectId) -> Result<VarBind, SnmpError> {
        tokio::task::yield_now().await;
        self.agent.get(oid)
    }

    async fn get_bulk(
        &mut self,
        oid: &ObjectId,
        max_repetitions: u32,
    ) -> Result<Vec<VarBind>, SnmpError> {
        tokio::task::yield_now().await;
        self.agent.get_bulk(oid, max_repetitions)
    }
}

#[derive(Debug)]
pub(crate) struct MockConnector {
    pub(crate) agent: Arc<MockAgent>,
    refuse: bool,
    connects: AtomicUsize,
    options: std::sync::Mutex<Vec<SessionOptions>>,
}

impl MockConnector {
    pub(crate) fn new(agent: MockAgent) -> Self {
        Self {
            agent: Arc::new(agent),
            refuse: false,
            connects: AtomicUsize::new(0),
            options: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Every connect attempt fails.
    pub(crate) fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(MockAgent::new())
        }
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Session options of every connect call, in order.
    pub(crate) fn seen_options(&self) -> Vec<SessionOptions> {
        self.options.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        _target: &Target,
        options: SessionOptions,
    ) -> Result<Box<dyn SnmpTransport>, SnmpError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.options.lock().unwrap().push(options);
        if self.refuse {
            return Err(SnmpError::Connect("connection refused".to_string()));
        }
        Ok(Box::new(MockSession {
            agent: Arc::clone(&self.agent),
        }))
    }
}

pub(crate) fn target() -> Target {
    Target::new("192.0.2.10")
}

pub(crate) fn octets(text: &str) -> RawValue {
    RawValue::OctetString(text.as_bytes().to_vec())
}
