use std::fmt;
use std::str::FromStr;

use snmp2::Oid;

use crate::error::SnmpError;

/// Owned object identifier as a list of arcs.
///
/// Ordering is arc-wise lexicographic, which is the order agents walk tables in.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(Vec<u64>);

impl ObjectId {
    pub fn from_arcs(arcs: &[u64]) -> Self {
        Self(arcs.to_vec())
    }

    pub fn arcs(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new OID with `arc` appended.
    pub fn child(&self, arc: u64) -> Self {
        let mut arcs = self.0.clone();
        arcs.push(arc);
        Self(arcs)
    }

    /// Arc-wise prefix test: `1.3.6.1.2.1.2.2.1.1` is not a prefix of `1.3.6.1.2.1.2.2.1.10`.
    pub fn starts_with(&self, prefix: &ObjectId) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Trailing arc of an OID below `prefix`, as an interface index.
    ///
    /// `None` when the OID is not strictly below the prefix, or the arc is
    /// zero or does not fit in 32 bits.
    pub fn trailing_index(&self, prefix: &ObjectId) -> Option<u32> {
        if self.0.len() <= prefix.0.len() || !self.starts_with(prefix) {
            return None;
        }
        self.0
            .last()
            .and_then(|&arc| u32::try_from(arc).ok())
            .filter(|&index| index > 0)
    }

    /// Converts into the wire library's OID type.
    pub fn to_snmp2(&self) -> Result<Oid<'static>, SnmpError> {
        Oid::from(&self.0).map_err(|e| SnmpError::InvalidOid(format!("{}: {:?}", self, e)))
    }

    /// Converts from the wire library's OID type.
    ///
    /// An OID with arcs wider than 64 bits cannot be represented and comes back
    /// empty, which no table prefix matches.
    pub fn from_snmp2(oid: &Oid<'_>) -> Self {
        match oid.iter() {
            Some(arcs) => Self(arcs.collect()),
            None => oid.to_string().parse().unwrap_or_default(),
        }
    }
}

impl FromStr for ObjectId {
    type Err = SnmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Result<Vec<u64>, _> = s
            .trim()
            .split('.')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<u64>())
            .collect();

        let parts = parts.map_err(|e| SnmpError::InvalidOid(format!("{}: {}", s, e)))?;
        if parts.is_empty() {
            return Err(SnmpError::InvalidOid(s.to_string()));
        }
        Ok(Self(parts))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}
