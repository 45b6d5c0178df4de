use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::snmp::{ObjectId, SessionOptions};

/// Device to poll. Not modified during a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub address: String,
    pub port: u16,
    pub community: String,
    pub timeout: Duration,
    pub retries: u32,
}

impl Target {
    pub const DEFAULT_PORT: u16 = 161;

    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: Self::DEFAULT_PORT,
            community: "public".to_string(),
            timeout: Duration::from_secs(2),
            retries: 1,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.community = community.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// `host:port`, bracketing bare IPv6 addresses.
    pub fn socket_addr(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::new(self.timeout, self.retries)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.socket_addr())
    }
}

/// ifEntry (IF-MIB) column prefix.
const IF_ENTRY: [u64; 9] = [1, 3, 6, 1, 2, 1, 2, 2, 1];

/// Interface attribute, one ifTable column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldId {
    Description,
    OperStatus,
    AdminStatus,
    InOctets,
    OutOctets,
    Speed,
    Type,
    PhysAddress,
}

/// How a field's raw value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    PhysAddress,
}

impl FieldId {
    /// Columns walked on every fetch.
    pub const CORE: [FieldId; 8] = [
        FieldId::Description,
        FieldId::OperStatus,
        FieldId::AdminStatus,
        FieldId::InOctets,
        FieldId::OutOctets,
        FieldId::Speed,
        FieldId::Type,
        FieldId::PhysAddress,
    ];

    /// ifEntry column number.
    pub const fn column(self) -> u64 {
        match self {
            FieldId::Description => 2,
            FieldId::Type => 3,
            FieldId::Speed => 5,
            FieldId::PhysAddress => 6,
            FieldId::AdminStatus => 7,
            FieldId::OperStatus => 8,
            FieldId::InOctets => 10,
            FieldId::OutOctets => 16,
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            FieldId::Description => FieldKind::Text,
            FieldId::PhysAddress => FieldKind::PhysAddress,
            FieldId::OperStatus
            | FieldId::AdminStatus
            | FieldId::InOctets
            | FieldId::OutOctets
            | FieldId::Speed
            | FieldId::Type => FieldKind::Integer,
        }
    }

    /// IF-MIB object name.
    pub const fn mib_name(self) -> &'static str {
        match self {
            FieldId::Description => "ifDescr",
            FieldId::OperStatus => "ifOperStatus",
            FieldId::AdminStatus => "ifAdminStatus",
            FieldId::InOctets => "ifInOctets",
            FieldId::OutOctets => "ifOutOctets",
            FieldId::Speed => "ifSpeed",
            FieldId::Type => "ifType",
            FieldId::PhysAddress => "ifPhysAddress",
        }
    }

    /// Table prefix walked for this field.
    pub fn oid(self) -> ObjectId {
        ObjectId::from_arcs(&IF_ENTRY).child(self.column())
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mib_name())
    }
}

/// Decoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Integer(_) => None,
        }
    }
}

/// Per-index decoded fields, ascending by index.
pub type InterfaceData = BTreeMap<u32, BTreeMap<FieldId, FieldValue>>;

/// ifOperStatus / ifAdminStatus `down(2)`.
pub const STATUS_DOWN: i64 = 2;
/// ifType `other(1)`.
pub const TYPE_OTHER: i64 = 1;
/// Placeholder for VLAN and power when nothing was learned.
pub const NOT_AVAILABLE: &str = "N/A";

/// IF-MIB status code label.
pub fn status_label(code: i64) -> &'static str {
    match code {
        1 => "up",
        2 => "down",
        3 => "testing",
        4 => "unknown",
        5 => "dormant",
        6 => "notPresent",
        7 => "lowerLayerDown",
        _ => "invalid",
    }
}

/// One row of the interface table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InterfaceRecord {
    pub index: u32,
    pub description: String,
    pub op_status: i64,
    pub admin_status: i64,
    #[serde(rename = "VLAN")]
    pub vlan: String,
    pub in_octets: i64,
    pub out_octets: i64,
    pub speed: i64,
    #[serde(rename = "Type")]
    pub if_type: i64,
    pub phys_address: String,
    pub power: String,
}

impl InterfaceRecord {
    /// Builds a record, filling whatever the walks did not return with defaults.
    pub fn assemble(
        index: u32,
        fields: &BTreeMap<FieldId, FieldValue>,
        vlan: Option<&String>,
        power: Option<&String>,
    ) -> Self {
        let integer = |field: FieldId, default: i64| {
            fields
                .get(&field)
                .and_then(FieldValue::as_integer)
                .unwrap_or(default)
        };
        let text = |field: FieldId| fields.get(&field).and_then(FieldValue::as_text);

        Self {
            index,
            description: text(FieldId::Description)
                .map_or_else(|| format!("Interface-{}", index), str::to_string),
            op_status: integer(FieldId::OperStatus, STATUS_DOWN),
            admin_status: integer(FieldId::AdminStatus, STATUS_DOWN),
            vlan: vlan.map_or_else(|| NOT_AVAILABLE.to_string(), Clone::clone),
            in_octets: integer(FieldId::InOctets, 0),
            out_octets: integer(FieldId::OutOctets, 0),
            speed: integer(FieldId::Speed, 0),
            if_type: integer(FieldId::Type, TYPE_OTHER),
            phys_address: text(FieldId::PhysAddress).unwrap_or_default().to_string(),
            power: power.map_or_else(|| NOT_AVAILABLE.to_string(), Clone::clone),
        }
    }

    pub fn is_oper_up(&self) -> bool {
        self.op_status == 1
    }

    pub fn is_admin_up(&self) -> bool {
        self.admin_status == 1
    }
}
