use std::fmt;

use snmp2::Value;

use super::oid::ObjectId;

/// Owned copy of a varbind value, detached from the response buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Integer(i64),
    /// Counter32, Gauge/Unsigned32, TimeTicks, Counter64
    Unsigned(u64),
    OctetString(Vec<u8>),
    ObjectIdentifier(ObjectId),
    IpAddress([u8; 4]),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Anything else, kept in its debug form
    Other(String),
}

impl RawValue {
    /// Integer view of the value. Octet strings holding decimal text are accepted.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawValue::Integer(v) => Some(*v),
            RawValue::Unsigned(v) => i64::try_from(*v).ok(),
            RawValue::OctetString(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
            _ => None,
        }
    }

    /// `noSuchObject`, `noSuchInstance` and `endOfMibView` exceptions.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            RawValue::NoSuchObject | RawValue::NoSuchInstance | RawValue::EndOfMibView
        )
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Integer(v) => write!(f, "{}", v),
            RawValue::Unsigned(v) => write!(f, "{}", v),
            RawValue::OctetString(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            RawValue::ObjectIdentifier(oid) => write!(f, "{}", oid),
            RawValue::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            RawValue::Null => Ok(()),
            RawValue::NoSuchObject => f.write_str("noSuchObject"),
            RawValue::NoSuchInstance => f.write_str("noSuchInstance"),
            RawValue::EndOfMibView => f.write_str("endOfMibView"),
            RawValue::Other(text) => f.write_str(text),
        }
    }
}

impl From<&Value<'_>> for RawValue {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::Integer(v) => RawValue::Integer(*v),
            Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => {
                RawValue::Unsigned(u64::from(*v))
            }
            Value::Counter64(v) => RawValue::Unsigned(*v),
            Value::OctetString(bytes) | Value::Opaque(bytes) => RawValue::OctetString(bytes.to_vec()),
            Value::ObjectIdentifier(oid) => RawValue::ObjectIdentifier(ObjectId::from_snmp2(oid)),
            Value::IpAddress(addr) => RawValue::IpAddress(*addr),
            Value::Null => RawValue::Null,
            Value::NoSuchObject => RawValue::NoSuchObject,
            Value::NoSuchInstance => RawValue::NoSuchInstance,
            Value::EndOfMibView => RawValue::EndOfMibView,
            other => RawValue::Other(format!("{:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_integer() {
        assert_eq!(RawValue::Integer(-3).as_integer(), Some(-3));
        assert_eq!(RawValue::Unsigned(1_000_000_000).as_integer(), Some(1_000_000_000));
        assert_eq!(RawValue::Unsigned(u64::MAX).as_integer(), None);
        assert_eq!(RawValue::OctetString(b" 42 ".to_vec()).as_integer(), Some(42));
        assert_eq!(RawValue::OctetString(b"eth0".to_vec()).as_integer(), None);
        assert_eq!(RawValue::Null.as_integer(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(RawValue::OctetString(b"Gi0/1".to_vec()).to_string(), "Gi0/1");
        assert_eq!(RawValue::IpAddress([10, 0, 0, 1]).to_string(), "10.0.0.1");
        assert_eq!(RawValue::Null.to_string(), "");
    }

    #[test]
    fn test_from_wire_value() {
        assert_eq!(RawValue::from(&Value::Counter32(7)), RawValue::Unsigned(7));
        assert_eq!(
            RawValue::from(&Value::OctetString(b"up")),
            RawValue::OctetString(b"up".to_vec())
        );
        assert!(RawValue::from(&Value::EndOfMibView).is_exception());
    }
}
