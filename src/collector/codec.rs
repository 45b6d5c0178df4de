//! Raw varbind value to typed interface field.

use tracing::trace;

use super::types::{FieldId, FieldKind, FieldValue};
use crate::snmp::RawValue;

/// Decodes `raw` for `field`. Never fails: integer fields fall back to 0.
pub fn convert(field: FieldId, raw: &RawValue) -> FieldValue {
    match field.kind() {
        FieldKind::Integer => FieldValue::Integer(raw.as_integer().unwrap_or_else(|| {
            trace!(%field, value = %raw, "value is not an integer, using 0");
            0
        })),
        FieldKind::PhysAddress => FieldValue::Text(format_phys_address(raw)),
        FieldKind::Text => FieldValue::Text(raw.to_string()),
    }
}

/// Six octets become `aa:bb:cc:dd:ee:ff`; anything else is kept as text.
pub fn format_phys_address(raw: &RawValue) -> String {
    match raw {
        RawValue::OctetString(bytes) if bytes.len() == 6 => bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_address() {
        let raw = RawValue::OctetString(vec![0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e]);
        assert_eq!(
            convert(FieldId::PhysAddress, &raw),
            FieldValue::Text("00:1a:2b:3c:4d:5e".to_string())
        );
    }

    #[test]
    fn test_phys_address_not_six_bytes() {
        assert_eq!(
            convert(FieldId::PhysAddress, &RawValue::OctetString(Vec::new())),
            FieldValue::Text(String::new())
        );
        assert_eq!(
            convert(FieldId::PhysAddress, &RawValue::OctetString(b"00-1A".to_vec())),
            FieldValue::Text("00-1A".to_string())
        );
    }

    #[test]
    fn test_integer_fields() {
        assert_eq!(
            convert(FieldId::InOctets, &RawValue::Unsigned(4_000_000_000)),
            FieldValue::Integer(4_000_000_000)
        );
        assert_eq!(
            convert(FieldId::OperStatus, &RawValue::Integer(1)),
            FieldValue::Integer(1)
        );
        assert_eq!(
            convert(FieldId::Speed, &RawValue::OctetString(b"fast".to_vec())),
            FieldValue::Integer(0)
        );
        assert_eq!(
            convert(FieldId::Type, &RawValue::NoSuchInstance),
            FieldValue::Integer(0)
        );
    }

    #[test]
    fn test_text_fields() {
        assert_eq!(
            convert(FieldId::Description, &RawValue::OctetString(b"GigabitEthernet0/1".to_vec())),
            FieldValue::Text("GigabitEthernet0/1".to_string())
        );
        assert_eq!(
            convert(FieldId::Description, &RawValue::Integer(5)),
            FieldValue::Text("5".to_string())
        );
    }
}
