//! Legacy Typed-Signature Hash
//!
//! The flat, pre-EIP-712 typed data format: an ordered list of
//! `{name, type, value}` entries hashed with tight (non-padded) Solidity
//! packing. Kept as an independent algorithm; its wire format is genuinely
//! different from the structured path and shares only the digest type.

use crate::encoder::{keccak256, parse_address};
use crate::types::TypedDataError;
use crate::util::{parse_hex, parse_hex_quantity};
use serde::{Deserialize, Serialize};

/// One entry of the legacy typed data format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacyEntry {
    /// The display name of the value
    pub name: String,
    /// The elementary Solidity type of the value
    #[serde(rename = "type")]
    pub type_name: String,
    /// The value itself
    pub value: serde_json::Value,
}

/// Hash a legacy typed data entry list.
///
/// digest = keccak256( keccak256(pack(schema)) || keccak256(pack(types, values)) )
/// where `schema[i]` is the string `"{type} {name}"` and packing is tight
/// Solidity packing, not 32-byte ABI slots.
pub fn typed_signature_hash(entries: &[LegacyEntry]) -> Result<[u8; 32], TypedDataError> {
    if entries.is_empty() {
        return Err(TypedDataError::MalformedLegacyEntry(
            "expected a non-empty array of entries".to_string(),
        ));
    }

    let mut schema = Vec::new();
    let mut data = Vec::new();

    for entry in entries {
        if entry.name.is_empty() {
            return Err(TypedDataError::MalformedLegacyEntry(format!(
                "entry of type {} has no name",
                entry.type_name
            )));
        }
        // Strings pack as their raw bytes
        schema.extend_from_slice(format!("{} {}", entry.type_name, entry.name).as_bytes());
        data.extend_from_slice(&solidity_pack(&entry.type_name, &entry.value)?);
    }

    let mut outer = Vec::with_capacity(64);
    outer.extend_from_slice(&keccak256(&schema));
    outer.extend_from_slice(&keccak256(&data));
    Ok(keccak256(&outer))
}

/// Tight Solidity packing of a single elementary value.
///
/// Unlike the 32-byte slots of the struct encoder, tight packing uses each
/// type's natural width: uintN/intN take N/8 bytes, addresses 20, bools 1,
/// bytesN exactly N, and string/bytes their raw length.
fn solidity_pack(type_name: &str, value: &serde_json::Value) -> Result<Vec<u8>, TypedDataError> {
    // Bare uint/int alias the 256-bit width
    let type_name = match type_name {
        "uint" => "uint256",
        "int" => "int256",
        other => other,
    };

    if type_name == "string" {
        let s = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        return Ok(s.as_bytes().to_vec());
    }

    if type_name == "bytes" {
        let s = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        return parse_hex(s);
    }

    if type_name == "address" {
        let s = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        return Ok(parse_address(s)?.to_vec());
    }

    if type_name == "bool" {
        let b = value.as_bool().ok_or_else(|| invalid_value(type_name, value))?;
        return Ok(vec![u8::from(b)]);
    }

    if let Some(bits) = type_name.strip_prefix("uint") {
        let width = parse_bit_width(type_name, bits)?;
        return pack_uint(type_name, value, width);
    }

    if let Some(bits) = type_name.strip_prefix("int") {
        let width = parse_bit_width(type_name, bits)?;
        return pack_int(type_name, value, width);
    }

    if let Some(size) = type_name.strip_prefix("bytes") {
        let size: usize = size
            .parse()
            .map_err(|_| unsupported_type(type_name))?;
        if size == 0 || size > 32 {
            return Err(unsupported_type(type_name));
        }
        let s = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        let bytes = parse_hex(s)?;
        if bytes.len() > size {
            return Err(invalid_value(type_name, value));
        }
        let mut out = bytes;
        out.resize(size, 0);
        return Ok(out);
    }

    Err(unsupported_type(type_name))
}

fn parse_bit_width(type_name: &str, bits: &str) -> Result<usize, TypedDataError> {
    let n: usize = bits.parse().map_err(|_| unsupported_type(type_name))?;
    if n == 0 || n > 256 || n % 8 != 0 {
        return Err(unsupported_type(type_name));
    }
    Ok(n / 8)
}

fn pack_uint(
    type_name: &str,
    value: &serde_json::Value,
    width: usize,
) -> Result<Vec<u8>, TypedDataError> {
    let be = match value {
        serde_json::Value::Number(n) => {
            let u = n.as_u64().ok_or_else(|| invalid_value(type_name, value))? as u128;
            u.to_be_bytes().to_vec()
        }
        serde_json::Value::String(s) if s.starts_with("0x") || s.starts_with("0X") => {
            parse_hex_quantity(s)?
        }
        serde_json::Value::String(s) => {
            let u: u128 = s.parse().map_err(|_| invalid_value(type_name, value))?;
            u.to_be_bytes().to_vec()
        }
        _ => return Err(invalid_value(type_name, value)),
    };
    fit_left_padded(type_name, value, &be, width, 0)
}

fn pack_int(
    type_name: &str,
    value: &serde_json::Value,
    width: usize,
) -> Result<Vec<u8>, TypedDataError> {
    let (be, fill) = match value {
        serde_json::Value::Number(n) => {
            let i = n.as_i64().ok_or_else(|| invalid_value(type_name, value))? as i128;
            (
                i.to_be_bytes().to_vec(),
                if i < 0 { 0xff } else { 0x00 },
            )
        }
        serde_json::Value::String(s) if s.starts_with("0x") || s.starts_with("0X") => {
            let bytes = parse_hex_quantity(s)?;
            let fill = if bytes.first().is_some_and(|b| b & 0x80 != 0) {
                0xff
            } else {
                0x00
            };
            (bytes, fill)
        }
        serde_json::Value::String(s) => {
            let i: i128 = s.parse().map_err(|_| invalid_value(type_name, value))?;
            (
                i.to_be_bytes().to_vec(),
                if i < 0 { 0xff } else { 0x00 },
            )
        }
        _ => return Err(invalid_value(type_name, value)),
    };
    fit_left_padded(type_name, value, &be, width, fill)
}

/// Trim or pad a big-endian byte string to `width`, rejecting values that
/// cannot fit
fn fit_left_padded(
    type_name: &str,
    value: &serde_json::Value,
    be: &[u8],
    width: usize,
    fill: u8,
) -> Result<Vec<u8>, TypedDataError> {
    if be.len() > width {
        let (excess, rest) = be.split_at(be.len() - width);
        if excess.iter().any(|&b| b != fill) {
            return Err(invalid_value(type_name, value));
        }
        return Ok(rest.to_vec());
    }
    let mut out = vec![fill; width - be.len()];
    out.extend_from_slice(be);
    Ok(out)
}

fn invalid_value(type_name: &str, value: &serde_json::Value) -> TypedDataError {
    TypedDataError::InvalidValue {
        type_name: type_name.to_string(),
        value: value.to_string(),
    }
}

fn unsupported_type(type_name: &str) -> TypedDataError {
    TypedDataError::EncodingError(format!("unsupported legacy type: {type_name}"))
}

#[cfg(test)]
mod legacy_tests {
    use super::*;

    fn entry(name: &str, type_name: &str, value: serde_json::Value) -> LegacyEntry {
        LegacyEntry {
            name: name.to_string(),
            type_name: type_name.to_string(),
            value,
        }
    }

    #[test]
    fn test_string_entry_vector() {
        let entries = vec![entry("message", "string", serde_json::json!("Hi, Alice!"))];
        let hash = typed_signature_hash(&entries).unwrap();
        assert_eq!(
            hex::encode(hash),
            "14b9f24872e28cc49e72dc104d7380d8e0ba84a3fe2e712704bcac66a5702bd5"
        );
    }

    #[test]
    fn test_bytes_entry_vector() {
        let entries = vec![entry("message", "bytes", serde_json::json!("0xdeadbeaf"))];
        let hash = typed_signature_hash(&entries).unwrap();
        assert_eq!(
            hex::encode(hash),
            "6c69d03412450b174def7d1e48b3bcbbbd8f51df2e76e2c5b3a5d951125be3a9"
        );
    }

    #[test]
    fn test_mixed_entries_vector() {
        let entries = vec![
            entry("message", "string", serde_json::json!("Hi, Alice!")),
            entry("value", "uint8", serde_json::json!(10)),
        ];
        let hash = typed_signature_hash(&entries).unwrap();
        assert_eq!(
            hex::encode(hash),
            "f7ad23226db5c1c00ca0ca1468fd49c8f8bbc1489bc1c382de5adc557a69c229"
        );
    }

    #[test]
    fn test_empty_list_fails() {
        let err = typed_signature_hash(&[]).unwrap_err();
        assert!(matches!(err, TypedDataError::MalformedLegacyEntry(_)));
    }

    #[test]
    fn test_empty_name_fails() {
        let entries = vec![entry("", "string", serde_json::json!("hello"))];
        let err = typed_signature_hash(&entries).unwrap_err();
        assert!(matches!(err, TypedDataError::MalformedLegacyEntry(_)));
    }

    #[test]
    fn test_pack_widths() {
        assert_eq!(
            solidity_pack("uint8", &serde_json::json!(10)).unwrap(),
            vec![10]
        );
        assert_eq!(
            solidity_pack("uint32", &serde_json::json!(1)).unwrap(),
            vec![0, 0, 0, 1]
        );
        assert_eq!(solidity_pack("bool", &serde_json::json!(true)).unwrap(), vec![1]);
        assert_eq!(
            solidity_pack("int8", &serde_json::json!(-1)).unwrap(),
            vec![0xff]
        );
        assert_eq!(
            solidity_pack("address", &serde_json::json!("0x0000000000000000000000000000000000000001"))
                .unwrap()
                .len(),
            20
        );
    }

    #[test]
    fn test_pack_odd_digit_hex_quantities() {
        assert_eq!(
            solidity_pack("uint16", &serde_json::json!("0x3e8")).unwrap(),
            solidity_pack("uint16", &serde_json::json!(1000)).unwrap()
        );
        assert_eq!(
            solidity_pack("int16", &serde_json::json!("0x7ff")).unwrap(),
            solidity_pack("int16", &serde_json::json!(2047)).unwrap()
        );
    }

    #[test]
    fn test_pack_overflow_rejected() {
        let err = solidity_pack("uint8", &serde_json::json!(256)).unwrap_err();
        assert!(matches!(err, TypedDataError::InvalidValue { .. }));
    }

    #[test]
    fn test_bare_uint_aliases_uint256() {
        assert_eq!(
            solidity_pack("uint", &serde_json::json!(1)).unwrap(),
            solidity_pack("uint256", &serde_json::json!(1)).unwrap()
        );
    }
}
