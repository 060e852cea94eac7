//! EIP-712 Type and Data Encoding
//!
//! Implements the recursive struct-encoding scheme: type dependency
//! resolution, canonical type strings, type hashes and struct data encoding.

use crate::types::{is_atomic_type, is_dynamic_type, TypeTable, TypedDataError};
use crate::util::{parse_hex, parse_hex_quantity};
use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Find all struct types transitively referenced by `type_name`.
///
/// The result preserves first-visit order and contains each dependency
/// exactly once; the "already collected" check doubles as the cycle guard.
/// Elementary types contribute nothing. A root that names an elementary type
/// yields an empty list.
pub fn find_type_dependencies(type_name: &str, types: &TypeTable) -> Vec<String> {
    let mut found = Vec::new();
    collect_dependencies(type_name, types, &mut found);
    found
}

fn collect_dependencies(type_name: &str, types: &TypeTable, found: &mut Vec<String>) {
    if found.iter().any(|t| t == type_name) {
        return;
    }
    let fields = match types.get(type_name) {
        Some(fields) => fields,
        None => return,
    };
    found.push(type_name.to_string());
    for field in fields {
        collect_dependencies(&field.type_name, types, found);
    }
}

/// Encode the canonical type string for a struct type.
///
/// Format: `Name(type1 name1,type2 name2,...)` for the root type, followed by
/// every transitively referenced struct type sorted lexicographically, with
/// no separator. Field order within each type is the declared order.
pub fn encode_type(type_name: &str, types: &TypeTable) -> Result<String, TypedDataError> {
    let mut deps: Vec<String> = find_type_dependencies(type_name, types)
        .into_iter()
        .filter(|dep| dep != type_name)
        .collect();
    deps.sort();

    let mut ordered = Vec::with_capacity(deps.len() + 1);
    ordered.push(type_name.to_string());
    ordered.extend(deps);

    let mut result = String::new();
    for dep in &ordered {
        let fields = types
            .get(dep)
            .ok_or_else(|| TypedDataError::MissingTypeDefinition(dep.clone()))?;
        let field_strs: Vec<String> = fields
            .iter()
            .map(|f| format!("{} {}", f.type_name, f.name))
            .collect();
        result.push_str(&format!("{}({})", dep, field_strs.join(",")));
    }

    Ok(result)
}

/// Calculate the type hash for a struct type.
///
/// typeHash = keccak256(encodeType(typeOf(s))) — a pure function of the type
/// shape, independent of any data instance.
pub fn type_hash(type_name: &str, types: &TypeTable) -> Result<[u8; 32], TypedDataError> {
    let encoded = encode_type(type_name, types)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// How a field's declared type is encoded, resolved once per field from the
/// type table.
enum FieldKind<'a> {
    /// `string` / `bytes`: the slot holds keccak256 of the raw value
    Dynamic,
    /// A nested struct: the slot holds keccak256 of its encoded data
    Struct(&'a str),
    /// Array-suffixed types are not supported by the struct encoder
    Array,
    /// An atomic ABI type packed into its standard 32-byte slot
    Elementary,
}

fn classify<'a>(type_name: &'a str, types: &TypeTable) -> Result<FieldKind<'a>, TypedDataError> {
    if is_dynamic_type(type_name) {
        Ok(FieldKind::Dynamic)
    } else if types.contains_key(type_name) {
        Ok(FieldKind::Struct(type_name))
    } else if type_name.ends_with(']') {
        Ok(FieldKind::Array)
    } else if is_atomic_type(type_name) {
        Ok(FieldKind::Elementary)
    } else {
        Err(TypedDataError::MissingTypeDefinition(type_name.to_string()))
    }
}

/// Encode a struct instance into its packed byte sequence.
///
/// The output starts with the struct's type hash, followed by one 32-byte
/// slot per field present in `data`, in declared field order.
///
/// Fields absent from `data` are skipped entirely rather than zero-filled or
/// rejected. This must be preserved for hash compatibility, but note the
/// hazard: a typo in a field name silently changes the digest instead of
/// raising an error.
///
/// Integer values are accepted as JSON numbers, decimal strings (within the
/// i128/u128 range) or 0x-hex strings (full 256-bit range).
pub fn encode_data(
    type_name: &str,
    data: &serde_json::Value,
    types: &TypeTable,
) -> Result<Vec<u8>, TypedDataError> {
    let obj = data.as_object().ok_or_else(|| TypedDataError::InvalidValue {
        type_name: type_name.to_string(),
        value: data.to_string(),
    })?;

    let mut encoded = Vec::new();
    encoded.extend_from_slice(&type_hash(type_name, types)?);

    // type_hash already guarantees the entry exists
    let fields = types
        .get(type_name)
        .ok_or_else(|| TypedDataError::MissingTypeDefinition(type_name.to_string()))?;

    for field in fields {
        let value = match obj.get(&field.name) {
            Some(value) => value,
            // Skip-if-absent, required for digest compatibility.
            None => continue,
        };

        match classify(&field.type_name, types)? {
            FieldKind::Dynamic => {
                let raw = dynamic_bytes(&field.type_name, value)?;
                encoded.extend_from_slice(&keccak256(&raw));
            }
            FieldKind::Struct(nested) => {
                let inner = encode_data(nested, value, types)?;
                encoded.extend_from_slice(&keccak256(&inner));
            }
            FieldKind::Array => {
                return Err(TypedDataError::UnsupportedArrayType(
                    field.type_name.clone(),
                ));
            }
            FieldKind::Elementary => {
                encoded.extend_from_slice(&encode_elementary(&field.type_name, value)?);
            }
        }
    }

    Ok(encoded)
}

/// Hash a struct instance.
///
/// hashStruct(s) = keccak256(encodeData(s))
pub fn hash_struct(
    type_name: &str,
    data: &serde_json::Value,
    types: &TypeTable,
) -> Result<[u8; 32], TypedDataError> {
    let encoded = encode_data(type_name, data, types)?;
    Ok(keccak256(&encoded))
}

/// Raw bytes of a `string` or `bytes` value, before hashing
fn dynamic_bytes(type_name: &str, value: &serde_json::Value) -> Result<Vec<u8>, TypedDataError> {
    let s = value.as_str().ok_or_else(|| TypedDataError::InvalidValue {
        type_name: type_name.to_string(),
        value: value.to_string(),
    })?;

    if type_name == "bytes" {
        parse_hex(s)
    } else {
        Ok(s.as_bytes().to_vec())
    }
}

/// Pack an atomic value into its standard fixed-width 32-byte slot
pub fn encode_elementary(
    type_name: &str,
    value: &serde_json::Value,
) -> Result<[u8; 32], TypedDataError> {
    let mut slot = [0u8; 32];

    // address - 20 bytes, left-padded
    if type_name == "address" {
        let addr = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        let addr_bytes = parse_address(addr)?;
        slot[12..].copy_from_slice(&addr_bytes);
        return Ok(slot);
    }

    // bool - 0 or 1 in the last byte
    if type_name == "bool" {
        let b = value.as_bool().ok_or_else(|| invalid_value(type_name, value))?;
        slot[31] = u8::from(b);
        return Ok(slot);
    }

    // uintN - big-endian, left-padded
    if type_name.starts_with("uint") {
        return encode_uint(type_name, value);
    }

    // intN - big-endian two's complement, sign-extended
    if type_name.starts_with("int") {
        return encode_int(type_name, value);
    }

    // bytesN - right-padded
    if type_name.starts_with("bytes") && type_name != "bytes" {
        let size: usize = type_name[5..]
            .parse()
            .map_err(|_| TypedDataError::MissingTypeDefinition(type_name.to_string()))?;
        let hex_str = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
        let bytes = parse_hex(hex_str)?;
        if bytes.len() > size {
            return Err(TypedDataError::InvalidValue {
                type_name: type_name.to_string(),
                value: format!("bytes too long: {} > {}", bytes.len(), size),
            });
        }
        slot[..bytes.len()].copy_from_slice(&bytes);
        return Ok(slot);
    }

    Err(TypedDataError::MissingTypeDefinition(type_name.to_string()))
}

fn invalid_value(type_name: &str, value: &serde_json::Value) -> TypedDataError {
    TypedDataError::InvalidValue {
        type_name: type_name.to_string(),
        value: value.to_string(),
    }
}

fn encode_uint(type_name: &str, value: &serde_json::Value) -> Result<[u8; 32], TypedDataError> {
    let mut slot = [0u8; 32];
    match value {
        serde_json::Value::Number(n) => {
            let u = n.as_u64().ok_or_else(|| invalid_value(type_name, value))?;
            slot[24..].copy_from_slice(&u.to_be_bytes());
            Ok(slot)
        }
        serde_json::Value::String(s) => {
            if s.starts_with("0x") || s.starts_with("0X") {
                let bytes = parse_hex_quantity(s)?;
                if bytes.len() > 32 {
                    return Err(invalid_value(type_name, value));
                }
                slot[32 - bytes.len()..].copy_from_slice(&bytes);
            } else {
                let u: u128 = s.parse().map_err(|_| invalid_value(type_name, value))?;
                slot[16..].copy_from_slice(&u.to_be_bytes());
            }
            Ok(slot)
        }
        _ => Err(invalid_value(type_name, value)),
    }
}

fn encode_int(type_name: &str, value: &serde_json::Value) -> Result<[u8; 32], TypedDataError> {
    let mut slot = [0u8; 32];
    match value {
        serde_json::Value::Number(n) => {
            let i = n.as_i64().ok_or_else(|| invalid_value(type_name, value))?;
            if i < 0 {
                slot = [0xff; 32];
            }
            slot[24..].copy_from_slice(&i.to_be_bytes());
            Ok(slot)
        }
        serde_json::Value::String(s) => {
            if s.starts_with("0x") || s.starts_with("0X") {
                let bytes = parse_hex_quantity(s)?;
                if bytes.len() > 32 {
                    return Err(invalid_value(type_name, value));
                }
                // Sign-extend from the leading byte
                if bytes.first().is_some_and(|b| b & 0x80 != 0) {
                    slot = [0xff; 32];
                }
                slot[32 - bytes.len()..].copy_from_slice(&bytes);
            } else {
                let i: i128 = s.parse().map_err(|_| invalid_value(type_name, value))?;
                if i < 0 {
                    slot = [0xff; 32];
                }
                slot[16..].copy_from_slice(&i.to_be_bytes());
            }
            Ok(slot)
        }
        _ => Err(invalid_value(type_name, value)),
    }
}

/// Parse an Ethereum address into its 20 raw bytes
pub fn parse_address(addr: &str) -> Result<[u8; 20], TypedDataError> {
    let addr = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);

    if addr.len() != 40 {
        return Err(TypedDataError::InvalidAddress(format!(
            "invalid length: expected 40 hex chars, got {}",
            addr.len()
        )));
    }

    let bytes =
        hex::decode(addr).map_err(|e| TypedDataError::InvalidAddress(format!("invalid hex: {e}")))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

#[cfg(test)]
mod encoder_tests {
    use super::*;
    use crate::types::TypedDataField;
    use std::collections::HashMap;

    fn field(name: &str, type_name: &str) -> TypedDataField {
        TypedDataField {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }

    fn person_types() -> TypeTable {
        let mut types = HashMap::new();
        types.insert(
            "Person".to_string(),
            vec![field("name", "string"), field("wallet", "address")],
        );
        types
    }

    #[test]
    fn test_encode_type_simple() {
        let encoded = encode_type("Person", &person_types()).unwrap();
        assert_eq!(encoded, "Person(string name,address wallet)");
    }

    #[test]
    fn test_encode_type_with_dependencies() {
        let mut types = person_types();
        types.insert(
            "Mail".to_string(),
            vec![
                field("from", "Person"),
                field("to", "Person"),
                field("contents", "string"),
            ],
        );

        let encoded = encode_type("Mail", &types).unwrap();
        assert_eq!(
            encoded,
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
    }

    #[test]
    fn test_encode_type_missing_definition() {
        let err = encode_type("Person", &HashMap::new()).unwrap_err();
        assert!(matches!(err, TypedDataError::MissingTypeDefinition(ref t) if t == "Person"));
    }

    #[test]
    fn test_dependencies_first_visit_order() {
        let mut types = HashMap::new();
        types.insert(
            "Outer".to_string(),
            vec![field("b", "Bravo"), field("a", "Alpha")],
        );
        types.insert("Bravo".to_string(), vec![field("x", "uint256")]);
        types.insert("Alpha".to_string(), vec![field("y", "uint256")]);

        let deps = find_type_dependencies("Outer", &types);
        assert_eq!(deps, vec!["Outer", "Bravo", "Alpha"]);
    }

    #[test]
    fn test_dependencies_cycle_terminates() {
        let mut types = HashMap::new();
        types.insert("A".to_string(), vec![field("b", "B")]);
        types.insert("B".to_string(), vec![field("a", "A")]);

        let deps = find_type_dependencies("A", &types);
        assert_eq!(deps, vec!["A", "B"]);

        let deps = find_type_dependencies("B", &types);
        assert_eq!(deps, vec!["B", "A"]);
    }

    #[test]
    fn test_dependencies_of_elementary_type() {
        assert!(find_type_dependencies("uint256", &person_types()).is_empty());
    }

    #[test]
    fn test_encode_data_skips_absent_fields() {
        let types = person_types();
        let full = serde_json::json!({"name": "Alice", "wallet": "0x0000000000000000000000000000000000000001"});
        let partial = serde_json::json!({"name": "Alice"});

        let full_enc = encode_data("Person", &full, &types).unwrap();
        let partial_enc = encode_data("Person", &partial, &types).unwrap();

        // type hash slot + 2 value slots vs. type hash slot + 1 value slot
        assert_eq!(full_enc.len(), 96);
        assert_eq!(partial_enc.len(), 64);
        assert_eq!(&full_enc[..64], &partial_enc[..]);
    }

    #[test]
    fn test_encode_data_rejects_arrays() {
        let mut types = HashMap::new();
        types.insert("Order".to_string(), vec![field("items", "uint256[]")]);

        let data = serde_json::json!({"items": [1, 2, 3]});
        let err = encode_data("Order", &data, &types).unwrap_err();
        assert!(matches!(err, TypedDataError::UnsupportedArrayType(_)));
    }

    #[test]
    fn test_encode_elementary_address() {
        let slot = encode_elementary(
            "address",
            &serde_json::json!("0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"),
        )
        .unwrap();
        assert_eq!(&slot[..12], &[0u8; 12]);
        assert_eq!(slot[12], 0xCD);
        assert_eq!(slot[31], 0x26);
    }

    #[test]
    fn test_encode_elementary_bool() {
        assert_eq!(encode_elementary("bool", &serde_json::json!(true)).unwrap()[31], 1);
        assert_eq!(encode_elementary("bool", &serde_json::json!(false)).unwrap()[31], 0);
    }

    #[test]
    fn test_encode_elementary_uint_forms() {
        let from_number = encode_elementary("uint256", &serde_json::json!(1000)).unwrap();
        let from_decimal = encode_elementary("uint256", &serde_json::json!("1000")).unwrap();
        let from_hex = encode_elementary("uint256", &serde_json::json!("0x3e8")).unwrap();
        assert_eq!(from_number, from_decimal);
        assert_eq!(from_number, from_hex);
        assert_eq!(from_number[30..], [0x03, 0xe8]);
    }

    #[test]
    fn test_encode_elementary_negative_int() {
        let slot = encode_elementary("int256", &serde_json::json!(-1)).unwrap();
        assert_eq!(slot, [0xff; 32]);
    }

    #[test]
    fn test_encode_elementary_fixed_bytes() {
        let slot = encode_elementary("bytes4", &serde_json::json!("0xdeadbeef")).unwrap();
        assert_eq!(&slot[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&slot[4..], &[0u8; 28]);

        let err = encode_elementary("bytes2", &serde_json::json!("0xdeadbeef")).unwrap_err();
        assert!(matches!(err, TypedDataError::InvalidValue { .. }));
    }

    #[test]
    fn test_keccak256() {
        let hash = keccak256(b"hello");
        assert_eq!(
            hex::encode(hash),
            "1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }
}
