//! Formatting helpers: signature concatenation, hex normalization, parsing.

use crate::types::TypedDataError;

/// Parse a hex string (with or without 0x prefix)
pub fn parse_hex(s: &str) -> Result<Vec<u8>, TypedDataError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let s = s.strip_prefix("0X").unwrap_or(s);

    hex::decode(s).map_err(|e| TypedDataError::EncodingError(format!("invalid hex: {e}")))
}

/// Parse a hex-encoded integer quantity (with or without 0x prefix).
///
/// Integers are routinely written with an odd number of digits ("0x3e8"), so
/// a missing leading nibble is read as zero. Raw byte strings keep the strict
/// even-length rule of [`parse_hex`].
pub fn parse_hex_quantity(s: &str) -> Result<Vec<u8>, TypedDataError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let s = s.strip_prefix("0X").unwrap_or(s);

    if s.len() % 2 == 0 {
        hex::decode(s)
    } else {
        hex::decode(format!("0{s}"))
    }
    .map_err(|e| TypedDataError::EncodingError(format!("invalid hex: {e}")))
}

/// Serialize signature components into the transport hex blob.
///
/// r and s are left-zero-padded to exactly 64 hex characters; v is rendered
/// as minimal hex. The whole string carries a single 0x prefix.
pub fn concat_sig(v: u8, r: &[u8], s: &[u8]) -> Result<String, TypedDataError> {
    if r.len() > 32 || s.len() > 32 {
        return Err(TypedDataError::InvalidSignature(
            "r and s must be at most 32 bytes".to_string(),
        ));
    }

    Ok(format!(
        "0x{:0>64}{:0>64}{:x}",
        hex::encode(r),
        hex::encode(s),
        v
    ))
}

/// Normalize a number or hex string into a lowercase 0x-prefixed hex string.
///
/// Integers become their minimal big-endian byte representation (zero is a
/// single zero byte); strings are lowercased and prefixed idempotently. Any
/// other input is an error.
pub fn normalize(input: &serde_json::Value) -> Result<String, TypedDataError> {
    match input {
        serde_json::Value::Number(n) => {
            let u = n
                .as_u64()
                .ok_or_else(|| TypedDataError::InvalidNormalizeInput(n.to_string()))?;
            let mut hex_str = format!("{u:x}");
            if hex_str.len() % 2 != 0 {
                hex_str.insert(0, '0');
            }
            Ok(format!("0x{hex_str}"))
        }
        serde_json::Value::String(s) => {
            let lower = s.to_lowercase();
            let stripped = lower.strip_prefix("0x").unwrap_or(&lower);
            Ok(format!("0x{stripped}"))
        }
        other => Err(TypedDataError::InvalidNormalizeInput(other.to_string())),
    }
}

#[cfg(test)]
mod util_tests {
    use super::*;

    #[test]
    fn test_concat_sig_pads_short_components() {
        let sig = concat_sig(27, &[0x01], &[0x02]).unwrap();
        let expected = format!("0x{}01{}02{}", "0".repeat(62), "0".repeat(62), "1b");
        assert_eq!(sig, expected);
        // 0x + 64 + 64 + minimal v
        assert_eq!(sig.len(), 2 + 64 + 64 + 2);
    }

    #[test]
    fn test_concat_sig_full_width() {
        let r = [0xaa; 32];
        let s = [0xbb; 32];
        let sig = concat_sig(28, &r, &s).unwrap();
        assert!(sig.starts_with("0x"));
        assert!(sig.contains(&"aa".repeat(32)));
        assert!(sig.ends_with("1c"));
    }

    #[test]
    fn test_concat_sig_rejects_oversized() {
        let too_long = [0u8; 33];
        assert!(concat_sig(27, &too_long, &[0x01]).is_err());
    }

    #[test]
    fn test_normalize_numbers() {
        assert_eq!(normalize(&serde_json::json!(1)).unwrap(), "0x01");
        assert_eq!(normalize(&serde_json::json!(256)).unwrap(), "0x0100");
        assert_eq!(normalize(&serde_json::json!(0)).unwrap(), "0x00");
    }

    #[test]
    fn test_normalize_strings() {
        assert_eq!(normalize(&serde_json::json!("0xABCDEF")).unwrap(), "0xabcdef");
        assert_eq!(normalize(&serde_json::json!("abcdef")).unwrap(), "0xabcdef");
        // Idempotent prefixing
        let once = normalize(&serde_json::json!("0xAbC1")).unwrap();
        assert_eq!(normalize(&serde_json::json!(once.clone())).unwrap(), once);
    }

    #[test]
    fn test_normalize_rejects_other_inputs() {
        for bad in [
            serde_json::json!(true),
            serde_json::json!(null),
            serde_json::json!([1, 2]),
            serde_json::json!(1.5),
        ] {
            assert!(matches!(
                normalize(&bad).unwrap_err(),
                TypedDataError::InvalidNormalizeInput(_)
            ));
        }
    }

    #[test]
    fn test_parse_hex_prefix_tolerant() {
        assert_eq!(parse_hex("0xdead").unwrap(), vec![0xde, 0xad]);
        assert_eq!(parse_hex("dead").unwrap(), vec![0xde, 0xad]);
        assert!(parse_hex("0xzz").is_err());
    }

    #[test]
    fn test_parse_hex_quantity_pads_odd_digit_counts() {
        assert_eq!(parse_hex_quantity("0x3e8").unwrap(), vec![0x03, 0xe8]);
        assert_eq!(parse_hex_quantity("0x0").unwrap(), vec![0x00]);
        assert_eq!(parse_hex_quantity("0x03e8").unwrap(), vec![0x03, 0xe8]);
        assert!(parse_hex_quantity("0xzz").is_err());
        // Byte strings stay strict
        assert!(parse_hex("0x3e8").is_err());
    }
}
