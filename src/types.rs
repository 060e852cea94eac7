//! EIP-712 Type Definitions
//!
//! Core data structures for typed data signing: the typed-data payload,
//! field definitions, signature components and the error taxonomy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", or another struct type)
    #[serde(rename = "type")]
    pub type_name: String,
}

/// The type table: struct name -> ordered field list.
///
/// Field order within a struct is significant and part of the type's
/// identity; the key order of the map is not.
pub type TypeTable = HashMap<String, Vec<TypedDataField>>;

/// Complete EIP-712 typed data payload.
///
/// The `types` table must contain an `EIP712Domain` entry describing the
/// shape of `domain`; `domain` and `message` are plain JSON objects hashed
/// through the generic struct encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields)
    pub types: TypeTable,

    /// The name of the primary type being signed
    pub primary_type: String,

    /// The domain struct data, shaped per `types["EIP712Domain"]`
    pub domain: serde_json::Value,

    /// The message struct data, shaped per `types[primary_type]`
    pub message: serde_json::Value,
}

impl TypedData {
    /// Parse typed data from a JSON string.
    ///
    /// Unrecognized top-level keys are dropped silently; only `types`,
    /// `primaryType`, `domain` and `message` survive. Malformed JSON is an
    /// [`TypedDataError::InvalidJson`] error; well-formed JSON with the wrong
    /// shape is a [`TypedDataError::SchemaViolation`].
    pub fn from_json(json: &str) -> Result<Self, TypedDataError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| TypedDataError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// Build typed data from an already-parsed JSON value, applying the same
    /// top-level key sanitization as [`TypedData::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, TypedDataError> {
        serde_json::from_value(value).map_err(|e| TypedDataError::SchemaViolation(e.to_string()))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, TypedDataError> {
        serde_json::to_string(self).map_err(|e| TypedDataError::InvalidJson(e.to_string()))
    }

    /// Validate the typed data structure.
    ///
    /// Checks that the primary type is defined and that, within the types
    /// reachable from the primary type or the domain type, every field type
    /// is either elementary or defined in the table and none uses an array
    /// type (unsupported by the struct encoder). Entries of the table that
    /// hashing never touches are left alone; they cannot affect the digest.
    pub fn validate(&self) -> Result<(), TypedDataError> {
        if !self.types.contains_key(&self.primary_type) {
            return Err(TypedDataError::MissingTypeDefinition(
                self.primary_type.clone(),
            ));
        }

        let mut reachable =
            crate::encoder::find_type_dependencies(&self.primary_type, &self.types);
        for dep in crate::encoder::find_type_dependencies(crate::hasher::DOMAIN_TYPE, &self.types)
        {
            if !reachable.contains(&dep) {
                reachable.push(dep);
            }
        }

        for name in &reachable {
            if let Some(fields) = self.types.get(name) {
                for field in fields {
                    self.validate_type(&field.type_name)?;
                }
            }
        }

        Ok(())
    }

    /// Check a single field type reference
    fn validate_type(&self, type_name: &str) -> Result<(), TypedDataError> {
        if type_name.ends_with(']') {
            return Err(TypedDataError::UnsupportedArrayType(type_name.to_string()));
        }

        if is_atomic_type(type_name) || is_dynamic_type(type_name) {
            return Ok(());
        }

        if self.types.contains_key(type_name) {
            return Ok(());
        }

        Err(TypedDataError::MissingTypeDefinition(type_name.to_string()))
    }
}

/// ECDSA signature components, serialized on the wire as `r || s || v`.
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct EcdsaSignature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// v component (recovery id, typically 27 or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Create from raw components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Create from a 65-byte signature (r || s || v)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypedDataError> {
        if bytes.len() != 65 {
            return Err(TypedDataError::InvalidSignature(
                "expected 65 bytes".to_string(),
            ));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = bytes[64];

        Ok(Self { r, s, v })
    }

    /// Create from an RPC-style hex blob (with or without 0x prefix)
    pub fn from_rpc_hex(sig: &str) -> Result<Self, TypedDataError> {
        let bytes = crate::util::parse_hex(sig)?;
        Self::from_bytes(&bytes)
    }

    /// Convert to the 65-byte representation (r || s || v)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Convert to a 0x-prefixed hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

/// Errors that can occur during typed data hashing, signing or recovery
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypedDataError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("No type definition for: {0}")]
    MissingTypeDefinition(String),

    #[error("Array types are not supported: {0}")]
    UnsupportedArrayType(String),

    #[error("Invalid value for type {type_name}: {value}")]
    InvalidValue { type_name: String, value: String },

    #[error("Malformed legacy entry: {0}")]
    MalformedLegacyEntry(String),

    #[error("Normalize requires a hex string or integer, got: {0}")]
    InvalidNormalizeInput(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Check if a type is an atomic (fixed-size) elementary type
pub fn is_atomic_type(type_name: &str) -> bool {
    if type_name == "address" || type_name == "bool" {
        return true;
    }

    // uintN and intN
    if (type_name.starts_with("uint") || type_name.starts_with("int")) && type_name.len() > 3 {
        let bits: &str = if type_name.starts_with("uint") {
            &type_name[4..]
        } else {
            &type_name[3..]
        };
        if let Ok(n) = bits.parse::<u32>() {
            return n > 0 && n <= 256 && n % 8 == 0;
        }
    }

    // bytesN (fixed-size bytes)
    if type_name.starts_with("bytes") && type_name != "bytes" {
        let size: &str = &type_name[5..];
        if let Ok(n) = size.parse::<u32>() {
            return n > 0 && n <= 32;
        }
    }

    false
}

/// Check if a type is a dynamic elementary type
pub fn is_dynamic_type(type_name: &str) -> bool {
    type_name == "bytes" || type_name == "string"
}
