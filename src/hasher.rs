//! EIP-712 Signing Hash
//!
//! Assembles the final domain-separated digest from the hashed domain struct
//! and the hashed message struct.

use crate::encoder::{hash_struct, keccak256};
use crate::types::{TypedData, TypedDataError};

/// Magic prefix for EIP-712 encoding: EIP-191 magic byte plus the
/// structured-data version byte. Separates these digests from every other
/// signing scheme over the same key space.
const EIP712_PREFIX: &[u8] = b"\x19\x01";

/// Name of the mandatory domain struct type
pub(crate) const DOMAIN_TYPE: &str = "EIP712Domain";

/// Calculate the domain separator hash.
///
/// domainSeparator = hashStruct("EIP712Domain", domain), using the
/// caller-supplied `EIP712Domain` entry of the type table.
pub fn domain_separator(typed_data: &TypedData) -> Result<[u8; 32], TypedDataError> {
    hash_struct(DOMAIN_TYPE, &typed_data.domain, &typed_data.types)
}

/// Calculate the final EIP-712 digest for signing.
///
/// hash = keccak256("\x19\x01" || domainSeparator || hashStruct(message))
pub fn hash_typed_data(typed_data: &TypedData) -> Result<[u8; 32], TypedDataError> {
    Ok(pre_image(typed_data)?.signing_hash)
}

/// The digest components, for callers that sign externally
pub struct TypedDataPreImage {
    pub domain_separator: [u8; 32],
    pub struct_hash: [u8; 32],
    pub signing_hash: [u8; 32],
}

/// Calculate the pre-image components for a typed data payload
pub fn pre_image(typed_data: &TypedData) -> Result<TypedDataPreImage, TypedDataError> {
    typed_data.validate()?;

    let domain_separator = domain_separator(typed_data)?;
    let struct_hash = hash_struct(
        &typed_data.primary_type,
        &typed_data.message,
        &typed_data.types,
    )?;

    let mut data = Vec::with_capacity(2 + 32 + 32);
    data.extend_from_slice(EIP712_PREFIX);
    data.extend_from_slice(&domain_separator);
    data.extend_from_slice(&struct_hash);

    Ok(TypedDataPreImage {
        domain_separator,
        struct_hash,
        signing_hash: keccak256(&data),
    })
}
