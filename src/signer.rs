//! ECDSA Signing and Recovery
//!
//! Recoverable secp256k1 signatures over the structured, legacy and
//! personal-message digests, plus address derivation and EIP-55 checksums.

use crate::encoder::keccak256;
use crate::hasher::hash_typed_data;
use crate::legacy::{typed_signature_hash, LegacyEntry};
use crate::types::{EcdsaSignature, TypedData, TypedDataError};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Ethereum message prefix for personal_sign (EIP-191)
const ETH_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Sign EIP-712 typed data.
///
/// Hashes the payload per the structured scheme and signs the digest.
pub fn sign_typed_data(
    typed_data: &TypedData,
    private_key: &[u8],
) -> Result<EcdsaSignature, TypedDataError> {
    let hash = hash_typed_data(typed_data)?;
    sign_hash(&hash, private_key)
}

/// Recover the signer's address from an EIP-712 typed data signature
pub fn recover_typed_signature(
    typed_data: &TypedData,
    signature: &EcdsaSignature,
) -> Result<String, TypedDataError> {
    let hash = hash_typed_data(typed_data)?;
    recover_address(&hash, signature)
}

/// Sign legacy typed data (the flat entry-list format)
pub fn sign_typed_data_legacy(
    entries: &[LegacyEntry],
    private_key: &[u8],
) -> Result<EcdsaSignature, TypedDataError> {
    let hash = typed_signature_hash(entries)?;
    sign_hash(&hash, private_key)
}

/// Recover the signer's address from a legacy typed data signature
pub fn recover_typed_signature_legacy(
    entries: &[LegacyEntry],
    signature: &EcdsaSignature,
) -> Result<String, TypedDataError> {
    let hash = typed_signature_hash(entries)?;
    recover_address(&hash, signature)
}

/// Hash a message with the Ethereum personal-message prefix.
///
/// Format: "\x19Ethereum Signed Message:\n" + len(message) + message
pub fn personal_sign_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("{}{}", ETH_MESSAGE_PREFIX, message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Sign a message using Ethereum personal_sign
pub fn personal_sign(
    message: &[u8],
    private_key: &[u8],
) -> Result<EcdsaSignature, TypedDataError> {
    let hash = personal_sign_hash(message);
    sign_hash(&hash, private_key)
}

/// Recover the signer's address from a personal_sign signature
pub fn recover_personal_signature(
    message: &[u8],
    signature: &EcdsaSignature,
) -> Result<String, TypedDataError> {
    let hash = personal_sign_hash(message);
    recover_address(&hash, signature)
}

/// Extract the signer's public key from a personal_sign signature.
///
/// Returns the 64-byte uncompressed key body as a 0x-prefixed hex string.
pub fn extract_public_key(
    message: &[u8],
    signature: &EcdsaSignature,
) -> Result<String, TypedDataError> {
    let hash = personal_sign_hash(message);
    let public_key = recover_public_key(&hash, signature)?;
    Ok(format!(
        "0x{}",
        hex::encode(&public_key.serialize_uncompressed()[1..])
    ))
}

/// Sign a pre-computed 32-byte digest.
///
/// v is 27 + recovery id, the Ethereum convention.
pub fn sign_hash(hash: &[u8; 32], private_key: &[u8]) -> Result<EcdsaSignature, TypedDataError> {
    if private_key.len() != 32 {
        return Err(TypedDataError::SigningError(format!(
            "invalid private key length: expected 32, got {}",
            private_key.len()
        )));
    }

    let secp = Secp256k1::new();

    let secret_key = SecretKey::from_slice(private_key)
        .map_err(|e| TypedDataError::SigningError(e.to_string()))?;

    let message = Message::from_digest_slice(hash)
        .map_err(|e| TypedDataError::SigningError(e.to_string()))?;

    let (recovery_id, signature) = secp
        .sign_ecdsa_recoverable(&message, &secret_key)
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[0..32]);
    s.copy_from_slice(&signature[32..64]);

    let v = recovery_id.to_i32() as u8 + 27;

    Ok(EcdsaSignature::new(r, s, v))
}

/// Recover the signer's address from a digest and signature.
///
/// Returns the EIP-55 checksummed address.
pub fn recover_address(
    hash: &[u8; 32],
    signature: &EcdsaSignature,
) -> Result<String, TypedDataError> {
    let public_key = recover_public_key(hash, signature)?;
    let address = public_key_to_address(&public_key);
    Ok(checksum_address(&address))
}

/// Verify an EIP-712 typed data signature against an expected address
pub fn verify_typed_data(
    typed_data: &TypedData,
    signature: &EcdsaSignature,
    expected_address: &str,
) -> Result<bool, TypedDataError> {
    let recovered = recover_typed_signature(typed_data, signature)?;
    let expected = expected_address.trim_start_matches("0x").to_lowercase();
    let actual = recovered.trim_start_matches("0x").to_lowercase();
    Ok(expected == actual)
}

fn recover_public_key(
    hash: &[u8; 32],
    signature: &EcdsaSignature,
) -> Result<PublicKey, TypedDataError> {
    let v = signature.v;
    let recovery_id = if v >= 27 { v - 27 } else { v };
    if recovery_id > 3 {
        return Err(TypedDataError::InvalidSignature(format!(
            "invalid recovery id: {recovery_id}"
        )));
    }

    let recovery_id = RecoveryId::from_i32(recovery_id as i32)
        .map_err(|e| TypedDataError::InvalidSignature(e.to_string()))?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[0..32].copy_from_slice(&signature.r);
    sig_bytes[32..64].copy_from_slice(&signature.s);

    let recoverable_sig = RecoverableSignature::from_compact(&sig_bytes, recovery_id)
        .map_err(|e| TypedDataError::InvalidSignature(e.to_string()))?;

    let message = Message::from_digest_slice(hash)
        .map_err(|e| TypedDataError::InvalidSignature(e.to_string()))?;

    Secp256k1::new()
        .recover_ecdsa(&message, &recoverable_sig)
        .map_err(|e| TypedDataError::InvalidSignature(e.to_string()))
}

/// Convert a secp256k1 public key to a raw Ethereum address
pub fn public_key_to_address(public_key: &PublicKey) -> [u8; 20] {
    // Hash the uncompressed key body (skip the 0x04 prefix byte)
    let pubkey_bytes = public_key.serialize_uncompressed();
    let hash = keccak256(&pubkey_bytes[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

/// Compute the EIP-55 checksummed form of an address
pub fn checksum_address(address: &[u8; 20]) -> String {
    let hex_addr = hex::encode(address);
    let hash = keccak256(hex_addr.as_bytes());

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (i, c) in hex_addr.chars().enumerate() {
        if c.is_ascii_digit() {
            result.push(c);
        } else {
            let nibble = hash[i / 2];
            let should_upper = if i % 2 == 0 {
                nibble >> 4 >= 8
            } else {
                nibble & 0x0f >= 8
            };
            result.push(if should_upper { c.to_ascii_uppercase() } else { c });
        }
    }

    result
}
