//! EIP-712 Typed Data Signing
//!
//! Deterministic hashing of structured data per EIP-712, plus ECDSA signing
//! and public-key recovery over the resulting digests. Lets wallets and
//! clients sign application data in a human-auditable, domain-separated way
//! instead of opaque byte blobs.
//!
//! This crate provides:
//! - **types**: the typed-data payload model, schema validation, signatures
//! - **encoder**: type dependency resolution, canonical type strings,
//!   recursive struct data encoding and hashing
//! - **hasher**: the `\x19\x01`-prefixed domain-separated signing hash
//! - **legacy**: the older flat typed-signature hash, kept for backward
//!   compatibility
//! - **signer**: recoverable ECDSA over the structured, legacy and
//!   personal-message (EIP-191) digests
//! - **util**: signature serialization and hex normalization helpers
//!
//! All entry points are pure, synchronous computations over their arguments;
//! nothing is persisted or transmitted. Array-typed struct fields are
//! deliberately unsupported by the struct encoder.
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use eth_typed_sign::{TypedData, hash_typed_data, sign_typed_data};
//!
//! let typed_data = TypedData::from_json(json_string)?;
//! let digest = hash_typed_data(&typed_data)?;
//! let signature = sign_typed_data(&typed_data, &private_key)?;
//! ```

pub mod encoder;
pub mod hasher;
pub mod legacy;
pub mod signer;
pub mod types;
pub mod util;

pub use encoder::{
    encode_data, encode_type, find_type_dependencies, hash_struct, keccak256, type_hash,
};
pub use hasher::{domain_separator, hash_typed_data, pre_image, TypedDataPreImage};
pub use legacy::{typed_signature_hash, LegacyEntry};
pub use signer::{
    checksum_address, extract_public_key, personal_sign, personal_sign_hash,
    recover_personal_signature, recover_typed_signature, recover_typed_signature_legacy,
    sign_hash, sign_typed_data, sign_typed_data_legacy, verify_typed_data,
};
pub use types::{EcdsaSignature, TypeTable, TypedData, TypedDataError, TypedDataField};
pub use util::{concat_sig, normalize};
