//! Agent key material: secret decoding and public identity derivation.
//!
//! Secrets arrive as text (Base58 or `0x`-prefixed hex). Decoded bytes are
//! held in [`Zeroizing`] buffers and are never logged or serialized.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH, SECRET_KEY_LENGTH};
use serde::Deserialize;
use zeroize::Zeroizing;

use super::base58;
use crate::{Error, Result};

/// Text encoding of a secret key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    /// Solana-style Base58.
    Base58,
    /// Hex, with or without a `0x` prefix.
    Hex,
}

impl std::str::FromStr for KeyEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base58" => Ok(KeyEncoding::Base58),
            "hex" => Ok(KeyEncoding::Hex),
            other => Err(Error::Config {
                message: format!("unknown key encoding '{other}', expected base58 or hex"),
            }),
        }
    }
}

/// Decode a textual secret into raw bytes.
pub fn decode_secret(text: &str, encoding: KeyEncoding) -> Result<Zeroizing<Vec<u8>>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::key_format("secret is empty"));
    }

    let bytes = match encoding {
        KeyEncoding::Base58 => base58::decode(trimmed)?,
        KeyEncoding::Hex => {
            let digits = trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
                .unwrap_or(trimmed);
            hex::decode(digits).map_err(|e| Error::key_format(format!("invalid hex secret: {e}")))?
        }
    };

    Ok(Zeroizing::new(bytes))
}

/// Build an Ed25519 signing key from a 32-byte seed or a 64-byte
/// seed+public-key pair.
///
/// A 64-byte pair whose trailing half is not the public key of its seed is
/// rejected rather than silently signing under a different identity.
pub fn ed25519_signing_key(secret: &[u8]) -> Result<SigningKey> {
    match secret.len() {
        SECRET_KEY_LENGTH => {
            let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
            seed.copy_from_slice(secret);
            Ok(SigningKey::from_bytes(&seed))
        }
        KEYPAIR_LENGTH => {
            let mut pair = Zeroizing::new([0u8; KEYPAIR_LENGTH]);
            pair.copy_from_slice(secret);
            SigningKey::from_keypair_bytes(&pair).map_err(|_| {
                Error::key_format("keypair public half does not match its seed")
            })
        }
        other => Err(Error::key_format(format!(
            "Ed25519 secret must be {SECRET_KEY_LENGTH} or {KEYPAIR_LENGTH} bytes, got {other}"
        ))),
    }
}

/// Build a wallet signer from a 32-byte secp256k1 scalar.
pub fn wallet_signer(secret: &[u8]) -> Result<PrivateKeySigner> {
    if secret.len() != 32 {
        return Err(Error::key_format(format!(
            "wallet secret must be 32 bytes, got {}",
            secret.len()
        )));
    }
    PrivateKeySigner::from_slice(secret)
        .map_err(|e| Error::key_format(format!("invalid wallet private key: {e}")))
}

/// Public identity derived from the agent key. Display only; the venue
/// authorizes by account and agent-wallet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicIdentity {
    Ed25519([u8; 32]),
    Wallet(Address),
}

impl std::fmt::Display for PublicIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicIdentity::Ed25519(bytes) => f.write_str(&base58::encode(bytes)),
            PublicIdentity::Wallet(address) => write!(f, "{address}"),
        }
    }
}
