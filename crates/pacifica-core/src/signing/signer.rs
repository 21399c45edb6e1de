//! Message signers.
//!
//! Two interchangeable schemes behind [`MessageSigner`]. A client picks one at
//! construction and uses it for every request it signs.

use std::sync::Arc;

use alloy_signer::Signer as _;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use serde::Deserialize;

use super::base58;
use super::canonical::{canonical_message, PayloadMap, SigningHeader};
use super::keys::{self, KeyEncoding, PublicIdentity};
use crate::{Error, Result};

/// Signing scheme selected per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningScheme {
    /// Ed25519 over the canonical message, Base58 signature.
    #[default]
    Ed25519,
    /// EIP-191 personal message over the merged JSON message, hex signature.
    Wallet,
}

impl SigningScheme {
    pub fn default_key_encoding(&self) -> KeyEncoding {
        match self {
            SigningScheme::Ed25519 => KeyEncoding::Base58,
            SigningScheme::Wallet => KeyEncoding::Hex,
        }
    }
}

impl std::str::FromStr for SigningScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ed25519" => Ok(SigningScheme::Ed25519),
            "wallet" => Ok(SigningScheme::Wallet),
            other => Err(Error::Config {
                message: format!("unknown signing scheme '{other}', expected ed25519 or wallet"),
            }),
        }
    }
}

/// Signing capability shared by both schemes.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    fn scheme(&self) -> SigningScheme;

    fn public_identity(&self) -> PublicIdentity;

    /// The exact text this scheme signs for a header and payload.
    fn message(&self, header: &SigningHeader, payload: &PayloadMap) -> Result<String>;

    /// Raw signature bytes over `message`.
    async fn sign_message(&self, message: &str) -> Result<Vec<u8>>;

    /// Transport encoding of a raw signature.
    fn encode_signature(&self, signature: &[u8]) -> String;

    /// Sign a header and payload, returning the transport-encoded signature.
    async fn sign(&self, header: &SigningHeader, payload: &PayloadMap) -> Result<String> {
        let message = self.message(header, payload)?;
        let signature = self.sign_message(&message).await?;
        Ok(self.encode_signature(&signature))
    }
}

/// Ed25519 raw-message signer.
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Build from decoded secret bytes (32-byte seed or 64-byte pair).
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        Ok(Self::new(keys::ed25519_signing_key(secret)?))
    }

    pub fn verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.key.verifying_key()
    }
}

#[async_trait]
impl MessageSigner for Ed25519Signer {
    fn scheme(&self) -> SigningScheme {
        SigningScheme::Ed25519
    }

    fn public_identity(&self) -> PublicIdentity {
        PublicIdentity::Ed25519(self.key.verifying_key().to_bytes())
    }

    fn message(&self, header: &SigningHeader, payload: &PayloadMap) -> Result<String> {
        Ok(canonical_message(header, payload))
    }

    async fn sign_message(&self, message: &str) -> Result<Vec<u8>> {
        Ok(self.key.sign(message.as_bytes()).to_bytes().to_vec())
    }

    fn encode_signature(&self, signature: &[u8]) -> String {
        base58::encode(signature)
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("public_key", &self.public_identity().to_string())
            .finish_non_exhaustive()
    }
}

/// Wallet personal-message signer.
///
/// Signs `{type, timestamp, expiry_window, ...payload}` as compact JSON. Nonce
/// generation is the signer library's concern.
pub struct WalletSigner {
    signer: PrivateKeySigner,
}

impl WalletSigner {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Build from a decoded 32-byte secp256k1 scalar.
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        Ok(Self::new(keys::wallet_signer(secret)?))
    }
}

#[async_trait]
impl MessageSigner for WalletSigner {
    fn scheme(&self) -> SigningScheme {
        SigningScheme::Wallet
    }

    fn public_identity(&self) -> PublicIdentity {
        PublicIdentity::Wallet(self.signer.address())
    }

    fn message(&self, header: &SigningHeader, payload: &PayloadMap) -> Result<String> {
        let mut merged = serde_json::Map::new();
        merged.insert("type".to_string(), header.kind.as_str().into());
        merged.insert("timestamp".to_string(), header.timestamp.into());
        merged.insert("expiry_window".to_string(), header.expiry_window.into());
        for (key, value) in payload {
            merged.insert(key.clone(), serde_json::to_value(value)?);
        }
        Ok(serde_json::to_string(&merged)?)
    }

    async fn sign_message(&self, message: &str) -> Result<Vec<u8>> {
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| Error::Signing {
                message: format!("Failed to sign message: {e}"),
            })?;
        Ok(signature.as_bytes().to_vec())
    }

    fn encode_signature(&self, signature: &[u8]) -> String {
        format!("0x{}", hex::encode(signature))
    }
}

impl std::fmt::Debug for WalletSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSigner")
            .field("address", &self.public_identity().to_string())
            .finish_non_exhaustive()
    }
}

/// Decode a textual secret and build the signer for `scheme`.
///
/// Fails with [`Error::KeyFormat`] on malformed input; no partially built
/// signer is ever returned.
pub fn signer_from_secret(
    scheme: SigningScheme,
    secret: &str,
    encoding: KeyEncoding,
) -> Result<Arc<dyn MessageSigner>> {
    let bytes = keys::decode_secret(secret, encoding)?;
    Ok(match scheme {
        SigningScheme::Ed25519 => Arc::new(Ed25519Signer::from_secret(&bytes)?),
        SigningScheme::Wallet => Arc::new(WalletSigner::from_secret(&bytes)?),
    })
}
