//! Signed request envelopes.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::canonical::{PayloadMap, PayloadValue, SigningHeader};
use super::keys::PublicIdentity;
use super::operation::{Action, OperationKind};
use super::signer::MessageSigner;
use crate::{Error, Result};

/// Validity window attached to every signed request, in milliseconds.
pub const EXPIRY_WINDOW_MS: u64 = 5000;

/// Envelope field names. Payload keys may not reuse them.
pub const RESERVED_FIELDS: [&str; 5] = [
    "account",
    "signature",
    "timestamp",
    "expiry_window",
    "agent_wallet",
];

/// Flat request body: identity, signature, timing and the payload fields
/// side by side.
///
/// `account` and `agent_wallet` are not covered by the signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedEnvelope {
    pub account: String,
    pub signature: String,
    pub timestamp: u64,
    pub expiry_window: u64,
    pub agent_wallet: String,
    #[serde(flatten)]
    pub payload: PayloadMap,
}

/// Assembles signed envelopes for one account and agent wallet.
#[derive(Clone)]
pub struct RequestSigner {
    account: String,
    agent_wallet: String,
    signer: Arc<dyn MessageSigner>,
}

impl RequestSigner {
    pub fn new(
        account: impl Into<String>,
        agent_wallet: impl Into<String>,
        signer: Arc<dyn MessageSigner>,
    ) -> Self {
        Self {
            account: account.into(),
            agent_wallet: agent_wallet.into(),
            signer,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn agent_wallet(&self) -> &str {
        &self.agent_wallet
    }

    pub fn public_identity(&self) -> PublicIdentity {
        self.signer.public_identity()
    }

    pub fn signer(&self) -> &Arc<dyn MessageSigner> {
        &self.signer
    }

    /// Sign a typed action at the current time.
    pub async fn sign_action<A: Action>(&self, action: &A) -> Result<SignedEnvelope> {
        self.sign(A::KIND, PayloadValue::object_from(action)?).await
    }

    /// Sign a payload under `kind` at the current time.
    ///
    /// The clock is read once; the same value goes into the signed message
    /// and the envelope.
    pub async fn sign(&self, kind: OperationKind, payload: PayloadMap) -> Result<SignedEnvelope> {
        let timestamp = now_millis()?;
        self.sign_at(kind, payload, timestamp).await
    }

    /// Sign a payload under `kind` with an explicit timestamp.
    pub async fn sign_at(
        &self,
        kind: OperationKind,
        payload: PayloadMap,
        timestamp: u64,
    ) -> Result<SignedEnvelope> {
        if let Some(key) = RESERVED_FIELDS.iter().find(|k| payload.contains_key(**k)) {
            return Err(Error::validation(format!(
                "payload field '{key}' collides with an envelope field"
            )));
        }

        let header = SigningHeader {
            kind,
            timestamp,
            expiry_window: EXPIRY_WINDOW_MS,
        };
        let signature = self.signer.sign(&header, &payload).await?;

        debug!(kind = %kind, timestamp, "Signed request");

        Ok(SignedEnvelope {
            account: self.account.clone(),
            signature,
            timestamp,
            expiry_window: EXPIRY_WINDOW_MS,
            agent_wallet: self.agent_wallet.clone(),
            payload,
        })
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("account", &self.account)
            .field("agent_wallet", &self.agent_wallet)
            .field("scheme", &self.signer.scheme())
            .finish()
    }
}

fn now_millis() -> Result<u64> {
    millis_since_epoch(chrono::Utc::now().timestamp_millis())
}

fn millis_since_epoch(millis: i64) -> Result<u64> {
    u64::try_from(millis).map_err(|_| Error::Signing {
        message: format!("system clock reads {millis} ms, before the Unix epoch"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::base58;
    use crate::signing::canonical::canonical_message;
    use crate::signing::signer::Ed25519Signer;
    use ed25519_dalek::Verifier;
    use serde_json::json;

    const SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn ed25519() -> Arc<Ed25519Signer> {
        Arc::new(Ed25519Signer::from_secret(&hex::decode(SEED_HEX).unwrap()).unwrap())
    }

    fn request_signer(signer: Arc<Ed25519Signer>) -> RequestSigner {
        RequestSigner::new("MainAccount111", "AgentWallet222", signer)
    }

    fn payload() -> PayloadMap {
        PayloadValue::object_from(&json!({"symbol": "BTC", "leverage": 10})).unwrap()
    }

    fn verify(signer: &Ed25519Signer, kind: OperationKind, envelope: &SignedEnvelope) -> bool {
        let header = SigningHeader {
            kind,
            timestamp: envelope.timestamp,
            expiry_window: envelope.expiry_window,
        };
        let message = canonical_message(&header, &envelope.payload);
        let raw = base58::decode(&envelope.signature).unwrap();
        let signature = ed25519_dalek::Signature::from_slice(&raw).unwrap();
        signer
            .verifying_key()
            .verify(message.as_bytes(), &signature)
            .is_ok()
    }

    #[tokio::test]
    async fn test_envelope_timestamp_is_the_signed_timestamp() {
        let key = ed25519();
        let signer = request_signer(key.clone());

        let envelope = signer
            .sign(OperationKind::UpdateLeverage, payload())
            .await
            .unwrap();

        assert!(envelope.timestamp > 0);
        assert!(verify(&key, OperationKind::UpdateLeverage, &envelope));
        // Same payload under another kind does not verify
        assert!(!verify(&key, OperationKind::Withdraw, &envelope));
    }

    #[tokio::test]
    async fn test_expiry_window_is_fixed_for_every_kind() {
        let signer = request_signer(ed25519());
        for kind in OperationKind::ALL {
            let envelope = signer.sign_at(kind, payload(), 1_000).await.unwrap();
            assert_eq!(envelope.expiry_window, EXPIRY_WINDOW_MS);
        }
    }

    #[tokio::test]
    async fn test_envelope_is_flat() {
        let signer = request_signer(ed25519());
        let envelope = signer
            .sign_at(OperationKind::UpdateLeverage, payload(), 1_716_200_000_000)
            .await
            .unwrap();

        let body = serde_json::to_value(&envelope).unwrap();
        let object = body.as_object().unwrap();
        assert_eq!(object["account"], "MainAccount111");
        assert_eq!(object["agent_wallet"], "AgentWallet222");
        assert_eq!(object["timestamp"], 1_716_200_000_000u64);
        assert_eq!(object["expiry_window"], 5000);
        assert_eq!(object["symbol"], "BTC");
        assert_eq!(object["leverage"], 10);
        assert!(object["signature"].is_string());
        assert!(!object.contains_key("data"));
        assert!(!object.contains_key("type"));
    }

    #[tokio::test]
    async fn test_identity_fields_are_not_signed() {
        let key = ed25519();
        let a = RequestSigner::new("AccountA", "AgentA", key.clone());
        let b = RequestSigner::new("AccountB", "AgentB", key);

        let ea = a.sign_at(OperationKind::CancelAllOrders, payload(), 42).await.unwrap();
        let eb = b.sign_at(OperationKind::CancelAllOrders, payload(), 42).await.unwrap();
        assert_eq!(ea.signature, eb.signature);
        assert_ne!(ea.account, eb.account);
    }

    #[tokio::test]
    async fn test_reserved_payload_keys_are_rejected() {
        let signer = request_signer(ed25519());
        for key in RESERVED_FIELDS {
            let mut payload = payload();
            payload.insert(key.to_string(), PayloadValue::from("x"));
            let err = signer
                .sign_at(OperationKind::CreateOrder, payload, 1)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation { .. }), "{key}");
        }
    }

    #[tokio::test]
    async fn test_sign_action_uses_type_bound_kind() {
        #[derive(Serialize)]
        struct Leverage {
            symbol: &'static str,
            leverage: u32,
        }
        impl Action for Leverage {
            const KIND: OperationKind = OperationKind::UpdateLeverage;
            const PATH: &'static str = "account/leverage";
        }

        let key = ed25519();
        let signer = request_signer(key.clone());
        let envelope = signer
            .sign_action(&Leverage {
                symbol: "BTC",
                leverage: 10,
            })
            .await
            .unwrap();
        assert!(verify(&key, OperationKind::UpdateLeverage, &envelope));
    }

    #[test]
    fn test_clock_before_epoch_is_an_error() {
        assert_eq!(millis_since_epoch(1_716_200_000_000).unwrap(), 1_716_200_000_000);
        let err = millis_since_epoch(-1).unwrap_err();
        assert!(matches!(err, Error::Signing { .. }));
    }
}
