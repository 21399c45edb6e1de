//! Request signing.
//!
//! Key decoding, canonical message construction, the two signing schemes and
//! envelope assembly. Nothing in here touches the network.

pub mod base58;
pub mod canonical;
pub mod envelope;
pub mod keys;
pub mod operation;
pub mod signer;

pub use canonical::{canonical_message, PayloadMap, PayloadNumber, PayloadValue, SigningHeader};
pub use envelope::{RequestSigner, SignedEnvelope, EXPIRY_WINDOW_MS};
pub use keys::{decode_secret, KeyEncoding, PublicIdentity};
pub use operation::{Action, OperationKind};
pub use signer::{
    signer_from_secret, Ed25519Signer, MessageSigner, SigningScheme, WalletSigner,
};
