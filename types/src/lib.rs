//! Types shared by Sign-In With Solana issuers, wallets and verifiers.
//!
//! - [`ChallengeRecord`]: the completed challenge a client returns, with
//!   self-validating newtypes for each constrained field
//! - [`SignInMessage`]: the canonical text the wallet signed, and
//!   [`message::serialize`] to go from a record to the signed bytes
//! - [`crypto`]: ed25519 public keys, signatures and detached verification

pub mod crypto;
pub mod errors;
pub mod message;
pub mod network;
pub mod record;

pub use crypto::public_key::PublicKey;
pub use crypto::secret_key::SecretKey;
pub use crypto::signature::Signature;
pub use message::SignInMessage;
pub use network::Network;
pub use record::{Address, ChallengeId, ChallengeRecord, ProfileId, Timestamp, Version};
