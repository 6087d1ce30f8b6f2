//! Server-side verification for Sign-In With Solana
//!
//! This crate checks that a wallet signed a relying party's login challenge:
//! - [Canonical message serialization](types::message::serialize) of a [`ChallengeRecord`]
//! - [Detached ed25519 signature verification](types::crypto::verify) against the record's address
//! - [Validity window, domain and URI rules](Validator)
//! - [Single-use nonces](ReplayStore) with a process-local [ledger](InMemoryReplayStore)
//! - [One call tying it all together](Verifier::verify)
//!
//! # Example
//! ```rust,no_run
//! use chrono::Utc;
//! use siws_api::*;
//!
//! # fn example(record: ChallengeRecord, signature: String) -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryReplayStore::new();
//! // When the challenge is handed out
//! store.issue(record.id.clone(), record.nonce.clone());
//!
//! // When the client comes back with the wallet's signature
//! let verifier = Verifier::new(store);
//! let identity = verifier.verify(&record, &signature, Utc::now(), "defi.finance")?;
//! assert_eq!(identity.address, record.address);
//! # Ok(())
//! # }
//! ```

mod config;
mod replay;
mod validate;
mod verify;

pub mod errors;

pub use crate::{
    config::RelyingPartyConfig,
    replay::{InMemoryReplayStore, ReplayStore},
    validate::{ResourceScope, UriPolicy, ValidationOutcome, Validator, Violation, consume_nonce},
    verify::{VerifiedIdentity, Verifier},
};

pub use siws_api_types as types;
pub use siws_api_types::{
    Address, ChallengeId, ChallengeRecord, Network, ProfileId, PublicKey, SecretKey, Signature,
    SignInMessage, Timestamp, Version,
};
