//! Sign-In With Solana verification
//!
//! A [`Verifier`] turns a completed challenge and the wallet's signature into
//! a [`VerifiedIdentity`], or explains why it refused to.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use siws_api::{InMemoryReplayStore, RelyingPartyConfig, Verifier};
//! use siws_api::types::ChallengeRecord;
//!
//! # fn example(body: &str, signature: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelyingPartyConfig::new("defi.finance");
//! let verifier = Verifier::from_config(InMemoryReplayStore::new(), &config);
//!
//! let record: ChallengeRecord = serde_json::from_str(body)?;
//! let identity = verifier.verify(&record, signature, Utc::now(), &config.domain)?;
//! println!("{} signed in as {}", identity.address, identity.profile_id);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use siws_api_types::{
    Address, ChallengeId, ChallengeRecord, Network, ProfileId, crypto, message,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::RelyingPartyConfig,
    errors::VerificationError,
    replay::ReplayStore,
    validate::{UriPolicy, Validator, consume_nonce},
};

const VERIFY_TARGET: &str = "siws_api::verify";

/// The identity a successful sign-in proves.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedIdentity {
    pub id: ChallengeId,
    pub address: Address,
    pub network: Network,
    pub profile_id: ProfileId,
}

impl From<&ChallengeRecord> for VerifiedIdentity {
    fn from(record: &ChallengeRecord) -> Self {
        Self {
            id: record.id.clone(),
            address: record.address.clone(),
            network: record.network,
            profile_id: record.profile_id.clone(),
        }
    }
}

/// Checks challenge responses against a replay ledger and the relying
/// party's rules.
///
/// `Verifier` holds no per-attempt state and can be shared across threads;
/// concurrency safety of nonce consumption is the store's job.
#[derive(Debug, Clone)]
pub struct Verifier<S> {
    store: S,
    validator: Validator,
}

impl<S: ReplayStore> Verifier<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            validator: Validator::new(),
        }
    }

    pub fn from_config(store: S, config: &RelyingPartyConfig) -> Self {
        Self {
            store,
            validator: config.validator(),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_uri_policy(mut self, policy: impl UriPolicy + 'static) -> Self {
        self.validator = self.validator.with_uri_policy(policy);
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Verifies that `signature` is the record's address signing the
    /// record's canonical message, and that the challenge is fresh, in its
    /// validity window and issued for `expected_domain`.
    ///
    /// The challenge is consumed before any cryptographic work, so every
    /// attempt that gets past the structural checks burns it, including
    /// attempts that then fail. A user whose sign-in failed for any reason
    /// other than [`VerificationError::Format`] must request a new challenge.
    ///
    /// When several rules are broken the error reports the first one, in
    /// this order: format, nonce, key and signature decoding, signature,
    /// window consistency, not-before, expiration, domain, URI scope.
    #[instrument(skip_all, fields(challenge_id = %record.id, domain = %record.domain))]
    pub fn verify(
        &self,
        record: &ChallengeRecord,
        signature: &str,
        now: DateTime<Utc>,
        expected_domain: &str,
    ) -> Result<VerifiedIdentity, VerificationError> {
        let result = self.verify_inner(record, signature, now, expected_domain);
        match &result {
            Ok(identity) => {
                info!(target: VERIFY_TARGET, address = %identity.address, network = %identity.network, "Sign-in verified");
            }
            Err(err) => {
                warn!(target: VERIFY_TARGET, error = %err, "Sign-in rejected");
            }
        }
        result
    }

    fn verify_inner(
        &self,
        record: &ChallengeRecord,
        signature: &str,
        now: DateTime<Utc>,
        expected_domain: &str,
    ) -> Result<VerifiedIdentity, VerificationError> {
        record.check()?;
        debug!(target: VERIFY_TARGET, "Record is well-formed");

        consume_nonce(&self.store, record)?;
        debug!(target: VERIFY_TARGET, "Nonce consumed");

        let message = message::serialize(record)?;
        debug!(target: VERIFY_TARGET, message_len = message.len(), "Canonical message built");

        if !crypto::verify(&message, signature, &record.address)? {
            return Err(VerificationError::SignatureInvalid);
        }
        debug!(target: VERIFY_TARGET, "Signature verified");

        self.validator
            .validate(record, now, expected_domain)
            .into_result()?;

        Ok(VerifiedIdentity::from(record))
    }
}
