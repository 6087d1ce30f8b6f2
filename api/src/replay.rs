use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use siws_api_types::ChallengeId;
use tracing::{debug, trace};

const REPLAY_TARGET: &str = "siws_api::replay";

/// The ledger of outstanding challenges.
///
/// Implementations are the sole arbiter of nonce freshness. They must make
/// [`try_consume`](ReplayStore::try_consume) atomic: of any number of
/// concurrent calls with the same `(id, nonce)`, at most one returns `true`.
///
/// The verifier calls the store once per attempt and never retries, so a
/// store backed by a remote service should implement the call as a single
/// conditional delete (e.g. a `GET` + `DEL` script).
pub trait ReplayStore: Send + Sync {
    /// Marks the challenge `id` as consumed and reports whether `nonce` was
    /// its outstanding, unused nonce.
    ///
    /// `false` covers unknown ids, already consumed challenges and nonces
    /// that do not belong to `id`.
    fn try_consume(&self, id: &ChallengeId, nonce: &str) -> bool;
}

impl<T: ReplayStore + ?Sized> ReplayStore for Arc<T> {
    fn try_consume(&self, id: &ChallengeId, nonce: &str) -> bool {
        (**self).try_consume(id, nonce)
    }
}

impl<T: ReplayStore + ?Sized> ReplayStore for &T {
    fn try_consume(&self, id: &ChallengeId, nonce: &str) -> bool {
        (**self).try_consume(id, nonce)
    }
}

/// Process-local [`ReplayStore`] keyed by challenge id.
///
/// Any consume attempt removes the challenge, whether or not the nonce
/// matched, so a challenge can be attempted exactly once.
///
/// The ledger is unbounded: challenges that are issued and never attempted
/// stay until [`revoke`](Self::revoke)d. Issuers that let challenges lapse
/// should revoke them when they expire.
#[derive(Debug, Default)]
pub struct InMemoryReplayStore {
    outstanding: Mutex<HashMap<ChallengeId, String>>,
}

impl InMemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly issued challenge.
    ///
    /// Returns `false` and leaves the ledger untouched if `id` is already
    /// outstanding.
    pub fn issue(&self, id: ChallengeId, nonce: impl Into<String>) -> bool {
        let mut ledger = self.ledger();
        if ledger.contains_key(&id) {
            debug!(target: REPLAY_TARGET, challenge_id = %id, "Challenge id already outstanding");
            return false;
        }
        ledger.insert(id, nonce.into());
        true
    }

    /// Withdraws an outstanding challenge without attempting it.
    ///
    /// Returns whether `id` was outstanding.
    pub fn revoke(&self, id: &ChallengeId) -> bool {
        let revoked = self.ledger().remove(id).is_some();
        debug!(target: REPLAY_TARGET, challenge_id = %id, revoked, "Challenge revoked");
        revoked
    }

    /// Number of challenges issued and not yet attempted.
    pub fn outstanding(&self) -> usize {
        self.ledger().len()
    }

    fn ledger(&self) -> MutexGuard<'_, HashMap<ChallengeId, String>> {
        // The map holds no invariant a panicking holder could break.
        self.outstanding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReplayStore for InMemoryReplayStore {
    fn try_consume(&self, id: &ChallengeId, nonce: &str) -> bool {
        let consumed = self
            .ledger()
            .remove(id)
            .is_some_and(|expected| expected == nonce);
        trace!(target: REPLAY_TARGET, challenge_id = %id, consumed, "Consume attempt");
        consumed
    }
}
