use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use siws_api::{ChallengeRecord, InMemoryReplayStore, SecretKey, Verifier, types::message};
use testresult::TestError;

pub const DOMAIN: &str = "defi.finance";

pub struct TestContext {
    pub key: SecretKey,
    pub record: ChallengeRecord,
    pub signature: String,
    pub store: Arc<InMemoryReplayStore>,
    pub verifier: Verifier<Arc<InMemoryReplayStore>>,
}

impl TestContext {
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.record
            .issued_at
            .as_ref()
            .map(|issued_at| issued_at.instant())
            .unwrap_or_default()
    }

    /// Replaces the record, registers its challenge and signs it with the
    /// context key.
    pub fn reissue(&mut self, record: ChallengeRecord) -> Result<(), TestError> {
        self.store.issue(record.id.clone(), record.nonce.clone());
        self.signature = sign(&self.key, &record)?;
        self.record = record;
        Ok(())
    }
}

/// A deterministic keypair for `label` whose address is 44 base58
/// characters long.
pub fn keypair(label: &str) -> SecretKey {
    (0u32..)
        .map(|counter| {
            let seed = Sha256::new()
                .chain_update(label.as_bytes())
                .chain_update(counter.to_le_bytes())
                .finalize();
            SecretKey::from_seed(seed.into())
        })
        .find(|key| key.public_key().to_string().len() == 44)
        .expect("some counter yields a 44 character address")
}

pub fn sign(key: &SecretKey, record: &ChallengeRecord) -> Result<String, TestError> {
    Ok(key.sign(&message::serialize(record)?).to_string())
}

pub fn challenge(key: &SecretKey) -> Result<ChallengeRecord, TestError> {
    let issued_at: DateTime<Utc> = "2024-05-01T11:55:00.000Z".parse()?;
    Ok(serde_json::from_value(serde_json::json!({
        "id": "fRyt67D3eRss3RrX",
        "domain": DOMAIN,
        "network": "mainnet",
        "address": key.public_key().to_string(),
        "statement": "Sign in to DeFi Finance",
        "uri": "https://defi.finance/app",
        "version": "1.0",
        "nonce": "0x1234567890abcdef",
        "issuedAt": "2024-05-01T11:55:00.000Z",
        "expirationTime": (issued_at + Duration::minutes(10)).to_rfc3339(),
        "resources": ["https://defi.finance/terms"],
        "profileId": "0xbfbcfab169c67072ff418133124480fea02175f1402aaa497daa4fd09026b0e1"
    }))?)
}

pub fn setup() -> Result<TestContext, TestError> {
    let key = keypair("wallet");
    let record = challenge(&key)?;
    let store = Arc::new(InMemoryReplayStore::new());
    store.issue(record.id.clone(), record.nonce.clone());
    let signature = sign(&key, &record)?;

    Ok(TestContext {
        verifier: Verifier::new(Arc::clone(&store)),
        key,
        record,
        signature,
        store,
    })
}
