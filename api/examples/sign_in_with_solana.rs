use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use siws_api::{
    ChallengeRecord, InMemoryReplayStore, Network, RelyingPartyConfig, SecretKey, Timestamp,
    Verifier, Version, types::message,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> testresult::TestResult {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("siws_api=debug".parse()?))
        .init();

    let config: RelyingPartyConfig = serde_json::from_str(
        r#"{ "domain": "defi.finance", "uriScope": "https://defi.finance/" }"#,
    )?;
    let store = InMemoryReplayStore::new();

    // Issuer: hand out a challenge
    // Addresses of some keys encode to 43 characters; challenges expect 44.
    let wallet = (0u8..=u8::MAX)
        .map(|seed| SecretKey::from_seed([seed; 32]))
        .find(|key| key.public_key().to_string().len() == 44)
        .ok_or("no suitable demo key")?;
    let address = wallet.public_key().to_string();
    let now = Utc::now();
    let record = ChallengeRecord {
        id: "fRyt67D3eRss3RrX".parse()?,
        domain: config.domain.clone(),
        network: Network::Mainnet,
        address: address.parse()?,
        statement: Some("Sign in to DeFi Finance".to_string()),
        uri: "https://defi.finance/".to_string(),
        version: Version::V1,
        nonce: format!("{:x}", Sha256::digest(now.to_rfc3339().as_bytes())),
        issued_at: Some(Timestamp::from(now)),
        expiration_time: Some(Timestamp::from(now + Duration::minutes(10))),
        not_before: None,
        resources: Some(vec!["https://defi.finance/terms".to_string()]),
        profile_id: format!("0x{:x}", Sha256::digest(address.as_bytes())).parse()?,
    };
    store.issue(record.id.clone(), record.nonce.clone());

    // Wallet: sign the canonical message
    let message = message::serialize(&record)?;
    println!("{}\n", String::from_utf8(message.clone())?);
    let signature = wallet.sign(&message).to_base64();

    // Relying party: verify the response
    let verifier = Verifier::from_config(store, &config);
    let identity = verifier.verify(&record, &signature, Utc::now(), &config.domain)?;
    println!("Signed in: {}", serde_json::to_string_pretty(&identity)?);

    let replay = verifier.verify(&record, &signature, Utc::now(), &config.domain);
    match replay {
        Ok(_) => println!("Replay attempt accepted"),
        Err(err) => println!("Replay attempt rejected: {err}"),
    }

    Ok(())
}
