use std::sync::Arc;

use chrono::{DateTime, Utc};
use siws_api_types::ChallengeRecord;
use url::Url;

use crate::replay::ReplayStore;

/// A temporal or identity rule a challenge response broke.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("Not Before ({not_before}) is later than Expiration Time ({expiration_time})")]
    InconsistentWindow {
        not_before: DateTime<Utc>,
        expiration_time: DateTime<Utc>,
    },
    #[error("Not valid before {not_before}")]
    NotYetValid { not_before: DateTime<Utc> },
    #[error("Expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
    #[error("Domain mismatch: expected {expected}, got {found}")]
    DomainMismatch { expected: String, found: String },
    #[error("URI {0} is out of scope")]
    UriOutOfScope(String),
    #[error("Nonce is unknown or was already used")]
    NonceUnknownOrReused,
}

/// Every rule a record broke, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    violations: Vec<Violation>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Collapses the outcome to its first violation.
    pub fn into_result(self) -> Result<(), Violation> {
        match self.violations.into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

/// Decides whether a record's `uri` names a subject the relying party
/// accepts sign-ins for.
///
/// There is no default rule: without a policy every URI is accepted.
/// Closures `Fn(&Url) -> bool` implement the trait.
pub trait UriPolicy: Send + Sync {
    fn permits(&self, uri: &Url) -> bool;
}

impl<F> UriPolicy for F
where
    F: Fn(&Url) -> bool + Send + Sync,
{
    fn permits(&self, uri: &Url) -> bool {
        self(uri)
    }
}

/// Accepts URIs with the same origin as `base` whose path lies under
/// `base`'s path, segment-wise: a scope of `/app` covers `/app` and
/// `/app/login` but not `/application`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceScope(Url);

impl ResourceScope {
    pub const fn new(base: Url) -> Self {
        Self(base)
    }

    pub const fn base(&self) -> &Url {
        &self.0
    }
}

impl UriPolicy for ResourceScope {
    fn permits(&self, uri: &Url) -> bool {
        if uri.origin() != self.0.origin() {
            return false;
        }
        let scope = self.0.path();
        let path = uri.path();
        if scope.ends_with('/') {
            return path.starts_with(scope);
        }
        path == scope
            || path
                .strip_prefix(scope)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Temporal and identity rules for a completed challenge.
#[derive(Clone, Default)]
pub struct Validator {
    uri_policy: Option<Arc<dyn UriPolicy>>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("uri_policy", &self.uri_policy.is_some())
            .finish()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uri_policy(mut self, policy: impl UriPolicy + 'static) -> Self {
        self.uri_policy = Some(Arc::new(policy));
        self
    }

    /// Checks the validity window, domain and URI scope against `now`.
    ///
    /// All rules are evaluated; the window is `[notBefore, expirationTime)`.
    pub fn validate(
        &self,
        record: &ChallengeRecord,
        now: DateTime<Utc>,
        expected_domain: &str,
    ) -> ValidationOutcome {
        let mut violations = Vec::new();
        let not_before = record.not_before.as_ref().map(|t| t.instant());
        let expiration_time = record.expiration_time.as_ref().map(|t| t.instant());

        if let (Some(not_before), Some(expiration_time)) = (not_before, expiration_time) {
            if not_before > expiration_time {
                violations.push(Violation::InconsistentWindow {
                    not_before,
                    expiration_time,
                });
            }
        }
        if let Some(not_before) = not_before.filter(|not_before| now < *not_before) {
            violations.push(Violation::NotYetValid { not_before });
        }
        if let Some(expired_at) = expiration_time.filter(|expires| now >= *expires) {
            violations.push(Violation::Expired { expired_at });
        }

        if !record.domain.eq_ignore_ascii_case(expected_domain) {
            violations.push(Violation::DomainMismatch {
                expected: expected_domain.to_string(),
                found: record.domain.clone(),
            });
        }

        if let Some(policy) = &self.uri_policy {
            let permitted = Url::parse(&record.uri).is_ok_and(|uri| policy.permits(&uri));
            if !permitted {
                violations.push(Violation::UriOutOfScope(record.uri.clone()));
            }
        }

        ValidationOutcome { violations }
    }
}

/// The nonce rule: the record's nonce must be the outstanding one for its id.
///
/// Consumes the challenge in `store` whatever the outcome.
pub fn consume_nonce<S: ReplayStore + ?Sized>(
    store: &S,
    record: &ChallengeRecord,
) -> Result<(), Violation> {
    if store.try_consume(&record.id, &record.nonce) {
        Ok(())
    } else {
        Err(Violation::NonceUnknownOrReused)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::InMemoryReplayStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn record() -> ChallengeRecord {
        serde_json::from_value(serde_json::json!({
            "id": "fRyt67D3eRss3RrX",
            "domain": "defi.finance",
            "network": "mainnet",
            "address": "26qv4GCcx98RihuK3c4T6ozB3J7L6VwCuFVc7Ta2A3Uo",
            "uri": "https://defi.finance/",
            "version": "1.0",
            "nonce": "0x1234567890abcdef",
            "issuedAt": "2024-05-01T11:55:00.000Z",
            "profileId": "0xbfbcfab169c67072ff418133124480fea02175f1402aaa497daa4fd09026b0e1"
        }))
        .unwrap()
    }

    fn with_window(
        not_before: Option<DateTime<Utc>>,
        expiration_time: Option<DateTime<Utc>>,
    ) -> ChallengeRecord {
        ChallengeRecord {
            not_before: not_before.map(Into::into),
            expiration_time: expiration_time.map(Into::into),
            ..record()
        }
    }

    #[test]
    fn record_without_window_is_valid() {
        let outcome = Validator::new().validate(&record(), now(), "defi.finance");
        assert!(outcome.is_valid());
        assert_eq!(outcome.into_result(), Ok(()));
    }

    #[test]
    fn not_before_is_inclusive() {
        let validator = Validator::new();
        let record = with_window(Some(now()), None);

        assert!(validator.validate(&record, now(), "defi.finance").is_valid());
        assert_eq!(
            validator
                .validate(&record, now() - Duration::milliseconds(1), "defi.finance")
                .into_result(),
            Err(Violation::NotYetValid { not_before: now() })
        );
    }

    #[test]
    fn expiration_is_exclusive() {
        let validator = Validator::new();
        let record = with_window(None, Some(now()));

        assert_eq!(
            validator.validate(&record, now(), "defi.finance").into_result(),
            Err(Violation::Expired { expired_at: now() })
        );
        assert!(validator
            .validate(&record, now() - Duration::milliseconds(1), "defi.finance")
            .is_valid());
    }

    #[test]
    fn inverted_window_is_reported() {
        let record = with_window(Some(now() + Duration::hours(1)), Some(now()));
        let outcome = Validator::new().validate(&record, now(), "defi.finance");

        assert_eq!(
            outcome.violations(),
            &[
                Violation::InconsistentWindow {
                    not_before: now() + Duration::hours(1),
                    expiration_time: now(),
                },
                Violation::NotYetValid {
                    not_before: now() + Duration::hours(1)
                },
                Violation::Expired { expired_at: now() },
            ]
        );
    }

    #[test]
    fn collects_every_violation() {
        let record = with_window(None, Some(now() - Duration::minutes(1)));
        let outcome = Validator::new()
            .with_uri_policy(|_: &Url| false)
            .validate(&record, now(), "other.finance");

        assert_eq!(outcome.violations().len(), 3);
        assert!(matches!(outcome.violations()[0], Violation::Expired { .. }));
        assert!(matches!(
            &outcome.violations()[1],
            Violation::DomainMismatch { expected, found }
                if expected == "other.finance" && found == "defi.finance"
        ));
        assert_eq!(
            outcome.violations()[2],
            Violation::UriOutOfScope("https://defi.finance/".to_string())
        );
    }

    #[test]
    fn domain_comparison_ignores_ascii_case() {
        let outcome = Validator::new().validate(&record(), now(), "DeFi.Finance");
        assert!(outcome.is_valid());
    }

    #[test]
    fn domain_port_must_match() {
        let record = ChallengeRecord {
            domain: "defi.finance:8443".to_string(),
            ..record()
        };
        let outcome = Validator::new().validate(&record, now(), "defi.finance");
        assert!(!outcome.is_valid());
    }

    #[test]
    fn resource_scope_is_segment_aware() {
        let scope = ResourceScope::new("https://defi.finance/app".parse().unwrap());
        let permits = |uri: &str| scope.permits(&uri.parse().unwrap());

        assert!(permits("https://defi.finance/app"));
        assert!(permits("https://defi.finance/app/login"));
        assert!(!permits("https://defi.finance/application"));
        assert!(!permits("http://defi.finance/app"));
        assert!(!permits("https://evil.finance/app"));

        let root = ResourceScope::new("https://defi.finance/".parse().unwrap());
        assert!(root.permits(&"https://defi.finance/anything".parse().unwrap()));
    }

    #[test]
    fn consume_nonce_is_single_use() {
        let store = InMemoryReplayStore::new();
        let record = record();
        store.issue(record.id.clone(), record.nonce.clone());

        assert_eq!(consume_nonce(&store, &record), Ok(()));
        assert_eq!(
            consume_nonce(&store, &record),
            Err(Violation::NonceUnknownOrReused)
        );
    }
}
