use chrono::{DateTime, Utc};
use siws_api_types::errors::{DecodingError, FormatError};

use crate::validate::Violation;

/// Why a challenge response was not accepted.
///
/// Callers are expected to branch on the variant: an expired challenge and a
/// forged signature call for different user-facing messages.
#[derive(thiserror::Error, Debug)]
pub enum VerificationError {
    #[error("Malformed challenge record: {0}")]
    Format(#[from] FormatError),
    #[error("Malformed key or signature: {0}")]
    Decoding(#[from] DecodingError),
    #[error("Signature does not authenticate the message")]
    SignatureInvalid,
    #[error("Challenge expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
    #[error("Challenge is not valid before {not_before}")]
    NotYetValid { not_before: DateTime<Utc> },
    #[error("Domain mismatch: expected {expected}, got {found}")]
    DomainMismatch { expected: String, found: String },
    #[error("Nonce is unknown or was already used")]
    NonceUnknownOrReused,
    #[error("Not Before ({not_before}) is later than Expiration Time ({expiration_time})")]
    InconsistentWindow {
        not_before: DateTime<Utc>,
        expiration_time: DateTime<Utc>,
    },
    #[error("URI {0} is outside of the relying party's resource scope")]
    UriOutOfScope(String),
}

impl From<Violation> for VerificationError {
    fn from(violation: Violation) -> Self {
        match violation {
            Violation::InconsistentWindow {
                not_before,
                expiration_time,
            } => Self::InconsistentWindow {
                not_before,
                expiration_time,
            },
            Violation::NotYetValid { not_before } => Self::NotYetValid { not_before },
            Violation::Expired { expired_at } => Self::Expired { expired_at },
            Violation::DomainMismatch { expected, found } => {
                Self::DomainMismatch { expected, found }
            }
            Violation::UriOutOfScope(uri) => Self::UriOutOfScope(uri),
            Violation::NonceUnknownOrReused => Self::NonceUnknownOrReused,
        }
    }
}
