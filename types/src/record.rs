//! The challenge-response record a client hands back after signing.
//!
//! Field names on the wire are camelCase. Every newtype validates itself on
//! construction (including JSON deserialization), so a [`ChallengeRecord`]
//! that exists already has the right id, address, profile id, network,
//! version and timestamp shapes. The remaining free-form strings are checked
//! by [`ChallengeRecord::check`].

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::{Network, PublicKey, errors::DecodingError, errors::FormatError};

pub const ADDRESS_LENGTH: usize = 44;
pub const PROFILE_ID_LENGTH: usize = 66;
pub const CHALLENGE_ID_MIN_LENGTH: usize = 8;
pub const CHALLENGE_ID_MAX_LENGTH: usize = 64;

/// Correlates a completed challenge with the one that was issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChallengeId(String);

impl ChallengeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChallengeId {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let length_ok =
            (CHALLENGE_ID_MIN_LENGTH..=CHALLENGE_ID_MAX_LENGTH).contains(&value.len());
        if !length_ok || !value.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(FormatError::InvalidChallengeId(value));
        }
        Ok(Self(value))
    }
}

impl FromStr for ChallengeId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl Display for ChallengeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ChallengeId> for String {
    fn from(id: ChallengeId) -> Self {
        id.0
    }
}

/// The signer's public key in the network's 44-character text encoding.
///
/// Only the length is checked here; decoding to key bytes happens in
/// [`Address::public_key`], and its failures are [`DecodingError`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the address as plain base58; the `ed25519:` prefix that
    /// [`PublicKey`] accepts is not an address.
    pub fn public_key(&self) -> Result<PublicKey, DecodingError> {
        PublicKey::try_from(bs58::decode(&self.0).into_vec()?.as_slice())
    }
}

impl TryFrom<String> for Address {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let length = value.chars().count();
        if length != ADDRESS_LENGTH {
            return Err(FormatError::InvalidAddressLength(length));
        }
        Ok(Self(value))
    }
}

impl FromStr for Address {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Opaque profile identifier, passed through verification untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId(String);

impl ProfileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProfileId {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let length = value.chars().count();
        if length != PROFILE_ID_LENGTH {
            return Err(FormatError::InvalidProfileIdLength(length));
        }
        Ok(Self(value))
    }
}

impl FromStr for ProfileId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl Display for ProfileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        id.0
    }
}

/// Version of the message format. Only `1.0` exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Version {
    #[default]
    V1,
}

impl Version {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "1.0",
        }
    }
}

impl FromStr for Version {
    type Err = FormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1.0" => Ok(Self::V1),
            other => Err(FormatError::UnsupportedVersion(other.to_string())),
        }
    }
}

impl TryFrom<String> for Version {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Version> for &'static str {
    fn from(version: Version) -> Self {
        version.as_str()
    }
}

/// A point in time as written by the issuer.
///
/// The original text is what ends up in the canonical message, so it is kept
/// verbatim next to the parsed instant used for comparisons.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    raw: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub const fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}

impl FromStr for Timestamp {
    type Err = FormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let instant = DateTime::parse_from_rfc3339(value)
            .map_err(|err| FormatError::InvalidTimestamp {
                value: value.to_string(),
                reason: err.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self {
            raw: value.to_string(),
            instant,
        })
    }
}

impl TryFrom<String> for Timestamp {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Renders with millisecond precision and a `Z` suffix, the same text
/// JavaScript's `Date#toISOString` produces.
impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        let instant = instant.trunc_subsecs(3);
        Self {
            raw: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            instant,
        }
    }
}

impl From<Timestamp> for String {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.raw
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A completed challenge as returned by the client.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    /// Secret challenge id the issuer used to register the nonce.
    pub id: ChallengeId,
    /// RFC 4501 dns authority that is requesting the signing.
    pub domain: String,
    pub network: Network,
    /// Public key used to perform the signing.
    pub address: Address,
    /// Human-readable ASCII assertion; must not contain a line break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    /// RFC 3986 URI referring to the subject of the signing.
    pub uri: String,
    pub version: Version,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<Timestamp>,
    /// URIs the user wants resolved as part of authentication, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
    pub profile_id: ProfileId,
}

impl ChallengeRecord {
    /// Structural checks on the free-form fields.
    ///
    /// None of these need key material, and all of them guard the canonical
    /// message against line injection: a stray `\n` in any field would shift
    /// the message layout.
    pub fn check(&self) -> Result<(), FormatError> {
        check_domain(&self.domain)?;
        if let Some(statement) = &self.statement {
            check_statement(statement)?;
        }
        check_uri(&self.uri)?;
        for resource in self.resources.iter().flatten() {
            check_uri(resource)?;
        }
        check_nonce(&self.nonce)?;
        if self.issued_at.is_none() {
            return Err(FormatError::MissingIssuedAt);
        }
        Ok(())
    }
}

pub(crate) fn check_domain(domain: &str) -> Result<(), FormatError> {
    let invalid = |reason: &str| FormatError::InvalidDomain(format!("{domain:?} {reason}"));

    if domain.is_empty() {
        return Err(invalid("is empty"));
    }
    if domain.contains("://") {
        return Err(invalid("must not include a scheme"));
    }
    if domain
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '@'))
    {
        return Err(invalid("is not a bare authority"));
    }
    let parsed = url::Url::parse(&format!("https://{domain}/"))
        .map_err(|err| invalid(&format!("is not a valid authority: {err}")))?;
    if parsed.host_str().is_none() {
        return Err(invalid("has no host"));
    }
    Ok(())
}

pub(crate) fn check_statement(statement: &str) -> Result<(), FormatError> {
    if !statement.is_ascii() || statement.contains(['\n', '\r']) {
        return Err(FormatError::InvalidStatement);
    }
    Ok(())
}

pub(crate) fn check_uri(uri: &str) -> Result<(), FormatError> {
    let invalid = |reason: String| FormatError::InvalidUri {
        uri: uri.to_string(),
        reason,
    };

    // `Url::parse` silently strips tabs and newlines, so reject them first.
    if uri.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("contains whitespace".to_string()));
    }
    url::Url::parse(uri).map_err(|err| invalid(err.to_string()))?;
    Ok(())
}

pub(crate) fn check_nonce(nonce: &str) -> Result<(), FormatError> {
    if nonce.is_empty() || nonce.contains(['\n', '\r']) {
        return Err(FormatError::InvalidNonce);
    }
    Ok(())
}
