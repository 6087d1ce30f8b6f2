//! Canonical Sign-In With Solana message text.
//!
//! The signed bytes are the UTF-8 encoding of this layout, lines joined by a
//! single `\n` and no trailing newline:
//!
//! ```text
//! {domain} wants you to sign in with your Solana account:
//! {address}
//!
//! {statement}                       <- only with a statement,
//!                                   <- together with this blank line
//! URI: {uri}
//! Version: {version}
//! Network: {network}
//! Nonce: {nonce}
//! Issued At: {issuedAt}
//! Expiration Time: {expirationTime} <- optional
//! Not Before: {notBefore}           <- optional
//! Resources:                        <- optional
//! - {resource}                      <- one per resource, in order
//! ```
//!
//! Optional fields are left out entirely when absent. Wallets build the same
//! text before signing, so any difference here is a failed signature.
//!
//! # Example
//!
//! ```rust
//! use siws_api_types::{ChallengeRecord, SignInMessage};
//!
//! let record: ChallengeRecord = serde_json::from_str(r#"{
//!     "id": "fRyt67D3eRss3RrX",
//!     "domain": "defi.finance",
//!     "network": "mainnet",
//!     "address": "26qv4GCcx98RihuK3c4T6ozB3J7L6VwCuFVc7Ta2A3Uo",
//!     "uri": "https://defi.finance/",
//!     "version": "1.0",
//!     "nonce": "0x1234567890abcdef",
//!     "issuedAt": "2020-01-01T00:00:00.000Z",
//!     "profileId": "0xbfbcfab169c67072ff418133124480fea02175f1402aaa497daa4fd09026b0e1"
//! }"#).unwrap();
//!
//! let message = SignInMessage::try_from(&record).unwrap();
//! assert!(message.to_string().starts_with("defi.finance wants you to sign in"));
//! ```

use std::{
    fmt::{Display, Formatter},
    iter::{Enumerate, Peekable},
    str::{FromStr, Split},
};

use crate::{
    errors::FormatError,
    record::{check_domain, check_nonce, check_statement, check_uri},
    Address, ChallengeRecord, Network, Timestamp, Version,
};

const PREAMBLE: &str = " wants you to sign in with your ";
const ACCOUNT_SUFFIX: &str = " account:";
const URI_TAG: &str = "URI: ";
const VERSION_TAG: &str = "Version: ";
const NETWORK_TAG: &str = "Network: ";
const NONCE_TAG: &str = "Nonce: ";
const ISSUED_AT_TAG: &str = "Issued At: ";
const EXPIRATION_TIME_TAG: &str = "Expiration Time: ";
const NOT_BEFORE_TAG: &str = "Not Before: ";
const RESOURCES_TAG: &str = "Resources:";
const RESOURCE_PREFIX: &str = "- ";

/// The fields that make up the signed text, in the shape the text needs them.
///
/// Unlike [`ChallengeRecord`], `issued_at` is mandatory and the id / profile
/// id are absent: they never appear in the signed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInMessage {
    pub domain: String,
    pub network: Network,
    pub address: Address,
    pub statement: Option<String>,
    pub uri: String,
    pub version: Version,
    pub nonce: String,
    pub issued_at: Timestamp,
    pub expiration_time: Option<Timestamp>,
    pub not_before: Option<Timestamp>,
    pub resources: Option<Vec<String>>,
}

impl SignInMessage {
    /// The exact bytes a wallet signs for this message.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    fn check(&self) -> Result<(), FormatError> {
        check_domain(&self.domain)?;
        if let Some(statement) = &self.statement {
            check_statement(statement)?;
        }
        check_uri(&self.uri)?;
        for resource in self.resources.iter().flatten() {
            check_uri(resource)?;
        }
        check_nonce(&self.nonce)
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{}{PREAMBLE}{}{ACCOUNT_SUFFIX}",
                self.domain,
                self.network.chain_name()
            ),
            self.address.to_string(),
            String::new(),
        ];

        if let Some(statement) = &self.statement {
            lines.push(statement.clone());
            lines.push(String::new());
        }

        lines.push(format!("{URI_TAG}{}", self.uri));
        lines.push(format!("{VERSION_TAG}{}", self.version));
        lines.push(format!("{NETWORK_TAG}{}", self.network));
        lines.push(format!("{NONCE_TAG}{}", self.nonce));
        lines.push(format!("{ISSUED_AT_TAG}{}", self.issued_at));

        if let Some(expiration_time) = &self.expiration_time {
            lines.push(format!("{EXPIRATION_TIME_TAG}{expiration_time}"));
        }
        if let Some(not_before) = &self.not_before {
            lines.push(format!("{NOT_BEFORE_TAG}{not_before}"));
        }
        if let Some(resources) = &self.resources {
            lines.push(RESOURCES_TAG.to_string());
            lines.extend(
                resources
                    .iter()
                    .map(|resource| format!("{RESOURCE_PREFIX}{resource}")),
            );
        }

        lines
    }
}

/// Serializes a completed challenge into the bytes its signer signed.
///
/// Fails with [`FormatError::MissingIssuedAt`] when the record carries no
/// issue time, and with the other [`FormatError`]s when a field would break
/// the line layout.
pub fn serialize(record: &ChallengeRecord) -> Result<Vec<u8>, FormatError> {
    Ok(SignInMessage::try_from(record)?.to_bytes())
}

impl TryFrom<&ChallengeRecord> for SignInMessage {
    type Error = FormatError;

    fn try_from(record: &ChallengeRecord) -> Result<Self, Self::Error> {
        record.check()?;
        let issued_at = record
            .issued_at
            .clone()
            .ok_or(FormatError::MissingIssuedAt)?;

        Ok(Self {
            domain: record.domain.clone(),
            network: record.network,
            address: record.address.clone(),
            // An empty statement is treated like a missing one, as wallets do.
            statement: record.statement.clone().filter(|s| !s.is_empty()),
            uri: record.uri.clone(),
            version: record.version,
            nonce: record.nonce.clone(),
            issued_at,
            expiration_time: record.expiration_time.clone(),
            not_before: record.not_before.clone(),
            resources: record.resources.clone(),
        })
    }
}

impl Display for SignInMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Parses canonical message text.
///
/// The parser is exactly as strict as the serializer: fields in the fixed
/// order, no empty optional lines, `\n` separators only and no trailing
/// newline. Anything it accepts serializes back to the same text.
impl FromStr for SignInMessage {
    type Err = FormatError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some(line) = text.split('\n').position(|line| line.contains('\r')) {
            return Err(malformed(line + 1, "carriage returns are not allowed"));
        }

        let mut lines = MessageLines::new(text);

        let (line, header) = lines.next_line()?;
        let (domain, rest) = header
            .split_once(PREAMBLE)
            .ok_or_else(|| malformed(line, "missing sign-in preamble"))?;
        let chain = rest
            .strip_suffix(ACCOUNT_SUFFIX)
            .ok_or_else(|| malformed(line, "missing account suffix"))?;
        if chain != Network::CHAIN_NAME {
            return Err(malformed(line, format!("unexpected chain name {chain:?}")));
        }

        let address = lines.next_line()?.1.parse::<Address>()?;
        lines.expect_blank()?;

        // A statement is the only line followed by a blank one; it may itself
        // look like a tag.
        let statement = if !lines.second_is_blank() {
            None
        } else {
            let (line, statement) = lines.next_line()?;
            if statement.is_empty() {
                return Err(malformed(line, "empty statement"));
            }
            lines.expect_blank()?;
            Some(statement.to_string())
        };

        let uri = lines.tagged(URI_TAG)?.to_string();
        let version = lines.tagged(VERSION_TAG)?.parse::<Version>()?;
        let network = lines.tagged(NETWORK_TAG)?.parse::<Network>()?;
        let nonce = lines.tagged(NONCE_TAG)?.to_string();
        let issued_at = lines.tagged(ISSUED_AT_TAG)?.parse::<Timestamp>()?;
        let expiration_time = lines
            .optional_tagged(EXPIRATION_TIME_TAG)
            .map(str::parse::<Timestamp>)
            .transpose()?;
        let not_before = lines
            .optional_tagged(NOT_BEFORE_TAG)
            .map(str::parse::<Timestamp>)
            .transpose()?;

        let resources = if lines.next_if_exact(RESOURCES_TAG) {
            let mut resources = Vec::new();
            while let Some(resource) = lines.optional_tagged(RESOURCE_PREFIX) {
                resources.push(resource.to_string());
            }
            Some(resources)
        } else {
            None
        };

        if let Some((line, rest)) = lines.inner.next() {
            return Err(malformed(line + 1, format!("unexpected line {rest:?}")));
        }

        let message = Self {
            domain: domain.to_string(),
            network,
            address,
            statement,
            uri,
            version,
            nonce,
            issued_at,
            expiration_time,
            not_before,
            resources,
        };
        message.check()?;
        Ok(message)
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> FormatError {
    FormatError::MalformedMessage {
        line,
        reason: reason.into(),
    }
}

/// Line cursor with 1-based line numbers for error reporting.
struct MessageLines<'a> {
    inner: Peekable<Enumerate<Split<'a, char>>>,
}

impl<'a> MessageLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split('\n').enumerate().peekable(),
        }
    }

    fn next_line(&mut self) -> Result<(usize, &'a str), FormatError> {
        match self.inner.next() {
            Some((index, line)) => Ok((index + 1, line)),
            None => Err(malformed(0, "unexpected end of message")),
        }
    }

    fn expect_blank(&mut self) -> Result<(), FormatError> {
        let (line, text) = self.next_line()?;
        if !text.is_empty() {
            return Err(malformed(line, "expected an empty line"));
        }
        Ok(())
    }

    fn second_is_blank(&self) -> bool {
        self.inner
            .clone()
            .nth(1)
            .is_some_and(|(_, line)| line.is_empty())
    }

    fn tagged(&mut self, tag: &str) -> Result<&'a str, FormatError> {
        let (line, text) = self.next_line()?;
        text.strip_prefix(tag)
            .ok_or_else(|| malformed(line, format!("expected `{}`", tag.trim_end())))
    }

    fn optional_tagged(&mut self, tag: &str) -> Option<&'a str> {
        let (_, text) = self.inner.next_if(|(_, line)| line.starts_with(tag))?;
        text.strip_prefix(tag)
    }

    fn next_if_exact(&mut self, expected: &str) -> bool {
        self.inner.next_if(|(_, line)| *line == expected).is_some()
    }
}
