use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::{errors::DecodingError, record::Address};

pub mod public_key;
pub mod secret_key;
pub mod signature;

pub const ED25519_PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
pub const ED25519_SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Key schemes accepted in `<key-type>:<base58>` prefixed strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum KeyType {
    ED25519 = 0,
}

impl Display for KeyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str(match self {
            Self::ED25519 => "ed25519",
        })
    }
}

impl FromStr for KeyType {
    type Err = DecodingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowercase_key_type = value.to_ascii_lowercase();
        match lowercase_key_type.as_str() {
            "ed25519" => Ok(Self::ED25519),
            _ => Err(DecodingError::InvalidKeyFormat(lowercase_key_type)),
        }
    }
}

fn split_key_type_data(value: &str) -> Result<(KeyType, &str), DecodingError> {
    if let Some((prefix, key_data)) = value.split_once(':') {
        Ok((KeyType::from_str(prefix)?, key_data))
    } else {
        // Solana keys and signatures carry no prefix.
        Ok((KeyType::ED25519, value))
    }
}

/// Verifies a detached signature over `message` with the public key the
/// address encodes.
///
/// Returns `Ok(false)` when both inputs are well-formed but the signature does
/// not authenticate the message, and an error when either input cannot be
/// decoded. The comparison itself is done by `ed25519-dalek`
/// (`verify_strict`), which does not leak where a signature diverged.
pub fn verify(message: &[u8], signature: &str, address: &Address) -> Result<bool, DecodingError> {
    let public_key = address.public_key()?;
    let signature = signature.parse::<signature::Signature>()?;
    signature.verify(message, &public_key)
}
