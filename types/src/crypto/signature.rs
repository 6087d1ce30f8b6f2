use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use base64::prelude::*;

use crate::{
    crypto::{split_key_type_data, ED25519_SIGNATURE_LENGTH},
    errors::DecodingError,
    PublicKey,
};

/// A detached ed25519 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub ed25519_dalek::Signature);

impl Signature {
    /// Construct a signature from its raw 64-byte blob.
    pub fn from_bytes(signature_data: &[u8]) -> Result<Self, DecodingError> {
        let data: &[u8; ED25519_SIGNATURE_LENGTH] = signature_data
            .try_into()
            .map_err(|_| DecodingError::IncorrectLength(signature_data.len()))?;
        Ok(Self(ed25519_dalek::Signature::from_bytes(data)))
    }

    pub fn to_bytes(&self) -> [u8; ED25519_SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// The encoding browser wallets hand back after `signMessage`.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(self.to_bytes())
    }

    /// Verifies that this signature signs `data` with the given public key.
    ///
    /// Uses strict verification: small-order keys and non-canonical
    /// signatures are rejected as unauthenticated. A key that is not a
    /// point on the curve is a decoding error rather than `false`.
    pub fn verify(&self, data: &[u8], public_key: &PublicKey) -> Result<bool, DecodingError> {
        let verifying_key = public_key.verifying_key()?;
        Ok(verifying_key.verify_strict(data, &self.0).is_ok())
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(signature: ed25519_dalek::Signature) -> Self {
        Self(signature)
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str(&bs58::encode(self.to_bytes()).into_string())
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl serde::Serialize for Signature {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<<S as serde::Serializer>::Ok, <S as serde::Serializer>::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as serde::Deserializer<'de>>::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse()
            .map_err(|err: DecodingError| serde::de::Error::custom(err.to_string()))
    }
}

/// Parses a signature as produced by the common wallet adapters:
/// - `ed25519:<base58>` prefixed form
/// - plain base58 (the network's native encoding)
/// - standard base64 (what most browser wallets return)
impl FromStr for Signature {
    type Err = DecodingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.contains(':') {
            let (_, sig_data) = split_key_type_data(value)?;
            return Self::from_bytes(&bs58::decode(sig_data).into_vec()?);
        }

        match bs58::decode(value).into_vec() {
            Ok(bytes) if bytes.len() == ED25519_SIGNATURE_LENGTH => Self::from_bytes(&bytes),
            _ => Self::from_bytes(&BASE64_STANDARD.decode(value)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SecretKey;

    fn test_signature() -> (Signature, PublicKey) {
        let secret_key = SecretKey::from_seed([42; 32]);
        (secret_key.sign(b"test message"), secret_key.public_key())
    }

    #[test]
    fn parses_every_supported_encoding() {
        let (signature, _) = test_signature();

        let base58 = signature.to_string();
        let prefixed = format!("ed25519:{base58}");
        let base64 = signature.to_base64();

        assert_eq!(base58.parse::<Signature>().unwrap(), signature);
        assert_eq!(prefixed.parse::<Signature>().unwrap(), signature);
        assert_eq!(base64.parse::<Signature>().unwrap(), signature);
    }

    #[test]
    fn rejects_wrong_length() {
        let short = BASE64_STANDARD.encode(b"too_short");
        assert!(matches!(
            short.parse::<Signature>(),
            Err(DecodingError::IncorrectLength(9))
        ));
    }

    #[test]
    fn rejects_invalid_encoding() {
        assert!(matches!(
            "not-base64!".parse::<Signature>(),
            Err(DecodingError::Base64DecodingError(_))
        ));
    }

    #[test]
    fn verify_valid_and_invalid() {
        let (signature, public_key) = test_signature();

        assert!(signature.verify(b"test message", &public_key).unwrap());
        assert!(!signature.verify(b"wrong message", &public_key).unwrap());
    }

    #[test]
    fn verify_with_wrong_key() {
        let (signature, _) = test_signature();
        let other = SecretKey::from_seed([43; 32]).public_key();

        assert!(!signature.verify(b"test message", &other).unwrap());
    }
}
