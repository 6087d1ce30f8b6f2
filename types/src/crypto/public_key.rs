use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use crate::{
    crypto::{split_key_type_data, KeyType, ED25519_PUBLIC_KEY_LENGTH},
    errors::DecodingError,
};

/// A raw ed25519 public key.
///
/// Displayed as plain base58, which is how the network writes account
/// addresses. Parsing also accepts the `ed25519:` prefixed form.
#[derive(Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct PublicKey(pub [u8; ED25519_PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub const fn key_type(&self) -> KeyType {
        KeyType::ED25519
    }

    pub fn key_data(&self) -> &[u8] {
        &self.0
    }

    /// Decompresses the key into a curve point usable for verification.
    pub fn verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, DecodingError> {
        Ok(ed25519_dalek::VerifyingKey::from_bytes(&self.0)?)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = DecodingError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(
            data.try_into()
                .map_err(|_| DecodingError::IncorrectLength(data.len()))?,
        ))
    }
}

impl From<ed25519_dalek::VerifyingKey> for PublicKey {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl Display for PublicKey {
    fn fmt(&self, fmt: &mut Formatter) -> std::fmt::Result {
        fmt.write_str(&bs58::encode(&self.0).into_string())
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl serde::Serialize for PublicKey {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<<S as serde::Serializer>::Ok, <S as serde::Serializer>::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as serde::Deserializer<'de>>::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse()
            .map_err(|err: DecodingError| serde::de::Error::custom(err.to_string()))
    }
}

impl FromStr for PublicKey {
    type Err = DecodingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (KeyType::ED25519, key_data) = split_key_type_data(value)?;
        Self::try_from(bs58::decode(key_data).into_vec()?.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // cspell:disable-next-line
    const ADDRESS: &str = "26qv4GCcx98RihuK3c4T6ozB3J7L6VwCuFVc7Ta2A3Uo";

    #[test]
    fn parses_plain_and_prefixed_base58() {
        let plain: PublicKey = ADDRESS.parse().unwrap();
        let prefixed: PublicKey = format!("ed25519:{ADDRESS}").parse().unwrap();

        assert_eq!(plain, prefixed);
        assert_eq!(plain.to_string(), ADDRESS);
    }

    #[test]
    fn rejects_wrong_length() {
        let short = bs58::encode([1u8; 31]).into_string();
        assert!(matches!(
            short.parse::<PublicKey>(),
            Err(DecodingError::IncorrectLength(31))
        ));
    }

    #[test]
    fn rejects_invalid_alphabet() {
        assert!(matches!(
            "0OIl".parse::<PublicKey>(),
            Err(DecodingError::Base58DecodingError(_))
        ));
    }
}
