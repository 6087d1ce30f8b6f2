use std::{fmt::Display, str::FromStr};

use ed25519_dalek::Signer;

use crate::{
    crypto::split_key_type_data,
    errors::DecodingError,
    PublicKey, Signature,
};

/// An ed25519 signing key, as held by a wallet.
///
/// The verification engine never needs one; it exists so Rust clients and
/// tests can produce the detached signature over a canonical message.
#[derive(Clone)]
pub struct SecretKey(ed25519_dalek::SigningKey);

impl SecretKey {
    pub fn from_seed(seed: [u8; ed25519_dalek::SECRET_KEY_LENGTH]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&seed))
    }

    pub fn sign(&self, data: &[u8]) -> Signature {
        Signature(self.0.sign(data))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(self.0.verifying_key())
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretKey").field(&self.public_key()).finish()
    }
}

/// Accepts either a 32-byte seed or the 64-byte `seed || public key`
/// keypair layout used by the network's CLI keyfiles, base58 encoded.
impl FromStr for SecretKey {
    type Err = DecodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, key_data) = split_key_type_data(s)?;
        let bytes = bs58::decode(key_data).into_vec()?;
        match bytes.len() {
            ed25519_dalek::SECRET_KEY_LENGTH => Ok(Self::from_seed(bytes.try_into()?)),
            ed25519_dalek::KEYPAIR_LENGTH => {
                let keypair: [u8; ed25519_dalek::KEYPAIR_LENGTH] = bytes.try_into()?;
                Ok(Self(ed25519_dalek::SigningKey::from_keypair_bytes(
                    &keypair,
                )?))
            }
            other => Err(DecodingError::IncorrectLength(other)),
        }
    }
}

impl Display for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&bs58::encode(self.0.to_keypair_bytes()).into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_string_roundtrip_keeps_public_key() {
        let secret_key = SecretKey::from_seed([9; 32]);
        let parsed: SecretKey = secret_key.to_string().parse().unwrap();

        assert_eq!(parsed.public_key(), secret_key.public_key());
    }

    #[test]
    fn seed_string_is_accepted() {
        let seed = [5u8; 32];
        let parsed: SecretKey = bs58::encode(seed).into_string().parse().unwrap();

        assert_eq!(parsed.public_key(), SecretKey::from_seed(seed).public_key());
    }

    #[test]
    fn mismatched_keypair_is_rejected() {
        let mut keypair = SecretKey::from_seed([1; 32]).0.to_keypair_bytes();
        keypair[32..].copy_from_slice(&SecretKey::from_seed([2; 32]).public_key().0);

        let encoded = bs58::encode(keypair).into_string();
        assert!(matches!(
            encoded.parse::<SecretKey>(),
            Err(DecodingError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let secret_key = SecretKey::from_seed([3; 32]);
        let debug = format!("{secret_key:?}");

        assert!(!debug.contains(&secret_key.to_string()));
        assert!(debug.contains(&secret_key.public_key().to_string()));
    }
}
