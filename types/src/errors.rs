/// A challenge record, or a piece of one, that does not have the shape the
/// canonical message format requires.
///
/// Format errors are raised before any cryptographic work is attempted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid challenge id: expected 8 to 64 alphanumeric characters, got {0:?}")]
    InvalidChallengeId(String),
    #[error("Invalid address length: expected 44 characters, got {0}")]
    InvalidAddressLength(usize),
    #[error("Invalid profile id length: expected 66 characters, got {0}")]
    InvalidProfileIdLength(usize),
    #[error("Unknown network: {0}. Expected one of: mainnet, devnet, testnet")]
    UnknownNetwork(String),
    #[error("Unsupported message version: {0}")]
    UnsupportedVersion(String),
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
    #[error("Statement must be ASCII without line breaks")]
    InvalidStatement,
    #[error("Invalid URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("Nonce must be non-empty and fit on one line")]
    InvalidNonce,
    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("Issued At timestamp is required to build the canonical message")]
    MissingIssuedAt,
    #[error("Malformed message at line {line}: {reason}")]
    MalformedMessage { line: usize, reason: String },
}

/// Key or signature material that cannot be decoded to the expected bytes.
#[derive(thiserror::Error, Debug)]
pub enum DecodingError {
    #[error("Base58 decoding error: {0}")]
    Base58DecodingError(#[from] bs58::decode::Error),
    #[error("Base64 decoding error: {0}")]
    Base64DecodingError(#[from] base64::DecodeError),
    #[error("Incorrect length: {0}")]
    IncorrectLength(usize),
    #[error("Invalid key format. Expected: [ed25519] but got: {0}")]
    InvalidKeyFormat(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(#[from] ed25519_dalek::SignatureError),
}

impl From<Vec<u8>> for DecodingError {
    fn from(value: Vec<u8>) -> Self {
        Self::IncorrectLength(value.len())
    }
}
