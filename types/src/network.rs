use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::errors::FormatError;

/// The clusters an account can sign in from.
///
/// The set is closed: anything else fails to parse with
/// [`FormatError::UnknownNetwork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Network {
    Mainnet,
    Devnet,
    Testnet,
}

impl Network {
    /// Name of the network family, as written in the first line of the message.
    pub const CHAIN_NAME: &'static str = "Solana";

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
        }
    }

    pub const fn chain_name(&self) -> &'static str {
        Self::CHAIN_NAME
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = FormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mainnet" => Ok(Self::Mainnet),
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            unknown => Err(FormatError::UnknownNetwork(unknown.to_string())),
        }
    }
}

impl TryFrom<String> for Network {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Network> for &'static str {
    fn from(network: Network) -> Self {
        network.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_set_only() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("devnet".parse::<Network>().unwrap(), Network::Devnet);
        assert_eq!(
            "Mainnet".parse::<Network>(),
            Err(FormatError::UnknownNetwork("Mainnet".to_string()))
        );
        assert!("localnet".parse::<Network>().is_err());
    }

    #[test]
    fn json_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&Network::Testnet).unwrap(),
            "\"testnet\""
        );
        assert_eq!(
            serde_json::from_str::<Network>("\"devnet\"").unwrap(),
            Network::Devnet
        );

        let err = serde_json::from_str::<Network>("\"polygon\"").unwrap_err();
        assert!(err.to_string().contains("Unknown network: polygon"));
    }
}
