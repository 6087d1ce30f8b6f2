use url::Url;

use crate::validate::{ResourceScope, Validator};

/// Settings of the party accepting sign-ins.
///
/// Loadable from any serde format, e.g. JSON:
///
/// ```json
/// { "domain": "defi.finance", "uriScope": "https://defi.finance/app" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelyingPartyConfig {
    /// Origin authority (host and optional port) challenges are issued for.
    pub domain: String,
    /// When set, a record's `uri` must fall under this URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_scope: Option<Url>,
}

impl RelyingPartyConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            uri_scope: None,
        }
    }

    pub fn with_uri_scope(mut self, uri_scope: Url) -> Self {
        self.uri_scope = Some(uri_scope);
        self
    }

    pub fn validator(&self) -> Validator {
        match &self.uri_scope {
            Some(scope) => Validator::new().with_uri_policy(ResourceScope::new(scope.clone())),
            None => Validator::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_camel_case_json() {
        let config: RelyingPartyConfig = serde_json::from_str(
            r#"{"domain":"defi.finance","uriScope":"https://defi.finance/app"}"#,
        )
        .unwrap();

        assert_eq!(
            config,
            RelyingPartyConfig::new("defi.finance")
                .with_uri_scope("https://defi.finance/app".parse().unwrap())
        );
    }

    #[test]
    fn uri_scope_is_optional() {
        let config: RelyingPartyConfig =
            serde_json::from_str(r#"{"domain":"defi.finance"}"#).unwrap();
        assert_eq!(config.uri_scope, None);
        assert_eq!(
            serde_json::to_string(&config).unwrap(),
            r#"{"domain":"defi.finance"}"#
        );
    }

    #[test]
    fn validator_enforces_scope() {
        let record: siws_api_types::ChallengeRecord = serde_json::from_value(serde_json::json!({
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
        .unwrap();
        let now = record.issued_at.as_ref().unwrap().instant();

        let open = RelyingPartyConfig::new("defi.finance").validator();
        assert!(open.validate(&record, now, "defi.finance").is_valid());

        let scoped = RelyingPartyConfig::new("defi.finance")
            .with_uri_scope("https://defi.finance/app".parse().unwrap())
            .validator();
        assert!(!scoped.validate(&record, now, "defi.finance").is_valid());
    }
}
