//! Configuration management for the Pacifica client.

use crate::signing::{KeyEncoding, SigningScheme};
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Venue network selected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub const MAINNET_URL: &'static str = "https://api.pacifica.fi";
    pub const TESTNET_URL: &'static str = "https://test-api.pacifica.fi";

    pub fn base_url(&self) -> &'static str {
        match self {
            Network::Mainnet => Self::MAINNET_URL,
            Network::Testnet => Self::TESTNET_URL,
        }
    }
}

impl std::str::FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(Error::Config {
                message: format!("unknown network '{other}', expected mainnet or testnet"),
            }),
        }
    }
}

/// Client configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    /// Overrides the network's base host (test servers, proxies).
    #[serde(default)]
    pub base_url: Option<String>,
    /// The trading account.
    pub account_address: String,
    /// Delegated signer authorized to act for the account.
    pub agent_wallet_address: String,
    /// Secret key material for the agent.
    pub agent_private_key: String,
    #[serde(default)]
    pub signing_scheme: SigningScheme,
    /// Text encoding of `agent_private_key`; defaults per scheme.
    #[serde(default)]
    pub key_encoding: Option<KeyEncoding>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Config {
    pub fn new(
        network: Network,
        account_address: impl Into<String>,
        agent_wallet_address: impl Into<String>,
        agent_private_key: impl Into<String>,
    ) -> Self {
        Self {
            network,
            base_url: None,
            account_address: account_address.into(),
            agent_wallet_address: agent_wallet_address.into(),
            agent_private_key: agent_private_key.into(),
            signing_scheme: SigningScheme::default(),
            key_encoding: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    pub fn with_signing_scheme(mut self, scheme: SigningScheme) -> Self {
        self.signing_scheme = scheme;
        self
    }

    pub fn with_key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.key_encoding = Some(encoding);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Load configuration from environment variables.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let network = match env::var("PACIFICA_NETWORK") {
            Ok(value) => value.parse()?,
            Err(_) => Network::default(),
        };
        let signing_scheme = match env::var("PACIFICA_SIGNING_SCHEME") {
            Ok(value) => value.parse()?,
            Err(_) => SigningScheme::default(),
        };
        let key_encoding = env::var("PACIFICA_KEY_ENCODING")
            .ok()
            .map(|value| value.parse())
            .transpose()?;

        Ok(Self {
            network,
            base_url: env::var("PACIFICA_BASE_URL").ok(),
            account_address: required_var("PACIFICA_ACCOUNT_ADDRESS")?,
            agent_wallet_address: required_var("PACIFICA_AGENT_WALLET_ADDRESS")?,
            agent_private_key: required_var("PACIFICA_AGENT_PRIVATE_KEY")?,
            signing_scheme,
            key_encoding,
            request_timeout_secs: env::var("PACIFICA_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_request_timeout_secs),
            connect_timeout_secs: env::var("PACIFICA_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_connect_timeout_secs),
        })
    }

    /// Load configuration from a file, with `PACIFICA_*` environment
    /// variables taking precedence.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("PACIFICA").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Base host for all requests.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.network.base_url())
    }

    /// Encoding used to decode `agent_private_key`.
    pub fn key_encoding(&self) -> KeyEncoding {
        self.key_encoding
            .unwrap_or_else(|| self.signing_scheme.default_key_encoding())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config {
        message: format!("{name} environment variable not set"),
    })
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("network", &self.network)
            .field("base_url", &self.base_url())
            .field("account_address", &self.account_address)
            .field("agent_wallet_address", &self.agent_wallet_address)
            .field("agent_private_key", &"[REDACTED]")
            .field("signing_scheme", &self.signing_scheme)
            .field("key_encoding", &self.key_encoding())
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_network_base_urls() {
        let config = Config::new(Network::Mainnet, "acct", "agent", "key");
        assert_eq!(config.base_url(), "https://api.pacifica.fi");

        let config = Config::new(Network::Testnet, "acct", "agent", "key");
        assert_eq!(config.base_url(), "https://test-api.pacifica.fi");

        let config = config.with_base_url("http://127.0.0.1:9000");
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("MAINNET".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!(" testnet ".parse::<Network>().unwrap(), Network::Testnet);
        assert!("devnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_key_encoding_defaults_follow_scheme() {
        let config = Config::new(Network::Mainnet, "acct", "agent", "key");
        assert_eq!(config.key_encoding(), KeyEncoding::Base58);

        let config = config.with_signing_scheme(SigningScheme::Wallet);
        assert_eq!(config.key_encoding(), KeyEncoding::Hex);

        let config = config.with_key_encoding(KeyEncoding::Base58);
        assert_eq!(config.key_encoding(), KeyEncoding::Base58);
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = Config::new(Network::Mainnet, "acct", "agent", "super-secret-key");
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super-secret-key"));
    }

    #[test]
    fn test_from_file_applies_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
network = "testnet"
account_address = "acct-file"
agent_wallet_address = "agent-file"
agent_private_key = "secret"
signing_scheme = "wallet"
request_timeout_secs = 5
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.signing_scheme, SigningScheme::Wallet);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.key_encoding(), KeyEncoding::Hex);
    }
}
