use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{BearychatError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "bearychat.toml";
pub const ENV_PREFIX: &str = "BEARYCHAT_";
pub const DEFAULT_MOCK_WEBHOOK: &str = "http://127.0.0.1:3927/=bwaaa/incoming/deadbeef";

/// Top-level config (bearychat.toml + BEARYCHAT_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BearychatConfig {
    #[serde(default)]
    pub incoming: IncomingConfig,
    #[serde(default)]
    pub mock: MockConfig,
}

/// Defaults for outgoing Incoming messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingConfig {
    /// Webhook url copied from the robot settings page.
    pub webhook: Option<String>,
    pub channel: Option<String>,
    pub user: Option<String>,
    #[serde(default)]
    pub markdown: bool,
}

/// Mock Incoming server used for local testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// The server listens on this url's authority and serves only its path.
    #[serde(default = "default_mock_webhook")]
    pub webhook: String,
    /// When set, every request is answered with this application error.
    pub fail: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            webhook: default_mock_webhook(),
            fail: None,
        }
    }
}

fn default_mock_webhook() -> String {
    DEFAULT_MOCK_WEBHOOK.to_string()
}

impl BearychatConfig {
    /// Load config from a TOML file with BEARYCHAT_* env var overrides.
    ///
    /// A missing file is not an error; defaults fill every field.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

        Self::extract(
            Figment::new()
                .merge(Toml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("_")),
        )
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| BearychatError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_empty() {
        let config = BearychatConfig::extract(Figment::new()).unwrap();
        assert!(config.incoming.webhook.is_none());
        assert!(!config.incoming.markdown);
        assert_eq!(config.mock.webhook, DEFAULT_MOCK_WEBHOOK);
        assert!(config.mock.fail.is_none());
    }

    #[test]
    fn reads_sections_from_toml() {
        let toml = r#"
            [incoming]
            webhook = "https://hook.bearychat.com/=bw8NI/incoming/abc"
            channel = "ops"
            markdown = true

            [mock]
            fail = "foobar"
        "#;
        let config = BearychatConfig::extract(Figment::new().merge(Toml::string(toml))).unwrap();
        assert_eq!(
            config.incoming.webhook.as_deref(),
            Some("https://hook.bearychat.com/=bw8NI/incoming/abc")
        );
        assert_eq!(config.incoming.channel.as_deref(), Some("ops"));
        assert!(config.incoming.markdown);
        assert_eq!(config.mock.fail.as_deref(), Some("foobar"));
        assert_eq!(config.mock.webhook, DEFAULT_MOCK_WEBHOOK);
    }

    #[test]
    fn wrong_type_is_config_error() {
        let toml = "[incoming]\nmarkdown = \"yes please\"\n";
        let err = BearychatConfig::extract(Figment::new().merge(Toml::string(toml))).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn load_reads_file_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[incoming]\nuser = \"=bw52O\"").unwrap();

        let config = BearychatConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.incoming.user.as_deref(), Some("=bw52O"));
    }
}
