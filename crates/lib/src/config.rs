//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.warelay/config.json`) once at
//! startup; environment variables override file values. Only the completion
//! API key is required — everything else has a default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Completion service settings (API key, endpoint, model).
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Relay behavior (prefix gate, fallback reply).
    #[serde(default)]
    pub relay: RelayConfig,

    /// WhatsApp transport settings (session directory).
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// Completion service config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionConfig {
    /// API key for the completion service. Overridden by OPENAI_API_KEY env when set.
    pub api_key: Option<String>,
    /// Base URL override for the completion endpoint. Overridden by OPENAI_API_BASE env.
    pub base_url: Option<String>,
    /// Model identifier to request. Overridden by OPENAI_MODEL env.
    pub model: Option<String>,
}

/// Relay behavior config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Literal prefix gating which messages get a reply (e.g. "!gpt ").
    /// Empty or absent means "respond to every qualifying message".
    /// Overridden by WARELAY_PREFIX env when set.
    pub prefix: Option<String>,
    /// Reply sent in place of a completion when the completion call fails.
    pub fallback_reply: Option<String>,
}

/// WhatsApp transport config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    /// Directory holding the transport session state (default ~/.warelay/session).
    pub session_dir: Option<PathBuf>,
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the completion API key: env OPENAI_API_KEY overrides config.
/// None means startup must fail.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    env_override("OPENAI_API_KEY").or_else(|| {
        config
            .completion
            .api_key
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve the completion endpoint base URL override, if any: env
/// OPENAI_API_BASE overrides config; None means the client default.
pub fn resolve_base_url(config: &Config) -> Option<String> {
    env_override("OPENAI_API_BASE").or_else(|| {
        config
            .completion
            .base_url
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve the model identifier: env OPENAI_MODEL overrides config, falling
/// back to the baseline model.
pub fn resolve_model(config: &Config) -> String {
    env_override("OPENAI_MODEL")
        .or_else(|| {
            config
                .completion
                .model
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| crate::llm::DEFAULT_MODEL.to_string())
}

/// Resolve the message prefix: env WARELAY_PREFIX overrides config. Empty
/// string means every qualifying message is answered. The prefix is a literal
/// and is not trimmed — a trailing space in "!gpt " is significant.
pub fn resolve_prefix(config: &Config) -> String {
    std::env::var("WARELAY_PREFIX")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| config.relay.prefix.clone().filter(|s| !s.is_empty()))
        .unwrap_or_default()
}

/// Resolve the fallback reply text sent when the completion call fails.
pub fn resolve_fallback_reply(config: &Config) -> String {
    config
        .relay
        .fallback_reply
        .as_ref()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| crate::relay::DEFAULT_FALLBACK_REPLY.to_string())
}

/// Resolve the transport session directory (default ~/.warelay/session).
pub fn resolve_session_dir(config: &Config) -> PathBuf {
    config.whatsapp.session_dir.clone().unwrap_or_else(|| {
        dirs::home_dir()
            .map(|h| h.join(".warelay").join("session"))
            .unwrap_or_else(|| PathBuf::from("session"))
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("WARELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".warelay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or WARELAY_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_absent_by_default() {
        // No key anywhere means startup must fail.
        let config = Config::default();
        assert_eq!(resolve_api_key(&config), None);
    }

    #[test]
    fn api_key_from_config() {
        let mut config = Config::default();
        config.completion.api_key = Some("sk-test".to_string());
        assert_eq!(resolve_api_key(&config), Some("sk-test".to_string()));
    }

    #[test]
    fn blank_config_api_key_counts_as_absent() {
        let mut config = Config::default();
        config.completion.api_key = Some("   ".to_string());
        assert_eq!(resolve_api_key(&config), None);
    }

    #[test]
    fn default_model_is_baseline() {
        let config = Config::default();
        assert_eq!(resolve_model(&config), crate::llm::DEFAULT_MODEL);
    }

    #[test]
    fn model_from_config() {
        let mut config = Config::default();
        config.completion.model = Some("gpt-4o-mini".to_string());
        assert_eq!(resolve_model(&config), "gpt-4o-mini");
    }

    #[test]
    fn prefix_defaults_to_empty() {
        let config = Config::default();
        assert_eq!(resolve_prefix(&config), "");
    }

    #[test]
    fn prefix_keeps_trailing_space() {
        let mut config = Config::default();
        config.relay.prefix = Some("!gpt ".to_string());
        assert_eq!(resolve_prefix(&config), "!gpt ");
    }

    #[test]
    fn fallback_reply_defaults() {
        let config = Config::default();
        assert_eq!(
            resolve_fallback_reply(&config),
            crate::relay::DEFAULT_FALLBACK_REPLY
        );
    }

    #[test]
    fn session_dir_override() {
        let mut config = Config::default();
        config.whatsapp.session_dir = Some(PathBuf::from("/tmp/wa-session"));
        assert_eq!(resolve_session_dir(&config), PathBuf::from("/tmp/wa-session"));
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"{
            "completion": { "apiKey": "sk-test", "baseUrl": "http://localhost:8080/v1", "model": "local" },
            "relay": { "prefix": "!gpt ", "fallbackReply": "sorry" },
            "whatsapp": { "sessionDir": "auth" }
        }"#;
        let config: Config = serde_json::from_str(json).expect("parse config");
        assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            config.completion.base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert_eq!(config.relay.prefix.as_deref(), Some("!gpt "));
        assert_eq!(config.relay.fallback_reply.as_deref(), Some("sorry"));
        assert_eq!(config.whatsapp.session_dir, Some(PathBuf::from("auth")));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = serde_json::from_str("{}").expect("parse empty config");
        assert!(config.completion.api_key.is_none());
        assert_eq!(resolve_prefix(&config), "");
        assert_eq!(resolve_model(&config), crate::llm::DEFAULT_MODEL);
    }
}
