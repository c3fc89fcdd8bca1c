use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Fixed answer when a pipeline is used before its valves are set.
pub const VALVES_REFUSAL: &str = "Please set ALL the valves before using this pipeline.";

/// Placeholder value deployments use for "not configured yet".
pub const UNDEFINED: &str = "UNDEFINED";

/// A named pipeline setting read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Valve {
    ApiKey,
    Endpoint,
    ModelNameChat,
    ModelNameAnalyze,
    TokenLimitChat,
    TokenLimitAnalyze,
}

impl Valve {
    pub const ALL: [Valve; 6] = [
        Valve::ApiKey,
        Valve::Endpoint,
        Valve::ModelNameChat,
        Valve::ModelNameAnalyze,
        Valve::TokenLimitChat,
        Valve::TokenLimitAnalyze,
    ];

    /// Environment variable holding this valve.
    pub fn env_key(&self) -> &'static str {
        match self {
            Valve::ApiKey => "UTC_API_KEY",
            Valve::Endpoint => "UTC_ENDPOINT",
            Valve::ModelNameChat => "MODEL_NAME_CHAT",
            Valve::ModelNameAnalyze => "MODEL_NAME_ANALYZE",
            Valve::TokenLimitChat => "TOKEN_LIMIT_CHAT",
            Valve::TokenLimitAnalyze => "TOKEN_LIMIT_ANALYZE",
        }
    }

    fn is_secret(&self) -> bool {
        matches!(self, Valve::ApiKey)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValveError {
    #[error("valves not set: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("valve {valve} is not a number: {value:?}")]
    NotANumber { valve: &'static str, value: String },
}

/// Pipeline settings, as raw strings. Validation happens per pipeline, at
/// turn time, so a half-configured deployment still starts and answers with
/// [`VALVES_REFUSAL`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Valves {
    pub api_key: String,
    pub endpoint: String,
    pub model_name_chat: String,
    pub model_name_analyze: String,
    pub token_limit_chat: String,
    pub token_limit_analyze: String,
}

impl Valves {
    /// Read every valve from the process environment; unset ones are empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut valves = Self::default();
        for valve in Valve::ALL {
            if let Some(value) = lookup(valve.env_key()) {
                *valves.slot(valve) = value;
            }
        }
        valves
    }

    pub fn get(&self, valve: Valve) -> &str {
        match valve {
            Valve::ApiKey => &self.api_key,
            Valve::Endpoint => &self.endpoint,
            Valve::ModelNameChat => &self.model_name_chat,
            Valve::ModelNameAnalyze => &self.model_name_analyze,
            Valve::TokenLimitChat => &self.token_limit_chat,
            Valve::TokenLimitAnalyze => &self.token_limit_analyze,
        }
    }

    fn slot(&mut self, valve: Valve) -> &mut String {
        match valve {
            Valve::ApiKey => &mut self.api_key,
            Valve::Endpoint => &mut self.endpoint,
            Valve::ModelNameChat => &mut self.model_name_chat,
            Valve::ModelNameAnalyze => &mut self.model_name_analyze,
            Valve::TokenLimitChat => &mut self.token_limit_chat,
            Valve::TokenLimitAnalyze => &mut self.token_limit_analyze,
        }
    }

    pub fn is_set(&self, valve: Valve) -> bool {
        let value = self.get(valve).trim();
        !value.is_empty() && value != UNDEFINED
    }

    /// Fail with the list of required valves that are unset or `UNDEFINED`.
    pub fn require(&self, required: &[Valve]) -> Result<(), ValveError> {
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|v| !self.is_set(**v))
            .map(Valve::env_key)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValveError::Missing(missing))
        }
    }

    /// Parse a token-limit valve.
    pub fn token_limit(&self, valve: Valve) -> Result<usize, ValveError> {
        let raw = self.get(valve).trim();
        raw.parse().map_err(|_| ValveError::NotANumber {
            valve: valve.env_key(),
            value: raw.to_string(),
        })
    }

    /// `(env key, display value)` pairs with secrets masked.
    pub fn masked(&self) -> Vec<(&'static str, String)> {
        Valve::ALL
            .iter()
            .map(|valve| {
                let value = self.get(*valve);
                let shown = if value.is_empty() {
                    "(empty)".to_string()
                } else if valve.is_secret() {
                    let show: String = value.chars().take(4).collect();
                    let hidden = value.chars().count().saturating_sub(4);
                    format!("{}{}", show, "*".repeat(hidden))
                } else {
                    value.to_string()
                };
                (valve.env_key(), shown)
            })
            .collect()
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Replaces the embedded helpdesk knowledge base when set
    pub knowledge_base_path: Option<PathBuf>,
    pub valves: Valves,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "9099".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            knowledge_base_path: env::var("KNOWLEDGE_BASE_PATH").ok().map(PathBuf::from),
            valves: Valves::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valves(pairs: &[(&str, &str)]) -> Valves {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Valves::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_from_lookup_fills_known_keys() {
        let v = valves(&[("UTC_ENDPOINT", "https://llm.utc.fr/v1"), ("TOKEN_LIMIT_CHAT", "4000")]);
        assert_eq!(v.endpoint, "https://llm.utc.fr/v1");
        assert_eq!(v.token_limit_chat, "4000");
        assert_eq!(v.api_key, "");
    }

    #[test]
    fn test_require_reports_unset_and_sentinel() {
        let v = valves(&[
            ("UTC_API_KEY", "sk-1"),
            ("UTC_ENDPOINT", "UNDEFINED"),
            ("MODEL_NAME_CHAT", "  "),
        ]);
        let err = v
            .require(&[Valve::ApiKey, Valve::Endpoint, Valve::ModelNameChat])
            .unwrap_err();
        assert_eq!(err, ValveError::Missing(vec!["UTC_ENDPOINT", "MODEL_NAME_CHAT"]));
        assert!(v.require(&[Valve::ApiKey]).is_ok());
    }

    #[test]
    fn test_token_limit_parsing() {
        let v = valves(&[("TOKEN_LIMIT_CHAT", " 8000 "), ("TOKEN_LIMIT_ANALYZE", "lots")]);
        assert_eq!(v.token_limit(Valve::TokenLimitChat), Ok(8000));
        assert_eq!(
            v.token_limit(Valve::TokenLimitAnalyze),
            Err(ValveError::NotANumber {
                valve: "TOKEN_LIMIT_ANALYZE",
                value: "lots".into()
            })
        );
    }

    #[test]
    fn test_masked_hides_api_key() {
        let v = valves(&[("UTC_API_KEY", "sk-abcdef"), ("MODEL_NAME_CHAT", "mistral")]);
        let masked: HashMap<_, _> = v.masked().into_iter().collect();
        assert_eq!(masked["UTC_API_KEY"], "sk-a*****");
        assert_eq!(masked["MODEL_NAME_CHAT"], "mistral");
        assert_eq!(masked["UTC_ENDPOINT"], "(empty)");
    }
}
