//! Compiler configuration

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Day-of-month used for the end of a `between <month> <year> and <month> <year>` range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BetweenEndDay {
    /// Always day 3 of the end month
    #[default]
    ReferencePad,
    FirstOfMonth,
    LastOfMonth,
}

impl BetweenEndDay {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "reference_pad" => Some(BetweenEndDay::ReferencePad),
            "first_of_month" => Some(BetweenEndDay::FirstOfMonth),
            "last_of_month" => Some(BetweenEndDay::LastOfMonth),
            _ => None,
        }
    }
}

/// Tunables for the compiler. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Row limit for filter and search queries
    pub list_limit: u32,
    /// Row limit for most-watched and highest-rated queries
    pub ranked_limit: u32,
    pub between_end_day: BetweenEndDay,
    /// Year that, with "after" or "from" and no month, opens a range at January 1st
    pub open_year_fallback: i32,
    /// Utterances up to this many words with no movie keyword count as greetings
    pub max_short_utterance_words: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            list_limit: 20,
            ranked_limit: 10,
            between_end_day: BetweenEndDay::default(),
            open_year_fallback: 2025,
            max_short_utterance_words: 2,
        }
    }
}

impl CompilerConfig {
    /// Load configuration from a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `NQL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("NQL_LIST_LIMIT") {
            config.list_limit = parse_number("NQL_LIST_LIMIT", &v)?;
        }
        if let Some(v) = lookup("NQL_RANKED_LIMIT") {
            config.ranked_limit = parse_number("NQL_RANKED_LIMIT", &v)?;
        }
        if let Some(v) = lookup("NQL_OPEN_YEAR_FALLBACK") {
            config.open_year_fallback = parse_number("NQL_OPEN_YEAR_FALLBACK", &v)?;
        }
        if let Some(v) = lookup("NQL_BETWEEN_END_DAY") {
            config.between_end_day =
                BetweenEndDay::parse(&v).ok_or_else(|| ConfigError::Invalid {
                    key: "NQL_BETWEEN_END_DAY",
                    message: format!("unknown policy '{}'", v),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.list_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "list_limit",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.ranked_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "ranked_limit",
                message: "must be greater than zero".to_string(),
            });
        }
        if !(1000..=9999).contains(&self.open_year_fallback) {
            return Err(ConfigError::Invalid {
                key: "open_year_fallback",
                message: format!("{} is not a four-digit year", self.open_year_fallback),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        message: format!("'{}' is not a number", value),
    })
}
