//! Configuration from the environment.
//!
//! - `ANTHROPIC_API_KEY` - Required. Key for the completion service.
//! - `SOLUTION_LOOP_MODEL` - Optional. Model id. Defaults to `claude-sonnet-4-20250514`.
//! - `SOLUTION_LOOP_TIMEOUT_SECS` - Optional. Per-call timeout. Defaults to `60`.
//! - `SOLUTION_LOOP_CANDIDATES` - Optional. Approaches per generation. Defaults to `5`.
//! - `SOLUTION_LOOP_ROUNDS` - Optional. Refinement rounds. Defaults to `1`.
//! - `EXA_API_KEY` - Optional. Enables the search tools.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::llm::DEFAULT_MODEL;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub candidates: usize,
    pub rounds: usize,
    pub exa_api_key: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// `MissingEnvVar` when `ANTHROPIC_API_KEY` is unset, `InvalidValue`
    /// when a numeric setting does not parse or the candidate count is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reading from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".to_string()))?;

        let model = lookup("SOLUTION_LOOP_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs: u64 = parse_or(&lookup, "SOLUTION_LOOP_TIMEOUT_SECS", 60)?;
        let candidates: usize = parse_or(&lookup, "SOLUTION_LOOP_CANDIDATES", 5)?;
        if candidates == 0 {
            return Err(ConfigError::InvalidValue(
                "SOLUTION_LOOP_CANDIDATES".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let rounds: usize = parse_or(&lookup, "SOLUTION_LOOP_ROUNDS", 1)?;

        Ok(Self {
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
            candidates,
            rounds,
            exa_api_key: lookup("EXA_API_KEY").filter(|k| !k.trim().is_empty()),
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("{e}"))),
    }
}
