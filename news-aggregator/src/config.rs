//! Process configuration read from the environment.
//!
//! The generative-service credential is mandatory and checked here, once,
//! so a misconfigured process fails before serving anything.

use crate::types::{AggregatorError, EnrichmentConfig, FetchConfig, Result};
use std::collections::HashMap;
use std::env;
use std::path::Path;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const RETRIES_VAR: &str = "OPENAI_RETRIES";
pub const USER_AGENT_VAR: &str = "USER_AGENT";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub enrichment: EnrichmentConfig,
}

impl AppConfig {
    /// Load a `.env` file from the working directory (if any), then read the environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Process environment first, then the variables of a `.env` style file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let file_vars = read_env_file(path.as_ref())?;
        Self::from_lookup(|name| env::var(name).ok().or_else(|| file_vars.get(name).cloned()))
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var(API_KEY_VAR)
            .ok_or_else(|| AggregatorError::Config(format!("{} is required for enrichment", API_KEY_VAR)))?;

        let mut enrichment = EnrichmentConfig::new(api_key);
        if let Some(model) = var(MODEL_VAR) {
            enrichment.model = model;
        }
        if let Some(base_url) = var(BASE_URL_VAR) {
            enrichment.base_url = base_url;
        }
        if let Some(retries) = var(RETRIES_VAR) {
            enrichment.retries = retries.parse().map_err(|_| {
                AggregatorError::Config(format!("{} must be a non-negative integer, got '{}'", RETRIES_VAR, retries))
            })?;
        }

        let mut fetch = FetchConfig::default();
        if let Some(user_agent) = var(USER_AGENT_VAR) {
            fetch.user_agent = user_agent;
        }

        Ok(Self { fetch, enrichment })
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let unreadable = |e: dotenv::Error| AggregatorError::Config(format!("unable to read {}: {}", path.display(), e));
    dotenv::from_path_iter(path)
        .map_err(unreadable)?
        .map(|item| item.map_err(unreadable))
        .collect()
}
