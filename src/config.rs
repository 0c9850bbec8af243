//! Runtime settings read from the environment (and a local `.env`).

use crate::statics;
use std::{path::PathBuf, time::Duration};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Workflow service base URL without a trailing `/`.
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub workflow_id: Option<String>,
    pub run_endpoint: String,
    /// Run-detail path template containing [`statics::RUN_ID_PLACEHOLDER`].
    pub detail_endpoint: String,
    pub user: String,
    pub timeout: Duration,
    /// Holds `saves.json` and the session keys.
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout_secs = match get(statics::ENV_TIMEOUT_SECS) {
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid {}, using default", statics::ENV_TIMEOUT_SECS);
                statics::DEFAULT_TIMEOUT_SECS
            }),
            None => statics::DEFAULT_TIMEOUT_SECS,
        };

        let base = get(statics::ENV_API_BASE_URL)
            .unwrap_or_else(|| statics::DEFAULT_API_BASE_URL.to_string());

        Self {
            api_base_url: base.trim_end_matches('/').to_string(),
            api_key: get(statics::ENV_API_KEY),
            workflow_id: get(statics::ENV_WORKFLOW_ID),
            run_endpoint: get(statics::ENV_RUN_ENDPOINT)
                .unwrap_or_else(|| statics::DEFAULT_RUN_ENDPOINT.to_string()),
            detail_endpoint: get(statics::ENV_DETAIL_ENDPOINT)
                .unwrap_or_else(|| statics::DEFAULT_DETAIL_ENDPOINT.to_string()),
            user: get(statics::ENV_USER).unwrap_or_else(|| statics::DEFAULT_USER.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            data_dir: PathBuf::from(
                get(statics::ENV_DATA_DIR).unwrap_or_else(|| statics::DEFAULT_DATA_DIR.to_string()),
            ),
        }
    }

    pub fn saves_path(&self) -> PathBuf {
        self.data_dir.join(statics::SAVES_FILE_NAME)
    }

    /// Session keys live next to the saves file.
    pub fn session_dir(&self) -> PathBuf {
        self.data_dir.join(statics::SESSION_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.api_base_url, "https://api.dify.ai");
        assert_eq!(config.api_key, None);
        assert_eq!(config.run_endpoint, "/v1/workflows/run");
        assert_eq!(config.detail_endpoint, "/v1/workflows/run/{workflow_run_id}");
        assert_eq!(config.user, "purchases-maintenance-app");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.saves_path(), PathBuf::from("data").join("saves.json"));
    }

    #[test]
    fn overrides_are_trimmed_and_blank_means_unset() {
        let vars: HashMap<&str, &str> = [
            ("DIFY_API_BASE_URL", "http://localhost:5001/"),
            ("DIFY_API_KEY", " app-123 "),
            ("DIFY_WORKFLOW_ID", ""),
            ("DIFY_TIMEOUT_SECS", "5"),
            ("ORDER_INTAKE_DATA_DIR", "/tmp/orders"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_base_url, "http://localhost:5001");
        assert_eq!(config.api_key.as_deref(), Some("app-123"));
        assert_eq!(config.workflow_id, None);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/orders"));
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        let config = AppConfig::from_lookup(|k| (k == "DIFY_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }
}
