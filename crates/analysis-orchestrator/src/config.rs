use anyhow::{bail, Context, Result};
use analysis_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    // Fetching
    pub lookback_days: u32,        // 365
    pub fetch_timeout_secs: u64,   // 30
    pub batch_concurrency: usize,  // 8

    // Signal summary
    pub summary_window: usize,     // 30

    // Inputs
    pub watchlist: Vec<String>,
    pub data_dir: PathBuf,
    pub simulated_estimates: bool, // add the simulated source next to file estimates
}

impl OrchestratorConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            lookback_days: var("LOOKBACK_DAYS", "365")
                .parse()
                .context("LOOKBACK_DAYS must be a positive integer")?,
            fetch_timeout_secs: var("FETCH_TIMEOUT_SECS", "30")
                .parse()
                .context("FETCH_TIMEOUT_SECS must be a positive integer")?,
            batch_concurrency: var("BATCH_CONCURRENCY", "8")
                .parse()
                .context("BATCH_CONCURRENCY must be a positive integer")?,
            summary_window: var("SUMMARY_WINDOW", "30")
                .parse()
                .context("SUMMARY_WINDOW must be a positive integer")?,
            watchlist: var("WATCHLIST", "AAPL,MSFT,TSLA,2330.TW,2317.TW,BTC-USD")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            data_dir: PathBuf::from(var("DATA_DIR", "./data")),
            simulated_estimates: var("SIMULATED_ESTIMATES", "true")
                .parse()
                .context("SIMULATED_ESTIMATES must be true or false")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            bail!("LOOKBACK_DAYS must be greater than 0");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("FETCH_TIMEOUT_SECS must be greater than 0");
        }
        if self.batch_concurrency == 0 {
            bail!("BATCH_CONCURRENCY must be greater than 0");
        }
        if self.summary_window == 0 {
            bail!("SUMMARY_WINDOW must be greater than 0");
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default().with_summary_window(self.summary_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<OrchestratorConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        OrchestratorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.lookback_days, 365);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.batch_concurrency, 8);
        assert_eq!(config.summary_window, 30);
        assert_eq!(config.watchlist.len(), 6);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(config.simulated_estimates);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LOOKBACK_DAYS", "200"),
            ("SUMMARY_WINDOW", "10"),
            ("WATCHLIST", " aapl , msft,, "),
            ("SIMULATED_ESTIMATES", "false"),
        ])
        .unwrap();
        assert_eq!(config.lookback_days, 200);
        assert_eq!(config.watchlist, vec!["aapl".to_string(), "msft".to_string()]);
        assert_eq!(config.engine_config().summary_window, 10);
        assert!(!config.simulated_estimates);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("BATCH_CONCURRENCY", "0")]).is_err());
        assert!(config_from(&[("FETCH_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("LOOKBACK_DAYS", "-1")]).is_err());
    }
}
