use std::path::{Path, PathBuf};

use analysis_core::{AnalysisError, AnalystEstimate, EstimateProvider, PriceBar, PriceProvider};
use async_trait::async_trait;
use chrono::Duration;
use estimate_aggregator::{EarningsObservation, EpsMultipleModel};
use serde::{Deserialize, Serialize};

/// Trailing EPS and the history used for the P/E band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub eps: f64,
    #[serde(default)]
    pub history: Vec<EarningsObservation>,
}

/// On-disk layout of `<DATA_DIR>/<SYMBOL>.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentFile {
    #[serde(default)]
    pub bars: Vec<PriceBar>,
    #[serde(default)]
    pub estimates: Vec<AnalystEstimate>,
    #[serde(default)]
    pub fundamentals: Option<Fundamentals>,
}

/// Serves bars and estimates from one JSON file per symbol.
///
/// When the file carries fundamentals, an EPS-multiple estimate is appended
/// to the published ones.
pub struct JsonFileProvider {
    data_dir: PathBuf,
    eps_model: EpsMultipleModel,
}

impl JsonFileProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            eps_model: EpsMultipleModel::default(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", symbol))
    }

    pub async fn load(&self, symbol: &str) -> Result<InstrumentFile, AnalysisError> {
        let path = self.path_for(symbol);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AnalysisError::Provider(format!("failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| AnalysisError::Provider(format!("failed to parse {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl PriceProvider for JsonFileProvider {
    async fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<PriceBar>, AnalysisError> {
        let mut bars = self.load(symbol).await?.bars;
        if let Some(latest) = bars.last().map(|b| b.date) {
            let cutoff = latest - Duration::days(lookback_days as i64);
            bars.retain(|b| b.date > cutoff);
        }
        tracing::debug!("Loaded {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }
}

#[async_trait]
impl EstimateProvider for JsonFileProvider {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn fetch_estimates(&self, symbol: &str) -> Result<Vec<AnalystEstimate>, AnalysisError> {
        let file = self.load(symbol).await?;
        let mut estimates = file.estimates;

        if let (Some(fundamentals), Some(latest)) = (&file.fundamentals, file.bars.last()) {
            match self
                .eps_model
                .estimate(latest.close, fundamentals.eps, &fundamentals.history, latest.date)
            {
                Ok(estimate) => estimates.push(estimate),
                Err(e) => tracing::warn!("Skipping EPS-multiple estimate for {}: {}", symbol, e),
            }
        }

        Ok(estimates)
    }
}
