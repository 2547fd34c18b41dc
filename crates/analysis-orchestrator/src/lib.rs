use std::sync::Arc;
use std::time::Duration;

use analysis_core::validation::validate_bars;
use analysis_core::{
    normalize_symbol, AnalysisError, AnalystEstimate, EngineConfig, EstimateProvider, PriceBar,
    PriceProvider, SignalReport, SymbolInfo,
};
use chrono::NaiveDate;
use estimate_aggregator::{EstimateAggregator, EstimateReport};
use serde::Serialize;
use technical_analysis::{assess_conditions, build_snapshots, MarketConditions, SignalEngine};
use tokio::time::timeout;

pub mod batch;
pub mod config;
pub mod providers;

pub use batch::{rank, BatchAnalyzer, BatchFailure, BatchResult};
pub use config::OrchestratorConfig;
pub use providers::{Fundamentals, InstrumentFile, JsonFileProvider};

/// Everything fetched for one symbol, before any computation runs
#[derive(Debug, Clone)]
pub struct InstrumentInput {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub estimates: Vec<AnalystEstimate>,
}

/// Signal and estimate results for one symbol
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentAnalysis {
    pub symbol: SymbolInfo,
    pub as_of: NaiveDate,
    pub current_price: f64,
    pub signals: SignalReport,
    pub conditions: Option<MarketConditions>,
    pub estimates: EstimateReport,
}

/// Runs the fetch → compute → aggregate pipeline for single symbols.
///
/// Fetching is async and bounded by a timeout per provider call; the
/// computation itself is synchronous and touches no shared state.
pub struct AnalysisOrchestrator {
    prices: Arc<dyn PriceProvider>,
    estimate_sources: Vec<Arc<dyn EstimateProvider>>,
    signal_engine: SignalEngine,
    aggregator: EstimateAggregator,
    lookback_days: u32,
    fetch_timeout: Duration,
}

impl AnalysisOrchestrator {
    pub fn new(prices: Arc<dyn PriceProvider>) -> Self {
        Self {
            prices,
            estimate_sources: Vec::new(),
            signal_engine: SignalEngine::default(),
            aggregator: EstimateAggregator::default(),
            lookback_days: 365,
            fetch_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(prices: Arc<dyn PriceProvider>, config: &OrchestratorConfig) -> Self {
        Self::new(prices)
            .with_engine_config(config.engine_config())
            .with_lookback_days(config.lookback_days)
            .with_fetch_timeout(config.fetch_timeout())
    }

    pub fn with_estimate_source(mut self, source: Arc<dyn EstimateProvider>) -> Self {
        self.estimate_sources.push(source);
        self
    }

    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.signal_engine = SignalEngine::new(config);
        self.aggregator = EstimateAggregator::new(config);
        self
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Fetch bars and every source's estimates for one symbol.
    ///
    /// A failing or slow price provider fails the symbol. A failing estimate
    /// source is logged and skipped so the remaining sources still count.
    pub async fn fetch(&self, symbol: &str) -> Result<InstrumentInput, AnalysisError> {
        let symbol = normalize_symbol(symbol)?;

        let bars = timeout(self.fetch_timeout, self.prices.fetch_bars(&symbol, self.lookback_days))
            .await
            .map_err(|_| {
                AnalysisError::Timeout(format!(
                    "price fetch for {} exceeded {}s",
                    symbol,
                    self.fetch_timeout.as_secs_f64()
                ))
            })??;

        let mut estimates = Vec::new();
        for source in &self.estimate_sources {
            match timeout(self.fetch_timeout, source.fetch_estimates(&symbol)).await {
                Ok(Ok(mut fetched)) => {
                    tracing::debug!("{} returned {} estimates for {}", source.name(), fetched.len(), symbol);
                    estimates.append(&mut fetched);
                }
                Ok(Err(e)) => tracing::warn!("Estimate source {} failed for {}: {}", source.name(), symbol, e),
                Err(_) => tracing::warn!("Estimate source {} timed out for {}", source.name(), symbol),
            }
        }

        Ok(InstrumentInput {
            symbol,
            bars,
            estimates,
        })
    }

    /// Pure computation over already-fetched inputs.
    pub fn analyze_input(&self, input: &InstrumentInput) -> Result<InstrumentAnalysis, AnalysisError> {
        let symbol = SymbolInfo::from_symbol(&input.symbol)?;
        validate_bars(&input.bars)?;

        let latest = input.bars.last().ok_or(AnalysisError::InsufficientData {
            required: self.signal_engine.config().min_lookback,
            available: 0,
        })?;

        let snapshots = build_snapshots(&input.bars);
        let signals = self.signal_engine.compute_signals(&snapshots)?;
        let conditions = assess_conditions(&snapshots);
        let estimates = self.aggregator.aggregate(&input.estimates, latest.close)?;

        tracing::info!(
            "{}: {} ({:.2}) from {} bars, {} estimate sources",
            symbol.symbol,
            signals.current.signal,
            signals.current.raw_score,
            input.bars.len(),
            estimates.sources.len()
        );

        Ok(InstrumentAnalysis {
            symbol,
            as_of: latest.date,
            current_price: latest.close,
            signals,
            conditions,
            estimates,
        })
    }

    pub async fn analyze(&self, symbol: &str) -> Result<InstrumentAnalysis, AnalysisError> {
        let input = self.fetch(symbol).await?;
        self.analyze_input(&input)
    }
}
