use async_trait::async_trait;
use crate::{AnalysisError, AnalystEstimate, PriceBar};

/// Source of daily bars for a symbol
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Bars covering roughly the last `lookback_days`, ascending by date.
    async fn fetch_bars(&self, symbol: &str, lookback_days: u32) -> Result<Vec<PriceBar>, AnalysisError>;
}

/// Source of 1-year analyst estimates.
///
/// A provider may return records from several named sources; an empty vector
/// means nothing is published for the symbol.
#[async_trait]
pub trait EstimateProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_estimates(&self, symbol: &str) -> Result<Vec<AnalystEstimate>, AnalysisError>;
}
