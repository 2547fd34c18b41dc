//! Valuation-based estimate source: next year's EPS priced at the stock's
//! historical P/E band.
//!
//! Used when a symbol has earnings history but little or no analyst coverage.
//! The result is an ordinary 1y `AnalystEstimate` and is aggregated like any
//! other source.

use analysis_core::numeric::{max, mean, median, min, population_std_dev};
use analysis_core::{AnalysisError, AnalystEstimate, Horizon, RecommendationCounts};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const EPS_MODEL_SOURCE_ID: &str = "eps_multiple";

/// Price and trailing EPS on one reporting date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarningsObservation {
    pub date: NaiveDate,
    pub price: f64,
    pub eps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeStatistics {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    pub std_dev: f64,
    pub count: usize,
}

pub fn pe_ratio(price: f64, eps: f64) -> Option<f64> {
    if eps > 0.0 && price > 0.0 {
        Some(price / eps)
    } else {
        None
    }
}

/// P/E distribution over the observations with positive earnings.
pub fn historical_pe(observations: &[EarningsObservation]) -> Option<PeStatistics> {
    let ratios: Vec<f64> = observations
        .iter()
        .filter_map(|o| pe_ratio(o.price, o.eps))
        .collect();

    Some(PeStatistics {
        mean: mean(&ratios)?,
        median: median(&ratios)?,
        max: max(&ratios)?,
        min: min(&ratios)?,
        std_dev: population_std_dev(&ratios),
        count: ratios.len(),
    })
}

/// Multiples applied to forward EPS for the low/mean/high targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeBand {
    pub low: f64,
    pub mean: f64,
    pub high: f64,
}

impl PeBand {
    pub fn from_history(stats: &PeStatistics) -> Self {
        Self {
            low: stats.min,
            mean: stats.mean,
            high: stats.max,
        }
    }

    /// ±30% around the current multiple, for symbols without usable history
    pub fn around(current_pe: f64) -> Self {
        Self {
            low: current_pe * 0.7,
            mean: current_pe,
            high: current_pe * 1.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationCall {
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

impl ValuationCall {
    /// Cheaper than the band floor is a strong buy, above the ceiling a sell.
    pub fn from_pe(current_pe: f64, band: &PeBand) -> Self {
        if current_pe < band.low {
            ValuationCall::StrongBuy
        } else if current_pe < band.mean {
            ValuationCall::Buy
        } else if current_pe < band.high {
            ValuationCall::Hold
        } else {
            ValuationCall::Sell
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            ValuationCall::StrongBuy => "Strong Buy",
            ValuationCall::Buy => "Buy",
            ValuationCall::Hold => "Hold",
            ValuationCall::Sell => "Sell",
        }
    }

    /// The model counts as a single recommendation.
    pub fn as_counts(&self) -> RecommendationCounts {
        match self {
            ValuationCall::StrongBuy | ValuationCall::Buy => RecommendationCounts { buy: 1, hold: 0, sell: 0 },
            ValuationCall::Hold => RecommendationCounts { buy: 0, hold: 1, sell: 0 },
            ValuationCall::Sell => RecommendationCounts { buy: 0, hold: 0, sell: 1 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsMultipleModel {
    /// Expected EPS growth over the next year
    pub eps_growth: f64,
}

impl Default for EpsMultipleModel {
    fn default() -> Self {
        Self { eps_growth: 0.08 }
    }
}

impl EpsMultipleModel {
    pub fn new(eps_growth: f64) -> Self {
        Self { eps_growth }
    }

    /// 1y targets from forward EPS times the historical P/E band.
    ///
    /// Fails with `InvalidInput` when price or EPS is not positive, since no
    /// multiple can be derived.
    pub fn estimate(
        &self,
        current_price: f64,
        eps: f64,
        history: &[EarningsObservation],
        as_of: NaiveDate,
    ) -> Result<AnalystEstimate, AnalysisError> {
        let current_pe = pe_ratio(current_price, eps).ok_or_else(|| {
            AnalysisError::invalid(format!(
                "EPS-multiple estimate needs positive price and EPS, got {} / {}",
                current_price, eps
            ))
        })?;

        let band = match historical_pe(history) {
            Some(stats) => PeBand::from_history(&stats),
            None => {
                tracing::debug!("No positive-EPS history, using ±30% around P/E {:.2}", current_pe);
                PeBand::around(current_pe)
            }
        };

        let future_eps = eps * (1.0 + self.eps_growth);
        let call = ValuationCall::from_pe(current_pe, &band);

        Ok(AnalystEstimate {
            source_id: EPS_MODEL_SOURCE_ID.to_string(),
            as_of,
            horizon: Horizon::OneYear,
            target_mean: future_eps * band.mean,
            target_median: future_eps * band.mean,
            target_high: future_eps * band.high,
            target_low: future_eps * band.low,
            analyst_count: 1,
            recommendations: call.as_counts(),
        })
    }
}
