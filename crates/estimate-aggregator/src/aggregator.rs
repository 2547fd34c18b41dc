use std::collections::BTreeMap;

use analysis_core::numeric::{max, mean, median, min, pct_change, sample_std_dev};
use analysis_core::validation::{validate_estimates, validate_price};
use analysis_core::{
    AggregateEstimate, AnalysisError, AnalystEstimate, ConfidenceInterval, ConsensusLevel, EngineConfig,
    ExtrapolatedEstimate, Horizon, HorizonEstimate, RecommendationCounts, RiskLevel,
};
use serde::{Deserialize, Serialize};

use crate::consensus::{consensus_score, recommendation_split};
use crate::extrapolation::{extrapolate, target_date};

/// Aggregates for all three horizons of one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub current_price: f64,
    /// Contributing source ids, in input order; each source appears once
    pub sources: Vec<String>,
    pub horizons: BTreeMap<Horizon, HorizonEstimate>,
}

impl EstimateReport {
    /// The aggregate for `horizon`, if one could be computed.
    pub fn horizon(&self, horizon: Horizon) -> Option<&AggregateEstimate> {
        self.horizons.get(&horizon).and_then(HorizonEstimate::available)
    }
}

/// Cross-source price-target statistics per horizon
#[derive(Debug, Clone, Default)]
pub struct EstimateAggregator {
    config: EngineConfig,
}

impl EstimateAggregator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate the inputs, then aggregate each horizon independently.
    ///
    /// A horizon with no contributing source is reported as unavailable with
    /// the `NoEstimates` message; it never fails the whole call.
    pub fn aggregate(
        &self,
        estimates: &[AnalystEstimate],
        current_price: f64,
    ) -> Result<EstimateReport, AnalysisError> {
        validate_price(current_price)?;
        validate_estimates(estimates)?;

        let mut horizons = BTreeMap::new();
        for horizon in Horizon::ALL {
            let entry = match self.aggregate_horizon(estimates, horizon, current_price) {
                Ok(aggregate) => HorizonEstimate::Available(aggregate),
                Err(e @ AnalysisError::NoEstimates { .. }) => {
                    tracing::info!("Skipping {} horizon: {}", horizon, e);
                    HorizonEstimate::Unavailable { reason: e.to_string() }
                }
                Err(e) => return Err(e),
            };
            horizons.insert(horizon, entry);
        }

        let sources: Vec<String> = estimates.iter().map(|e| e.source_id.clone()).collect();

        tracing::debug!(
            "Aggregated {} estimates from {} sources at price {:.2}",
            estimates.len(),
            sources.len(),
            current_price
        );

        Ok(EstimateReport {
            current_price,
            sources,
            horizons,
        })
    }

    /// Statistics over the per-source mean targets for one horizon.
    ///
    /// Inputs are assumed valid; `aggregate` checks them first.
    pub fn aggregate_horizon(
        &self,
        estimates: &[AnalystEstimate],
        horizon: Horizon,
        current_price: f64,
    ) -> Result<AggregateEstimate, AnalysisError> {
        let projected: Vec<ExtrapolatedEstimate> = estimates
            .iter()
            .map(|e| extrapolate(e, horizon, &self.config.growth))
            .collect();

        let means: Vec<f64> = projected.iter().map(|e| e.target_mean).collect();
        let mean_target = mean(&means).ok_or(AnalysisError::NoEstimates { horizon })?;
        let stddev = sample_std_dev(&means);

        let highs: Vec<f64> = projected.iter().map(|e| e.target_high).collect();
        let lows: Vec<f64> = projected.iter().map(|e| e.target_low).collect();

        let cv = if mean_target == 0.0 { 0.0 } else { stddev / mean_target };

        let recommendations = projected
            .iter()
            .fold(RecommendationCounts::default(), |acc, e| acc + e.recommendations);

        let as_of = projected
            .iter()
            .map(|e| e.as_of)
            .max()
            .ok_or(AnalysisError::NoEstimates { horizon })?;
        let target_date = target_date(as_of, horizon)
            .ok_or_else(|| AnalysisError::invalid(format!("{} + {} is out of range", as_of, horizon)))?;

        let expected_return_pct = pct_change(mean_target, current_price)
            .ok_or_else(|| AnalysisError::invalid(format!("current price must be positive, got {}", current_price)))?;

        let consensus_score = consensus_score(cv, &recommendations, &self.config.consensus);

        Ok(AggregateEstimate {
            horizon,
            target_date,
            source_count: projected.len(),
            analyst_count: projected.iter().map(|e| e.analyst_count).sum(),
            mean: mean_target,
            median: median(&means).unwrap_or(mean_target),
            max: max(&means).unwrap_or(mean_target),
            min: min(&means).unwrap_or(mean_target),
            stddev,
            target_high: max(&highs).unwrap_or(mean_target),
            target_low: min(&lows).unwrap_or(mean_target),
            expected_return_pct,
            ci68: ConfidenceInterval {
                lower: mean_target - stddev,
                upper: mean_target + stddev,
            },
            ci95: ConfidenceInterval {
                lower: mean_target - 2.0 * stddev,
                upper: mean_target + 2.0 * stddev,
            },
            consensus_score,
            consensus_level: ConsensusLevel::from_score(consensus_score),
            recommendation_split: recommendation_split(&recommendations),
            coefficient_of_variation: cv,
            risk_level: RiskLevel::from_cv(cv),
        })
    }
}

/// Aggregate with the default growth and consensus constants.
pub fn aggregate_estimates(
    estimates: &[AnalystEstimate],
    current_price: f64,
) -> Result<EstimateReport, AnalysisError> {
    EstimateAggregator::default().aggregate(estimates, current_price)
}
