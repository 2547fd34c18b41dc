use serde::{Deserialize, Serialize};

use crate::{Horizon, IndicatorGroup};

/// Per-group weights of the composite score. They sum to 1.0, so the score
/// stays inside [-100, 100] without further normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub momentum: f64,
    pub trend: f64,
    pub oscillator: f64,
    pub stochastic: f64,
    pub volatility: f64,
}

impl SignalWeights {
    pub fn weight(&self, group: IndicatorGroup) -> f64 {
        match group {
            IndicatorGroup::Momentum => self.momentum,
            IndicatorGroup::Trend => self.trend,
            IndicatorGroup::Oscillator => self.oscillator,
            IndicatorGroup::Stochastic => self.stochastic,
            IndicatorGroup::Volatility => self.volatility,
        }
    }

    pub fn total(&self) -> f64 {
        self.momentum + self.trend + self.oscillator + self.stochastic + self.volatility
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            momentum: 0.25,
            trend: 0.20,
            oscillator: 0.20,
            stochastic: 0.20,
            volatility: 0.15,
        }
    }
}

/// Score cut-offs for BUY/SELL, inclusive on both sides
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    pub buy: f64,
    pub sell: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            buy: 30.0,
            sell: -30.0,
        }
    }
}

/// Annualized growth used to extrapolate 1y targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthAssumptions {
    pub mean: f64,
    pub high: f64,
    pub low: f64,
}

impl Default for GrowthAssumptions {
    fn default() -> Self {
        Self {
            mean: 0.08,
            high: 0.10,
            low: 0.06,
        }
    }
}

impl GrowthAssumptions {
    /// Compounding factor for `rate` over the years beyond the 1y anchor.
    pub fn factor(rate: f64, horizon: Horizon) -> f64 {
        (1.0 + rate).powi(horizon.years() as i32 - 1)
    }
}

/// Blend of dispersion and recommendation agreement in the consensus score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusWeights {
    pub target_agreement: f64,
    pub recommendation_agreement: f64,
    /// Points of target agreement lost per unit of CV (CV 0.5 → 0)
    pub cv_penalty: f64,
}

impl Default for ConsensusWeights {
    fn default() -> Self {
        Self {
            target_agreement: 0.40,
            recommendation_agreement: 0.60,
            cv_penalty: 200.0,
        }
    }
}

/// All algorithm constants of both engines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub weights: SignalWeights,
    pub thresholds: SignalThresholds,
    pub growth: GrowthAssumptions,
    pub consensus: ConsensusWeights,
    /// Bars required before any signal is scored (sma50 window)
    pub min_lookback: usize,
    /// Trailing bars covered by the signal summary
    pub summary_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            thresholds: SignalThresholds::default(),
            growth: GrowthAssumptions::default(),
            consensus: ConsensusWeights::default(),
            min_lookback: 50,
            summary_window: 30,
        }
    }
}

impl EngineConfig {
    pub fn with_summary_window(mut self, window: usize) -> Self {
        self.summary_window = window;
        self
    }
}
