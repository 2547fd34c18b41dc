use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Indicator values computed for one bar.
///
/// `None` means the indicator is still inside its warm-up window for this bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: i64,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma120: Option<f64>,
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi14: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_mid: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub atr: Option<f64>,
    pub volume_sma: Option<f64>,
}

/// Indicator families that each cast one vote per bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorGroup {
    /// Moving-average alignment
    Trend,
    /// MACD line vs signal line
    Momentum,
    /// RSI
    Oscillator,
    /// Stochastic %K/%D
    Stochastic,
    /// Bollinger bands
    Volatility,
}

impl IndicatorGroup {
    pub const ALL: [IndicatorGroup; 5] = [
        IndicatorGroup::Trend,
        IndicatorGroup::Momentum,
        IndicatorGroup::Oscillator,
        IndicatorGroup::Stochastic,
        IndicatorGroup::Volatility,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IndicatorGroup::Trend => "trend",
            IndicatorGroup::Momentum => "momentum",
            IndicatorGroup::Oscillator => "oscillator",
            IndicatorGroup::Stochastic => "stochastic",
            IndicatorGroup::Volatility => "volatility",
        }
    }
}

/// A single indicator group's opinion for one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalVote {
    Sell,
    Hold,
    Buy,
}

impl SignalVote {
    pub fn value(&self) -> i32 {
        match self {
            SignalVote::Sell => -1,
            SignalVote::Hold => 0,
            SignalVote::Buy => 1,
        }
    }
}

/// Final discrete signal for a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

impl TradeSignal {
    pub fn to_label(&self) -> &'static str {
        match self {
            TradeSignal::Buy => "BUY",
            TradeSignal::Sell => "SELL",
            TradeSignal::Hold => "HOLD",
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Vote cast by one group, kept for the per-bar breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupVote {
    pub group: IndicatorGroup,
    pub vote: SignalVote,
}

/// Weighted combination of group votes for one bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSignal {
    pub date: NaiveDate,
    pub close: f64,
    /// Strength score in [-100, 100]
    pub raw_score: f64,
    pub signal: TradeSignal,
    pub votes: Vec<GroupVote>,
}

/// Signal counts over the trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub total_days: usize,
    pub buy_days: usize,
    pub sell_days: usize,
    pub hold_days: usize,
    pub avg_score: f64,
}

/// Output of one Signal Engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub signals: Vec<CompositeSignal>,
    pub current: CompositeSignal,
    pub summary: SignalSummary,
}

/// Forward window of a price target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYear,
    #[serde(rename = "3y")]
    ThreeYear,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::OneYear, Horizon::TwoYear, Horizon::ThreeYear];

    pub fn years(&self) -> u32 {
        match self {
            Horizon::OneYear => 1,
            Horizon::TwoYear => 2,
            Horizon::ThreeYear => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::OneYear => "1y",
            Horizon::TwoYear => "2y",
            Horizon::ThreeYear => "3y",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Analyst recommendation distribution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationCounts {
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
}

impl RecommendationCounts {
    pub fn total(&self) -> u32 {
        self.buy + self.hold + self.sell
    }
}

impl std::ops::Add for RecommendationCounts {
    type Output = RecommendationCounts;

    fn add(self, rhs: Self) -> Self::Output {
        RecommendationCounts {
            buy: self.buy + rhs.buy,
            hold: self.hold + rhs.hold,
            sell: self.sell + rhs.sell,
        }
    }
}

/// 12-month target distribution published by one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystEstimate {
    pub source_id: String,
    pub as_of: NaiveDate,
    pub horizon: Horizon,
    pub target_mean: f64,
    pub target_median: f64,
    pub target_high: f64,
    pub target_low: f64,
    pub analyst_count: u32,
    pub recommendations: RecommendationCounts,
}

/// 2y/3y targets derived from a 1y estimate by compounding growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolatedEstimate {
    pub source_id: String,
    pub as_of: NaiveDate,
    pub horizon: Horizon,
    pub target_mean: f64,
    pub target_median: f64,
    pub target_high: f64,
    pub target_low: f64,
    pub analyst_count: u32,
    pub recommendations: RecommendationCounts,
}

impl From<&AnalystEstimate> for ExtrapolatedEstimate {
    /// Native 1y estimate carried through unmodified
    fn from(e: &AnalystEstimate) -> Self {
        ExtrapolatedEstimate {
            source_id: e.source_id.clone(),
            as_of: e.as_of,
            horizon: e.horizon,
            target_mean: e.target_mean,
            target_median: e.target_median,
            target_high: e.target_high,
            target_low: e.target_low,
            analyst_count: e.analyst_count,
            recommendations: e.recommendations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusLevel {
    #[serde(rename = "Very High")]
    VeryHigh,
    High,
    Medium,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl ConsensusLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => ConsensusLevel::VeryHigh,
            s if s >= 60.0 => ConsensusLevel::High,
            s if s >= 40.0 => ConsensusLevel::Medium,
            s if s >= 20.0 => ConsensusLevel::Low,
            _ => ConsensusLevel::VeryLow,
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            ConsensusLevel::VeryHigh => "Very High",
            ConsensusLevel::High => "High",
            ConsensusLevel::Medium => "Medium",
            ConsensusLevel::Low => "Low",
            ConsensusLevel::VeryLow => "Very Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// CV < 0.10 is Low, CV > 0.20 is High, both bounds of Medium inclusive.
    pub fn from_cv(cv: f64) -> Self {
        if cv < 0.10 {
            RiskLevel::Low
        } else if cv <= 0.20 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Shares of each recommendation in hundredths of a percent.
///
/// The three shares always add up to [`RecommendationSplit::WHOLE`]. On the
/// wire they appear as two-decimal percentages (`buy_pct`, `hold_pct`, `sell_pct`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSplit {
    #[serde(rename = "buy_pct", with = "percent_hundredths")]
    pub buy: u32,
    #[serde(rename = "hold_pct", with = "percent_hundredths")]
    pub hold: u32,
    #[serde(rename = "sell_pct", with = "percent_hundredths")]
    pub sell: u32,
}

impl RecommendationSplit {
    /// 100.00%
    pub const WHOLE: u32 = 10_000;

    pub fn buy_pct(&self) -> f64 {
        self.buy as f64 / 100.0
    }

    pub fn hold_pct(&self) -> f64 {
        self.hold as f64 / 100.0
    }

    pub fn sell_pct(&self) -> f64 {
        self.sell as f64 / 100.0
    }

    pub fn total_pct(&self) -> f64 {
        (self.buy + self.hold + self.sell) as f64 / 100.0
    }
}

mod percent_hundredths {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*value as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let pct = f64::deserialize(deserializer)?;
        if !(0.0..=100.0).contains(&pct) {
            return Err(D::Error::custom(format!("percentage {} is outside 0..=100", pct)));
        }
        Ok((pct * 100.0).round() as u32)
    }
}

/// Cross-source statistics for one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEstimate {
    pub horizon: Horizon,
    pub target_date: NaiveDate,
    pub source_count: usize,
    pub analyst_count: u32,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    pub stddev: f64,
    /// Highest per-source high target
    pub target_high: f64,
    /// Lowest per-source low target
    pub target_low: f64,
    pub expected_return_pct: f64,
    pub ci68: ConfidenceInterval,
    pub ci95: ConfidenceInterval,
    pub consensus_score: f64,
    pub consensus_level: ConsensusLevel,
    pub recommendation_split: Option<RecommendationSplit>,
    pub coefficient_of_variation: f64,
    pub risk_level: RiskLevel,
}

/// Per-horizon outcome: either the aggregate or the reason it is missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HorizonEstimate {
    Available(AggregateEstimate),
    Unavailable { reason: String },
}

impl HorizonEstimate {
    pub fn available(&self) -> Option<&AggregateEstimate> {
        match self {
            HorizonEstimate::Available(agg) => Some(agg),
            HorizonEstimate::Unavailable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_wire_labels() {
        assert_eq!(serde_json::to_string(&Horizon::TwoYear).unwrap(), "\"2y\"");
        let parsed: Horizon = serde_json::from_str("\"3y\"").unwrap();
        assert_eq!(parsed, Horizon::ThreeYear);
        assert_eq!(Horizon::ThreeYear.years(), 3);
    }

    #[test]
    fn test_signal_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TradeSignal::Hold).unwrap(), "\"HOLD\"");
        assert_eq!(TradeSignal::Buy.to_string(), "BUY");
    }

    #[test]
    fn test_unavailable_horizon_is_tagged() {
        let missing = HorizonEstimate::Unavailable { reason: "no sources".to_string() };
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "no sources");
        assert!(missing.available().is_none());
    }

    #[test]
    fn test_level_and_risk_boundaries() {
        assert_eq!(ConsensusLevel::from_score(80.0), ConsensusLevel::VeryHigh);
        assert_eq!(ConsensusLevel::from_score(79.99), ConsensusLevel::High);
        assert_eq!(ConsensusLevel::from_score(19.99), ConsensusLevel::VeryLow);
        assert_eq!(RiskLevel::from_cv(0.0999), RiskLevel::Low);
        assert_eq!(RiskLevel::from_cv(0.10), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_cv(0.20), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_cv(0.2001), RiskLevel::High);
    }

    #[test]
    fn test_consensus_level_wire_matches_label() {
        for level in [
            ConsensusLevel::VeryHigh,
            ConsensusLevel::High,
            ConsensusLevel::Medium,
            ConsensusLevel::Low,
            ConsensusLevel::VeryLow,
        ] {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.to_label()));
            let parsed: ConsensusLevel = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, level);
        }
    }

    #[test]
    fn test_split_serializes_as_percentages() {
        let split = RecommendationSplit { buy: 588, hold: 6471, sell: 2941 };
        assert_eq!(split.total_pct(), 100.0);
        assert_eq!(split.hold_pct(), 64.71);

        let json = serde_json::to_value(split).unwrap();
        assert_eq!(json["buy_pct"], 5.88);
        assert_eq!(json["sell_pct"], 29.41);

        let parsed: RecommendationSplit = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, split);
        assert!(serde_json::from_str::<RecommendationSplit>(r#"{"buy_pct":120.0,"hold_pct":0.0,"sell_pct":0.0}"#).is_err());
    }

    #[test]
    fn test_recommendation_counts_add() {
        let total = RecommendationCounts { buy: 3, hold: 2, sell: 1 } + RecommendationCounts { buy: 1, hold: 0, sell: 4 };
        assert_eq!(total, RecommendationCounts { buy: 4, hold: 2, sell: 5 });
        assert_eq!(total.total(), 11);
    }
}
