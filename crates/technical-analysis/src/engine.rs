use analysis_core::numeric::{mean, round_to};
use analysis_core::{
    AnalysisError, CompositeSignal, EngineConfig, GroupVote, IndicatorSnapshot, SignalReport,
    SignalSummary, SignalThresholds, SignalWeights, TradeSignal,
};

use crate::votes::cast_votes;

/// Turns indicator snapshots into weighted BUY/SELL/HOLD signals
#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    config: EngineConfig,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score every bar whose five indicator groups are all computable.
    ///
    /// Fails with `InsufficientData` when the sequence is shorter than the
    /// longest indicator lookback, or when the latest bar cannot be scored.
    pub fn compute_signals(&self, snapshots: &[IndicatorSnapshot]) -> Result<SignalReport, AnalysisError> {
        let required = self.config.min_lookback;
        if snapshots.len() < required {
            return Err(AnalysisError::InsufficientData {
                required,
                available: snapshots.len(),
            });
        }

        let signals: Vec<CompositeSignal> = snapshots
            .iter()
            .filter_map(|snapshot| self.score_bar(snapshot))
            .collect();

        let latest = snapshots.last().map(|s| s.date);
        let current = match signals.last() {
            Some(last) if Some(last.date) == latest => last.clone(),
            _ => {
                tracing::warn!(
                    "Latest bar {:?} is missing indicator groups, {} of {} bars scoreable",
                    latest,
                    signals.len(),
                    snapshots.len()
                );
                return Err(AnalysisError::InsufficientData {
                    required,
                    available: signals.len(),
                });
            }
        };

        let summary = self.summarize(&signals);
        tracing::debug!(
            "Scored {} of {} bars, current {} ({:.2})",
            signals.len(),
            snapshots.len(),
            current.signal,
            current.raw_score
        );

        Ok(SignalReport {
            signals,
            current,
            summary,
        })
    }

    fn score_bar(&self, snapshot: &IndicatorSnapshot) -> Option<CompositeSignal> {
        let votes = cast_votes(snapshot)?;
        let raw_score = weighted_score(&votes, &self.config.weights);
        Some(CompositeSignal {
            date: snapshot.date,
            close: snapshot.close,
            raw_score,
            signal: classify(raw_score, &self.config.thresholds),
            votes,
        })
    }

    /// Counts and mean score over the trailing `summary_window` signals
    pub fn summarize(&self, signals: &[CompositeSignal]) -> SignalSummary {
        let window = self.config.summary_window.max(1);
        let recent = &signals[signals.len().saturating_sub(window)..];

        let count = |wanted: TradeSignal| recent.iter().filter(|s| s.signal == wanted).count();
        let scores: Vec<f64> = recent.iter().map(|s| s.raw_score).collect();

        SignalSummary {
            total_days: recent.len(),
            buy_days: count(TradeSignal::Buy),
            sell_days: count(TradeSignal::Sell),
            hold_days: count(TradeSignal::Hold),
            avg_score: mean(&scores).map(|m| round_to(m, 2)).unwrap_or(0.0),
        }
    }
}

/// 100 × Σ weight·vote, rounded to two decimals so float dust cannot move a
/// score across a threshold.
pub fn weighted_score(votes: &[GroupVote], weights: &SignalWeights) -> f64 {
    let sum: f64 = votes
        .iter()
        .map(|v| weights.weight(v.group) * v.vote.value() as f64)
        .sum();
    round_to(sum * 100.0, 2).clamp(-100.0, 100.0)
}

/// Inclusive on both the BUY and SELL side
pub fn classify(raw_score: f64, thresholds: &SignalThresholds) -> TradeSignal {
    if raw_score >= thresholds.buy {
        TradeSignal::Buy
    } else if raw_score <= thresholds.sell {
        TradeSignal::Sell
    } else {
        TradeSignal::Hold
    }
}

/// Score a snapshot sequence with the default weights and thresholds.
pub fn compute_signals(snapshots: &[IndicatorSnapshot]) -> Result<SignalReport, AnalysisError> {
    SignalEngine::default().compute_signals(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::build_snapshots;
    use analysis_core::{IndicatorGroup, PriceBar, SignalVote};
    use chrono::{Duration, NaiveDate};

    fn votes(values: [SignalVote; 5]) -> Vec<GroupVote> {
        IndicatorGroup::ALL
            .iter()
            .zip(values)
            .map(|(group, vote)| GroupVote { group: *group, vote })
            .collect()
    }

    fn neutral_snapshot(day: i64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(day),
            close: 100.0,
            sma20: Some(100.0),
            sma50: Some(100.0),
            macd_line: Some(0.0),
            macd_signal: Some(0.0),
            macd_hist: Some(0.0),
            rsi14: Some(50.0),
            bb_upper: Some(110.0),
            bb_lower: Some(90.0),
            stoch_k: Some(50.0),
            stoch_d: Some(50.0),
            ..Default::default()
        }
    }

    fn bullish_snapshot(day: i64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            close: 89.0,
            sma20: Some(88.0),
            sma50: Some(87.0),
            macd_line: Some(1.0),
            macd_signal: Some(0.5),
            macd_hist: Some(0.5),
            rsi14: Some(25.0),
            stoch_k: Some(15.0),
            stoch_d: Some(10.0),
            ..neutral_snapshot(day)
        }
    }

    fn wave_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        (0..count)
            .map(|i| {
                let close = 100.0 + 10.0 * (i as f64 / 7.0).sin() + i as f64 * 0.05;
                PriceBar {
                    date: start + Duration::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.5,
                    low: close - 1.5,
                    close,
                    volume: 1_000_000 + (i as i64 % 5) * 100_000,
                }
            })
            .collect()
    }

    #[test]
    fn test_classification_boundaries() {
        let t = SignalThresholds::default();
        assert_eq!(classify(30.0, &t), TradeSignal::Buy);
        assert_eq!(classify(29.99, &t), TradeSignal::Hold);
        assert_eq!(classify(-30.0, &t), TradeSignal::Sell);
        assert_eq!(classify(-29.99, &t), TradeSignal::Hold);
        assert_eq!(classify(100.0, &t), TradeSignal::Buy);
        assert_eq!(classify(-100.0, &t), TradeSignal::Sell);
    }

    #[test]
    fn test_score_bounded_for_every_vote_combination() {
        let options = [SignalVote::Sell, SignalVote::Hold, SignalVote::Buy];
        let weights = SignalWeights::default();
        for a in options {
            for b in options {
                for c in options {
                    for d in options {
                        for e in options {
                            let score = weighted_score(&votes([a, b, c, d, e]), &weights);
                            assert!((-100.0..=100.0).contains(&score), "score {} out of range", score);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_weighted_score_values() {
        let weights = SignalWeights::default();
        let all_buy = votes([SignalVote::Buy; 5]);
        assert_eq!(weighted_score(&all_buy, &weights), 100.0);

        let all_sell = votes([SignalVote::Sell; 5]);
        assert_eq!(weighted_score(&all_sell, &weights), -100.0);

        // trend, momentum, oscillator, stochastic, volatility
        let momentum_and_trend = votes([
            SignalVote::Buy,
            SignalVote::Buy,
            SignalVote::Hold,
            SignalVote::Hold,
            SignalVote::Sell,
        ]);
        assert_eq!(weighted_score(&momentum_and_trend, &weights), 30.0);
    }

    #[test]
    fn test_insufficient_bars() {
        let snapshots: Vec<IndicatorSnapshot> = (0..10).map(neutral_snapshot).collect();
        let err = compute_signals(&snapshots).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { required: 50, available: 10 });
    }

    #[test]
    fn test_no_scoreable_bar_is_insufficient() {
        let snapshots: Vec<IndicatorSnapshot> = (0..60)
            .map(|d| IndicatorSnapshot { rsi14: None, ..neutral_snapshot(d) })
            .collect();
        assert!(matches!(
            compute_signals(&snapshots),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_unscoreable_latest_bar_is_insufficient() {
        let mut snapshots: Vec<IndicatorSnapshot> = (0..60).map(neutral_snapshot).collect();
        snapshots[59].macd_signal = None;

        let err = compute_signals(&snapshots).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { required: 50, available: 59 });
    }

    #[test]
    fn test_warm_up_bars_are_not_scored() {
        let snapshots: Vec<IndicatorSnapshot> = (0..60)
            .map(|d| {
                if d < 20 {
                    IndicatorSnapshot { sma50: None, ..neutral_snapshot(d) }
                } else {
                    neutral_snapshot(d)
                }
            })
            .collect();
        let report = compute_signals(&snapshots).unwrap();
        assert_eq!(report.signals.len(), 40);
        assert_eq!(report.signals[0].date, snapshots[20].date);
    }

    #[test]
    fn test_current_signal_is_last_bar() {
        let mut snapshots: Vec<IndicatorSnapshot> = (0..59).map(neutral_snapshot).collect();
        snapshots.push(bullish_snapshot(59));

        let report = compute_signals(&snapshots).unwrap();
        assert_eq!(report.current.date, snapshots[59].date);
        assert_eq!(report.current.signal, TradeSignal::Buy);
        assert_eq!(report.current.raw_score, 100.0);
        assert_eq!(report.current.votes.len(), 5);
    }

    #[test]
    fn test_summary_counts_trailing_window() {
        let mut snapshots: Vec<IndicatorSnapshot> = (0..70).map(neutral_snapshot).collect();
        for day in 65..70 {
            snapshots[day as usize] = bullish_snapshot(day);
        }

        let report = compute_signals(&snapshots).unwrap();
        let summary = &report.summary;
        assert_eq!(summary.total_days, 30);
        assert_eq!(summary.buy_days, 5);
        assert_eq!(summary.sell_days, 0);
        assert_eq!(summary.hold_days, 25);
        assert!((summary.avg_score - 16.67).abs() < 1e-9);

        let short = SignalEngine::new(EngineConfig::default().with_summary_window(5));
        let summary = short.compute_signals(&snapshots).unwrap().summary;
        assert_eq!(summary.total_days, 5);
        assert_eq!(summary.buy_days, 5);
    }

    #[test]
    fn test_end_to_end_from_bars() {
        let bars = wave_bars(200);
        let snapshots = build_snapshots(&bars);
        let report = compute_signals(&snapshots).unwrap();

        // sma50 is the last group to warm up, first value at index 49
        assert!(report.signals.len() <= 151);
        assert!(!report.signals.is_empty());
        assert_eq!(report.current.date, bars.last().unwrap().date);
        for signal in &report.signals {
            assert!((-100.0..=100.0).contains(&signal.raw_score));
        }
    }

    #[test]
    fn test_runs_are_idempotent() {
        let snapshots = build_snapshots(&wave_bars(150));
        let first = serde_json::to_string(&compute_signals(&snapshots).unwrap()).unwrap();
        let second = serde_json::to_string(&compute_signals(&snapshots).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
