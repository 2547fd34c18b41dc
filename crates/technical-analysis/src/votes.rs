use analysis_core::{GroupVote, IndicatorGroup, IndicatorSnapshot, SignalVote};

/// Vote function for one indicator group. `None` when an input is still
/// inside its warm-up window.
pub type VoteFn = fn(&IndicatorSnapshot) -> Option<SignalVote>;

/// Group → vote function dispatch table
pub const VOTE_TABLE: [(IndicatorGroup, VoteFn); 5] = [
    (IndicatorGroup::Trend, trend_vote),
    (IndicatorGroup::Momentum, momentum_vote),
    (IndicatorGroup::Oscillator, oscillator_vote),
    (IndicatorGroup::Stochastic, stochastic_vote),
    (IndicatorGroup::Volatility, volatility_vote),
];

/// Uptrend alignment: close > sma20 > sma50
pub fn trend_vote(s: &IndicatorSnapshot) -> Option<SignalVote> {
    let (sma20, sma50) = (s.sma20?, s.sma50?);
    Some(if s.close > sma20 && sma20 > sma50 {
        SignalVote::Buy
    } else if s.close < sma20 && sma20 < sma50 {
        SignalVote::Sell
    } else {
        SignalVote::Hold
    })
}

pub fn momentum_vote(s: &IndicatorSnapshot) -> Option<SignalVote> {
    let (line, signal, hist) = (s.macd_line?, s.macd_signal?, s.macd_hist?);
    Some(if line > signal && hist > 0.0 {
        SignalVote::Buy
    } else if line < signal && hist < 0.0 {
        SignalVote::Sell
    } else {
        SignalVote::Hold
    })
}

/// Overbought RSI is a sell bias, oversold a buy bias
pub fn oscillator_vote(s: &IndicatorSnapshot) -> Option<SignalVote> {
    let rsi = s.rsi14?;
    Some(if rsi > 70.0 {
        SignalVote::Sell
    } else if rsi < 30.0 {
        SignalVote::Buy
    } else {
        SignalVote::Hold
    })
}

/// %K crossing above %D inside the oversold zone, or below it inside the overbought zone
pub fn stochastic_vote(s: &IndicatorSnapshot) -> Option<SignalVote> {
    let (k, d) = (s.stoch_k?, s.stoch_d?);
    Some(if k > d && k < 20.0 {
        SignalVote::Buy
    } else if k < d && k > 80.0 {
        SignalVote::Sell
    } else {
        SignalVote::Hold
    })
}

/// Touching a band counts, so the comparisons are inclusive
pub fn volatility_vote(s: &IndicatorSnapshot) -> Option<SignalVote> {
    let (upper, lower) = (s.bb_upper?, s.bb_lower?);
    Some(if s.close <= lower {
        SignalVote::Buy
    } else if s.close >= upper {
        SignalVote::Sell
    } else {
        SignalVote::Hold
    })
}

/// All five votes for a bar, or `None` if any group is not yet computable.
pub fn cast_votes(snapshot: &IndicatorSnapshot) -> Option<Vec<GroupVote>> {
    VOTE_TABLE
        .iter()
        .map(|(group, vote)| vote(snapshot).map(|v| GroupVote { group: *group, vote: v }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            close: 100.0,
            sma20: Some(100.0),
            sma50: Some(100.0),
            macd_line: Some(0.0),
            macd_signal: Some(0.0),
            macd_hist: Some(0.0),
            rsi14: Some(50.0),
            bb_upper: Some(110.0),
            bb_lower: Some(90.0),
            bb_mid: Some(100.0),
            stoch_k: Some(50.0),
            stoch_d: Some(50.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_table_covers_every_group_once() {
        let groups: Vec<IndicatorGroup> = VOTE_TABLE.iter().map(|(g, _)| *g).collect();
        assert_eq!(groups, IndicatorGroup::ALL.to_vec());
    }

    #[test]
    fn test_trend_vote() {
        let up = IndicatorSnapshot { close: 105.0, sma20: Some(102.0), sma50: Some(100.0), ..snapshot() };
        assert_eq!(trend_vote(&up), Some(SignalVote::Buy));

        let down = IndicatorSnapshot { close: 95.0, sma20: Some(98.0), sma50: Some(100.0), ..snapshot() };
        assert_eq!(trend_vote(&down), Some(SignalVote::Sell));

        // Above sma20 but sma20 below sma50: no alignment
        let mixed = IndicatorSnapshot { close: 105.0, sma20: Some(98.0), sma50: Some(100.0), ..snapshot() };
        assert_eq!(trend_vote(&mixed), Some(SignalVote::Hold));

        let warming_up = IndicatorSnapshot { sma50: None, ..snapshot() };
        assert_eq!(trend_vote(&warming_up), None);
    }

    #[test]
    fn test_momentum_vote() {
        let bull = IndicatorSnapshot { macd_line: Some(1.0), macd_signal: Some(0.5), macd_hist: Some(0.5), ..snapshot() };
        assert_eq!(momentum_vote(&bull), Some(SignalVote::Buy));

        let bear = IndicatorSnapshot { macd_line: Some(-1.0), macd_signal: Some(-0.5), macd_hist: Some(-0.5), ..snapshot() };
        assert_eq!(momentum_vote(&bear), Some(SignalVote::Sell));

        // Line above signal with a non-positive histogram is inconclusive
        let flat = IndicatorSnapshot { macd_line: Some(1.0), macd_signal: Some(0.5), macd_hist: Some(0.0), ..snapshot() };
        assert_eq!(momentum_vote(&flat), Some(SignalVote::Hold));
    }

    #[test]
    fn test_oscillator_vote_boundaries() {
        let at = |rsi| oscillator_vote(&IndicatorSnapshot { rsi14: Some(rsi), ..snapshot() });
        assert_eq!(at(70.1), Some(SignalVote::Sell));
        assert_eq!(at(70.0), Some(SignalVote::Hold));
        assert_eq!(at(30.0), Some(SignalVote::Hold));
        assert_eq!(at(29.9), Some(SignalVote::Buy));
    }

    #[test]
    fn test_stochastic_vote() {
        let at = |k, d| stochastic_vote(&IndicatorSnapshot { stoch_k: Some(k), stoch_d: Some(d), ..snapshot() });
        assert_eq!(at(15.0, 10.0), Some(SignalVote::Buy));
        assert_eq!(at(15.0, 18.0), Some(SignalVote::Hold));
        assert_eq!(at(85.0, 90.0), Some(SignalVote::Sell));
        assert_eq!(at(85.0, 80.0), Some(SignalVote::Hold));
        assert_eq!(at(20.0, 10.0), Some(SignalVote::Hold));
    }

    #[test]
    fn test_volatility_vote_inclusive_bands() {
        let at = |close| volatility_vote(&IndicatorSnapshot { close, ..snapshot() });
        assert_eq!(at(90.0), Some(SignalVote::Buy));
        assert_eq!(at(85.0), Some(SignalVote::Buy));
        assert_eq!(at(110.0), Some(SignalVote::Sell));
        assert_eq!(at(100.0), Some(SignalVote::Hold));
    }

    #[test]
    fn test_cast_votes_requires_every_group() {
        let votes = cast_votes(&snapshot()).unwrap();
        assert_eq!(votes.len(), 5);
        assert!(votes.iter().all(|v| v.vote == SignalVote::Hold));

        let missing_rsi = IndicatorSnapshot { rsi14: None, ..snapshot() };
        assert!(cast_votes(&missing_rsi).is_none());
    }
}
