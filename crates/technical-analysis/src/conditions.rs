//! Descriptive read-out of the latest bar: oscillator zones, band position,
//! moving-average alignment, trend strength and consolidation.
//!
//! Nothing here feeds the composite score. Values that cannot be computed
//! yet are reported as `None`.

use analysis_core::numeric::{max, mean, min, pct_change};
use analysis_core::IndicatorSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const RANGE_WINDOW: usize = 20;
const COST_WINDOW_3M: usize = 63;
const COST_WINDOW_6M: usize = 126;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiStatus {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    AboveUpper,
    BelowLower,
    WithinBands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    High,
    Normal,
    Low,
}

/// Ordering of close against the 20/50/120-bar averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaAlignment {
    StrongBullish,
    Bullish,
    Mixed,
    Bearish,
    StrongBearish,
}

impl MaAlignment {
    pub fn score(&self) -> i32 {
        match self {
            MaAlignment::StrongBullish => 2,
            MaAlignment::Bullish => 1,
            MaAlignment::Mixed => 0,
            MaAlignment::Bearish => -1,
            MaAlignment::StrongBearish => -2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: Option<f64>,
    pub rsi_status: Option<RsiStatus>,
    pub macd_status: Option<Bias>,
    pub bb_position: Option<BandPosition>,
    pub ma_status: Option<Bias>,
    pub volume_ratio: Option<f64>,
    pub volume_trend: Option<VolumeTrend>,
    pub ma_alignment: Option<MaAlignment>,
    /// -100 (strong downtrend) to 100 (strong uptrend)
    pub trend_strength: Option<f64>,
    /// 0 (trending) to 100 (tight consolidation)
    pub sideways_score: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    /// Close vs. its 63-bar average, in percent
    pub cost_position_3m: Option<f64>,
    /// Close vs. its 126-bar average, in percent
    pub cost_position_6m: Option<f64>,
}

pub fn rsi_status(rsi: f64) -> RsiStatus {
    if rsi > 70.0 {
        RsiStatus::Overbought
    } else if rsi < 30.0 {
        RsiStatus::Oversold
    } else {
        RsiStatus::Neutral
    }
}

pub fn ma_alignment(s: &IndicatorSnapshot) -> Option<MaAlignment> {
    let (close, sma20, sma50, sma120) = (s.close, s.sma20?, s.sma50?, s.sma120?);
    Some(if close > sma20 && sma20 > sma50 && sma50 > sma120 {
        MaAlignment::StrongBullish
    } else if close > sma20 && sma20 > sma50 {
        MaAlignment::Bullish
    } else if close < sma20 && sma20 < sma50 && sma50 < sma120 {
        MaAlignment::StrongBearish
    } else if close < sma20 && sma20 < sma50 {
        MaAlignment::Bearish
    } else {
        MaAlignment::Mixed
    })
}

fn volume_ratio(s: &IndicatorSnapshot) -> Option<f64> {
    match s.volume_sma {
        Some(avg) if avg > 0.0 => Some(s.volume as f64 / avg),
        _ => None,
    }
}

/// Alignment sets the base (±20/±40), distance from sma20 and volume confirm it.
pub fn trend_strength(s: &IndicatorSnapshot, alignment: MaAlignment) -> f64 {
    let mut strength: f64 = match alignment {
        MaAlignment::StrongBullish => 40.0,
        MaAlignment::Bullish => 20.0,
        MaAlignment::Mixed => 0.0,
        MaAlignment::Bearish => -20.0,
        MaAlignment::StrongBearish => -40.0,
    };

    if let Some(sma20) = s.sma20 {
        if s.close > sma20 * 1.05 {
            strength += 15.0;
        } else if s.close < sma20 * 0.95 {
            strength -= 15.0;
        }
    }

    if let Some(ratio) = volume_ratio(s) {
        if ratio > 1.5 && alignment.score() > 0 {
            strength += 10.0;
        } else if ratio > 1.5 && alignment.score() < 0 {
            strength -= 10.0;
        }
    }

    strength.clamp(-100.0, 100.0)
}

/// Consolidation score over the trailing 20 bars, `None` until sma50 exists.
pub fn sideways_score(snapshots: &[IndicatorSnapshot]) -> Option<f64> {
    if snapshots.len() < RANGE_WINDOW {
        return None;
    }
    let latest = snapshots.last()?;
    let (sma20, sma50) = (latest.sma20?, latest.sma50?);
    let recent = &snapshots[snapshots.len() - RANGE_WINDOW..];
    let closes: Vec<f64> = recent.iter().map(|s| s.close).collect();

    let mut score = 0.0;

    let avg_price = mean(&closes)?;
    let range = max(&closes)? - min(&closes)?;
    if avg_price > 0.0 && range / avg_price < 0.10 {
        score += 30.0;
    }

    if sma50 > 0.0 && (sma20 - sma50).abs() / sma50 < 0.05 {
        score += 25.0;
    }

    let ratios: Vec<f64> = recent.iter().filter_map(volume_ratio).collect();
    if let Some(avg_ratio) = mean(&ratios) {
        if avg_ratio > 0.8 && avg_ratio < 1.2 {
            score += 20.0;
        }
    }

    if sma20 > 0.0 && (latest.close - sma20).abs() / sma20 < 0.03 {
        score += 25.0;
    }

    Some(f64::min(score, 100.0))
}

fn trailing_mean(closes: &[f64], window: usize) -> Option<f64> {
    if closes.len() < window {
        return None;
    }
    mean(&closes[closes.len() - window..])
}

/// Describe the most recent bar. `None` for an empty sequence.
pub fn assess_conditions(snapshots: &[IndicatorSnapshot]) -> Option<MarketConditions> {
    let latest = snapshots.last()?;
    let closes: Vec<f64> = snapshots.iter().map(|s| s.close).collect();

    let macd_status = match (latest.macd_line, latest.macd_signal) {
        (Some(line), Some(signal)) if line > signal => Some(Bias::Bullish),
        (Some(_), Some(_)) => Some(Bias::Bearish),
        _ => None,
    };

    let bb_position = match (latest.bb_upper, latest.bb_lower) {
        (Some(upper), _) if latest.close > upper => Some(BandPosition::AboveUpper),
        (_, Some(lower)) if latest.close < lower => Some(BandPosition::BelowLower),
        (Some(_), Some(_)) => Some(BandPosition::WithinBands),
        _ => None,
    };

    let ma_status = match (latest.sma20, latest.sma50) {
        (Some(sma20), Some(sma50)) => Some(if latest.close > sma20 && sma20 > sma50 {
            Bias::Bullish
        } else if latest.close < sma20 && sma20 < sma50 {
            Bias::Bearish
        } else {
            Bias::Neutral
        }),
        _ => None,
    };

    let ratio = volume_ratio(latest);
    let volume_trend = ratio.map(|r| {
        if r > 1.5 {
            VolumeTrend::High
        } else if r < 0.5 {
            VolumeTrend::Low
        } else {
            VolumeTrend::Normal
        }
    });

    let alignment = ma_alignment(latest);
    let recent_closes = &closes[closes.len().saturating_sub(RANGE_WINDOW)..];
    let full_range = closes.len() >= RANGE_WINDOW;

    Some(MarketConditions {
        date: latest.date,
        close: latest.close,
        rsi: latest.rsi14,
        rsi_status: latest.rsi14.map(rsi_status),
        macd_status,
        bb_position,
        ma_status,
        volume_ratio: ratio,
        volume_trend,
        ma_alignment: alignment,
        trend_strength: alignment.map(|a| trend_strength(latest, a)),
        sideways_score: sideways_score(snapshots),
        support: if full_range { min(recent_closes) } else { None },
        resistance: if full_range { max(recent_closes) } else { None },
        cost_position_3m: trailing_mean(&closes, COST_WINDOW_3M).and_then(|c| pct_change(latest.close, c)),
        cost_position_6m: trailing_mean(&closes, COST_WINDOW_6M).and_then(|c| pct_change(latest.close, c)),
    })
}
