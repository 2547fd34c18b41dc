//! Input checks run before either engine touches the data.

use std::collections::HashSet;

use crate::{AnalysisError, AnalystEstimate, Horizon, PriceBar};

/// Reject bars that are out of order, duplicated, or carry impossible values.
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), AnalysisError> {
    for (i, bar) in bars.iter().enumerate() {
        if !(bar.open > 0.0 && bar.high > 0.0 && bar.low > 0.0 && bar.close > 0.0) {
            return Err(AnalysisError::invalid(format!(
                "bar {} ({}) has a non-positive price",
                i, bar.date
            )));
        }
        if bar.high < bar.low {
            return Err(AnalysisError::invalid(format!(
                "bar {} ({}) has high {} below low {}",
                i, bar.date, bar.high, bar.low
            )));
        }
        if bar.volume < 0 {
            return Err(AnalysisError::invalid(format!(
                "bar {} ({}) has negative volume {}",
                i, bar.date, bar.volume
            )));
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(AnalysisError::invalid(format!(
                "bars are not strictly ascending at index {} ({} after {})",
                i,
                bar.date,
                bars[i - 1].date
            )));
        }
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), AnalysisError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::invalid(format!("current price must be positive, got {}", price)))
    }
}

/// Source records must be 1-year targets with a coherent distribution.
pub fn validate_estimate(estimate: &AnalystEstimate) -> Result<(), AnalysisError> {
    let id = &estimate.source_id;
    if id.trim().is_empty() {
        return Err(AnalysisError::invalid("estimate source_id must not be empty"));
    }
    if estimate.horizon != Horizon::OneYear {
        return Err(AnalysisError::invalid(format!(
            "estimate from {} has horizon {}, sources publish 1y targets only",
            id, estimate.horizon
        )));
    }
    let targets = [
        estimate.target_mean,
        estimate.target_median,
        estimate.target_high,
        estimate.target_low,
    ];
    if targets.iter().any(|t| !t.is_finite() || *t <= 0.0) {
        return Err(AnalysisError::invalid(format!("estimate from {} has a non-positive target", id)));
    }
    if estimate.target_low > estimate.target_high {
        return Err(AnalysisError::invalid(format!(
            "estimate from {} has low target {} above high target {}",
            id, estimate.target_low, estimate.target_high
        )));
    }
    Ok(())
}

/// Check every record and reject a source that appears more than once.
pub fn validate_estimates(estimates: &[AnalystEstimate]) -> Result<(), AnalysisError> {
    let mut seen = HashSet::new();
    for estimate in estimates {
        validate_estimate(estimate)?;
        if !seen.insert(estimate.source_id.as_str()) {
            return Err(AnalysisError::invalid(format!(
                "source {} supplied more than one estimate",
                estimate.source_id
            )));
        }
    }
    Ok(())
}
