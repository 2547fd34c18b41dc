use analysis_core::{AnalystEstimate, ExtrapolatedEstimate, GrowthAssumptions, Horizon};
use chrono::{Months, NaiveDate};

/// Project a 1y estimate onto `horizon` by compounding the growth assumptions.
///
/// Mean and median share the mean rate; high and low use their own rates.
/// A 1y horizon returns the native estimate unchanged.
pub fn extrapolate(
    estimate: &AnalystEstimate,
    horizon: Horizon,
    growth: &GrowthAssumptions,
) -> ExtrapolatedEstimate {
    let mut projected = ExtrapolatedEstimate::from(estimate);
    if horizon == Horizon::OneYear {
        return projected;
    }

    let mean_factor = GrowthAssumptions::factor(growth.mean, horizon);
    projected.horizon = horizon;
    projected.target_mean *= mean_factor;
    projected.target_median *= mean_factor;
    projected.target_high *= GrowthAssumptions::factor(growth.high, horizon);
    projected.target_low *= GrowthAssumptions::factor(growth.low, horizon);
    projected
}

/// Date the target refers to: `as_of` plus the horizon's years.
///
/// Feb 29 falls back to Feb 28 in non-leap target years.
pub fn target_date(as_of: NaiveDate, horizon: Horizon) -> Option<NaiveDate> {
    as_of.checked_add_months(Months::new(12 * horizon.years()))
}
