use analysis_core::{ConsensusWeights, RecommendationCounts, RecommendationSplit};
use std::cmp::Reverse;

/// 100 at zero dispersion, falling linearly with the coefficient of variation.
pub fn target_agreement(cv: f64, weights: &ConsensusWeights) -> f64 {
    (100.0 - cv * weights.cv_penalty).clamp(0.0, 100.0)
}

/// Share of the most common recommendation, in percent. `None` when nothing was counted.
pub fn recommendation_agreement(counts: &RecommendationCounts) -> Option<f64> {
    let total = counts.total();
    if total == 0 {
        return None;
    }
    let dominant = counts.buy.max(counts.hold).max(counts.sell);
    Some(100.0 * dominant as f64 / total as f64)
}

/// Weighted blend of target and recommendation agreement.
///
/// Without any recommendation counts the score rests on target agreement alone.
pub fn consensus_score(cv: f64, counts: &RecommendationCounts, weights: &ConsensusWeights) -> f64 {
    let targets = target_agreement(cv, weights);
    let score = match recommendation_agreement(counts) {
        Some(recommendations) => {
            weights.target_agreement * targets + weights.recommendation_agreement * recommendations
        }
        None => targets,
    };
    score.clamp(0.0, 100.0)
}

/// Buy/hold/sell shares rounded to hundredths of a percent.
///
/// Rounding happens in integer hundredths; the remainder goes to the largest
/// share (buy wins ties, then hold) so the three add up to exactly 100.
pub fn recommendation_split(counts: &RecommendationCounts) -> Option<RecommendationSplit> {
    let total = counts.total() as i64;
    if total == 0 {
        return None;
    }

    let whole = RecommendationSplit::WHOLE as i64;
    let raw = [counts.buy, counts.hold, counts.sell];
    let mut shares = raw.map(|n| (n as i64 * whole * 2 + total) / (total * 2));

    let largest = (0..raw.len())
        .max_by_key(|&i| (raw[i], Reverse(i)))
        .unwrap_or(0);
    shares[largest] += whole - shares.iter().sum::<i64>();

    let [buy, hold, sell] = shares.map(|s| s.clamp(0, whole) as u32);
    Some(RecommendationSplit { buy, hold, sell })
}
