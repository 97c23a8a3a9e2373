//! Input data-quality assessment.
//!
//! Runs on the raw (un-normalized) feature vector. Degradation is never an
//! error: it lowers the reported `data_quality` and is listed as
//! [`DataQualityIssue`]s on the forecast.

use statrs::statistics::Statistics;

use crate::config::defaults::{FLATLINE_PENALTY, MISSING_SAMPLE_PENALTY};
use crate::features::FeatureVector;
use crate::types::{Channel, DataQualityIssue};

#[derive(Debug, Clone, PartialEq)]
pub struct DataQualityReport {
    /// 0-1
    pub score: f64,
    pub issues: Vec<DataQualityIssue>,
}

/// Score the feature vector.
///
/// quality = 1 − 0.5 × (non-finite fraction over all six series)
///             − 0.2 if the Bz population std is below `bz_flatline_std`,
/// clamped to [0, 1]. Zero is a legitimate value (e.g. zero coupling under
/// northward IMF) and is not counted as missing. Bz with fewer than two finite
/// values counts as flatlined.
pub fn assess_data_quality(features: &FeatureVector, bz_flatline_std: f64) -> DataQualityReport {
    let mut score = 1.0;
    let mut issues = Vec::new();

    let total: usize = features.series.iter().map(Vec::len).sum();
    let missing = features.series.iter().flatten().filter(|v| !v.is_finite()).count();
    if total > 0 && missing > 0 {
        #[allow(clippy::cast_precision_loss)]
        let fraction = missing as f64 / total as f64;
        score -= fraction * MISSING_SAMPLE_PENALTY;
        issues.push(DataQualityIssue::MissingSamples { fraction });
    }

    let finite_bz: Vec<f64> = features.channel(Channel::Bz).iter().copied().filter(|v| v.is_finite()).collect();
    let flat = finite_bz.len() < 2 || finite_bz.iter().population_std_dev() < bz_flatline_std;
    if flat {
        score -= FLATLINE_PENALTY;
        issues.push(DataQualityIssue::FlatlinedChannel { channel: Channel::Bz });
    }

    DataQualityReport { score: f64::clamp(score, 0.0, 1.0), issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::{BZ_FLATLINE_STD, WINDOW_LEN};
    use crate::features::ContextualFeatures;
    use chrono::Utc;

    fn vector(bz: Vec<f64>, speed: Vec<f64>) -> FeatureVector {
        FeatureVector::from_series(
            [speed, vec![5.0], bz, vec![6.0], vec![0.0], vec![50.0]],
            ContextualFeatures::at(Utc::now()),
        )
    }

    fn varying_bz() -> Vec<f64> {
        (0..WINDOW_LEN).map(|i| if i % 2 == 0 { -3.0 } else { 2.0 }).collect()
    }

    #[test]
    fn test_clean_window_scores_one() {
        let report = assess_data_quality(&vector(varying_bz(), vec![400.0]), BZ_FLATLINE_STD);
        assert!((report.score - 1.0).abs() < 1e-12);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_zero_values_are_not_missing() {
        // coupling channel is all zeros in `vector`
        let report = assess_data_quality(&vector(varying_bz(), vec![0.0]), BZ_FLATLINE_STD);
        assert!(!report.issues.iter().any(|i| matches!(i, DataQualityIssue::MissingSamples { .. })));
    }

    #[test]
    fn test_flat_bz_penalised() {
        let report = assess_data_quality(&vector(vec![-2.0], vec![400.0]), BZ_FLATLINE_STD);
        assert!((report.score - 0.8).abs() < 1e-12);
        assert_eq!(report.issues, vec![DataQualityIssue::FlatlinedChannel { channel: Channel::Bz }]);
    }

    #[test]
    fn test_missing_fraction_penalised() {
        // one whole channel missing: 24 of 144 values
        let report = assess_data_quality(&vector(varying_bz(), Vec::new()), BZ_FLATLINE_STD);
        let fraction = 1.0 / 6.0;
        assert!((report.score - (1.0 - 0.5 * fraction)).abs() < 1e-12);
        assert!(matches!(
            report.issues[0],
            DataQualityIssue::MissingSamples { fraction: f } if (f - fraction).abs() < 1e-12
        ));
    }

    #[test]
    fn test_empty_window_scores_low() {
        let fv = FeatureVector::from_series(Default::default(), ContextualFeatures::at(Utc::now()));
        let report = assess_data_quality(&fv, BZ_FLATLINE_STD);
        // 1 − 0.5 − 0.2
        assert!((report.score - 0.3).abs() < 1e-12);
        assert_eq!(report.issues.len(), 2);
    }
}
