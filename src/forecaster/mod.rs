//! Neural Forecaster
//!
//! Normalizes a feature window, runs the stacked-LSTM sequence model and
//! denormalizes the nine outputs into 6h / 12h / 24h prediction windows with
//! confidence bounds, storm probabilities and forward-looking alerts.
//!
//! ## Lifecycle
//!
//! ```text
//! new(config) ──► Unloaded ──load_weights(path)──► Ready { trained: true }
//!                    │                      └─err─► Failed(reason)
//!                    └──init_untrained(seed)──────► Ready { trained: false }
//! ```
//!
//! `predict` refuses with [`ForecastError::ModelUnavailable`] unless the state
//! is `Ready`; it never fabricates numbers. It takes `&mut self`, so one
//! instance cannot run overlapping predictions.

pub mod alerts;
pub mod checkpoint;
pub mod ensemble;
pub mod lstm;
pub mod network;
pub mod normalizer;
pub mod quality;

pub use checkpoint::{CheckpointError, CheckpointMetadata, ModelCheckpoint};
pub use ensemble::{EnsembleEstimate, EnsembleOptions, HorizonSpread};
pub use network::SequenceModel;
pub use normalizer::FeatureNormalizer;
pub use quality::{assess_data_quality, DataQualityReport};

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{defaults, ForecasterConfig};
use crate::features::FeatureVector;
use crate::types::{
    Channel, ConfidenceInterval, ForecastConfidence, Horizon, NeuralForecast, PredictionWindow,
};

use network::NUM_OUTPUTS;

// ============================================================================
// Errors and state
// ============================================================================

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("forecast model unavailable: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("inference failed: {0}")]
    Inference(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecasterState {
    Unloaded,
    Ready { trained: bool },
    Failed(String),
}

/// Storm probability for a Kp value: 1/(1 + e^(−2(kp − 5))), clamped to [0, 1].
///
/// Exactly 0.5 at Kp 5 and strictly increasing.
pub fn storm_probability(kp: f64) -> f64 {
    (1.0 / (1.0 + (-2.0 * (kp - 5.0)).exp())).clamp(0.0, 1.0)
}

// ============================================================================
// Forecaster
// ============================================================================

pub struct NeuralForecaster {
    config: ForecasterConfig,
    normalizer: FeatureNormalizer,
    model: Option<Arc<SequenceModel>>,
    state: ForecasterState,
}

impl NeuralForecaster {
    /// Cheap constructor; no model is loaded yet.
    pub fn new(config: ForecasterConfig) -> Self {
        let normalizer = FeatureNormalizer::new(&config.normalization);
        Self { config, normalizer, model: None, state: ForecasterState::Unloaded }
    }

    pub fn state(&self) -> &ForecasterState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ForecasterState::Ready { .. })
    }

    pub fn normalizer(&self) -> &FeatureNormalizer {
        &self.normalizer
    }

    /// Load trained weights from a JSON checkpoint.
    ///
    /// On failure the forecaster moves to `Failed` and drops any previous
    /// model, so stale weights are never used silently.
    pub async fn load_weights(&mut self, path: &Path) -> Result<(), ForecastError> {
        let loaded = checkpoint::load_from_disk_async(path).await.and_then(|cp| {
            let trained = cp.metadata.trained;
            cp.into_model().map(|model| (model, trained))
        });
        match loaded {
            Ok((model, trained)) => {
                info!(
                    path = %path.display(),
                    params = model.num_params(),
                    trained,
                    "Loaded forecaster weights"
                );
                self.install(model, trained);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load forecaster weights");
                self.model = None;
                self.state = ForecasterState::Failed(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Install a model directly (e.g. from an in-memory checkpoint).
    pub fn load_model(&mut self, model: SequenceModel, trained: bool) -> Result<(), ForecastError> {
        let errors = model.shape_errors();
        if !errors.is_empty() {
            let err = CheckpointError::DimensionMismatch(errors);
            self.model = None;
            self.state = ForecasterState::Failed(err.to_string());
            return Err(err.into());
        }
        self.install(model, trained);
        Ok(())
    }

    /// Deterministic Glorot-initialised weights; confidence reflects that the
    /// model has never been trained.
    pub fn init_untrained(&mut self, seed: u64) {
        info!(seed, "Initialised untrained forecaster");
        self.install(SequenceModel::glorot(seed), false);
    }

    fn install(&mut self, model: SequenceModel, trained: bool) {
        self.model = Some(Arc::new(model));
        self.state = ForecasterState::Ready { trained };
    }

    fn ready_model(&self) -> Result<(Arc<SequenceModel>, bool), ForecastError> {
        match (&self.state, &self.model) {
            (ForecasterState::Ready { trained }, Some(model)) => Ok((Arc::clone(model), *trained)),
            (ForecasterState::Failed(reason), _) => Err(ForecastError::ModelUnavailable(reason.clone())),
            _ => Err(ForecastError::ModelUnavailable("no weights loaded".to_string())),
        }
    }

    /// Forecast from the current window; inference runs on the blocking pool.
    pub async fn predict(&mut self, features: &FeatureVector) -> Result<NeuralForecast, ForecastError> {
        self.predict_stamped(features, Utc::now()).await
    }

    /// As [`predict`](Self::predict), with horizons anchored at `now`.
    pub async fn predict_stamped(
        &mut self,
        features: &FeatureVector,
        now: DateTime<Utc>,
    ) -> Result<NeuralForecast, ForecastError> {
        let (model, trained) = self.ready_model()?;
        let report = assess_data_quality(features, self.config.bz_flatline_std);
        let rows = self.normalizer.normalize_vector(features);

        let raw = tokio::task::spawn_blocking(move || model.forward(&rows))
            .await
            .map_err(|e| ForecastError::Inference(format!("inference task failed: {e}")))?;

        self.build_forecast(&raw, report, trained, now)
    }

    /// Synchronous forecast stamped at `now`.
    pub fn predict_at(&mut self, features: &FeatureVector, now: DateTime<Utc>) -> Result<NeuralForecast, ForecastError> {
        let (model, trained) = self.ready_model()?;
        let report = assess_data_quality(features, self.config.bz_flatline_std);
        let rows = self.normalizer.normalize_vector(features);
        let raw = model.forward(&rows);
        self.build_forecast(&raw, report, trained, now)
    }

    /// Ensemble estimate with `runs` perturbed inferences, on the blocking pool.
    pub async fn ensemble(&mut self, features: &FeatureVector, runs: usize) -> Result<EnsembleEstimate, ForecastError> {
        let (model, _) = self.ready_model()?;
        let rows = self.normalizer.normalize_vector(features);
        let normalizer = self.normalizer.clone();
        let options = self.ensemble_options(runs);

        tokio::task::spawn_blocking(move || ensemble::run_ensemble(&model, &normalizer, &rows, options))
            .await
            .map_err(|e| ForecastError::Inference(format!("ensemble task failed: {e}")))?
    }

    /// Synchronous ensemble estimate.
    pub fn ensemble_blocking(&mut self, features: &FeatureVector, runs: usize) -> Result<EnsembleEstimate, ForecastError> {
        let (model, _) = self.ready_model()?;
        let rows = self.normalizer.normalize_vector(features);
        ensemble::run_ensemble(&model, &self.normalizer, &rows, self.ensemble_options(runs))
    }

    fn ensemble_options(&self, runs: usize) -> EnsembleOptions {
        EnsembleOptions {
            runs,
            noise_std: self.config.ensemble_noise_std,
            mc_dropout: self.config.mc_dropout,
            seed: self.config.ensemble_seed,
        }
    }

    fn window(&self, raw: &[f64; NUM_OUTPUTS], horizon: Horizon, now: DateTime<Utc>) -> PredictionWindow {
        let k = horizon.output_offset();
        let kp_raw = raw[k];
        let predicted_kp = self.normalizer.denormalize_kp(kp_raw).clamp(0.0, 9.0);
        let half = horizon.ci_half_width();
        let lower = self.normalizer.denormalize_kp(kp_raw - half).clamp(0.0, 9.0);
        let upper = self.normalizer.denormalize_kp(kp_raw + half).clamp(0.0, 9.0);

        PredictionWindow {
            timestamp: now + horizon.duration(),
            predicted_kp,
            predicted_bz: self.normalizer.denormalize(Channel::Bz, raw[k + 1]),
            predicted_psi: raw[k + 2] * defaults::PSI_SCALE,
            storm_probability: storm_probability(predicted_kp),
            confidence_interval: ConfidenceInterval { lower, upper },
        }
    }

    fn build_forecast(
        &self,
        raw: &[f64; NUM_OUTPUTS],
        report: DataQualityReport,
        trained: bool,
        now: DateTime<Utc>,
    ) -> Result<NeuralForecast, ForecastError> {
        if raw.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::Inference("model produced non-finite output".to_string()));
        }

        let six_hour = self.window(raw, Horizon::SixHour, now);
        let twelve_hour = self.window(raw, Horizon::TwelveHour, now);
        let twenty_four_hour = self.window(raw, Horizon::TwentyFourHour, now);

        let model_agreement = if trained {
            self.config.trained_model_agreement
        } else {
            self.config.untrained_model_agreement
        };
        let data_quality = report.score;
        let confidence = ForecastConfidence {
            overall: (model_agreement + data_quality) / 2.0,
            model_agreement,
            data_quality,
        };

        let alerts = alerts::generate_forecast_alerts(&six_hour, &twelve_hour, &twenty_four_hour, now);
        debug!(
            kp_6h = six_hour.predicted_kp,
            kp_24h = twenty_four_hour.predicted_kp,
            data_quality,
            alerts = alerts.len(),
            "Neural forecast generated"
        );

        Ok(NeuralForecast {
            generated_at: now,
            six_hour,
            twelve_hour,
            twenty_four_hour,
            confidence,
            alerts,
            data_quality_issues: report.issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureWindow;
    use crate::types::{DataQualityIssue, SolarWindSample};
    use chrono::Duration;

    fn full_window() -> FeatureVector {
        let mut w = FeatureWindow::new();
        let t0 = Utc::now() - Duration::hours(24);
        for i in 0..24 {
            let bz = if i % 2 == 0 { -4.0 } else { 1.0 };
            w.push_sample(&SolarWindSample::new(t0 + Duration::hours(i), 450.0, 6.0, bz, 6.0));
        }
        w.snapshot()
    }

    #[test]
    fn test_storm_probability_sigmoid() {
        assert!((storm_probability(5.0) - 0.5).abs() < 1e-12);
        let mut prev = storm_probability(0.0);
        for i in 1..=90 {
            let p = storm_probability(f64::from(i) / 10.0);
            assert!(p > prev);
            prev = p;
        }
        assert!((0.0..=1.0).contains(&storm_probability(-100.0)));
        assert!((0.0..=1.0).contains(&storm_probability(100.0)));
    }

    #[test]
    fn test_unloaded_refuses_to_predict() {
        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        assert!(!f.is_ready());
        assert_eq!(f.state(), &ForecasterState::Unloaded);
        let err = f.predict_at(&full_window(), Utc::now()).expect_err("unloaded");
        assert!(matches!(err, ForecastError::ModelUnavailable(_)));
    }

    #[test]
    fn test_untrained_forecast_invariants() {
        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        f.init_untrained(42);
        assert_eq!(f.state(), &ForecasterState::Ready { trained: false });

        let now = Utc::now();
        let fc = f.predict_at(&full_window(), now).expect("forecast");
        assert_eq!(fc.generated_at, now);
        assert!((fc.confidence.model_agreement - 0.5).abs() < 1e-12);
        assert!((fc.confidence.overall - (0.5 + fc.confidence.data_quality) / 2.0).abs() < 1e-12);

        for h in Horizon::ALL {
            let w = fc.window(h);
            assert_eq!(w.timestamp, now + h.duration());
            assert!((0.0..=9.0).contains(&w.predicted_kp));
            assert!((0.0..=1.0).contains(&w.storm_probability));
            assert!(w.confidence_interval.lower <= w.confidence_interval.upper);
            assert!(w.confidence_interval.lower >= 0.0 && w.confidence_interval.upper <= 9.0);
        }
    }

    #[test]
    fn test_predict_at_is_deterministic() {
        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        f.init_untrained(7);
        let now = Utc::now();
        let a = f.predict_at(&full_window(), now).expect("forecast");
        let b = f.predict_at(&full_window(), now).expect("forecast");
        assert_eq!(a, b);
    }

    #[test]
    fn test_degraded_input_reported_not_fatal() {
        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        f.init_untrained(42);
        let empty = FeatureWindow::new().snapshot_at(Utc::now());
        let fc = f.predict_at(&empty, Utc::now()).expect("degraded forecast still produced");
        assert!(fc.confidence.data_quality < 0.5);
        assert!(fc
            .data_quality_issues
            .iter()
            .any(|i| matches!(i, DataQualityIssue::MissingSamples { .. })));
    }

    #[test]
    fn test_trained_model_agreement() {
        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        f.load_model(SequenceModel::glorot(3), true).expect("valid model");
        let fc = f.predict_at(&full_window(), Utc::now()).expect("forecast");
        assert!((fc.confidence.model_agreement - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_bad_model_marks_failed() {
        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        let mut model = SequenceModel::glorot(3);
        model.output.kernel.clear();
        assert!(f.load_model(model, true).is_err());
        assert!(matches!(f.state(), ForecasterState::Failed(_)));
        assert!(matches!(
            f.predict_at(&full_window(), Utc::now()),
            Err(ForecastError::ModelUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_async_predict_matches_sync() {
        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        f.init_untrained(11);
        let fv = full_window();
        let a = f.predict(&fv).await.expect("async forecast");
        let b = f.predict_at(&fv, a.generated_at).expect("sync forecast");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_load_weights_missing_file_fails() {
        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        let err = f.load_weights(Path::new("/nonexistent/model.json")).await.expect_err("missing");
        assert!(matches!(err, ForecastError::Checkpoint(CheckpointError::Io { .. })));
        assert!(matches!(f.state(), ForecasterState::Failed(_)));
    }

    #[tokio::test]
    async fn test_load_weights_from_checkpoint() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        let meta = CheckpointMetadata {
            model_name: "test".to_string(),
            created_at: Utc::now(),
            trained: true,
            validation_loss: None,
        };
        checkpoint::save_to_disk(&ModelCheckpoint::from_model(&SequenceModel::glorot(5), meta), &path)
            .expect("save");

        let mut f = NeuralForecaster::new(ForecasterConfig::default());
        f.load_weights(&path).await.expect("load");
        assert_eq!(f.state(), &ForecasterState::Ready { trained: true });
        let est = f.ensemble(&full_window(), 8).await.expect("ensemble");
        assert_eq!(est.runs, 8);
    }
}
