//! Cycle Pipeline - one full analysis pass per telemetry snapshot
//!
//! ```text
//! STEP 1: Ingest sample into the feature window
//! STEP 2: Derived physics metrics (coupling, Dst, morphology, lag, coherence)
//! STEP 3: Neural forecast (stale/unavailable fallback on failure)
//! STEP 4: Optional ensemble spread
//! STEP 5: Alert stack
//! STEP 6: Aurora windows per city
//! ```
//!
//! The pipeline never fails a cycle: forecast errors degrade to the last good
//! forecast and every other step is total.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alerts::{AlertClassifier, AlertInput};
use crate::aurora::{default_cities, forecast_points_from_neural, kp_forecast_points, AuroraPredictor};
use crate::config::defaults::WINDOW_LEN;
use crate::config::{AuroraConfig, DstParams, PipelineConfig, SkollConfig};
use crate::features::{FeatureVector, FeatureWindow};
use crate::forecaster::{EnsembleEstimate, NeuralForecaster};
use crate::physics_engine::{newell_coupling, DerivedMetrics, MetricsInput};
use crate::types::{
    AlertStack, AuroraWindow, City, KpForecastPoint, NeuralForecast, SolarWindSample, TelemetryCycle,
};

/// Outcome of the forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastStatus {
    Fresh(NeuralForecast),
    /// Previous good forecast re-served because this cycle's failed
    Stale { forecast: NeuralForecast, reason: String },
    Unavailable { reason: String },
}

impl ForecastStatus {
    /// Forecast to present, fresh or stale.
    pub fn forecast(&self) -> Option<&NeuralForecast> {
        match self {
            ForecastStatus::Fresh(f) | ForecastStatus::Stale { forecast: f, .. } => Some(f),
            ForecastStatus::Unavailable { .. } => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, ForecastStatus::Fresh(_))
    }
}

/// Everything one cycle produces for the display layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleOutput {
    pub generated_at: DateTime<Utc>,
    pub features: FeatureVector,
    pub derived: DerivedMetrics,
    pub forecast: ForecastStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<EnsembleEstimate>,
    pub alert_stack: AlertStack,
    pub aurora_windows: Vec<AuroraWindow>,
}

/// Owns the rolling window, the forecaster and the per-cycle scalar state.
pub struct SpaceWeatherPipeline {
    window: FeatureWindow,
    forecaster: NeuralForecaster,
    classifier: AlertClassifier,
    aurora: AuroraPredictor,
    aurora_config: AuroraConfig,
    dst_params: DstParams,
    config: PipelineConfig,
    cities: Vec<City>,
    /// Recent samples for the morphology classifier, oldest first
    recent_samples: VecDeque<SolarWindSample>,
    coupling_series: VecDeque<f64>,
    kp_series: VecDeque<f64>,
    prev_dst: f64,
    last_good_forecast: Option<NeuralForecast>,
    ensemble_runs: Option<usize>,
    // Statistics
    cycles_processed: u64,
    forecasts_fresh: u64,
    forecasts_stale: u64,
    forecasts_unavailable: u64,
    alerts_emitted: u64,
}

impl SpaceWeatherPipeline {
    /// The forecaster is handed over already constructed; loading it is the
    /// caller's job so a missing model surfaces as unavailable forecasts
    /// rather than a construction failure.
    pub fn new(config: &SkollConfig, forecaster: NeuralForecaster) -> Self {
        info!(
            forecaster_ready = forecaster.is_ready(),
            window = WINDOW_LEN,
            "Initializing space-weather pipeline"
        );
        Self {
            window: FeatureWindow::new(),
            forecaster,
            classifier: AlertClassifier::new(config.alerts.clone()),
            aurora: AuroraPredictor::new(config.aurora.clone()),
            aurora_config: config.aurora.clone(),
            dst_params: config.dst.clone(),
            config: config.pipeline.clone(),
            cities: default_cities(),
            recent_samples: VecDeque::with_capacity(WINDOW_LEN),
            coupling_series: VecDeque::with_capacity(WINDOW_LEN),
            kp_series: VecDeque::with_capacity(WINDOW_LEN),
            prev_dst: 0.0,
            last_good_forecast: None,
            ensemble_runs: None,
            cycles_processed: 0,
            forecasts_fresh: 0,
            forecasts_stale: 0,
            forecasts_unavailable: 0,
            alerts_emitted: 0,
        }
    }

    /// Replace the built-in city list.
    #[must_use]
    pub fn with_cities(mut self, cities: Vec<City>) -> Self {
        self.cities = cities;
        self
    }

    /// Run an ensemble of `runs` perturbed inferences every cycle.
    #[must_use]
    pub fn with_ensemble_runs(mut self, runs: usize) -> Self {
        self.ensemble_runs = (runs > 0).then_some(runs);
        self
    }

    pub fn forecaster(&self) -> &NeuralForecaster {
        &self.forecaster
    }

    pub fn forecaster_mut(&mut self) -> &mut NeuralForecaster {
        &mut self.forecaster
    }

    pub fn window(&self) -> &FeatureWindow {
        &self.window
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Run one full cycle for `cycle`, stamping outputs at `now`.
    pub async fn run_cycle(&mut self, cycle: &TelemetryCycle, now: DateTime<Utc>) -> CycleOutput {
        self.cycles_processed += 1;
        let sample = cycle.sample;

        // STEP 1: ingest
        let dt_hours = self.hours_since_last(&sample);
        self.window.push_sample(&sample);
        push_bounded(&mut self.recent_samples, sample);
        push_bounded(&mut self.coupling_series, newell_coupling(&sample));
        push_bounded(&mut self.kp_series, cycle.kp);

        // STEP 2: physics
        let history: Vec<SolarWindSample> = self.recent_samples.iter().copied().collect();
        let coupling: Vec<f64> = self.coupling_series.iter().copied().collect();
        let kp_series: Vec<f64> = self.kp_series.iter().copied().collect();
        let derived = DerivedMetrics::compute(
            &MetricsInput {
                sample: &sample,
                kp: cycle.kp,
                xray_flux: cycle.xray_flux,
                proton_flux_10mev: cycle.proton_flux_10mev,
                prev_dst: self.prev_dst,
                dt_hours,
                history: &history,
                coupling_series: &coupling,
                kp_series: &kp_series,
                sample_period_secs: dt_hours * 3600.0,
            },
            &self.dst_params,
        );
        self.prev_dst = derived.dst_estimate;

        // STEP 3: forecast
        let features = self.window.snapshot_at(sample.timestamp);
        let forecast = match self.forecaster.predict_stamped(&features, now).await {
            Ok(fc) => {
                self.forecasts_fresh += 1;
                self.last_good_forecast = Some(fc.clone());
                ForecastStatus::Fresh(fc)
            }
            Err(e) => {
                warn!(error = %e, "Forecast failed, falling back");
                self.fallback_forecast(e.to_string(), now)
            }
        };

        // STEP 4: ensemble
        let ensemble = match self.ensemble_runs {
            Some(runs) if self.forecaster.is_ready() => match self.forecaster.ensemble(&features, runs).await {
                Ok(est) => Some(est),
                Err(e) => {
                    warn!(error = %e, runs, "Ensemble failed");
                    None
                }
            },
            _ => None,
        };

        // STEP 5: alerts
        let alert_stack = self.classifier.build_alert_stack(&AlertInput::from_cycle(cycle), now);
        self.alerts_emitted += alert_stack.events.len() as u64;

        // STEP 6: aurora
        let outlook = self.aurora_outlook(cycle, forecast.forecast(), now);
        let aurora_windows = self.aurora.city_windows(&self.cities, &outlook, now);

        debug!(
            cycle = self.cycles_processed,
            dst = derived.dst_estimate,
            fresh = forecast.is_fresh(),
            alerts = alert_stack.events.len(),
            dominant = %alert_stack.dominant_class,
            "Cycle complete"
        );

        CycleOutput {
            generated_at: now,
            features,
            derived,
            forecast,
            ensemble,
            alert_stack,
            aurora_windows,
        }
    }

    fn hours_since_last(&self, sample: &SolarWindSample) -> f64 {
        self.window
            .last_timestamp()
            .map(|last| (sample.timestamp - last).num_seconds())
            .filter(|secs| *secs > 0)
            .map_or(self.config.default_cycle_hours, |secs| {
                // Cycle gaps fit comfortably in f64
                #[allow(clippy::cast_precision_loss)]
                let hours = secs as f64 / 3600.0;
                hours
            })
    }

    fn fallback_forecast(&mut self, reason: String, now: DateTime<Utc>) -> ForecastStatus {
        let max_age = Duration::hours(self.config.max_stale_forecast_hours);
        match &self.last_good_forecast {
            Some(prev) if now - prev.generated_at <= max_age => {
                self.forecasts_stale += 1;
                ForecastStatus::Stale { forecast: prev.clone(), reason }
            }
            Some(prev) => {
                self.forecasts_unavailable += 1;
                let age_hours = (now - prev.generated_at).num_hours();
                ForecastStatus::Unavailable {
                    reason: format!("{reason} (last forecast {age_hours}h old)"),
                }
            }
            None => {
                self.forecasts_unavailable += 1;
                ForecastStatus::Unavailable { reason }
            }
        }
    }

    /// Upstream outlook when supplied, else the neural horizons, else the
    /// current Kp alone.
    fn aurora_outlook(
        &self,
        cycle: &TelemetryCycle,
        forecast: Option<&NeuralForecast>,
        now: DateTime<Utc>,
    ) -> Vec<KpForecastPoint> {
        match (&cycle.kp_forecast, forecast) {
            (Some(values), _) if !values.is_empty() => {
                kp_forecast_points(now, values, self.aurora_config.forecast_step_hours, &self.aurora_config)
            }
            (_, Some(fc)) => forecast_points_from_neural(fc, cycle.kp, now),
            _ => vec![KpForecastPoint { time: now, kp: cycle.kp, confidence: None }],
        }
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            cycles_processed: self.cycles_processed,
            forecasts_fresh: self.forecasts_fresh,
            forecasts_stale: self.forecasts_stale,
            forecasts_unavailable: self.forecasts_unavailable,
            alerts_emitted: self.alerts_emitted,
            dst_estimate: self.prev_dst,
        }
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T) {
    if buf.len() == WINDOW_LEN {
        buf.pop_front();
    }
    buf.push_back(value);
}

/// Pipeline statistics
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStats {
    pub cycles_processed: u64,
    pub forecasts_fresh: u64,
    pub forecasts_stale: u64,
    pub forecasts_unavailable: u64,
    pub alerts_emitted: u64,
    pub dst_estimate: f64,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pipeline: {} cycles, forecasts {} fresh / {} stale / {} unavailable, {} alerts, Dst {:.1} nT",
            self.cycles_processed,
            self.forecasts_fresh,
            self.forecasts_stale,
            self.forecasts_unavailable,
            self.alerts_emitted,
            self.dst_estimate
        )
    }
}
