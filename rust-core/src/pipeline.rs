//! End-to-end restoration run: resample, filter, plan, movement, report
//!
//! This is the only layer that logs. Install a `tracing` subscriber to see
//! the per-stage events; without one nothing is emitted.

use crate::error::{RestorationError, Result};
use crate::filters::{restore, FilterMethod, FilterParameters};
use crate::movement::{
    calculate_movement, check_restrictions, extract_peaks, improvement_rate, Movement,
    MovementLimits, Peak, RestrictionReport, TrackAxis,
};
use crate::plan::{generate_initial, PlanLine};
use crate::processing::ChunkOptions;
use crate::series::MeasurementSeries;
use crate::spectrum::{AnalyzerConfig, WavelengthSpectrum};
use crate::stats::Statistics;
use crate::versine::{eccentric_versine, ChordConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info_span};

/// Settings for a full restoration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RestorationConfig {
    /// Resample non-uniform input onto the filter's sampling interval
    pub resample: bool,

    pub filter: FilterParameters,

    pub method: FilterMethod,

    /// Chord the input was measured with; enables the inverse kernel
    pub measured_chord: Option<ChordConfig>,

    /// Chords whose versine of the restored waveform goes into the report
    pub versine_chords: Vec<ChordConfig>,

    /// Moving-average width of the initial plan line, in samples
    pub plan_window: usize,

    pub axis: TrackAxis,

    pub limits: MovementLimits,

    /// Minimum spacing of reported movement peaks, in samples
    pub peak_separation: usize,

    /// `None` processes the whole series at once
    pub chunk_size: Option<usize>,

    pub parallel: bool,
}

impl Default for RestorationConfig {
    fn default() -> Self {
        Self {
            resample: true,
            filter: FilterParameters::default(),
            method: FilterMethod::Direct,
            measured_chord: None,
            versine_chords: vec![ChordConfig::symmetric(5.0), ChordConfig::symmetric(10.0)],
            plan_window: 41,
            axis: TrackAxis::Vertical,
            limits: MovementLimits::default(),
            peak_separation: 40,
            chunk_size: None,
            parallel: false,
        }
    }
}

impl RestorationConfig {
    /// Parse and validate a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        if let Some(chord) = &self.measured_chord {
            chord.validate()?;
        }
        for chord in &self.versine_chords {
            chord.validate()?;
        }
        if self.plan_window == 0 {
            return Err(RestorationError::invalid_input("plan window must be positive"));
        }
        if self.chunk_size == Some(0) {
            return Err(RestorationError::invalid_input("chunk size must be positive"));
        }
        self.limits.validate()
    }

    /// Chunking options described by this configuration
    pub fn chunk_options(&self) -> ChunkOptions<'static> {
        let options = match self.chunk_size {
            Some(size) => ChunkOptions::chunked(size),
            None => ChunkOptions::whole_series(),
        };
        options.with_parallel(self.parallel)
    }
}

/// Statistics block of a report
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatistics {
    /// Uniform input series
    pub original: Statistics,

    pub restored: Statistics,

    /// Restored waveform away from the zero-filled edges
    pub restored_reliable: Statistics,

    /// Restored waveform after the planned movement
    pub predicted: Statistics,

    pub movement: Statistics,

    /// σ reduction from original to restored, in percent
    pub filter_improvement: f64,

    /// σ reduction from restored to predicted, in percent
    pub improvement_rate: f64,

    /// Share of the input's spectral energy inside the filter band
    pub band_energy_fraction: f64,
}

/// Everything a restoration run produces
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorationReport {
    pub restored_waveform: MeasurementSeries,

    /// Samples this close to either end saw zero-filled input
    pub edge_margin: usize,

    pub plan_line: PlanLine,
    pub movement: Movement,
    pub versine_data: BTreeMap<String, MeasurementSeries>,
    pub statistics: ReportStatistics,
    pub restrictions: RestrictionReport,
    pub peaks: Vec<Peak>,
    pub filter_params: FilterParameters,

    limits: MovementLimits,
    peak_separation: usize,
}

impl RestorationReport {
    /// Recompute movement, restrictions, peaks and statistics for an edited plan
    pub fn replan(&mut self, plan: PlanLine) -> Result<()> {
        let movement = calculate_movement(&self.restored_waveform, &plan, self.movement.axis)?;
        let restrictions = check_restrictions(&movement.amounts(), &self.limits)?;
        let peaks = extract_peaks(&movement.as_series(), self.peak_separation);

        let predicted = Statistics::of_series(&movement.predicted);
        self.statistics.predicted = predicted;
        self.statistics.movement = movement.statistics();
        self.statistics.improvement_rate =
            improvement_rate(self.statistics.restored.sigma, predicted.sigma);

        self.plan_line = plan;
        self.movement = movement;
        self.restrictions = restrictions;
        self.peaks = peaks;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs the whole restoration chain with one configuration
#[derive(Debug, Clone)]
pub struct RestorationPipeline {
    config: RestorationConfig,
}

impl RestorationPipeline {
    pub fn new(config: RestorationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RestorationConfig {
        &self.config
    }

    pub fn run(&self, series: &MeasurementSeries) -> Result<RestorationReport> {
        self.run_with(series, &self.config.chunk_options())
    }

    /// Run with caller-supplied chunking (for progress reporting or cancellation)
    ///
    /// # Arguments
    /// * `series` - Measured irregularity, resampled first when the config allows
    /// * `options` - Chunking, progress callback and cancellation flag
    ///
    /// # Returns
    /// The full report, or `Cancelled` if the flag was raised mid-run
    pub fn run_with(
        &self,
        series: &MeasurementSeries,
        options: &ChunkOptions<'_>,
    ) -> Result<RestorationReport> {
        let config = &self.config;
        let params = &config.filter;
        let span = info_span!(
            "restoration",
            samples = series.len(),
            order = params.filter_order
        );
        let _guard = span.enter();

        let uniform = if config.resample {
            series.ensure_uniform(params.sampling_interval)?
        } else {
            series.check_uniform(params.sampling_interval)?;
            series.clone()
        };
        debug!(samples = uniform.len(), interval = params.sampling_interval, "input prepared");

        let chord = config.measured_chord.as_ref();
        let filtered = restore(&uniform, params, chord, config.method, options)?;
        let original = Statistics::of_series(&uniform);
        let restored = Statistics::of_series(&filtered.series);
        let restored_reliable =
            Statistics::of_range(&filtered.series.values(), filtered.reliable_range());
        debug!(
            sigma_before = original.sigma,
            sigma_after = restored.sigma,
            edge_margin = filtered.edge_margin,
            "restoration waveform computed"
        );

        let band_energy_fraction = WavelengthSpectrum::analyze(&uniform, &AnalyzerConfig::default())
            .map(|spectrum| spectrum.band_fraction(params.min_wavelength, params.max_wavelength))
            .unwrap_or(0.0);

        let mut versine_data = BTreeMap::new();
        for chord in &config.versine_chords {
            let versine = eccentric_versine(&filtered.series, chord, options)?;
            versine_data.insert(chord.label(), versine);
        }
        debug!(chords = versine_data.len(), "versine views computed");

        let plan = generate_initial(&filtered.series, config.plan_window)?;
        let movement = calculate_movement(&filtered.series, &plan, config.axis)?;

        let mut report = RestorationReport {
            restored_waveform: filtered.series,
            edge_margin: filtered.edge_margin,
            plan_line: plan.clone(),
            movement,
            versine_data,
            statistics: ReportStatistics {
                original,
                restored,
                restored_reliable,
                filter_improvement: improvement_rate(original.sigma, restored.sigma),
                band_energy_fraction,
                ..ReportStatistics::default()
            },
            restrictions: RestrictionReport::default(),
            peaks: Vec::new(),
            filter_params: *params,
            limits: config.limits,
            peak_separation: config.peak_separation,
        };
        report.replan(plan)?;
        debug!(
            improvement = report.statistics.improvement_rate,
            over_standard = report.restrictions.standard_exceeded.len(),
            over_maximum = report.restrictions.maximum_exceeded.len(),
            "movement computed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::WindowType;
    use crate::series::MeasurementPoint;
    use std::f64::consts::PI;
    use std::sync::atomic::AtomicBool;

    fn track(n: usize) -> MeasurementSeries {
        let values = (0..n)
            .map(|i| {
                let d = i as f64 * 0.25;
                6.0 * (2.0 * PI * d / 25.0).sin() + 1.5 * (2.0 * PI * d / 1.5).sin()
            })
            .collect();
        MeasurementSeries::uniform(0.0, 0.25, values).unwrap()
    }

    fn config() -> RestorationConfig {
        RestorationConfig {
            filter: FilterParameters::with_recommended_order(6.0, 40.0, 0.25, WindowType::Hamming),
            ..RestorationConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RestorationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let json = r#"{
            "filter": {
                "minWavelength": 6.0,
                "maxWavelength": 100.0,
                "samplingInterval": 0.25,
                "filterOrder": 201
            },
            "measuredChord": { "p": 7.5, "q": 2.5 },
            "axis": "lateral",
            "chunkSize": 5000
        }"#;
        let config = RestorationConfig::from_json(json).unwrap();
        assert_eq!(config.filter.filter_order, 201);
        assert_eq!(config.filter.window, WindowType::Hamming);
        assert_eq!(config.measured_chord, Some(ChordConfig::new(7.5, 2.5)));
        assert_eq!(config.axis, TrackAxis::Lateral);
        assert_eq!(config.chunk_size, Some(5000));
        assert_eq!(config.plan_window, 41);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            RestorationConfig::from_json("{ not json"),
            Err(RestorationError::Config(_))
        ));
        let even = r#"{ "filter": {
            "minWavelength": 6.0,
            "maxWavelength": 40.0,
            "samplingInterval": 0.25,
            "filterOrder": 200
        } }"#;
        assert!(matches!(
            RestorationConfig::from_json(even),
            Err(RestorationError::InvalidInput(_))
        ));
        assert!(RestorationConfig::from_json(r#"{ "planWindow": 0 }"#).is_err());
    }

    #[test]
    fn test_run_produces_consistent_report() {
        let pipeline = RestorationPipeline::new(config()).unwrap();
        let series = track(2400);
        let report = pipeline.run(&series).unwrap();

        assert_eq!(report.restored_waveform.len(), series.len());
        assert_eq!(report.plan_line.len(), series.len());
        assert_eq!(report.movement.len(), series.len());
        assert_eq!(report.edge_margin, report.filter_params.filter_order / 2);
        assert!(report.versine_data.contains_key("10m"));
        assert!(report.versine_data.contains_key("20m"));
        assert!(report.statistics.restored.sigma < report.statistics.original.sigma);
        assert!(report.statistics.filter_improvement > 0.0);
        assert_eq!(
            report.statistics.restored_reliable.count,
            series.len() - 2 * report.edge_margin
        );
        assert!(report.statistics.band_energy_fraction > 0.5);

        for (i, record) in report.movement.records.iter().enumerate() {
            let expected = report.plan_line.series().value(i) - report.restored_waveform.value(i);
            assert!((record.tamping - expected).abs() < 1e-12);
        }
        assert!(report.to_json().unwrap().contains("restoredWaveform"));
    }

    #[test]
    fn test_chunked_parallel_run_matches_whole() {
        let series = track(3000);
        let whole = RestorationPipeline::new(config()).unwrap().run(&series).unwrap();
        let chunked_config = RestorationConfig {
            chunk_size: Some(700),
            parallel: true,
            ..config()
        };
        let chunked = RestorationPipeline::new(chunked_config).unwrap().run(&series).unwrap();
        let chunked_values = chunked.restored_waveform.values();
        for (a, b) in whole.restored_waveform.values().iter().zip(chunked_values) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_non_uniform_input_is_resampled() {
        // Long enough for the default kernel to leave a reliable interior
        let points: Vec<MeasurementPoint> = (0..1800)
            .map(|i| {
                let d = i as f64 * 0.3 + if i % 2 == 0 { 0.0 } else { 0.05 };
                MeasurementPoint::new(d, (2.0 * PI * d / 20.0).sin())
            })
            .collect();
        let series = MeasurementSeries::new(points).unwrap();
        let report = RestorationPipeline::new(config()).unwrap().run(&series).unwrap();
        assert!(report.restored_waveform.is_uniform(1e-6));
        assert!(report.statistics.restored_reliable.count > 0);

        let strict = RestorationConfig {
            resample: false,
            ..config()
        };
        assert!(RestorationPipeline::new(strict).unwrap().run(&series).is_err());
    }

    #[test]
    fn test_cancelled_run() {
        let cancel = AtomicBool::new(true);
        let pipeline = RestorationPipeline::new(config()).unwrap();
        let options = ChunkOptions::chunked(500).with_cancel(&cancel);
        assert!(matches!(
            pipeline.run_with(&track(2000), &options),
            Err(RestorationError::Cancelled)
        ));
    }

    #[test]
    fn test_replan_with_flat_plan() {
        let pipeline = RestorationPipeline::new(config()).unwrap();
        let mut report = pipeline.run(&track(2400)).unwrap();

        let flat = report.restored_waveform.with_values(vec![0.0; 2400]);
        let flat = PlanLine::from_series(flat).unwrap();
        report.replan(flat).unwrap();
        assert_eq!(report.statistics.predicted.sigma, 0.0);
        assert!((report.statistics.improvement_rate - 100.0).abs() < 1e-12);
        assert!(!report.peaks.is_empty());
        assert!(report.peaks.windows(2).all(|w| w[1].index - w[0].index >= 40));
    }
}
