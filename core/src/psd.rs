use crate::error::{Result, WaveformError};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Number of frequency points used to sample the PSD window
pub const DEFAULT_PSD_POINTS: usize = 500;

/// Below this |π f T| the sinc is taken as exactly 1
const SINC_EPSILON: f64 = 1e-6;

/// Inputs of the sinc-squared PSD model.
///
/// Rate and bandwidth only need consistent units (Msps with MHz, or sps with Hz).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsdParams {
    pub symbol_rate: f64,
    pub signal_power_dbm: f64,
    pub bandwidth: f64,
}

impl Default for PsdParams {
    fn default() -> Self {
        Self {
            symbol_rate: 10.0,
            signal_power_dbm: 0.0,
            bandwidth: 20.0,
        }
    }
}

impl PsdParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.symbol_rate.is_finite() && self.symbol_rate > 0.0) {
            return Err(WaveformError::InvalidConfig(format!(
                "symbol rate must be positive, got {}",
                self.symbol_rate
            )));
        }
        if !(self.bandwidth.is_finite() && self.bandwidth > 0.0) {
            return Err(WaveformError::InvalidConfig(format!(
                "bandwidth must be positive, got {}",
                self.bandwidth
            )));
        }
        if !self.signal_power_dbm.is_finite() {
            return Err(WaveformError::InvalidConfig("signal power must be finite".into()));
        }
        Ok(())
    }

    /// Signal power in linear units (mW when the input is dBm)
    pub fn power_linear(&self) -> f64 {
        10f64.powf(self.signal_power_dbm / 10.0)
    }

    pub fn symbol_period(&self) -> f64 {
        1.0 / self.symbol_rate
    }
}

/// A sampled spectrum: parallel frequency and value columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub values: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest value, or 0 for an empty spectrum
    pub fn peak(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// (frequency, value) rows; a longer column is cut to the shorter one
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies.iter().copied().zip(self.values.iter().copied())
    }

    /// Frequency of the largest value
    pub fn peak_frequency(&self) -> Option<f64> {
        self.rows().max_by(|a, b| a.1.total_cmp(&b.1)).map(|(f, _)| f)
    }

    /// Scale so the peak is 1. A zero peak divides by 1.
    pub fn normalized(&self) -> Spectrum {
        let peak = self.peak();
        let scale = if peak == 0.0 { 1.0 } else { peak };
        Spectrum {
            frequencies: self.frequencies.clone(),
            values: self.values.iter().map(|v| v / scale).collect(),
        }
    }

    /// 10·log10 of each value, clamped below at `floor_db`
    pub fn to_db(&self, floor_db: f64) -> Spectrum {
        Spectrum {
            frequencies: self.frequencies.clone(),
            values: self
                .values
                .iter()
                .map(|&v| if v > 0.0 { (10.0 * v.log10()).max(floor_db) } else { floor_db })
                .collect(),
        }
    }

    /// The `count` largest (frequency, value) rows, largest first
    pub fn strongest(&self, count: usize) -> Vec<(f64, f64)> {
        let mut rows: Vec<(f64, f64)> = self.rows().collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows.truncate(count);
        rows
    }
}

/// sin(x)/x with the removable singularity filled in
fn sinc(x: f64) -> f64 {
    if x.abs() < SINC_EPSILON {
        1.0
    } else {
        x.sin() / x
    }
}

/// Theoretical PSD of a rectangular-pulse signal: P·T·sinc²(π f T)
///
/// The window spans [-B/2, B/2) in `num_points` steps.
pub fn theoretical_psd(params: &PsdParams, num_points: usize) -> Result<Spectrum> {
    params.validate()?;

    let power = params.power_linear();
    let period = params.symbol_period();
    let f_min = -params.bandwidth / 2.0;
    let f_max = params.bandwidth / 2.0;

    let mut spectrum = Spectrum {
        frequencies: Vec::with_capacity(num_points),
        values: Vec::with_capacity(num_points),
    };

    for i in 0..num_points {
        let f = f_min + (f_max - f_min) * i as f64 / num_points as f64;
        let s = sinc(PI * f * period);
        spectrum.frequencies.push(f);
        spectrum.values.push(power * period * s * s);
    }

    log::debug!(
        "PSD: {} points over {} with T={}, peak {}",
        num_points,
        params.bandwidth,
        period,
        spectrum.peak()
    );

    Ok(spectrum)
}

/// Magnitude spectrum of a real record, |FFT|/N, centred on DC
pub fn periodogram(samples: &[f64], sample_rate: f64) -> Result<Spectrum> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(WaveformError::InvalidConfig(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }

    let n = samples.len();
    if n == 0 {
        return Ok(Spectrum::default());
    }

    let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    // fftshift: bins n-n/2.. are the negative frequencies
    let half = n / 2;
    let mut spectrum = Spectrum {
        frequencies: Vec::with_capacity(n),
        values: Vec::with_capacity(n),
    };
    let bin_width = sample_rate / n as f64;
    for k in 0..n {
        let bin = (k + n - half) % n;
        spectrum.frequencies.push((k as f64 - half as f64) * bin_width);
        spectrum.values.push(buffer[bin].norm() / n as f64);
    }

    Ok(spectrum)
}
