//! Digitally modulated RF waveform toolkit
//!
//! Generates PAM/QAM/PSK/FSK passband records, computes the signal model
//! behind the signal plots (constellations, sinc² PSD, spectral
//! efficiency) and keeps waveform configurations and sample dumps on disk.

pub mod error;
pub mod modulation;
pub mod constellation;
pub mod psd;
pub mod metrics;
pub mod config;
pub mod noise;
pub mod synth;
pub mod store;

pub use config::WaveformConfig;
pub use constellation::Constellation;
pub use error::{Result, WaveformError};
pub use metrics::{spectral_efficiency, SignalSettings, SignalSummary};
pub use modulation::{Modulation, Scheme};
pub use psd::{periodogram, theoretical_psd, PsdParams, Spectrum, DEFAULT_PSD_POINTS};
pub use store::WaveformStore;
pub use synth::{Synthesizer, Waveform};

// Defaults for waveform generation, matching the reference QAM recording
pub const DEFAULT_SAMPLE_RATE: f64 = 48e3;
pub const DEFAULT_SYMBOL_PERIOD: f64 = 1e-3;
pub const DEFAULT_CARRIER_FREQUENCY: f64 = 20e3;
pub const DEFAULT_ORDER: u32 = 4;
pub const DEFAULT_NOISE_VARIANCE: f64 = 0.0;
pub const DEFAULT_NUM_SYMBOLS: usize = 2048;

/// Root directory the store writes to unless told otherwise
pub const DEFAULT_STORE_DIR: &str = "waveforms";
