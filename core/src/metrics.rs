//! Spectral-efficiency bookkeeping and the signal generation settings

use crate::error::{Result, WaveformError};
use crate::modulation::Scheme;
use crate::psd::PsdParams;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const CARRIER_RANGE_MHZ: RangeInclusive<f64> = 400.0..=6000.0;
pub const BANDWIDTH_RANGE_MHZ: RangeInclusive<f64> = 1.0..=100.0;
pub const SYMBOL_RATE_RANGE_MSPS: RangeInclusive<f64> = 1.0..=50.0;
pub const SIGNAL_POWER_RANGE_DBM: RangeInclusive<f64> = -30.0..=10.0;
pub const SAMPLES_PER_SYMBOL_RANGE: RangeInclusive<u32> = 2..=32;

/// bits/symbol × symbol rate / bandwidth, in bps/Hz.
///
/// Returns `None` for a non-positive bandwidth.
pub fn spectral_efficiency(bits_per_symbol: f64, symbol_rate: f64, bandwidth: f64) -> Option<f64> {
    if bandwidth > 0.0 {
        Some(bits_per_symbol * symbol_rate / bandwidth)
    } else {
        None
    }
}

/// Signal generation settings with their slider ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSettings {
    pub scheme: Scheme,
    pub carrier_mhz: f64,
    pub bandwidth_mhz: f64,
    pub symbol_rate_msps: f64,
    pub signal_power_dbm: f64,
    pub samples_per_symbol: u32,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            scheme: Scheme::Qpsk,
            carrier_mhz: 2400.0,
            bandwidth_mhz: 20.0,
            symbol_rate_msps: 10.0,
            signal_power_dbm: 0.0,
            samples_per_symbol: 8,
        }
    }
}

/// Derived statistics shown next to the constellation and PSD plots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub bits_per_symbol: u32,
    pub symbol_count: u32,
    /// bps/Hz; absent when the bandwidth is not positive
    pub spectral_efficiency: Option<f64>,
    pub data_rate_mbps: f64,
    pub sample_rate_msps: f64,
    pub occupied_bandwidth_mhz: f64,
    pub center_frequency_mhz: f64,
}

fn check_range<T>(name: &str, value: T, range: &RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(WaveformError::InvalidConfig(format!(
            "{} {} outside {}..={}",
            name,
            value,
            range.start(),
            range.end()
        )))
    }
}

impl SignalSettings {
    pub fn validate(&self) -> Result<()> {
        check_range("carrier frequency (MHz)", self.carrier_mhz, &CARRIER_RANGE_MHZ)?;
        check_range("bandwidth (MHz)", self.bandwidth_mhz, &BANDWIDTH_RANGE_MHZ)?;
        check_range("symbol rate (Msps)", self.symbol_rate_msps, &SYMBOL_RATE_RANGE_MSPS)?;
        check_range("signal power (dBm)", self.signal_power_dbm, &SIGNAL_POWER_RANGE_DBM)?;
        check_range(
            "samples per symbol",
            self.samples_per_symbol,
            &SAMPLES_PER_SYMBOL_RANGE,
        )?;
        Ok(())
    }

    pub fn psd_params(&self) -> PsdParams {
        PsdParams {
            symbol_rate: self.symbol_rate_msps,
            signal_power_dbm: self.signal_power_dbm,
            bandwidth: self.bandwidth_mhz,
        }
    }

    pub fn summary(&self) -> SignalSummary {
        let bits = self.scheme.bits_per_symbol();
        SignalSummary {
            bits_per_symbol: bits,
            symbol_count: self.scheme.order(),
            spectral_efficiency: spectral_efficiency(
                bits as f64,
                self.symbol_rate_msps,
                self.bandwidth_mhz,
            ),
            data_rate_mbps: bits as f64 * self.symbol_rate_msps,
            sample_rate_msps: self.symbol_rate_msps * self.samples_per_symbol as f64,
            occupied_bandwidth_mhz: self.bandwidth_mhz,
            center_frequency_mhz: self.carrier_mhz,
        }
    }
}
