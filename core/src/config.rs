use crate::error::{Result, WaveformError};
use crate::modulation::{bits_per_symbol, Modulation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Allowed distance of fs·Tsymb from an integer
const SPS_TOLERANCE: f64 = 1e-6;

/// Waveform configuration as it is written to `config.json`
///
/// `sps` and `output_len` are derived from the other fields. They are stored
/// for readers of the file but recomputed and checked on load. Integer
/// fields also accept whole-valued floats such as `4.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformConfig {
    pub modulation: Modulation,
    /// Sample rate (Hz)
    pub fs: f64,
    /// Symbol period (s)
    #[serde(rename = "Tsymb")]
    pub tsymb: f64,
    /// Carrier frequency (Hz)
    pub fc: f64,
    /// Modulation order
    #[serde(rename = "M", deserialize_with = "integral::deserialize")]
    pub m: u32,
    /// Noise variance
    pub var: f64,
    #[serde(deserialize_with = "integral::deserialize")]
    pub sps: usize,
    #[serde(rename = "Nysmb", deserialize_with = "integral::deserialize")]
    pub nsymb: usize,
    #[serde(deserialize_with = "integral::deserialize")]
    pub output_len: usize,
    /// Target SNR (dB) of white noise added after modulation, any family
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
}

impl WaveformConfig {
    pub fn new(
        modulation: Modulation,
        fs: f64,
        tsymb: f64,
        fc: f64,
        m: u32,
        var: f64,
        nsymb: usize,
    ) -> Result<Self> {
        let sps = samples_per_symbol(fs, tsymb)?;
        let output_len = record_length(sps, nsymb)?;
        let config = Self {
            modulation,
            fs,
            tsymb,
            fc,
            m,
            var,
            sps,
            nsymb,
            output_len,
            snr: None,
        };
        config.validate()?;

        log::debug!(
            "{}: sps={} output_len={} ({} s)",
            config.dir_key(),
            config.sps,
            config.output_len,
            config.duration()
        );
        if config.modulation != Modulation::Pam && config.var > 0.0 {
            log::warn!("noise variance {} is only applied to PAM waveforms", config.var);
        }

        Ok(config)
    }

    /// Same configuration with white noise at `snr_db` folded into the record
    pub fn with_snr(mut self, snr_db: f64) -> Result<Self> {
        self.snr = Some(snr_db);
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let expected_sps = samples_per_symbol(self.fs, self.tsymb)?;

        if self.sps != expected_sps {
            return Err(WaveformError::InvalidConfig(format!(
                "sps {} does not match fs*Tsymb = {}",
                self.sps, expected_sps
            )));
        }
        if self.nsymb == 0 {
            return Err(WaveformError::InvalidConfig("Nysmb must be at least 1".into()));
        }
        let expected_len = record_length(self.sps, self.nsymb)?;
        if self.output_len != expected_len {
            return Err(WaveformError::InvalidConfig(format!(
                "output_len {} does not match sps*Nysmb = {}",
                self.output_len, expected_len
            )));
        }
        if !(self.var.is_finite() && self.var >= 0.0) {
            return Err(WaveformError::InvalidConfig(format!(
                "noise variance must be non-negative, got {}",
                self.var
            )));
        }

        let nyquist = self.fs / 2.0;
        if !(self.fc.is_finite() && self.fc >= 0.0 && self.fc < nyquist) {
            return Err(WaveformError::InvalidConfig(format!(
                "carrier {} Hz must lie in [0, {}) Hz",
                self.fc, nyquist
            )));
        }

        if let Some(snr) = self.snr {
            if !snr.is_finite() {
                return Err(WaveformError::InvalidConfig(format!("snr must be finite, got {}", snr)));
            }
        }

        self.modulation.validate_order(self.m)?;

        match self.modulation {
            // each symbol must span at least one carrier cycle or the I/Q
            // points fold onto each other
            Modulation::Qam | Modulation::Psk => {
                let min_fc = self.symbol_rate();
                if self.fc < min_fc {
                    return Err(WaveformError::InvalidConfig(format!(
                        "carrier {} Hz is below the symbol rate {} Hz",
                        self.fc, min_fc
                    )));
                }
            }
            Modulation::Fsk => {
                let half_span = (self.m as f64 - 1.0) / (2.0 * self.tsymb);
                let bottom = self.fc - half_span;
                let top = self.fc + half_span;
                if bottom <= 0.0 {
                    return Err(WaveformError::InvalidConfig(format!(
                        "lowest FSK tone {} Hz must be above 0 Hz",
                        bottom
                    )));
                }
                if top >= nyquist {
                    return Err(WaveformError::InvalidConfig(format!(
                        "highest FSK tone {} Hz reaches Nyquist ({} Hz)",
                        top, nyquist
                    )));
                }
            }
            Modulation::Pam => {}
        }

        Ok(())
    }

    /// Directory name built from the configuration's own fields
    pub fn dir_key(&self) -> String {
        let key = format!(
            "{}_fs{}_Tsymb{}_fc{}_M{}_var{}_N{}",
            self.modulation, self.fs, self.tsymb, self.fc, self.m, self.var, self.nsymb
        );
        match self.snr {
            Some(snr) => format!("{}_snr{}", key, snr),
            None => key,
        }
    }

    pub fn symbol_rate(&self) -> f64 {
        1.0 / self.tsymb
    }

    pub fn bits_per_symbol(&self) -> u32 {
        bits_per_symbol(self.m)
    }

    /// Length of the generated record in seconds
    pub fn duration(&self) -> f64 {
        self.output_len as f64 / self.fs
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: WaveformConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(WaveformError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// fs·Tsymb as a whole number of samples
fn samples_per_symbol(fs: f64, tsymb: f64) -> Result<usize> {
    if !(fs.is_finite() && fs > 0.0) {
        return Err(WaveformError::InvalidConfig(format!("fs must be positive, got {}", fs)));
    }
    if !(tsymb.is_finite() && tsymb > 0.0) {
        return Err(WaveformError::InvalidConfig(format!(
            "Tsymb must be positive, got {}",
            tsymb
        )));
    }

    let exact = fs * tsymb;
    let rounded = exact.round();
    if (exact - rounded).abs() > SPS_TOLERANCE || rounded < 1.0 {
        return Err(WaveformError::InvalidConfig(format!(
            "fs*Tsymb = {} is not a whole number of samples",
            exact
        )));
    }
    // usize::MAX as f64 rounds up to 2^64, so anything at or above it saturates
    if rounded >= usize::MAX as f64 {
        return Err(WaveformError::InvalidConfig(format!(
            "fs*Tsymb = {} samples per symbol is too large",
            exact
        )));
    }

    Ok(rounded as usize)
}

/// sps·Nysmb, rejecting records whose length does not fit in memory indices
fn record_length(sps: usize, nsymb: usize) -> Result<usize> {
    sps.checked_mul(nsymb).ok_or_else(|| {
        WaveformError::InvalidConfig(format!("sps*Nysmb overflows ({} * {})", sps, nsymb))
    })
}

/// Integer fields that tolerate whole-valued JSON floats (`4.0`)
mod integral {
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;
    use std::marker::PhantomData;

    // 2^64, the first float past u64::MAX
    const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        deserializer.deserialize_any(IntegralVisitor(PhantomData))
    }

    struct IntegralVisitor<T>(PhantomData<T>);

    impl<'de, T: TryFrom<u64>> Visitor<'de> for IntegralVisitor<T> {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative whole number")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
            T::try_from(v).map_err(|_| E::custom(format!("{} is out of range", v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
            let v = u64::try_from(v).map_err(|_| E::custom(format!("{} is negative", v)))?;
            self.visit_u64(v)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<T, E> {
            if !(v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < U64_LIMIT) {
                return Err(E::custom(format!("{} is not a non-negative whole number", v)));
            }
            self.visit_u64(v as u64)
        }
    }
}
