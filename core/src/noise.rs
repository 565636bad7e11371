use crate::error::{Result, WaveformError};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Mean-square value of a record
pub fn mean_power(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64
}

/// Noise variance that puts `signal_power` at `snr_db` above the noise
pub fn noise_variance_for_snr(signal_power: f64, snr_db: f64) -> f64 {
    signal_power / 10f64.powf(snr_db / 10.0)
}

/// Add zero-mean white Gaussian noise of the given variance in place
pub fn add_awgn<R: Rng + ?Sized>(samples: &mut [f64], variance: f64, rng: &mut R) -> Result<()> {
    if !(variance.is_finite() && variance >= 0.0) {
        return Err(WaveformError::InvalidConfig(format!(
            "noise variance must be non-negative, got {}",
            variance
        )));
    }
    if variance == 0.0 {
        return Ok(());
    }

    let normal = Normal::new(0.0, variance.sqrt())
        .map_err(|e| WaveformError::InvalidConfig(format!("noise distribution: {}", e)))?;
    for sample in samples.iter_mut() {
        *sample += normal.sample(rng);
    }

    Ok(())
}

/// Add AWGN scaled to the record's own power. Returns the variance used.
pub fn add_awgn_snr<R: Rng + ?Sized>(samples: &mut [f64], snr_db: f64, rng: &mut R) -> Result<f64> {
    if !snr_db.is_finite() {
        return Err(WaveformError::InvalidConfig(format!("SNR must be finite, got {}", snr_db)));
    }
    let variance = noise_variance_for_snr(mean_power(samples), snr_db);
    log::debug!("AWGN at {} dB SNR: variance {}", snr_db, variance);
    add_awgn(samples, variance, rng)?;
    Ok(variance)
}
