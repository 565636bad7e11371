use crate::config::WaveformConfig;
use crate::constellation::Constellation;
use crate::error::Result;
use crate::modulation::Modulation;
use crate::noise::{add_awgn, add_awgn_snr, mean_power};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// A generated record together with the configuration and symbols behind it
#[derive(Debug, Clone)]
pub struct Waveform {
    pub config: WaveformConfig,
    /// Symbol index drawn for each symbol period, in 0..M
    pub symbols: Vec<usize>,
    /// Real passband samples, `config.output_len` long
    pub samples: Vec<f64>,
}

impl Waveform {
    pub fn signal_power(&self) -> f64 {
        mean_power(&self.samples)
    }

    /// Sample times in seconds
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|n| n as f64 / self.config.fs)
            .collect()
    }
}

/// Native waveform synthesizer
///
/// Produces rectangular-pulse passband records for PAM, QAM, PSK and FSK.
/// Symbols are drawn uniformly from the alphabet. Seeding makes the output
/// reproducible.
pub struct Synthesizer {
    rng: StdRng,
}

impl Synthesizer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Draw `count` uniform symbols from an `order`-ary alphabet
    pub fn random_symbols(&mut self, count: usize, order: u32) -> Vec<usize> {
        (0..count)
            .map(|_| self.rng.gen_range(0..order as usize))
            .collect()
    }

    pub fn generate(&mut self, config: &WaveformConfig) -> Result<Waveform> {
        config.validate()?;

        let symbols = self.random_symbols(config.nsymb, config.m);
        let mut samples = match config.modulation {
            Modulation::Pam | Modulation::Qam | Modulation::Psk => modulate_iq(config, &symbols)?,
            Modulation::Fsk => modulate_fsk(config, &symbols),
        };

        if config.modulation == Modulation::Pam {
            add_awgn(&mut samples, config.var, &mut self.rng)?;
        }
        if let Some(snr) = config.snr {
            add_awgn_snr(&mut samples, snr, &mut self.rng)?;
        }

        log::debug!(
            "generated {} samples of {} (M={}), power {}",
            samples.len(),
            config.modulation,
            config.m,
            mean_power(&samples)
        );

        Ok(Waveform {
            config: config.clone(),
            symbols,
            samples,
        })
    }
}

/// I·cos(2π fc t) − Q·sin(2π fc t) with the I/Q pair held for each symbol
fn modulate_iq(config: &WaveformConfig, symbols: &[usize]) -> Result<Vec<f64>> {
    let constellation = Constellation::generate(config.modulation, config.m)?;
    let points = constellation.points();
    let omega = 2.0 * PI * config.fc / config.fs;

    let mut samples = Vec::with_capacity(config.output_len);
    for (k, &symbol) in symbols.iter().enumerate() {
        let point = points[symbol];
        for j in 0..config.sps {
            let n = (k * config.sps + j) as f64;
            let phase = omega * n;
            samples.push(point.re * phase.cos() - point.im * phase.sin());
        }
    }

    Ok(samples)
}

/// Continuous-phase M-FSK with tones spaced 1/Tsymb apart, centred on fc
fn modulate_fsk(config: &WaveformConfig, symbols: &[usize]) -> Vec<f64> {
    let spacing = 1.0 / config.tsymb;
    let order = config.m as f64;

    let mut samples = Vec::with_capacity(config.output_len);
    let mut phase = 0.0f64;
    for &symbol in symbols {
        let offset = (2.0 * symbol as f64 - order + 1.0) * spacing / 2.0;
        let step = 2.0 * PI * (config.fc + offset) / config.fs;
        for _ in 0..config.sps {
            samples.push(phase.cos());
            phase = (phase + step) % (2.0 * PI);
        }
    }

    samples
}
