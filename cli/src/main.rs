use clap::{Args, Parser, Subcommand};
use hound::WavSpec;
use rfwave_core::psd::Spectrum;
use rfwave_core::{
    periodogram, theoretical_psd, Constellation, Modulation, PsdParams, Scheme, SignalSettings,
    Synthesizer, WaveformConfig, WaveformStore, DEFAULT_PSD_POINTS,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rfwave")]
#[command(about = "Generate, inspect and store digitally modulated RF waveforms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a waveform and store its configuration and samples
    Generate {
        #[command(flatten)]
        waveform: WaveformArgs,

        /// Seed for the symbol stream (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Add white noise at this SNR (dB); recorded in the stored configuration
        #[arg(long, allow_negative_numbers = true)]
        snr: Option<f64>,

        /// Also export the samples as a 16-bit WAV file
        #[arg(long, value_name = "OUTPUT.WAV")]
        wav: Option<PathBuf>,

        /// Store root directory
        #[arg(short, long, default_value = rfwave_core::DEFAULT_STORE_DIR)]
        out_dir: PathBuf,
    },

    /// Write a waveform configuration without generating samples
    SaveConfig {
        #[command(flatten)]
        waveform: WaveformArgs,

        /// Store root directory
        #[arg(short, long, default_value = rfwave_core::DEFAULT_STORE_DIR)]
        out_dir: PathBuf,
    },

    /// Print constellation points for a preset or an M-ary alphabet
    Constellation {
        /// Preset: QPSK, BPSK, 8PSK, 16QAM, 64QAM
        #[arg(conflicts_with_all = ["modulation", "order"])]
        scheme: Option<Scheme>,

        /// Modulation family for a generated alphabet
        #[arg(long, requires = "order")]
        modulation: Option<Modulation>,

        /// Modulation order for a generated alphabet
        #[arg(short = 'm', long, requires = "modulation")]
        order: Option<u32>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the theoretical sinc² power spectral density
    Psd {
        /// Symbol rate (Msps)
        #[arg(long, default_value_t = 10.0)]
        symbol_rate: f64,

        /// Signal power (dBm)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        power: f64,

        /// Frequency window width (MHz)
        #[arg(long, default_value_t = 20.0)]
        bandwidth: f64,

        /// Number of frequency points
        #[arg(long, default_value_t = DEFAULT_PSD_POINTS)]
        points: usize,

        /// Keep absolute values instead of normalizing to the peak
        #[arg(long)]
        raw: bool,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Print bits per symbol, spectral efficiency and rate statistics
    Summary {
        /// Modulation preset
        #[arg(long, default_value = "QPSK")]
        scheme: Scheme,

        /// Carrier frequency (MHz)
        #[arg(long, default_value_t = 2400.0)]
        carrier: f64,

        /// Bandwidth (MHz)
        #[arg(long, default_value_t = 20.0)]
        bandwidth: f64,

        /// Symbol rate (Msps)
        #[arg(long, default_value_t = 10.0)]
        symbol_rate: f64,

        /// Signal power (dBm)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        power: f64,

        /// Samples per symbol
        #[arg(long, default_value_t = 8)]
        sps: u32,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the strongest spectral lines of a stored sample dump
    Spectrum {
        /// Configuration directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Dump index (latest when omitted)
        #[arg(short, long)]
        index: Option<usize>,

        /// Number of lines to report
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// List stored configurations and their sample dumps
    List {
        /// Store root directory
        #[arg(short, long, default_value = rfwave_core::DEFAULT_STORE_DIR)]
        out_dir: PathBuf,
    },
}

/// Waveform parameters, from flags or a JSON configuration file
#[derive(Args)]
struct WaveformArgs {
    /// Load parameters from a config.json instead of flags
    #[arg(short, long, value_name = "CONFIG.JSON")]
    config: Option<PathBuf>,

    /// PAM, QAM, PSK or FSK
    #[arg(long, default_value = "QAM")]
    modulation: Modulation,

    /// Sample rate (Hz)
    #[arg(long, default_value_t = rfwave_core::DEFAULT_SAMPLE_RATE)]
    fs: f64,

    /// Symbol period (s)
    #[arg(long, default_value_t = rfwave_core::DEFAULT_SYMBOL_PERIOD)]
    tsymb: f64,

    /// Carrier frequency (Hz)
    #[arg(long, default_value_t = rfwave_core::DEFAULT_CARRIER_FREQUENCY)]
    fc: f64,

    /// Modulation order
    #[arg(short = 'm', long, default_value_t = rfwave_core::DEFAULT_ORDER)]
    order: u32,

    /// Noise variance (PAM)
    #[arg(long, default_value_t = rfwave_core::DEFAULT_NOISE_VARIANCE)]
    var: f64,

    /// Number of symbols
    #[arg(short, long, default_value_t = rfwave_core::DEFAULT_NUM_SYMBOLS)]
    nsymb: usize,
}

impl WaveformArgs {
    fn to_config(&self) -> rfwave_core::Result<WaveformConfig> {
        match &self.config {
            Some(path) => WaveformConfig::load(path),
            None => WaveformConfig::new(
                self.modulation,
                self.fs,
                self.tsymb,
                self.fc,
                self.order,
                self.var,
                self.nsymb,
            ),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { waveform, seed, snr, wav, out_dir } => {
            generate_command(&waveform, seed, snr, wav.as_deref(), &out_dir)?
        }
        Commands::SaveConfig { waveform, out_dir } => save_config_command(&waveform, &out_dir)?,
        Commands::Constellation { scheme, modulation, order, json } => {
            constellation_command(scheme, modulation, order, json)?
        }
        Commands::Psd { symbol_rate, power, bandwidth, points, raw, json } => {
            let params = PsdParams {
                symbol_rate,
                signal_power_dbm: power,
                bandwidth,
            };
            psd_command(&params, points, raw, json)?
        }
        Commands::Summary { scheme, carrier, bandwidth, symbol_rate, power, sps, json } => {
            let settings = SignalSettings {
                scheme,
                carrier_mhz: carrier,
                bandwidth_mhz: bandwidth,
                symbol_rate_msps: symbol_rate,
                signal_power_dbm: power,
                samples_per_symbol: sps,
            };
            summary_command(&settings, json)?
        }
        Commands::Spectrum { dir, index, top } => spectrum_command(&dir, index, top)?,
        Commands::List { out_dir } => list_command(&out_dir)?,
    }

    Ok(())
}

fn generate_command(
    args: &WaveformArgs,
    seed: Option<u64>,
    snr: Option<f64>,
    wav_path: Option<&Path>,
    out_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = args.to_config()?;
    if let Some(snr_db) = snr {
        config = config.with_snr(snr_db)?;
    }
    // refuse before anything is stored
    let wav_rate = match wav_path {
        Some(_) => Some(wav_sample_rate(config.fs)?),
        None => None,
    };
    println!(
        "Generating {} M={} ({} symbols x {} samples/symbol)",
        config.modulation, config.m, config.nsymb, config.sps
    );

    let mut synth = Synthesizer::new(seed);
    let waveform = synth.generate(&config)?;
    if let Some(snr_db) = config.snr {
        println!("Added AWGN at {} dB SNR", snr_db);
    }
    println!(
        "Generated {} samples, signal power {:.4}",
        waveform.samples.len(),
        waveform.signal_power()
    );

    let store = WaveformStore::new(out_dir);
    let (index, path) = store.save_samples(&config, &waveform.samples)?;
    println!("Saved sample dump #{} to {}", index, path.display());

    if let (Some(wav_path), Some(wav_rate)) = (wav_path, wav_rate) {
        write_wav(wav_path, &waveform.samples, wav_rate)?;
        println!("Wrote {}", wav_path.display());
    }

    Ok(())
}

fn save_config_command(args: &WaveformArgs, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.to_config()?;
    let store = WaveformStore::new(out_dir);
    let dir = store.save_config(&config)?;
    println!("Saved configuration to {}", dir.display());
    Ok(())
}

fn constellation_command(
    scheme: Option<Scheme>,
    modulation: Option<Modulation>,
    order: Option<u32>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (label, constellation) = match (modulation, order) {
        (Some(modulation), Some(order)) => (
            format!("{}-{}", order, modulation),
            Constellation::generate(modulation, order)?,
        ),
        _ => {
            let scheme = scheme.unwrap_or_default();
            (scheme.to_string(), Constellation::for_scheme(scheme))
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&constellation)?);
        return Ok(());
    }

    println!(
        "{}: {} symbols, {} bits/symbol",
        label,
        constellation.order(),
        constellation.bits_per_symbol()
    );
    for (i, point) in constellation.points().iter().enumerate() {
        println!("{:>3}  I={:+.4}  Q={:+.4}", i, point.re, point.im);
    }

    Ok(())
}

fn psd_command(params: &PsdParams, points: usize, raw: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let spectrum = theoretical_psd(params, points)?;
    let spectrum = if raw { spectrum } else { spectrum.normalized() };

    if json {
        println!("{}", serde_json::to_string(&spectrum)?);
        return Ok(());
    }

    for (f, value) in spectrum.frequencies.iter().zip(&spectrum.values) {
        println!("{:.6}\t{:.6e}", f, value);
    }

    Ok(())
}

fn summary_command(settings: &SignalSettings, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    settings.validate()?;
    let summary = settings.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Scheme:              {}", settings.scheme);
    println!("Bits per Symbol:     {:.1}", summary.bits_per_symbol as f64);
    println!("Symbol Count:        {}", summary.symbol_count);
    match summary.spectral_efficiency {
        Some(efficiency) => println!("Spectral Efficiency: {:.2} bps/Hz", efficiency),
        None => println!("Spectral Efficiency: n/a"),
    }
    println!("Center Frequency:    {} MHz", summary.center_frequency_mhz);
    println!("Occupied BW:         {} MHz", summary.occupied_bandwidth_mhz);
    println!("Data Rate:           {:.1} Mbps", summary.data_rate_mbps);
    println!("Sample Rate:         {:.1} Msps", summary.sample_rate_msps);

    Ok(())
}

fn spectrum_command(dir: &Path, index: Option<usize>, top: usize) -> Result<(), Box<dyn std::error::Error>> {
    let store = WaveformStore::new(dir.parent().unwrap_or(dir));
    let config = store.load_config(dir)?;

    let index = match index {
        Some(index) => index,
        None => *store
            .sample_indices(dir)?
            .last()
            .ok_or_else(|| format!("No sample dumps in {}", dir.display()))?,
    };

    let samples = store.load_samples(dir, index)?;
    println!(
        "{} dump #{}: {} samples at {} Hz",
        config.dir_key(),
        index,
        samples.len(),
        config.fs
    );

    let spectrum = periodogram(&samples, config.fs)?;
    let positive = positive_half(&spectrum);
    for (frequency, value) in positive.strongest(top) {
        println!("{:>12.2} Hz  {:.6}", frequency, value);
    }

    Ok(())
}

fn list_command(out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = WaveformStore::new(out_dir);
    let dirs = store.list_configs()?;
    if dirs.is_empty() {
        println!("No configurations under {}", out_dir.display());
        return Ok(());
    }

    for dir in dirs {
        let indices = store.sample_indices(&dir)?;
        let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        println!("{}  ({} dumps: {:?})", name, indices.len(), indices);
    }

    Ok(())
}

/// Non-negative frequency bins of a DC-centred spectrum
fn positive_half(spectrum: &Spectrum) -> Spectrum {
    let (frequencies, values) = spectrum.rows().filter(|(f, _)| *f >= 0.0).unzip();
    Spectrum { frequencies, values }
}

/// WAV headers carry a whole number of samples per second
fn wav_sample_rate(fs: f64) -> Result<u32, Box<dyn std::error::Error>> {
    if fs.fract() != 0.0 || fs < 1.0 || fs > u32::MAX as f64 {
        return Err(format!("sample rate {} Hz cannot be written to a WAV header", fs).into());
    }
    Ok(fs as u32)
}

/// Write samples as 16-bit mono PCM, scaled so the peak sits at full scale
fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) -> Result<(), Box<dyn std::error::Error>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let peak = samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    let scale = if peak > 0.0 { 1.0 / peak } else { 1.0 };

    let file = File::create(path)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for sample in samples {
        let clamped = (sample * scale).clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;

    tracing::debug!(path = %path.display(), samples = samples.len(), "wav written");
    Ok(())
}
