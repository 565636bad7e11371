use rfwave_core::store::CONFIG_FILE_NAME;
use rfwave_core::*;
use tempfile::tempdir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_generate_store_reload() {
    init_logging();
    let tmp = tempdir().expect("Failed to create temp dir");
    let store = WaveformStore::new(tmp.path());

    let config = WaveformConfig::new(Modulation::Qam, 48e3, 1e-3, 20e3, 16, 0.0, 128)
        .expect("Failed to build config");
    let waveform = Synthesizer::new(Some(2024))
        .generate(&config)
        .expect("Failed to generate waveform");

    let (index, path) = store
        .save_samples(&config, &waveform.samples)
        .expect("Failed to save samples");
    assert_eq!(index, 0);
    println!("Stored {} samples at {}", waveform.samples.len(), path.display());

    let dir = store.config_dir(&config);
    assert!(dir.join(CONFIG_FILE_NAME).is_file(), "config.json not written");

    let loaded_config = store.load_config(&dir).expect("Failed to load config");
    let loaded_samples = store.load_samples(&dir, index).expect("Failed to load samples");
    assert_eq!(loaded_config, config);
    assert_eq!(loaded_samples, waveform.samples, "Stored samples don't match");
}

#[test]
fn test_repeated_generation_numbers_dumps() {
    init_logging();
    let tmp = tempdir().expect("Failed to create temp dir");
    let store = WaveformStore::new(tmp.path());
    let config = WaveformConfig::new(Modulation::Pam, 8e3, 1e-3, 2e3, 4, 0.25, 32)
        .expect("Failed to build config");

    let mut synth = Synthesizer::new(Some(1));
    for expected in 0..4 {
        let waveform = synth.generate(&config).expect("Failed to generate waveform");
        let (index, _) = store
            .save_samples(&config, &waveform.samples)
            .expect("Failed to save samples");
        assert_eq!(index, expected);
    }

    let dir = store.config_dir(&config);
    assert_eq!(store.sample_indices(&dir).unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(store.list_configs().unwrap(), vec![dir]);
}

#[test]
fn test_carrier_dominates_periodogram() {
    let config = WaveformConfig::new(Modulation::Psk, 48e3, 1e-3, 12e3, 4, 0.0, 256)
        .expect("Failed to build config");
    let waveform = Synthesizer::new(Some(8))
        .generate(&config)
        .expect("Failed to generate waveform");

    let spectrum = periodogram(&waveform.samples, config.fs).expect("Failed to compute periodogram");
    let peak = spectrum.peak_frequency().expect("Empty spectrum");
    println!("Periodogram peak at {} Hz", peak);

    // rectangular PSK energy sits within one symbol rate of the carrier
    assert!(
        (peak.abs() - config.fc).abs() <= config.symbol_rate(),
        "Peak {} Hz too far from carrier {} Hz",
        peak,
        config.fc
    );
}

#[test]
fn test_fsk_tones_land_on_grid() {
    let config = WaveformConfig::new(Modulation::Fsk, 48e3, 1e-3, 12e3, 2, 0.0, 512)
        .expect("Failed to build config");
    let waveform = Synthesizer::new(Some(4))
        .generate(&config)
        .expect("Failed to generate waveform");

    let spectrum = periodogram(&waveform.samples, config.fs).expect("Failed to compute periodogram");
    let peak = spectrum.peak_frequency().expect("Empty spectrum").abs();

    // binary FSK tones sit at fc ± 500 Hz
    let expected = [config.fc - 500.0, config.fc + 500.0];
    assert!(
        expected.iter().any(|f| (peak - f).abs() < 1.0),
        "Peak {} Hz not on an FSK tone",
        peak
    );
}

#[test]
fn test_psd_symmetric_about_zero() {
    for scheme in Scheme::ALL {
        let settings = SignalSettings {
            scheme,
            symbol_rate_msps: 7.0,
            bandwidth_mhz: 30.0,
            ..SignalSettings::default()
        };
        let spectrum = theoretical_psd(&settings.psd_params(), DEFAULT_PSD_POINTS)
            .expect("Failed to compute PSD");
        let n = spectrum.len();
        let tolerance = 1e-9 * spectrum.peak();
        for i in 1..n {
            let (a, b) = (spectrum.values[i], spectrum.values[n - i]);
            assert!(
                (a - b).abs() <= tolerance,
                "PSD asymmetric at bin {}: {} vs {}",
                i,
                a,
                b
            );
        }
    }
}

#[test]
fn test_constellation_count_matches_order() {
    for scheme in Scheme::ALL {
        let constellation = Constellation::for_scheme(scheme);
        assert_eq!(constellation.order(), scheme.order() as usize);
    }

    for modulation in [Modulation::Pam, Modulation::Psk] {
        for order in [2, 4, 8, 16, 32] {
            let constellation = Constellation::generate(modulation, order).expect("Failed to generate");
            assert_eq!(constellation.order(), order as usize);
        }
    }
    for order in [4, 16, 64, 256] {
        let constellation = Constellation::generate(Modulation::Qam, order).expect("Failed to generate");
        assert_eq!(constellation.order(), order as usize);
    }
}

#[test]
fn test_efficiency_tracks_scheme() {
    let expected = [1.0, 0.5, 1.5, 2.0, 3.0];
    for (scheme, want) in Scheme::ALL.iter().zip(expected) {
        let settings = SignalSettings {
            scheme: *scheme,
            ..SignalSettings::default()
        };
        let summary = settings.summary();
        let got = summary.spectral_efficiency.expect("Bandwidth is positive");
        assert!((got - want).abs() < 1e-12, "{}: {} != {}", scheme, got, want);
    }
}
