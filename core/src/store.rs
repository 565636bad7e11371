//! Flat-file waveform store
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<dir_key>/config.json
//! <root>/<dir_key>/data_0.bin
//! <root>/<dir_key>/data_1.bin
//! ```
//!
//! Sample dumps are raw little-endian f64 arrays. New dumps take the first
//! unused numeric suffix. The store assumes a single writer.

use crate::config::WaveformConfig;
use crate::error::{Result, WaveformError};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const SAMPLE_FILE_PREFIX: &str = "data_";
pub const SAMPLE_FILE_EXTENSION: &str = "bin";

const SAMPLE_BYTES: usize = std::mem::size_of::<f64>();

pub struct WaveformStore {
    root: PathBuf,
}

impl WaveformStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_dir(&self, config: &WaveformConfig) -> PathBuf {
        self.root.join(config.dir_key())
    }

    /// Write `config.json` for the configuration and return its directory
    pub fn save_config(&self, config: &WaveformConfig) -> Result<PathBuf> {
        config.validate()?;
        let dir = self.config_dir(config);
        fs::create_dir_all(&dir)?;
        config.save(&dir.join(CONFIG_FILE_NAME))?;
        log::debug!("saved configuration to {}", dir.display());
        Ok(dir)
    }

    pub fn load_config(&self, dir: &Path) -> Result<WaveformConfig> {
        WaveformConfig::load(&dir.join(CONFIG_FILE_NAME))
    }

    /// Indices of the sample dumps present in `dir`, ascending
    pub fn sample_indices(&self, dir: &Path) -> Result<Vec<usize>> {
        if !dir.is_dir() {
            return Err(WaveformError::NotFound(dir.to_path_buf()));
        }

        let mut indices = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(index) = name.to_str().and_then(parse_sample_index) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// First suffix not yet taken by a dump in `dir`
    pub fn next_sample_index(&self, dir: &Path) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }
        let taken = self.sample_indices(dir)?;
        let mut next = 0;
        for index in taken {
            if index != next {
                break;
            }
            next += 1;
        }
        Ok(next)
    }

    pub fn sample_path(dir: &Path, index: usize) -> PathBuf {
        dir.join(format!("{}{}.{}", SAMPLE_FILE_PREFIX, index, SAMPLE_FILE_EXTENSION))
    }

    /// Store a dump under the configuration's directory.
    ///
    /// Writes `config.json` first when it is missing. Returns the dump's
    /// index and path.
    pub fn save_samples(&self, config: &WaveformConfig, samples: &[f64]) -> Result<(usize, PathBuf)> {
        if samples.len() != config.output_len {
            return Err(WaveformError::InvalidConfig(format!(
                "expected {} samples, got {}",
                config.output_len,
                samples.len()
            )));
        }

        let dir = self.config_dir(config);
        if !dir.join(CONFIG_FILE_NAME).exists() {
            self.save_config(config)?;
        }

        let index = self.next_sample_index(&dir)?;
        let path = Self::sample_path(&dir, index);

        let mut bytes = Vec::with_capacity(samples.len() * SAMPLE_BYTES);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        fs::write(&path, bytes)?;

        log::debug!("wrote {} samples to {}", samples.len(), path.display());
        Ok((index, path))
    }

    pub fn load_samples(&self, dir: &Path, index: usize) -> Result<Vec<f64>> {
        let path = Self::sample_path(dir, index);
        if !path.exists() {
            return Err(WaveformError::NotFound(path));
        }

        let bytes = fs::read(&path)?;
        if bytes.len() % SAMPLE_BYTES != 0 {
            return Err(WaveformError::CorruptSampleFile {
                path,
                reason: format!("{} bytes is not a whole number of f64 samples", bytes.len()),
            });
        }

        let mut samples = Vec::with_capacity(bytes.len() / SAMPLE_BYTES);
        for chunk in bytes.chunks_exact(SAMPLE_BYTES) {
            let mut raw = [0u8; SAMPLE_BYTES];
            raw.copy_from_slice(chunk);
            samples.push(f64::from_le_bytes(raw));
        }
        Ok(samples)
    }

    /// Configuration directories under the root, sorted by name
    pub fn list_configs(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.join(CONFIG_FILE_NAME).is_file() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

fn parse_sample_index(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(SAMPLE_FILE_PREFIX)?
        .strip_suffix(SAMPLE_FILE_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulation::Modulation;
    use tempfile::tempdir;

    fn small_config() -> WaveformConfig {
        WaveformConfig::new(Modulation::Psk, 8e3, 1e-3, 1e3, 4, 0.0, 4).unwrap()
    }

    #[test]
    fn test_parse_sample_index() {
        assert_eq!(parse_sample_index("data_0.bin"), Some(0));
        assert_eq!(parse_sample_index("data_12.bin"), Some(12));
        assert_eq!(parse_sample_index("data_.bin"), None);
        assert_eq!(parse_sample_index("data_3.npy"), None);
        assert_eq!(parse_sample_index("config.json"), None);
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempdir().unwrap();
        let store = WaveformStore::new(tmp.path());
        let config = small_config();
        let samples: Vec<f64> = (0..config.output_len).map(|n| n as f64 * 0.25).collect();

        let (index, path) = store.save_samples(&config, &samples).unwrap();
        assert_eq!(index, 0);
        assert!(path.ends_with("data_0.bin"));

        let dir = store.config_dir(&config);
        assert_eq!(store.load_config(&dir).unwrap(), config);
        assert_eq!(store.load_samples(&dir, 0).unwrap(), samples);
    }

    #[test]
    fn test_indices_fill_first_gap() {
        let tmp = tempdir().unwrap();
        let store = WaveformStore::new(tmp.path());
        let config = small_config();
        let samples = vec![0.0; config.output_len];

        for expected in 0..3 {
            let (index, _) = store.save_samples(&config, &samples).unwrap();
            assert_eq!(index, expected);
        }

        let dir = store.config_dir(&config);
        fs::remove_file(WaveformStore::sample_path(&dir, 1)).unwrap();
        assert_eq!(store.next_sample_index(&dir).unwrap(), 1);
        assert_eq!(store.sample_indices(&dir).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let tmp = tempdir().unwrap();
        let store = WaveformStore::new(tmp.path());
        assert!(store.save_samples(&small_config(), &[0.0; 3]).is_err());
    }

    #[test]
    fn test_missing_files() {
        let tmp = tempdir().unwrap();
        let store = WaveformStore::new(tmp.path());
        assert!(matches!(
            store.load_config(tmp.path()),
            Err(WaveformError::NotFound(_))
        ));
        assert!(matches!(
            store.load_samples(tmp.path(), 0),
            Err(WaveformError::NotFound(_))
        ));
        assert_eq!(store.next_sample_index(&tmp.path().join("absent")).unwrap(), 0);
    }

    #[test]
    fn test_truncated_dump_is_corrupt() {
        let tmp = tempdir().unwrap();
        let store = WaveformStore::new(tmp.path());
        fs::write(WaveformStore::sample_path(tmp.path(), 0), [0u8; 12]).unwrap();
        assert!(matches!(
            store.load_samples(tmp.path(), 0),
            Err(WaveformError::CorruptSampleFile { .. })
        ));
    }

    #[test]
    fn test_list_configs() {
        let tmp = tempdir().unwrap();
        let store = WaveformStore::new(tmp.path());
        assert!(store.list_configs().unwrap().is_empty());

        let dir = store.save_config(&small_config()).unwrap();
        fs::create_dir_all(tmp.path().join("stray")).unwrap();
        assert_eq!(store.list_configs().unwrap(), vec![dir]);
    }
}
