use anyhow::{Context, Result, anyhow, ensure};
use hound::WavReader;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::hrir::{Hrir, HrirTable};

/// Impulse responses longer than this are certainly not HRIRs.
const MAX_HRIR_LENGTH_SECONDS: u64 = 1;

/// Loads a directory of azimuth-named stereo WAV files (`az045.wav`,
/// `315.wav`, ...) into an in-memory HRIR table.
///
/// The left WAV channel is the left ear. Pairs are resampled to the engine
/// rate when needed and normalized jointly, so interaural level differences
/// survive loading.
pub struct HrirLoader {
    directory: PathBuf,
    target_sample_rate: u32,
}

impl HrirLoader {
    pub fn new(directory: &Path, target_sample_rate: u32) -> Self {
        Self {
            directory: directory.to_path_buf(),
            target_sample_rate,
        }
    }

    /// Scan the directory and load every response into a table.
    ///
    /// The set must cover the circle uniformly: `n` files at `360/n`-degree
    /// spacing, each named by its azimuth.
    pub fn load_table(&self) -> Result<HrirTable> {
        let found = self.scan()?;
        ensure!(
            !found.is_empty(),
            "no HRIR files found in {:?}",
            self.directory
        );

        let step = 360.0 / found.len() as f32;
        for (i, (azimuth, path)) in found.iter().enumerate() {
            let expected = i as f32 * step;
            ensure!(
                (f32::from(*azimuth) - expected).abs() < 0.5,
                "HRIR set must cover the circle uniformly: expected {expected:.1}° at position {i}, found {azimuth}° ({path:?})"
            );
        }

        let mut entries = Vec::with_capacity(found.len());
        for (azimuth, path) in &found {
            let (left, right) = self
                .load_pair(path)
                .with_context(|| format!("failed to load HRIR for {azimuth}° from {path:?}"))?;
            entries.push(Hrir::new(left, right)?);
        }

        debug!(
            "loaded {} HRIR pairs from {:?} at {} Hz",
            entries.len(),
            self.directory,
            self.target_sample_rate
        );
        HrirTable::new(entries)
    }

    fn scan(&self) -> Result<Vec<(u16, PathBuf)>> {
        let mut found = Vec::new();

        for entry in fs::read_dir(&self.directory)
            .with_context(|| format!("failed to read HRIR directory {:?}", self.directory))?
        {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("wav") {
                continue;
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            match parse_azimuth(stem) {
                Some(azimuth) => found.push((azimuth, path)),
                None => warn!("skipping {path:?}: file name carries no azimuth"),
            }
        }

        found.sort_by_key(|(azimuth, _)| *azimuth);
        for pair in found.windows(2) {
            ensure!(
                pair[0].0 != pair[1].0,
                "duplicate azimuth {}° ({:?} and {:?})",
                pair[0].0,
                pair[0].1,
                pair[1].1
            );
        }

        Ok(found)
    }

    fn load_pair(&self, path: &Path) -> Result<(Vec<f32>, Vec<f32>)> {
        let reader = WavReader::open(path).context("failed to open WAV file")?;
        let spec = reader.spec();

        ensure!(
            spec.channels == 2,
            "HRIR files must be stereo (left ear, right ear), got {} channel(s)",
            spec.channels
        );
        ensure!(
            u64::from(reader.duration()) <= u64::from(spec.sample_rate) * MAX_HRIR_LENGTH_SECONDS,
            "impulse response is too long: {:.2} seconds (max {})",
            f64::from(reader.duration()) / f64::from(spec.sample_rate),
            MAX_HRIR_LENGTH_SECONDS
        );

        let samples: Vec<f32> = if spec.sample_format == hound::SampleFormat::Float {
            reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .context("failed to read float samples")?
        } else {
            let max_val = (1 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to read integer samples")?
        };

        let mut left: Vec<f32> = samples.iter().step_by(2).copied().collect();
        let mut right: Vec<f32> = samples.iter().skip(1).step_by(2).copied().collect();

        if spec.sample_rate != self.target_sample_rate {
            debug!(
                "resampling HRIR from {} Hz to {} Hz",
                spec.sample_rate, self.target_sample_rate
            );
            left = resample(&left, spec.sample_rate, self.target_sample_rate)?;
            right = resample(&right, spec.sample_rate, self.target_sample_rate)?;
            let len = left.len().min(right.len());
            left.truncate(len);
            right.truncate(len);
        }

        normalize_pair(&mut left, &mut right);

        Ok((left, right))
    }
}

/// Pull the azimuth out of a file stem: any digit run, e.g. "az045" -> 45.
fn parse_azimuth(stem: &str) -> Option<u16> {
    let digits: String = stem.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|&azimuth| azimuth < 360)
}

/// Scale both ears by one factor so the louder peaks at 0.9; scaling the
/// ears separately would destroy the interaural level difference.
fn normalize_pair(left: &mut [f32], right: &mut [f32]) {
    let peak = left
        .iter()
        .chain(right.iter())
        .fold(0.0f32, |m, &x| m.max(x.abs()));

    if peak > 0.0 {
        let g = 0.9 / peak;
        for s in left.iter_mut().chain(right.iter_mut()) {
            *s *= g;
        }
    }
}

/// resample takes input samples at a given sample_rate and returns them in the target sample_rate
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, samples.len(), 1)?;

    let input = vec![samples.to_vec()];
    let output = resampler.process(&input, None)?;

    output
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("resampling produced no output"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_stereo_wav(path: &Path, left: &[f32], right: &[f32], sample_rate: u32) {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for (l, r) in left.iter().zip(right) {
            writer.write_sample((l * 32767.0) as i16).unwrap();
            writer.write_sample((r * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn impulse(len: usize, gain: f32) -> Vec<f32> {
        let mut ir = vec![0.0; len];
        ir[0] = gain;
        ir
    }

    #[test]
    fn test_load_table_from_uniform_set() -> Result<()> {
        let tmp = TempDir::new()?;
        for azimuth in [0u16, 90, 180, 270] {
            let path = tmp.path().join(format!("az{azimuth:03}.wav"));
            write_stereo_wav(&path, &impulse(64, 0.8), &impulse(64, 0.4), 44_100);
        }

        let table = HrirLoader::new(tmp.path(), 44_100).load_table()?;

        assert_eq!(table.len(), 4);
        assert_eq!(table.step_degrees(), 90.0);
        assert_eq!(table.bucket_for(135), 1);
        Ok(())
    }

    #[test]
    fn test_non_uniform_set_is_rejected() -> Result<()> {
        let tmp = TempDir::new()?;
        for azimuth in [0u16, 90, 180] {
            let path = tmp.path().join(format!("{azimuth}.wav"));
            write_stereo_wav(&path, &impulse(64, 0.5), &impulse(64, 0.5), 44_100);
        }

        assert!(HrirLoader::new(tmp.path(), 44_100).load_table().is_err());
        Ok(())
    }

    #[test]
    fn test_mono_file_is_rejected() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("0.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(1000i16).unwrap();
        writer.finalize().unwrap();

        assert!(HrirLoader::new(tmp.path(), 44_100).load_table().is_err());
        Ok(())
    }

    #[test]
    fn test_normalization_preserves_interaural_level_difference() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("0.wav");
        write_stereo_wav(&path, &impulse(64, 0.1), &impulse(64, 0.5), 44_100);

        let table = HrirLoader::new(tmp.path(), 44_100).load_table()?;
        let hrir = table.hrir(0);

        let left_peak = hrir.left().iter().fold(0.0f32, |m, &x| m.max(x.abs()));
        let right_peak = hrir.right().iter().fold(0.0f32, |m, &x| m.max(x.abs()));

        assert!((right_peak - 0.9).abs() < 1e-2);
        assert!((left_peak / right_peak - 0.2).abs() < 1e-2);
        Ok(())
    }

    #[test]
    fn test_parse_azimuth_variants() {
        assert_eq!(parse_azimuth("az045"), Some(45));
        assert_eq!(parse_azimuth("315"), Some(315));
        assert_eq!(parse_azimuth("hrir_090_deg"), Some(90));
        assert_eq!(parse_azimuth("400"), None);
        assert_eq!(parse_azimuth("front"), None);
    }

    #[test]
    fn test_resample_halves_length() -> Result<()> {
        let input: Vec<f32> = (0..48_000).map(|x| (x as f32).sin()).collect();
        let output = resample(&input, 48_000, 24_000)?;

        // Not guaranteed to be exactly half, but it should be close
        assert!(output.len() > 23_000 && output.len() < 25_000);
        Ok(())
    }

    #[test]
    fn test_resample_same_rate_unchanged() -> Result<()> {
        let input: Vec<f32> = (0..1000).map(|x| (x as f32).sin()).collect();
        let output = resample(&input, 48_000, 48_000)?;

        assert_eq!(output, input);
        Ok(())
    }
}
