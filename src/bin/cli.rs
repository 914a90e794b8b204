use anyhow::{Context, Result, bail, ensure};
#[cfg(debug_assertions)]
use assert_no_alloc::AllocDisabler;
use assert_no_alloc::assert_no_alloc;
use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{info, warn};
use std::path::Path;

use auralis::audio::{AudioBlock, AudioBus, BLOCK_SAMPLES, SpatialStage};
use auralis::hrir::HrirLoader;
use auralis::settings::Settings;
use auralis::spatial::{Controller, PartitionScheme};

#[cfg(debug_assertions)]
#[global_allocator]
static ALLOC: AllocDisabler = AllocDisabler;

#[derive(Parser, Debug)]
#[command(name = "auralis")]
#[command(author = "OpenSauce")]
#[command(version = "0.2")]
#[command(about = "Offline binaural renderer: convolve a stereo WAV against an HRIR set.")]
struct Args {
    #[arg(help = "Input stereo WAV")]
    input: String,

    #[arg(help = "Output WAV path")]
    output: String,

    #[arg(
        long,
        env = "AURALIS_HRIR_DIR",
        help = "Directory of azimuth-named HRIR WAVs (defaults to the configured one)"
    )]
    hrir_dir: Option<String>,

    #[arg(long, help = "Source azimuth in degrees (defaults to the configured one)")]
    azimuth: Option<u16>,

    #[arg(long, help = "Bypass convolution; audio still runs through the block pipeline")]
    passthrough: bool,
}

/// Feeds WAV data through the same block boundary the real-time pipeline
/// uses: one 128-sample block pair per tick, final partial block zero-padded.
struct FileBus {
    left_in: Vec<i16>,
    right_in: Vec<i16>,
    position: usize,
    left: AudioBlock,
    right: AudioBlock,
    rendered: Vec<i16>,
}

impl FileBus {
    fn new(left_in: Vec<i16>, right_in: Vec<i16>) -> Self {
        let capacity = 2 * left_in.len().div_ceil(BLOCK_SAMPLES) * BLOCK_SAMPLES;
        Self {
            left_in,
            right_in,
            position: 0,
            left: AudioBlock::silent(),
            right: AudioBlock::silent(),
            rendered: Vec::with_capacity(capacity),
        }
    }

    fn ticks(&self) -> usize {
        self.left_in.len().div_ceil(BLOCK_SAMPLES)
    }
}

impl AudioBus for FileBus {
    fn acquire(&mut self) -> Option<(&mut AudioBlock, &mut AudioBlock)> {
        if self.position >= self.left_in.len() {
            return None;
        }

        for i in 0..BLOCK_SAMPLES {
            let idx = self.position + i;
            self.left.samples[i] = self.left_in.get(idx).copied().unwrap_or(0);
            self.right.samples[i] = self.right_in.get(idx).copied().unwrap_or(0);
        }
        self.position += BLOCK_SAMPLES;

        Some((&mut self.left, &mut self.right))
    }

    fn transmit(&mut self) {
        for i in 0..BLOCK_SAMPLES {
            self.rendered.push(self.left.samples[i]);
            self.rendered.push(self.right.samples[i]);
        }
    }
}

fn read_stereo_wav(path: &str) -> Result<(Vec<i16>, Vec<i16>, u32)> {
    let reader = WavReader::open(path).with_context(|| format!("failed to open '{path}'"))?;
    let spec = reader.spec();
    ensure!(
        spec.channels == 2,
        "input must be stereo, got {} channel(s)",
        spec.channels
    );

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .collect::<Result<_, _>>()
            .context("failed to read samples")?,
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| (v * 32767.0).clamp(-32768.0, 32767.0) as i16))
            .collect::<Result<_, _>>()
            .context("failed to read samples")?,
        (format, bits) => bail!("unsupported WAV format: {bits}-bit {format:?}"),
    };

    let left = samples.iter().step_by(2).copied().collect();
    let right = samples.iter().skip(1).step_by(2).copied().collect();
    Ok((left, right, spec.sample_rate))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let settings = Settings::load()?;

    let hrir_dir = args.hrir_dir.unwrap_or_else(|| settings.hrir_dir.clone());
    let azimuth = args.azimuth.unwrap_or(settings.azimuth_degrees);

    info!("Auralis v{}", env!("CARGO_PKG_VERSION"));

    let (mut left, mut right, sample_rate) = read_stereo_wav(&args.input)?;
    info!(
        "input: {} frames at {} Hz from '{}'",
        left.len(),
        sample_rate,
        args.input
    );
    if sample_rate != settings.sample_rate {
        warn!(
            "input rate {} Hz differs from the configured {} Hz; rendering at the input rate",
            sample_rate, settings.sample_rate
        );
    }

    let table = HrirLoader::new(Path::new(&hrir_dir), sample_rate)
        .load_table()
        .with_context(|| format!("failed to load HRIR set from '{hrir_dir}'"))?;

    let scheme = PartitionScheme::default();
    let (engine, controller) = Controller::new(table, scheme, azimuth);
    if args.passthrough || settings.passthrough {
        controller.toggle_passthrough();
    }
    info!("{}", controller.status());

    // Pad with silence so the filter tail rings out.
    left.extend(std::iter::repeat_n(0, scheme.impulse_len()));
    right.extend(std::iter::repeat_n(0, scheme.impulse_len()));

    let mut stage = SpatialStage::new(engine);
    let mut bus = FileBus::new(left, right);
    let ticks = bus.ticks();

    for _ in 0..ticks {
        // The tick path is allocation-free; trip the allocator guard if a
        // regression sneaks one in.
        assert_no_alloc(|| stage.update(&mut bus));
    }

    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("failed to create '{}'", args.output))?;
    for sample in &bus.rendered {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    info!("rendered {} blocks to '{}'", ticks, args.output);
    Ok(())
}
