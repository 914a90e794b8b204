use crate::audio::block::{AudioBus, BLOCK_SAMPLES};
use crate::spatial::UpolsEngine;

/// Per-tick adapter between the platform's native block format and the
/// convolution engine: acquire, convert to float, convolve, convert back,
/// transmit. Conversion buffers are fixed; this path never allocates.
pub struct SpatialStage {
    engine: UpolsEngine,
    left: [f32; BLOCK_SAMPLES],
    right: [f32; BLOCK_SAMPLES],
}

impl SpatialStage {
    /// The engine's partition size must match the platform block size; a
    /// mismatch is a wiring bug caught here rather than per tick.
    pub fn new(engine: UpolsEngine) -> Self {
        assert_eq!(
            engine.partition_size(),
            BLOCK_SAMPLES,
            "engine partition size must match the audio block size"
        );
        Self {
            engine,
            left: [0.0; BLOCK_SAMPLES],
            right: [0.0; BLOCK_SAMPLES],
        }
    }

    /// Run one audio tick. No-ops when the bus has no block pair ready.
    pub fn update(&mut self, bus: &mut impl AudioBus) {
        let Some((left, right)) = bus.acquire() else {
            return;
        };

        if self.engine.is_passthrough() {
            // Forward the native samples untouched; no float round trip.
            bus.transmit();
            return;
        }

        for i in 0..BLOCK_SAMPLES {
            self.left[i] = sample_to_float(left.samples[i]);
            self.right[i] = sample_to_float(right.samples[i]);
        }

        self.engine.process(&mut self.left, &mut self.right);

        for i in 0..BLOCK_SAMPLES {
            left.samples[i] = float_to_sample(self.left[i]);
            right.samples[i] = float_to_sample(self.right[i]);
        }

        bus.transmit();
    }

    pub fn engine(&self) -> &UpolsEngine {
        &self.engine
    }
}

/// Q15 sample to float in [-1, 1).
#[inline]
fn sample_to_float(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Float back to Q15 with saturation.
#[inline]
fn float_to_sample(value: f32) -> i16 {
    (value * 32768.0).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}
