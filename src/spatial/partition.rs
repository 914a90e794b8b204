use log::warn;
use rustfft::num_complex::Complex;

use crate::hrir::Hrir;
use crate::spatial::fft::BlockTransform;
use crate::spatial::{Channel, PartitionScheme};

/// The active filter pair in frequency-domain form: one ordered set of
/// sub-filter blocks per ear. Replaced wholesale when the source angle
/// changes, never mutated in place.
pub struct TransferFunctionSet {
    scheme: PartitionScheme,
    left: Vec<Vec<Complex<f32>>>,
    right: Vec<Vec<Complex<f32>>>,
}

impl TransferFunctionSet {
    pub fn scheme(&self) -> PartitionScheme {
        self.scheme
    }

    pub fn partitions(&self, channel: Channel) -> &[Vec<Complex<f32>>] {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }
}

/// Converts raw impulse responses into frequency-domain sub-filter sets.
///
/// Runs on the control plane when the source angle changes; the per-tick
/// path never sees it.
pub struct Partitioner {
    scheme: PartitionScheme,
    fft: BlockTransform,
}

impl Partitioner {
    pub fn new(scheme: PartitionScheme) -> Self {
        Self {
            scheme,
            fft: BlockTransform::new(scheme.transform_len()),
        }
    }

    pub fn scheme(&self) -> PartitionScheme {
        self.scheme
    }

    /// Partition both ears of an impulse response.
    ///
    /// Responses shorter than the scheme are zero-padded; longer ones are
    /// truncated to the spanned length.
    pub fn partition(&mut self, hrir: &Hrir) -> TransferFunctionSet {
        if hrir.len() > self.scheme.impulse_len() {
            warn!(
                "impulse response truncated from {} to {} samples",
                hrir.len(),
                self.scheme.impulse_len()
            );
        }

        TransferFunctionSet {
            scheme: self.scheme,
            left: self.partition_channel(hrir.left()),
            right: self.partition_channel(hrir.right()),
        }
    }

    fn partition_channel(&mut self, samples: &[f32]) -> Vec<Vec<Complex<f32>>> {
        let size = self.scheme.partition_size();
        let mut partitions = Vec::with_capacity(self.scheme.partition_count());

        for j in 0..self.scheme.partition_count() {
            // Sub-filter taps occupy the second half of the block; the
            // leading zeros keep the per-block circular convolution linear
            // over the first half of each inverse transform.
            let mut block = vec![Complex::new(0.0, 0.0); self.scheme.transform_len()];
            for (k, slot) in block[size..].iter_mut().enumerate() {
                let tap = samples.get(j * size + k).copied().unwrap_or(0.0);
                *slot = Complex::new(tap, 0.0);
            }

            self.fft.forward(&mut block);
            partitions.push(block);
        }

        partitions
    }
}
