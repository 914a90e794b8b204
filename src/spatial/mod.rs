pub mod control;
pub mod fft;
pub mod kernels;
pub mod partition;
pub mod upols;

pub use control::{Controller, Status};
pub use partition::{Partitioner, TransferFunctionSet};
pub use upols::UpolsEngine;

use anyhow::{Result, ensure};

/// Stereo channel selector.
///
/// The engine packs the left channel into the real parts and the right
/// channel into the imaginary parts of a single complex transform, so the
/// channel decides which half of each complex sample is read back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

/// Geometry of the uniformly-partitioned convolution.
///
/// An impulse response of `partition_size * partition_count` samples is split
/// into `partition_count` sub-filters of `partition_size` samples each. Every
/// sub-filter is transformed at twice the partition length so that the
/// per-block circular convolution yields valid linear-convolution output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionScheme {
    partition_size: usize,
    partition_count: usize,
}

impl PartitionScheme {
    /// 128-sample partitions, 64 partitions: an 8192-tap filter at ~2.9 ms
    /// per block at 44.1 kHz.
    pub const DEFAULT: Self = Self {
        partition_size: 128,
        partition_count: 64,
    };

    pub fn new(partition_size: usize, partition_count: usize) -> Result<Self> {
        ensure!(
            partition_size.is_power_of_two(),
            "partition size must be a power of two, got {partition_size}"
        );
        ensure!(partition_count > 0, "partition count must be non-zero");
        Ok(Self {
            partition_size,
            partition_count,
        })
    }

    pub const fn partition_size(&self) -> usize {
        self.partition_size
    }

    pub const fn partition_count(&self) -> usize {
        self.partition_count
    }

    /// Complex points per transform block (two partitions' worth).
    pub const fn transform_len(&self) -> usize {
        2 * self.partition_size
    }

    /// Number of impulse-response samples the scheme spans per channel.
    pub const fn impulse_len(&self) -> usize {
        self.partition_size * self.partition_count
    }
}

impl Default for PartitionScheme {
    fn default() -> Self {
        Self::DEFAULT
    }
}
