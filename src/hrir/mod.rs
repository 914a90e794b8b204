pub mod loader;

pub use loader::HrirLoader;

use anyhow::{Result, ensure};

/// One head-related impulse-response pair: what each ear hears of a unit
/// impulse emitted from a single azimuth.
#[derive(Debug, Clone)]
pub struct Hrir {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Hrir {
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Result<Self> {
        ensure!(!left.is_empty(), "impulse response must not be empty");
        ensure!(
            left.len() == right.len(),
            "ear impulse responses must have equal length ({} vs {})",
            left.len(),
            right.len()
        );
        Ok(Self { left, right })
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }
}

/// Read-only table of impulse-response pairs covering the full circle in
/// uniform azimuth buckets; entry `i` sits at `i * 360 / len` degrees.
///
/// The table is fixed for the lifetime of a session. Selection maps a
/// requested azimuth to the bucket containing it; angles wrap around the
/// circle rather than clamping, since azimuth is circular.
pub struct HrirTable {
    entries: Vec<Hrir>,
}

impl HrirTable {
    pub fn new(entries: Vec<Hrir>) -> Result<Self> {
        ensure!(!entries.is_empty(), "HRIR table must contain at least one entry");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn step_degrees(&self) -> f32 {
        360.0 / self.entries.len() as f32
    }

    /// Bucket owning the given azimuth (floor of `azimuth / step`).
    pub fn bucket_for(&self, azimuth_degrees: u16) -> usize {
        let wrapped = f32::from(azimuth_degrees % 360);
        ((wrapped / self.step_degrees()) as usize).min(self.entries.len() - 1)
    }

    pub fn bucket_azimuth(&self, bucket: usize) -> f32 {
        bucket as f32 * self.step_degrees()
    }

    pub fn hrir(&self, bucket: usize) -> &Hrir {
        &self.entries[bucket]
    }
}
