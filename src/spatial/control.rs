use arc_swap::ArcSwap;
use log::debug;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::hrir::HrirTable;
use crate::spatial::PartitionScheme;
use crate::spatial::partition::{Partitioner, TransferFunctionSet};
use crate::spatial::upols::UpolsEngine;

/// Control-plane handle for a running engine.
///
/// Owns the HRIR table and the partitioner. Angle changes are partitioned
/// here, off the audio tick, and published to the engine with a single
/// atomic swap. The tick path only ever observes complete filter sets and
/// keeps rendering the previous one until the swap lands, so no mute window
/// is needed.
pub struct Controller {
    table: HrirTable,
    partitioner: Partitioner,
    transfer: Arc<ArcSwap<TransferFunctionSet>>,
    passthrough: Arc<AtomicBool>,
    azimuth: u16,
    bucket: usize,
}

/// Snapshot of the renderer's control state.
#[derive(Debug, Clone, Copy)]
pub struct Status {
    pub azimuth_degrees: u16,
    pub bucket: usize,
    pub bucket_azimuth_degrees: f32,
    pub passthrough: bool,
    pub partition_size: usize,
    pub partition_count: usize,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Azimuth: {}°", self.azimuth_degrees)?;
        writeln!(
            f,
            "Bucket: {} ({:.1}°)",
            self.bucket, self.bucket_azimuth_degrees
        )?;
        writeln!(f, "Passthrough: {}", self.passthrough)?;
        writeln!(
            f,
            "Partitions: {} x {} samples",
            self.partition_count, self.partition_size
        )?;
        Ok(())
    }
}

impl Controller {
    /// Build a connected engine/controller pair rendering `initial_azimuth`.
    pub fn new(
        table: HrirTable,
        scheme: PartitionScheme,
        initial_azimuth: u16,
    ) -> (UpolsEngine, Self) {
        let mut partitioner = Partitioner::new(scheme);
        let azimuth = initial_azimuth % 360;
        let bucket = table.bucket_for(azimuth);
        let set = partitioner.partition(table.hrir(bucket));

        let transfer = Arc::new(ArcSwap::from_pointee(set));
        let passthrough = Arc::new(AtomicBool::new(false));
        let engine = UpolsEngine::new(Arc::clone(&transfer), Arc::clone(&passthrough));

        debug!("initial filter set: azimuth {azimuth}° -> bucket {bucket}");

        (
            engine,
            Self {
                table,
                partitioner,
                transfer,
                passthrough,
                azimuth,
                bucket,
            },
        )
    }

    /// Point the renderer at a new source azimuth.
    ///
    /// Angles wrap around the circle, so 370° selects the same bucket as
    /// 10°. Returns the wrapped azimuth. Re-partitioning is skipped when the
    /// angle stays inside the current bucket.
    pub fn set_angle(&mut self, azimuth_degrees: u16) -> u16 {
        let azimuth = azimuth_degrees % 360;
        self.azimuth = azimuth;

        let bucket = self.table.bucket_for(azimuth);
        if bucket == self.bucket {
            debug!("azimuth {azimuth}° stays in bucket {bucket}, filter unchanged");
            return azimuth;
        }

        let set = self.partitioner.partition(self.table.hrir(bucket));
        self.transfer.store(Arc::new(set));
        self.bucket = bucket;
        debug!("azimuth {azimuth}° -> bucket {bucket}, new filter set published");

        azimuth
    }

    /// Flip passthrough and return the new state.
    pub fn toggle_passthrough(&self) -> bool {
        !self.passthrough.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn status(&self) -> Status {
        let scheme = self.partitioner.scheme();
        Status {
            azimuth_degrees: self.azimuth,
            bucket: self.bucket,
            bucket_azimuth_degrees: self.table.bucket_azimuth(self.bucket),
            passthrough: self.passthrough.load(Ordering::SeqCst),
            partition_size: scheme.partition_size(),
            partition_count: scheme.partition_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hrir::Hrir;

    fn table_of(n: usize) -> HrirTable {
        let entries = (0..n)
            .map(|i| {
                let mut ir = vec![0.0; 8];
                ir[0] = 1.0 / (i + 1) as f32;
                Hrir::new(ir.clone(), ir).unwrap()
            })
            .collect();
        HrirTable::new(entries).unwrap()
    }

    fn scheme() -> PartitionScheme {
        PartitionScheme::new(4, 2).unwrap()
    }

    #[test]
    fn test_set_angle_wraps_around_the_circle() {
        let (_engine, mut controller) = Controller::new(table_of(4), scheme(), 0);
        assert_eq!(controller.set_angle(370), 10);
        assert_eq!(controller.status().bucket, 0);
        assert_eq!(controller.set_angle(450), 90);
        assert_eq!(controller.status().bucket, 1);
    }

    #[test]
    fn test_same_bucket_does_not_republish() {
        let (_engine, mut controller) = Controller::new(table_of(4), scheme(), 0);
        let before = controller.transfer.load_full();

        controller.set_angle(45); // still bucket 0 at 90° steps
        assert!(Arc::ptr_eq(&before, &controller.transfer.load_full()));

        controller.set_angle(180);
        assert!(!Arc::ptr_eq(&before, &controller.transfer.load_full()));
    }

    #[test]
    fn test_toggle_passthrough_reaches_engine() {
        let (engine, controller) = Controller::new(table_of(4), scheme(), 0);
        assert!(!engine.is_passthrough());
        assert!(controller.toggle_passthrough());
        assert!(engine.is_passthrough());
        assert!(!controller.toggle_passthrough());
        assert!(!engine.is_passthrough());
    }

    #[test]
    fn test_status_reflects_configuration() {
        let (_engine, controller) = Controller::new(table_of(4), scheme(), 200);
        let status = controller.status();
        assert_eq!(status.azimuth_degrees, 200);
        assert_eq!(status.bucket, 2);
        assert_eq!(status.bucket_azimuth_degrees, 180.0);
        assert_eq!(status.partition_size, 4);
        assert_eq!(status.partition_count, 2);
        assert!(!status.passthrough);
        assert!(status.to_string().contains("Azimuth: 200°"));
    }
}
