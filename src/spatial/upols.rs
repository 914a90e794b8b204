use arc_swap::ArcSwap;
use rustfft::num_complex::Complex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::spatial::fft::BlockTransform;
use crate::spatial::partition::TransferFunctionSet;
use crate::spatial::{Channel, kernels};

/// Uniformly-partitioned overlap-save convolution engine.
///
/// Maintains a circular frequency-domain delay line of recent input blocks
/// and the active pair of ear transfer functions. Each tick transforms one
/// new 50%-overlapped stereo window, slides the delay line against the
/// sub-filters, and emits one block of rendered audio per ear. Both channels
/// share a single complex transform: left samples ride the real parts, right
/// samples the imaginary parts.
///
/// The transfer-function set is read through an `ArcSwap`, so the control
/// plane can republish a freshly partitioned filter at any time; the engine
/// picks it up at the next tick boundary and never convolves against a
/// half-written set. All scratch is allocated at construction; the tick
/// path performs no heap allocation.
pub struct UpolsEngine {
    fft: BlockTransform,
    transfer: Arc<ArcSwap<TransferFunctionSet>>,
    passthrough: Arc<AtomicBool>,
    active: Arc<TransferFunctionSet>,

    /// One frequency block per partition slot; the slot at `cursor` holds
    /// the newest input block, the slot `i` steps behind it (mod count) the
    /// block `i` ticks old.
    delay_line: Vec<Vec<Complex<f32>>>,
    cursor: usize,

    /// Previous tick's samples, packed left→re / right→im.
    overlap: Vec<Complex<f32>>,

    window: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
}

impl UpolsEngine {
    pub fn new(transfer: Arc<ArcSwap<TransferFunctionSet>>, passthrough: Arc<AtomicBool>) -> Self {
        let active = transfer.load_full();
        let scheme = active.scheme();
        let transform_len = scheme.transform_len();

        Self {
            fft: BlockTransform::new(transform_len),
            transfer,
            passthrough,
            delay_line: vec![
                vec![Complex::new(0.0, 0.0); transform_len];
                scheme.partition_count()
            ],
            cursor: 0,
            overlap: vec![Complex::new(0.0, 0.0); scheme.partition_size()],
            window: vec![Complex::new(0.0, 0.0); transform_len],
            accum: vec![Complex::new(0.0, 0.0); transform_len],
            active,
        }
    }

    /// Samples consumed and produced per channel per tick.
    pub fn partition_size(&self) -> usize {
        self.overlap.len()
    }

    /// Current write slot of the frequency delay line.
    pub fn partition_cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_passthrough(&self) -> bool {
        self.passthrough.load(Ordering::SeqCst)
    }

    /// Render one tick in place.
    ///
    /// Slice lengths must equal the partition size; the audio stage
    /// validates this once at construction. In passthrough the samples are
    /// left untouched and no state advances.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), self.partition_size());
        debug_assert_eq!(right.len(), self.partition_size());

        if self.is_passthrough() {
            return;
        }

        let current = self.transfer.load_full();
        if !Arc::ptr_eq(&current, &self.active) {
            // A filter built for a different source position must not see
            // history convolved under the old one.
            self.reset();
            self.active = current;
        }

        let size = self.partition_size();
        self.window[..size].copy_from_slice(&self.overlap);
        for i in 0..size {
            let sample = Complex::new(left[i], right[i]);
            self.window[size + i] = sample;
            self.overlap[i] = sample;
        }

        self.fft.forward(&mut self.window);
        self.delay_line[self.cursor].copy_from_slice(&self.window);

        let active = Arc::clone(&self.active);
        self.render_channel(active.partitions(Channel::Left), left, Channel::Left);
        self.render_channel(active.partitions(Channel::Right), right, Channel::Right);

        self.cursor = (self.cursor + 1) % self.delay_line.len();
    }

    /// Clear the delay line and overlap history.
    pub fn reset(&mut self) {
        for slot in &mut self.delay_line {
            kernels::clear(slot);
        }
        kernels::clear(&mut self.overlap);
        self.cursor = 0;
    }

    fn render_channel(
        &mut self,
        partitions: &[Vec<Complex<f32>>],
        out: &mut [f32],
        channel: Channel,
    ) {
        kernels::clear(&mut self.accum);

        let count = self.delay_line.len();
        debug_assert_eq!(partitions.len(), count);
        for (i, sub_filter) in partitions.iter().enumerate() {
            // Sub-filter i always pairs with the input block i ticks old;
            // the walk slides backwards from the newest slot.
            let slot = (self.cursor + count - i) % count;
            kernels::multiply_accumulate(&mut self.accum, &self.delay_line[slot], sub_filter);
        }

        self.fft.inverse(&mut self.accum);

        // The sub-filters sit in the second half of their blocks, which
        // rotates the time-aliased segment to the back: the first half of
        // the inverse transform is the valid linear-convolution output.
        match channel {
            Channel::Left => {
                for (o, c) in out.iter_mut().zip(&self.accum) {
                    *o = c.re;
                }
            }
            Channel::Right => {
                for (o, c) in out.iter_mut().zip(&self.accum) {
                    *o = c.im;
                }
            }
        }
    }
}
