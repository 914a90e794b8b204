use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Fixed-length forward/inverse complex FFT with preallocated scratch.
///
/// One instance serves one transform length for the lifetime of the engine,
/// so the per-tick path never touches the planner or allocates.
pub struct BlockTransform {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    len: usize,
}

impl BlockTransform {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            forward,
            inverse,
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            len,
        }
    }

    pub fn forward(&mut self, block: &mut [Complex<f32>]) {
        debug_assert_eq!(block.len(), self.len);
        self.forward.process_with_scratch(block, &mut self.scratch);
    }

    /// Inverse transform, scaled by `1/len`.
    ///
    /// rustfft leaves both directions unnormalized, so the spectral product
    /// of two forward transforms comes back from the inverse carrying a
    /// factor of `len`. Folding the normalization in here keeps the rest of
    /// the engine free of scaling constants.
    pub fn inverse(&mut self, block: &mut [Complex<f32>]) {
        debug_assert_eq!(block.len(), self.len);
        self.inverse.process_with_scratch(block, &mut self.scratch);

        let scale = 1.0 / self.len as f32;
        for v in block.iter_mut() {
            *v *= scale;
        }
    }
}
