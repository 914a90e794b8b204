/// Samples per hardware audio block: ~2.9 ms at 44.1 kHz.
pub const BLOCK_SAMPLES: usize = 128;

/// One channel's block of native 16-bit samples, borrowed from the
/// surrounding audio pipeline for the duration of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlock {
    pub samples: [i16; BLOCK_SAMPLES],
}

impl AudioBlock {
    pub const fn silent() -> Self {
        Self {
            samples: [0; BLOCK_SAMPLES],
        }
    }
}

impl Default for AudioBlock {
    fn default() -> Self {
        Self::silent()
    }
}

/// Boundary to the platform audio framework.
///
/// `acquire` hands out this tick's writable input blocks for both channels,
/// or `None` when either channel has nothing ready; the stage then skips
/// the tick entirely and no state advances. After processing the blocks in
/// place the stage calls `transmit`, at which point the implementation
/// forwards them to the output side and reclaims them. The stage never
/// holds a block across ticks.
pub trait AudioBus {
    fn acquire(&mut self) -> Option<(&mut AudioBlock, &mut AudioBlock)>;
    fn transmit(&mut self);
}
