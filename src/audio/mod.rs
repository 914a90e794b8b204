pub mod block;
pub mod stage;

pub use block::{AudioBlock, AudioBus, BLOCK_SAMPLES};
pub use stage::SpatialStage;
