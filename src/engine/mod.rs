pub mod preview;
pub mod primitives;
pub mod raymarcher;
pub mod sampler;
pub mod types;
