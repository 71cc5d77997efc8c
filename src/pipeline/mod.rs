// Bullet processing pipeline: pure text transforms over harvested and generated bullets

pub mod processing;

// Re-export key types and functions from each stage
pub use processing::normalize;
pub use processing::quality_gate;
