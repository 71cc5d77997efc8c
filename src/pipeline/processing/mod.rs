// Pipeline processing: harvesting, quality gating, splitting and normalization

pub mod extract;
pub mod normalize;
pub mod quality_gate;
pub mod split;

// Re-export key types and functions
pub use normalize::{BulletNormalizationPipeline, Pass, PipelineConfig};
pub use quality_gate::{clean_bullet, is_high_quality};
