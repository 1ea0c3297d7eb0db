//! ### English
//! Host-facing runtime: the assembled camera pipeline.
//!
//! ### 中文
//! 面向宿主的运行时：组装好的相机管线。
mod camera_pipeline;

pub use camera_pipeline::{CameraPipeline, CameraPipelineInit};
