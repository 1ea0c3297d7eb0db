/// ### English
/// `glcam_pipeline` crate root.
/// Camera capture, GPU preview and encoder-surface bridging as three cooperating actors;
/// the implementation lives under `engine`, this root re-exports the public surface.
///
/// ### 中文
/// `glcam_pipeline` 的 crate 根。
/// 以三个协作 actor 实现相机采集、GPU 预览与编码表面桥接；
/// 实现位于 `engine` 模块，crate 根只重新导出公开接口。
mod engine;

pub use engine::bridge::{
    EmbedderContextFactory, EmbedderGlApi, EncoderContext, EncoderInput, EncoderSink,
    EncoderSurfaceBridge, OutputSurfaceHandle, SharedContextFactory, install_embedder_gl_api,
};
pub use engine::capture::{
    CameraInfo, CaptureBackend, CaptureContext, CaptureDevice, CaptureDeviceController,
    CaptureState, DeviceCapabilities, DeviceConfig, Facing, FocusMode, FpsRange, closest_size,
    display_orientation, fastest_fps_range, preferred_focus_mode, resolve_config,
};
pub use engine::config::{
    DEFAULT_FORWARD_INTERVAL, DEFAULT_REQUESTED_SIZE, PipelineConfig, RedrawPolicy,
};
pub use engine::error::{DeviceError, PipelineError, PipelineResult};
pub use engine::frame::{CapturedImage, FrameAvailableListener, FrameProducer, FrameSlot};
pub use engine::observer::{DisplayRotation, NoopObserver, PipelineObserver, Rotation};
pub use engine::rendering::gles::{GlVersion, GlesQuadDrawer, GlesRenderBackend};
pub use engine::rendering::{
    PreviewHandle, PreviewRenderer, QuadDrawer, RenderBackend, SharedContextHandle, TextureId,
};
pub use engine::runtime::{CameraPipeline, CameraPipelineInit};
pub use engine::sink::FrameSink;
pub use engine::viewport::{
    IDENTITY, Mat4, ScaleMode, ViewportRect, ViewportTransform, compute as compute_viewport,
};

/// ### English
/// dpi size type used throughout the public API.
///
/// ### 中文
/// 公开 API 中使用的 dpi 尺寸类型。
pub use dpi::PhysicalSize;
