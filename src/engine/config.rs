//! ### English
//! Pipeline configuration supplied by the host when the pipeline is assembled.
//!
//! ### 中文
//! 宿主在组装管线时提供的配置。

use dpi::PhysicalSize;

use crate::engine::viewport::ScaleMode;

/// ### English
/// Default capture size requested whenever the display surface (re)appears.
///
/// ### 中文
/// 每次显示表面（重新）出现时请求的默认采集尺寸。
pub const DEFAULT_REQUESTED_SIZE: PhysicalSize<u32> = PhysicalSize::new(1280, 720);

/// ### English
/// Default forward interval: one sink forward every two redraw ticks.
///
/// ### 中文
/// 默认转发间隔：每两次重绘 tick 向 sink 转发一次。
pub const DEFAULT_FORWARD_INTERVAL: u32 = 2;

/// ### English
/// Redraw cadence of the preview renderer.
///
/// ### 中文
/// 预览渲染器的重绘节奏。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RedrawPolicy {
    /// ### English
    /// The host redraws on every display tick; the texture is refreshed only when a new frame is
    /// pending.
    ///
    /// ### 中文
    /// 宿主每个显示 tick 都重绘；仅在有待处理新帧时刷新纹理。
    #[default]
    Continuous,
    /// ### English
    /// The host redraws only when asked through `PipelineObserver::on_render_requested`.
    ///
    /// ### 中文
    /// 宿主仅在 `PipelineObserver::on_render_requested` 请求时重绘。
    WhenDirty,
}

/// ### English
/// Pipeline-wide configuration.
///
/// ### 中文
/// 管线级配置。
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// ### English
    /// Camera index passed to the capture backend.
    ///
    /// ### 中文
    /// 传给采集后端的相机索引。
    pub camera_id: u32,
    /// ### English
    /// Capture size requested when a surface change triggers a start.
    ///
    /// ### 中文
    /// 表面变化触发启动时请求的采集尺寸。
    pub requested_size: PhysicalSize<u32>,
    /// ### English
    /// Initial scale mode.
    ///
    /// ### 中文
    /// 初始缩放模式。
    pub scale_mode: ScaleMode,
    /// ### English
    /// Forward one frame to the sink every `forward_interval` redraw ticks (clamped to >= 1).
    ///
    /// ### 中文
    /// 每 `forward_interval` 次重绘 tick 向 sink 转发一帧（下限为 1）。
    pub forward_interval: u32,
    pub redraw_policy: RedrawPolicy,
    pub capture_thread_name: String,
    pub bridge_thread_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            camera_id: 0,
            requested_size: DEFAULT_REQUESTED_SIZE,
            scale_mode: ScaleMode::Stretch,
            forward_interval: DEFAULT_FORWARD_INTERVAL,
            redraw_policy: RedrawPolicy::Continuous,
            capture_thread_name: "glcam-capture".to_string(),
            bridge_thread_name: "glcam-encoder-bridge".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn with_camera_id(mut self, camera_id: u32) -> Self {
        self.camera_id = camera_id;
        self
    }

    pub fn with_requested_size(mut self, size: PhysicalSize<u32>) -> Self {
        self.requested_size = size;
        self
    }

    pub fn with_scale_mode(mut self, scale_mode: ScaleMode) -> Self {
        self.scale_mode = scale_mode;
        self
    }

    /// ### English
    /// Sets the sink forward interval; `0` is treated as `1` (forward on every tick).
    ///
    /// ### 中文
    /// 设置 sink 转发间隔；`0` 按 `1` 处理（每个 tick 都转发）。
    pub fn with_forward_interval(mut self, interval: u32) -> Self {
        self.forward_interval = interval.max(1);
        self
    }

    pub fn with_redraw_policy(mut self, policy: RedrawPolicy) -> Self {
        self.redraw_policy = policy;
        self
    }

    pub fn with_capture_thread_name(mut self, name: impl Into<String>) -> Self {
        self.capture_thread_name = name.into();
        self
    }

    pub fn with_bridge_thread_name(mut self, name: impl Into<String>) -> Self {
        self.bridge_thread_name = name.into();
        self
    }

    pub(crate) fn effective_forward_interval(&self) -> u32 {
        self.forward_interval.max(1)
    }
}
