//! ### English
//! Host-facing callbacks and the display orientation query.
//!
//! ### 中文
//! 面向宿主的回调以及显示方向查询。

use dpi::PhysicalSize;

use crate::engine::error::PipelineError;
use crate::engine::viewport::ViewportRect;

/// ### English
/// Notifications from the pipeline to the host. All methods default to no-ops and may be called
/// from any pipeline thread.
///
/// ### 中文
/// 管线发往宿主的通知。所有方法默认为空操作，可能在任意管线线程上调用。
pub trait PipelineObserver: Send + Sync {
    /// ### English
    /// A start request or renderer setup failed. Nothing is retried automatically.
    ///
    /// ### 中文
    /// 启动请求或渲染器初始化失败。不会自动重试。
    fn on_prepared_error(&self, _error: &PipelineError) {}

    fn on_viewport_changed(&self, _rect: ViewportRect) {}

    /// ### English
    /// The capture device resolved its preview size (before rotation is applied).
    ///
    /// ### 中文
    /// 采集设备已确定预览尺寸（未应用旋转）。
    fn on_preview_size_resolved(&self, _size: PhysicalSize<u32>) {}

    /// ### English
    /// A new frame is pending; hosts using `RedrawPolicy::WhenDirty` should schedule a redraw.
    ///
    /// ### 中文
    /// 有新帧待处理；使用 `RedrawPolicy::WhenDirty` 的宿主应安排一次重绘。
    fn on_render_requested(&self) {}
}

/// ### English
/// Observer that ignores everything.
///
/// ### 中文
/// 忽略所有通知的观察者。
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// ### English
/// Device rotation relative to its natural orientation.
///
/// ### 中文
/// 设备相对自然方向的旋转。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// ### English
    /// Maps any multiple of 90 degrees (modulo 360) to a rotation; other angles yield `None`.
    ///
    /// ### 中文
    /// 将任意 90 度倍数（对 360 取模）映射为旋转；其他角度返回 `None`。
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }
}

/// ### English
/// Host query for the current display rotation, sampled on every capture start.
///
/// ### 中文
/// 宿主提供的当前显示旋转查询，每次采集启动时读取。
pub trait DisplayRotation: Send + Sync {
    fn rotation(&self) -> Rotation;
}

impl DisplayRotation for Rotation {
    fn rotation(&self) -> Rotation {
        *self
    }
}
