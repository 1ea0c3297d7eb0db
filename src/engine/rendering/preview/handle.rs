//! ### English
//! Thread-safe handle to a preview renderer.
//!
//! ### 中文
//! 预览渲染器的线程安全句柄。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crossbeam_channel as channel;
use dpi::PhysicalSize;

use crate::engine::config::RedrawPolicy;
use crate::engine::frame::FrameAvailableListener;
use crate::engine::observer::PipelineObserver;
use crate::engine::sink::FrameSink;
use crate::engine::viewport::ScaleMode;

use super::command::RendererCommand;

/// ### English
/// State written by other threads and read by the renderer on its own context.
///
/// ### 中文
/// 由其他线程写入、渲染器在自身上下文中读取的状态。
pub(crate) struct PreviewShared {
    /// ### English
    /// Set by the frame-available listener, cleared by the next draw that latches the image.
    ///
    /// ### 中文
    /// 由帧可用监听器置位，由下一次锁存图像的绘制清除。
    pending_refresh: AtomicBool,
    scale_mode: AtomicU8,
    /// ### English
    /// Logical source size (already swapped for odd multiples of 90 degrees).
    ///
    /// ### 中文
    /// 逻辑源尺寸（旋转为 90 度奇数倍时已交换宽高）。
    source_width: AtomicU32,
    source_height: AtomicU32,
    /// ### English
    /// Display rotation last applied by the capture device.
    ///
    /// ### 中文
    /// 采集设备最近一次应用的显示旋转角度。
    rotation_degrees: AtomicU32,
    has_surface: AtomicBool,
    redraw_policy: RedrawPolicy,
    pub(super) observer: Arc<dyn PipelineObserver>,
}

impl PreviewShared {
    pub(super) fn new(
        scale_mode: ScaleMode,
        redraw_policy: RedrawPolicy,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            pending_refresh: AtomicBool::new(false),
            scale_mode: AtomicU8::new(scale_mode.index()),
            source_width: AtomicU32::new(0),
            source_height: AtomicU32::new(0),
            rotation_degrees: AtomicU32::new(0),
            has_surface: AtomicBool::new(false),
            redraw_policy,
            observer,
        }
    }

    fn on_new_frame_available(&self) {
        self.pending_refresh.store(true, Ordering::Release);
        if self.redraw_policy == RedrawPolicy::WhenDirty {
            self.observer.on_render_requested();
        }
    }

    pub(super) fn take_pending_refresh(&self) -> bool {
        self.pending_refresh.swap(false, Ordering::AcqRel)
    }

    pub(super) fn clear_pending_refresh(&self) {
        self.pending_refresh.store(false, Ordering::Release);
    }

    pub(super) fn scale_mode(&self) -> ScaleMode {
        ScaleMode::from_index(self.scale_mode.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub(super) fn source_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(
            self.source_width.load(Ordering::Acquire),
            self.source_height.load(Ordering::Acquire),
        )
    }

    pub(super) fn set_has_surface(&self, has_surface: bool) {
        self.has_surface.store(has_surface, Ordering::Release);
    }

    pub(super) fn frame_listener(self: &Arc<Self>) -> FrameAvailableListener {
        let shared = self.clone();
        Arc::new(move || shared.on_new_frame_available())
    }
}

/// ### English
/// Cloneable, `Send` handle used by the host and by the capture controller to reach the
/// renderer. Everything that touches GPU state is queued and executed at the start of the next
/// draw (or surface change) on the renderer's context.
///
/// ### 中文
/// 宿主与采集控制器用来访问渲染器的可克隆 `Send` 句柄。
/// 所有涉及 GPU 状态的操作都会入队，并在渲染器上下文的下一次绘制（或表面变化）开始时执行。
#[derive(Clone)]
pub struct PreviewHandle {
    shared: Arc<PreviewShared>,
    command_tx: channel::Sender<RendererCommand>,
}

impl PreviewHandle {
    pub(super) fn new(
        shared: Arc<PreviewShared>,
        command_tx: channel::Sender<RendererCommand>,
    ) -> Self {
        Self { shared, command_tx }
    }

    /// ### English
    /// Marks a new frame as pending. Never blocks; safe from any thread.
    ///
    /// ### 中文
    /// 标记有新帧待处理。不会阻塞；可在任意线程调用。
    pub fn on_new_frame_available(&self) {
        self.shared.on_new_frame_available();
    }

    /// ### English
    /// Changes the scale mode; the viewport is recomputed on the renderer's context.
    ///
    /// ### 中文
    /// 修改缩放模式；视口会在渲染器上下文中重新计算。
    pub fn set_scale_mode(&self, mode: ScaleMode) {
        let previous = self.shared.scale_mode.swap(mode.index(), Ordering::AcqRel);
        if previous != mode.index() {
            tracing::debug!(mode = mode.label(), "scale mode changed");
            self.send(RendererCommand::UpdateViewport);
        }
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.shared.scale_mode()
    }

    /// ### English
    /// Records the display rotation applied by the capture device. Affects subsequent
    /// `set_target_size` calls only.
    ///
    /// ### 中文
    /// 记录采集设备应用的显示旋转角度。只影响之后的 `set_target_size` 调用。
    pub fn set_display_rotation(&self, degrees: u32) {
        self.shared
            .rotation_degrees
            .store(degrees % 360, Ordering::Release);
    }

    pub fn display_rotation(&self) -> u32 {
        self.shared.rotation_degrees.load(Ordering::Acquire)
    }

    /// ### English
    /// Sets the source (camera) size in device orientation. Width and height are swapped when the
    /// recorded rotation is an odd multiple of 90 degrees.
    ///
    /// #### Parameters
    /// - `width`: Source width before rotation.
    /// - `height`: Source height before rotation.
    ///
    /// ### 中文
    /// 设置设备方向下的源（相机）尺寸。当记录的旋转角度为 90 度奇数倍时交换宽高。
    ///
    /// #### 参数
    /// - `width`：旋转前的源宽度。
    /// - `height`：旋转前的源高度。
    pub fn set_target_size(&self, width: u32, height: u32) {
        let (width, height) = if self.display_rotation() % 180 == 0 {
            (width, height)
        } else {
            (height, width)
        };
        self.shared.source_width.store(width, Ordering::Release);
        self.shared.source_height.store(height, Ordering::Release);
        self.send(RendererCommand::UpdateViewport);
    }

    pub fn source_size(&self) -> PhysicalSize<u32> {
        self.shared.source_size()
    }

    /// ### English
    /// Attaches `sink`; it receives `on_context_ready` on the renderer's context as soon as a
    /// surface exists.
    ///
    /// ### 中文
    /// 挂接 `sink`；一旦表面存在，它会在渲染器上下文中收到 `on_context_ready`。
    pub fn attach_sink(&self, sink: Box<dyn FrameSink>) {
        self.send(RendererCommand::AttachSink(sink));
    }

    pub fn detach_sink(&self) {
        self.send(RendererCommand::DetachSink);
    }

    /// ### English
    /// Whether the renderer currently owns a primary surface (texture allocated).
    ///
    /// ### 中文
    /// 渲染器当前是否持有主表面（纹理已分配）。
    pub fn has_surface(&self) -> bool {
        self.shared.has_surface.load(Ordering::Acquire)
    }

    fn send(&self, command: RendererCommand) {
        if let Err(err) = self.command_tx.send(command) {
            tracing::debug!(command = ?err.into_inner(), "renderer is gone; command dropped");
        }
    }
}
