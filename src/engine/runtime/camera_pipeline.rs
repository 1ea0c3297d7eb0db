//! ### English
//! Host-facing pipeline facade: wires the capture controller, the preview renderer and an
//! optional encoder sink together, and maps view lifecycle callbacks onto them.
//!
//! ### 中文
//! 面向宿主的管线门面：将采集控制器、预览渲染器与可选的编码 sink 连接起来，
//! 并把 view 生命周期回调映射到它们上。

use std::sync::Arc;

use dpi::PhysicalSize;

use crate::engine::bridge::{EncoderInput, EncoderSink, SharedContextFactory};
use crate::engine::capture::{CaptureBackend, CaptureContext, CaptureDeviceController, CaptureState};
use crate::engine::config::PipelineConfig;
use crate::engine::error::PipelineResult;
use crate::engine::frame::FrameSlot;
use crate::engine::observer::{DisplayRotation, PipelineObserver};
use crate::engine::rendering::{PreviewHandle, PreviewRenderer, RenderBackend};
use crate::engine::sink::FrameSink;
use crate::engine::viewport::ScaleMode;

pub struct CameraPipelineInit {
    pub config: PipelineConfig,
    pub capture_backend: Arc<dyn CaptureBackend>,
    pub display: Arc<dyn DisplayRotation>,
    pub observer: Arc<dyn PipelineObserver>,
}

/// ### English
/// One capture session's worth of pipeline. The host owns it; the matching
/// [`PreviewRenderer`] returned by [`CameraPipeline::new`] stays on the display thread.
///
/// Everything here is non-blocking except `stop(true)` and `surface_destroyed`.
///
/// ### 中文
/// 单个采集会话对应的管线，由宿主持有；[`CameraPipeline::new`] 同时返回的
/// [`PreviewRenderer`] 留在显示线程上。
///
/// 除 `stop(true)` 与 `surface_destroyed` 外，这里的操作都不会阻塞。
pub struct CameraPipeline {
    config: PipelineConfig,
    slot: Arc<FrameSlot>,
    preview: PreviewHandle,
    capture: CaptureDeviceController,
}

impl CameraPipeline {
    /// ### English
    /// Assembles the pipeline. The returned renderer must be driven from the thread that owns
    /// the display surface.
    ///
    /// ### 中文
    /// 组装管线。返回的渲染器必须在持有显示表面的线程上驱动。
    pub fn new(init: CameraPipelineInit) -> (Self, PreviewRenderer) {
        let CameraPipelineInit {
            config,
            capture_backend,
            display,
            observer,
        } = init;

        let slot = FrameSlot::new();
        let renderer = PreviewRenderer::new(&config, slot.clone(), observer.clone());
        let preview = renderer.handle();
        let capture = CaptureDeviceController::new(
            CaptureContext {
                backend: capture_backend,
                camera_id: config.camera_id,
                slot: slot.clone(),
                preview: preview.clone(),
                display,
                observer,
            },
            config.capture_thread_name.clone(),
        );

        let pipeline = Self {
            config,
            slot,
            preview,
            capture,
        };
        (pipeline, renderer)
    }

    pub fn start(&self, requested: PhysicalSize<u32>) -> PipelineResult<()> {
        self.capture.start(requested)
    }

    /// ### English
    /// Stops capture. With `wait`, blocks until the device is fully released.
    ///
    /// ### 中文
    /// 停止采集。`wait` 为真时阻塞直到设备完全释放。
    pub fn stop(&self, wait: bool) {
        self.capture.stop(wait);
    }

    pub fn set_scale_mode(&self, mode: ScaleMode) {
        self.preview.set_scale_mode(mode);
    }

    /// ### English
    /// Switches to the next scale mode and returns it.
    ///
    /// ### 中文
    /// 切换到下一个缩放模式并返回它。
    pub fn cycle_scale_mode(&self) -> ScaleMode {
        let next = self.preview.scale_mode().next();
        self.preview.set_scale_mode(next);
        next
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.preview.scale_mode()
    }

    pub fn set_target_size(&self, width: u32, height: u32) {
        self.preview.set_target_size(width, height);
    }

    pub fn attach_sink(&self, sink: Box<dyn FrameSink>) {
        self.preview.attach_sink(sink);
    }

    /// ### English
    /// Attaches an [`EncoderSink`] feeding `input` through a bridge built by `factory`.
    ///
    /// ### 中文
    /// 挂接一个 [`EncoderSink`]，通过 `factory` 构建的桥接器向 `input` 送帧。
    pub fn attach_encoder(
        &self,
        factory: Arc<dyn SharedContextFactory>,
        input: Box<dyn EncoderInput>,
    ) {
        let sink = EncoderSink::new(self.config.bridge_thread_name.clone(), factory, input);
        self.preview.attach_sink(Box::new(sink));
    }

    pub fn detach_sink(&self) {
        self.preview.detach_sink();
    }

    /// ### English
    /// Display surface created: set up the renderer's GPU objects on `backend`.
    ///
    /// ### 中文
    /// 显示表面已创建：在 `backend` 上初始化渲染器的 GPU 对象。
    pub fn surface_created(
        &self,
        renderer: &mut PreviewRenderer,
        backend: Box<dyn RenderBackend>,
    ) -> PipelineResult<()> {
        renderer.on_surface_created(backend)
    }

    /// ### English
    /// Display surface resized: recompute the viewport, then request capture at the configured
    /// size. Zero sizes are ignored (the view is still being laid out).
    ///
    /// ### 中文
    /// 显示表面尺寸变化：重新计算视口，然后按配置尺寸请求采集。
    /// 尺寸为 0 时忽略（view 仍在布局中）。
    pub fn surface_changed(
        &self,
        renderer: &mut PreviewRenderer,
        width: u32,
        height: u32,
    ) -> PipelineResult<()> {
        if !renderer.on_surface_changed(width, height) {
            return Ok(());
        }
        if self.preview.has_surface() {
            self.capture.start(self.config.requested_size)?;
        }
        Ok(())
    }

    /// ### English
    /// Display surface about to be destroyed: wait until the device stopped writing into it,
    /// then release the renderer's GPU objects.
    ///
    /// ### 中文
    /// 显示表面即将销毁：等待设备停止向其写入，然后释放渲染器的 GPU 对象。
    pub fn surface_destroyed(&self, renderer: &mut PreviewRenderer) {
        self.capture.stop(true);
        renderer.on_surface_destroyed();
    }

    /// ### English
    /// Host resumed: restart capture if a surface already exists.
    ///
    /// ### 中文
    /// 宿主恢复：若表面已存在则重新开始采集。
    pub fn resume(&self) -> PipelineResult<()> {
        if self.preview.has_surface() {
            self.capture.start(self.config.requested_size)?;
        }
        Ok(())
    }

    /// ### English
    /// Host paused: request a stop without waiting.
    ///
    /// ### 中文
    /// 宿主暂停：请求停止但不等待。
    pub fn pause(&self) {
        self.capture.stop(false);
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_running()
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    pub fn frame_slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
