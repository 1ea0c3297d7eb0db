//! ### English
//! On-screen preview renderer bound to the primary GPU context.
//!
//! The host drives it from the thread that owns the display surface: `on_surface_created`,
//! `on_surface_changed`, `on_draw_frame` on every redraw tick, and `on_surface_destroyed` before
//! the context goes away. Other threads only talk to it through a [`PreviewHandle`].
//!
//! ### 中文
//! 绑定到主 GPU 上下文的屏幕预览渲染器。
//!
//! 宿主在持有显示表面的线程上驱动它：`on_surface_created`、`on_surface_changed`、
//! 每个重绘 tick 调用 `on_draw_frame`，以及在上下文销毁前调用 `on_surface_destroyed`。
//! 其他线程只能通过 [`PreviewHandle`] 与其交互。
mod command;
mod handle;

use std::sync::Arc;

use crossbeam_channel as channel;
use dpi::PhysicalSize;

use crate::engine::config::PipelineConfig;
use crate::engine::error::PipelineResult;
use crate::engine::frame::FrameSlot;
use crate::engine::observer::PipelineObserver;
use crate::engine::sink::FrameSink;
use crate::engine::viewport::{self, IDENTITY, Mat4, ViewportRect, ViewportTransform};

use super::backend::{QuadDrawer, RenderBackend, TextureId};

use command::RendererCommand;
use handle::PreviewShared;

pub use handle::PreviewHandle;

/// ### English
/// Owns the primary-context GPU objects (texture, drawer), the viewport transform and the
/// attached sink.
///
/// ### 中文
/// 持有主上下文 GPU 对象（纹理、绘制器）、视口变换以及已挂接的 sink。
pub struct PreviewRenderer {
    shared: Arc<PreviewShared>,
    command_tx: channel::Sender<RendererCommand>,
    command_rx: channel::Receiver<RendererCommand>,
    slot: Arc<FrameSlot>,
    forward_interval: u64,
    backend: Option<Box<dyn RenderBackend>>,
    texture: Option<TextureId>,
    drawer: Option<Box<dyn QuadDrawer>>,
    sink: Option<Box<dyn FrameSink>>,
    view_size: PhysicalSize<u32>,
    transform: ViewportTransform,
    /// ### English
    /// Texture transform of the last latched frame.
    ///
    /// ### 中文
    /// 最近一次锁存帧的纹理变换。
    source_transform: Mat4,
    ticks: u64,
    forwarded: u64,
}

impl PreviewRenderer {
    /// ### English
    /// Creates a renderer with no surface yet.
    ///
    /// #### Parameters
    /// - `config`: Initial scale mode, forward interval and redraw policy.
    /// - `slot`: Frame slot the capture device publishes into.
    /// - `observer`: Host callbacks (viewport changes, setup errors, redraw requests).
    ///
    /// ### 中文
    /// 创建一个尚无表面的渲染器。
    ///
    /// #### 参数
    /// - `config`：初始缩放模式、转发间隔与重绘策略。
    /// - `slot`：采集设备发布帧的帧槽。
    /// - `observer`：宿主回调（视口变化、初始化错误、重绘请求）。
    pub fn new(
        config: &PipelineConfig,
        slot: Arc<FrameSlot>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        let (command_tx, command_rx) = channel::unbounded();
        let shared = Arc::new(PreviewShared::new(
            config.scale_mode,
            config.redraw_policy,
            observer,
        ));
        Self {
            shared,
            command_tx,
            command_rx,
            slot,
            forward_interval: u64::from(config.effective_forward_interval()),
            backend: None,
            texture: None,
            drawer: None,
            sink: None,
            view_size: PhysicalSize::new(0, 0),
            transform: ViewportTransform::identity(PhysicalSize::new(0, 0)),
            source_transform: IDENTITY,
            ticks: 0,
            forwarded: 0,
        }
    }

    pub fn handle(&self) -> PreviewHandle {
        PreviewHandle::new(self.shared.clone(), self.command_tx.clone())
    }

    /// ### English
    /// Sets up the primary-context objects on a freshly created surface.
    ///
    /// Fails (and owns nothing afterwards) if the backend lacks the frame-sampling capability or
    /// an object cannot be created. The error is also reported to the observer.
    ///
    /// ### 中文
    /// 在新创建的表面上初始化主上下文对象。
    ///
    /// 若后端缺少帧采样能力或无法创建对象则失败（失败后不持有任何对象），错误同时上报给观察者。
    pub fn on_surface_created(&mut self, backend: Box<dyn RenderBackend>) -> PipelineResult<()> {
        if self.backend.is_some() {
            tracing::warn!("surface created twice without teardown; releasing previous objects");
            self.on_surface_destroyed();
        }

        if let Err(err) = backend.check_capabilities() {
            tracing::error!(%err, "preview setup aborted");
            self.shared.observer.on_prepared_error(&err);
            return Err(err);
        }
        self.backend = Some(backend);

        if let Err(err) = self.create_gpu_objects() {
            tracing::error!(%err, "preview setup failed");
            self.on_surface_destroyed();
            self.shared.observer.on_prepared_error(&err);
            return Err(err);
        }
        Ok(())
    }

    fn create_gpu_objects(&mut self) -> PipelineResult<()> {
        let Some(backend) = self.backend.as_deref_mut() else {
            return Ok(());
        };
        let texture = backend.create_texture()?;
        self.texture = Some(texture);
        self.drawer = Some(backend.create_drawer()?);

        self.slot.attach(texture, self.shared.frame_listener());
        self.shared.set_has_surface(true);
        tracing::debug!(texture = texture.get(), "preview surface ready");

        let shared_context = backend.shared_context();
        if let Some(sink) = self.sink.as_mut() {
            sink.on_context_ready(shared_context, texture);
        }
        Ok(())
    }

    /// ### English
    /// Records the new surface size and recomputes the viewport. Returns `false` (and changes
    /// nothing) while either dimension is zero.
    ///
    /// ### 中文
    /// 记录新的表面尺寸并重新计算视口。任一维为 0 时返回 `false`（不做任何修改）。
    pub fn on_surface_changed(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.view_size = PhysicalSize::new(width, height);
        self.drain_commands();
        self.update_viewport();
        true
    }

    /// ### English
    /// One redraw tick: latch a pending frame, draw it, and forward it to the sink every
    /// `forward_interval` ticks.
    ///
    /// ### 中文
    /// 一次重绘 tick：锁存待处理帧、绘制，并每 `forward_interval` 个 tick 转发给 sink 一次。
    pub fn on_draw_frame(&mut self) {
        self.drain_commands();

        let (Some(backend), Some(drawer), Some(texture)) = (
            self.backend.as_deref_mut(),
            self.drawer.as_deref_mut(),
            self.texture,
        ) else {
            return;
        };

        backend.set_viewport(self.transform.rect);
        backend.clear();

        if self.shared.take_pending_refresh() {
            if let Some(image) = self.slot.take_latest() {
                backend.upload_image(texture, &image);
                self.source_transform = image.transform;
            }
        }

        drawer.draw(texture, &self.source_transform, &self.transform.mvp);

        // Advances on every tick, new frame or not.
        self.ticks += 1;
        if self.ticks % self.forward_interval == 0 {
            if let Some(sink) = self.sink.as_mut() {
                sink.on_frame(texture, &self.source_transform, &self.transform.mvp);
                self.forwarded += 1;
            }
        }
    }

    /// ### English
    /// Releases the drawer, the texture and the frame binding, in that order. Safe after a
    /// partial setup and safe to call repeatedly. An attached sink is told its context is gone
    /// first and stays attached for the next surface.
    ///
    /// ### 中文
    /// 依次释放绘制器、纹理与帧绑定。初始化部分失败后也可安全调用，可重复调用。
    /// 已挂接的 sink 会先收到上下文失效通知，并保持挂接以用于下一个表面。
    pub fn on_surface_destroyed(&mut self) {
        if self.texture.is_some() {
            if let Some(sink) = self.sink.as_mut() {
                sink.on_context_lost();
            }
        }
        if let Some(drawer) = self.drawer.take() {
            drawer.release();
        }
        if let Some(texture) = self.texture.take() {
            if let Some(backend) = self.backend.as_deref_mut() {
                backend.delete_texture(texture);
            }
        }
        self.slot.detach();
        self.shared.set_has_surface(false);
        self.shared.clear_pending_refresh();
        if self.backend.take().is_some() {
            tracing::debug!("preview surface released");
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn source_transform(&self) -> &Mat4 {
        &self.source_transform
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub fn view_size(&self) -> PhysicalSize<u32> {
        self.view_size
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// ### English
    /// Redraw ticks that reached the draw call.
    ///
    /// ### 中文
    /// 实际执行到绘制调用的重绘 tick 数。
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn forwarded_frames(&self) -> u64 {
        self.forwarded
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            tracing::trace!(?command, "renderer command");
            match command {
                RendererCommand::AttachSink(sink) => self.install_sink(sink),
                RendererCommand::DetachSink => self.remove_sink(),
                RendererCommand::UpdateViewport => self.update_viewport(),
            }
        }
    }

    fn install_sink(&mut self, mut sink: Box<dyn FrameSink>) {
        self.remove_sink();
        if let (Some(backend), Some(texture)) = (self.backend.as_deref(), self.texture) {
            sink.on_context_ready(backend.shared_context(), texture);
        }
        self.sink = Some(sink);
    }

    fn remove_sink(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if self.texture.is_some() {
                sink.on_context_lost();
            }
        }
    }

    fn update_viewport(&mut self) {
        let mode = self.shared.scale_mode();
        let source = self.shared.source_size();
        match viewport::compute(mode, self.view_size, source) {
            Some(transform) => {
                tracing::debug!(
                    mode = mode.label(),
                    view = ?self.view_size,
                    ?source,
                    rect = ?transform.rect,
                    "viewport updated"
                );
                self.transform = transform;
                self.shared.observer.on_viewport_changed(transform.rect);
            }
            None => {
                // Unknown source size: draw over the full view, keep the matrix.
                self.transform.rect = ViewportRect::full(self.view_size);
            }
        }
    }
}

impl Drop for PreviewRenderer {
    fn drop(&mut self) {
        self.on_surface_destroyed();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;

    use super::*;
    use crate::engine::error::PipelineError;
    use crate::engine::frame::CapturedImage;
    use crate::engine::rendering::SharedContextHandle;
    use crate::engine::viewport::ScaleMode;

    #[derive(Default)]
    struct GpuLog {
        events: Vec<String>,
        draws: usize,
        uploads: usize,
    }

    struct FakeBackend {
        log: Rc<RefCell<GpuLog>>,
        capable: bool,
        fail_drawer: bool,
    }

    impl FakeBackend {
        fn new(log: &Rc<RefCell<GpuLog>>) -> Box<Self> {
            Box::new(Self {
                log: log.clone(),
                capable: true,
                fail_drawer: false,
            })
        }
    }

    impl RenderBackend for FakeBackend {
        fn check_capabilities(&self) -> PipelineResult<()> {
            if self.capable {
                Ok(())
            } else {
                Err(PipelineError::MissingGpuCapability("npot".to_string()))
            }
        }

        fn shared_context(&self) -> SharedContextHandle {
            SharedContextHandle::from_addr(0x51)
        }

        fn create_texture(&mut self) -> PipelineResult<TextureId> {
            self.log.borrow_mut().events.push("create_texture".to_string());
            Ok(TextureId::new(5).unwrap())
        }

        fn upload_image(&mut self, _texture: TextureId, _image: &CapturedImage) {
            self.log.borrow_mut().uploads += 1;
        }

        fn delete_texture(&mut self, _texture: TextureId) {
            self.log.borrow_mut().events.push("delete_texture".to_string());
        }

        fn create_drawer(&mut self) -> PipelineResult<Box<dyn QuadDrawer>> {
            if self.fail_drawer {
                return Err(PipelineError::Gpu("link".to_string()));
            }
            Ok(Box::new(FakeDrawer {
                log: self.log.clone(),
            }))
        }

        fn set_viewport(&mut self, _rect: ViewportRect) {}

        fn clear(&mut self) {}
    }

    struct FakeDrawer {
        log: Rc<RefCell<GpuLog>>,
    }

    impl QuadDrawer for FakeDrawer {
        fn draw(&mut self, _texture: TextureId, _tex_matrix: &Mat4, _mvp: &Mat4) {
            self.log.borrow_mut().draws += 1;
        }

        fn release(self: Box<Self>) {
            self.log.borrow_mut().events.push("release_drawer".to_string());
        }
    }

    #[derive(Default)]
    struct SinkLog {
        events: Vec<&'static str>,
        frames: usize,
    }

    struct RecordingSink(Arc<Mutex<SinkLog>>);

    impl FrameSink for RecordingSink {
        fn on_context_ready(&mut self, _shared: SharedContextHandle, _texture: TextureId) {
            self.0.lock().unwrap().events.push("ready");
        }

        fn on_frame(&mut self, _texture: TextureId, _source: &Mat4, _viewport: &Mat4) {
            self.0.lock().unwrap().frames += 1;
        }

        fn on_context_lost(&mut self) {
            self.0.lock().unwrap().events.push("lost");
        }
    }

    #[derive(Default)]
    struct ErrorObserver(Mutex<Vec<PipelineError>>);

    impl PipelineObserver for ErrorObserver {
        fn on_prepared_error(&self, error: &PipelineError) {
            self.0.lock().unwrap().push(error.clone());
        }
    }

    fn renderer() -> (PreviewRenderer, Arc<FrameSlot>) {
        let slot = FrameSlot::new();
        let renderer = PreviewRenderer::new(
            &PipelineConfig::default(),
            slot.clone(),
            Arc::new(crate::engine::observer::NoopObserver),
        );
        (renderer, slot)
    }

    fn frame() -> CapturedImage {
        let size = PhysicalSize::new(2, 2);
        CapturedImage::new(size, vec![0; CapturedImage::expected_len(size)], 1)
    }

    #[test]
    fn missing_capability_aborts_setup() {
        let slot = FrameSlot::new();
        let observer = Arc::new(ErrorObserver::default());
        let mut renderer = PreviewRenderer::new(&PipelineConfig::default(), slot.clone(), observer.clone());
        let log = Rc::new(RefCell::new(GpuLog::default()));
        let mut backend = FakeBackend::new(&log);
        backend.capable = false;

        let err = renderer.on_surface_created(backend).unwrap_err();
        assert!(matches!(err, PipelineError::MissingGpuCapability(_)));
        assert!(renderer.texture().is_none());
        assert!(!slot.is_attached());
        assert!(log.borrow().events.is_empty());
        assert_eq!(observer.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn partial_setup_is_released() {
        let (mut renderer, slot) = renderer();
        let log = Rc::new(RefCell::new(GpuLog::default()));
        let mut backend = FakeBackend::new(&log);
        backend.fail_drawer = true;

        assert!(renderer.on_surface_created(backend).is_err());
        assert_eq!(log.borrow().events, ["create_texture", "delete_texture"]);
        assert!(!slot.is_attached());
        renderer.on_surface_destroyed();
        assert_eq!(log.borrow().events.len(), 2);
    }

    #[test]
    fn teardown_releases_drawer_then_texture_then_binding() {
        let (mut renderer, slot) = renderer();
        let log = Rc::new(RefCell::new(GpuLog::default()));
        renderer.on_surface_created(FakeBackend::new(&log)).unwrap();
        assert!(slot.is_attached());
        assert!(renderer.handle().has_surface());

        renderer.on_surface_destroyed();
        assert_eq!(
            log.borrow().events,
            ["create_texture", "release_drawer", "delete_texture"]
        );
        assert!(!slot.is_attached());
        assert!(!renderer.handle().has_surface());
    }

    #[test]
    fn texture_refreshes_only_when_a_frame_is_pending() {
        let (mut renderer, slot) = renderer();
        let log = Rc::new(RefCell::new(GpuLog::default()));
        renderer.on_surface_created(FakeBackend::new(&log)).unwrap();
        renderer.on_surface_changed(640, 480);

        renderer.on_draw_frame();
        assert_eq!(log.borrow().uploads, 0);

        let producer = slot.producer().unwrap();
        assert!(producer.publish(frame()));
        assert!(producer.publish(frame()));
        renderer.on_draw_frame();
        renderer.on_draw_frame();
        assert_eq!(log.borrow().uploads, 1);
        assert_eq!(log.borrow().draws, 3);
    }

    #[test]
    fn forwards_every_second_tick() {
        let (mut renderer, _slot) = renderer();
        let log = Rc::new(RefCell::new(GpuLog::default()));
        let sink_log = Arc::new(Mutex::new(SinkLog::default()));
        renderer.handle().attach_sink(Box::new(RecordingSink(sink_log.clone())));
        renderer.on_surface_created(FakeBackend::new(&log)).unwrap();

        for _ in 0..101 {
            renderer.on_draw_frame();
        }
        let frames = sink_log.lock().unwrap().frames;
        assert!((49..=51).contains(&frames), "forwarded {frames}");
        assert_eq!(renderer.forwarded_frames(), frames as u64);
        assert_eq!(renderer.ticks(), 101);
    }

    #[test]
    fn sink_survives_surface_recreation() {
        let (mut renderer, _slot) = renderer();
        let log = Rc::new(RefCell::new(GpuLog::default()));
        let sink_log = Arc::new(Mutex::new(SinkLog::default()));
        renderer.on_surface_created(FakeBackend::new(&log)).unwrap();
        renderer.handle().attach_sink(Box::new(RecordingSink(sink_log.clone())));
        renderer.on_draw_frame();
        assert!(renderer.has_sink());

        renderer.on_surface_destroyed();
        renderer.on_surface_created(FakeBackend::new(&log)).unwrap();
        renderer.handle().detach_sink();
        renderer.on_draw_frame();

        assert!(!renderer.has_sink());
        assert_eq!(sink_log.lock().unwrap().events, ["ready", "lost", "ready", "lost"]);
    }

    #[test]
    fn viewport_follows_rotated_target_size_and_scale_mode() {
        let (mut renderer, _slot) = renderer();
        let handle = renderer.handle();
        renderer.on_surface_changed(1000, 1000);
        assert_eq!(renderer.transform().rect, ViewportRect::full(PhysicalSize::new(1000, 1000)));

        handle.set_scale_mode(ScaleMode::FitLetterbox);
        handle.set_target_size(1280, 720);
        renderer.on_draw_frame();
        assert_eq!(
            renderer.transform().rect,
            ViewportRect {
                x: 0,
                y: 219,
                width: 1000,
                height: 562
            }
        );

        handle.set_display_rotation(90);
        handle.set_target_size(1280, 720);
        assert_eq!(handle.source_size(), PhysicalSize::new(720, 1280));
        renderer.on_draw_frame();
        assert_eq!(renderer.transform().rect.height, 1000);
        assert_eq!(renderer.transform().rect.width, 562);
    }

    #[test]
    fn zero_sized_surface_change_is_ignored() {
        let (mut renderer, _slot) = renderer();
        assert!(renderer.on_surface_changed(800, 600));
        assert!(!renderer.on_surface_changed(0, 600));
        assert_eq!(renderer.view_size(), PhysicalSize::new(800, 600));
    }
}
