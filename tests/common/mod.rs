#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use glcam_pipeline::{
    CameraInfo, CaptureBackend, CaptureDevice, CapturedImage, DeviceCapabilities, DeviceConfig,
    DeviceError, EncoderContext, EncoderInput, Facing, FocusMode, FpsRange, FrameProducer, Mat4,
    OutputSurfaceHandle, PhysicalSize, PipelineError, PipelineObserver, PipelineResult,
    QuadDrawer, RenderBackend, SharedContextFactory, SharedContextHandle, TextureId,
    ViewportRect,
};

/// Ordered log shared by every fake so cross-actor ordering can be asserted.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

pub fn size(width: u32, height: u32) -> PhysicalSize<u32> {
    PhysicalSize::new(width, height)
}

pub fn rgba_frame(width: u32, height: u32, timestamp_ns: u64) -> CapturedImage {
    let size = size(width, height);
    CapturedImage::new(size, vec![0x80; CapturedImage::expected_len(size)], timestamp_ns)
}

// ---------------------------------------------------------------------------------------------
// Capture

#[derive(Default)]
pub struct DeviceFaults {
    pub open: AtomicBool,
    pub configure: AtomicBool,
    pub start: AtomicBool,
}

pub struct FakeCaptureBackend {
    pub journal: Journal,
    pub info: CameraInfo,
    pub capabilities: DeviceCapabilities,
    pub faults: DeviceFaults,
    pub opened: AtomicUsize,
    pub applied: Mutex<Option<DeviceConfig>>,
    pub producer: Arc<Mutex<Option<FrameProducer>>>,
    /// Every producer ever bound, kept past release like a driver callback still in flight.
    pub retained: Mutex<Vec<FrameProducer>>,
}

impl FakeCaptureBackend {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            info: CameraInfo {
                facing: Facing::Back,
                sensor_orientation: 90,
            },
            capabilities: DeviceCapabilities {
                preview_sizes: vec![size(640, 480), size(1280, 720), size(1920, 1080)],
                picture_sizes: vec![size(1920, 1080), size(1280, 720)],
                fps_ranges: vec![FpsRange::new(15_000, 30_000), FpsRange::new(30_000, 30_000)],
                focus_modes: vec![FocusMode::Auto, FocusMode::ContinuousVideo],
            },
            faults: DeviceFaults::default(),
            opened: AtomicUsize::new(0),
            applied: Mutex::new(None),
            producer: Arc::new(Mutex::new(None)),
            retained: Mutex::new(Vec::new()),
        })
    }

    /// Publishes a frame through the currently bound device output.
    pub fn push_frame(&self, image: CapturedImage) -> bool {
        match self.producer.lock().unwrap().as_ref() {
            Some(producer) => producer.publish(image),
            None => false,
        }
    }

    pub fn applied(&self) -> Option<DeviceConfig> {
        *self.applied.lock().unwrap()
    }

    pub fn is_bound(&self) -> bool {
        self.producer.lock().unwrap().is_some()
    }

    pub fn last_retained(&self) -> Option<FrameProducer> {
        self.retained.lock().unwrap().last().cloned()
    }
}

/// Handle shared with the devices the backend opens.
struct BackendRef(Arc<FakeCaptureBackend>);

pub fn capture_backend(backend: &Arc<FakeCaptureBackend>) -> Arc<dyn CaptureBackend> {
    Arc::new(BackendRef(backend.clone()))
}

impl CaptureBackend for BackendRef {
    fn open(&self, camera_id: u32) -> Result<Box<dyn CaptureDevice>, DeviceError> {
        let backend = &self.0;
        if backend.faults.open.load(Ordering::SeqCst) {
            return Err(DeviceError::new(format!("camera {camera_id} is busy")));
        }
        backend.opened.fetch_add(1, Ordering::SeqCst);
        backend.journal.push("device:open");
        Ok(Box::new(FakeDevice {
            backend: backend.clone(),
        }))
    }
}

struct FakeDevice {
    backend: Arc<FakeCaptureBackend>,
}

impl CaptureDevice for FakeDevice {
    fn info(&self) -> CameraInfo {
        self.backend.info
    }

    fn capabilities(&self) -> Result<DeviceCapabilities, DeviceError> {
        Ok(self.backend.capabilities.clone())
    }

    fn configure(&mut self, config: &DeviceConfig) -> Result<PhysicalSize<u32>, DeviceError> {
        if self.backend.faults.configure.load(Ordering::SeqCst) {
            return Err(DeviceError::new("setParameters failed"));
        }
        *self.backend.applied.lock().unwrap() = Some(*config);
        self.backend.journal.push("device:configure");
        Ok(config.preview_size)
    }

    fn set_display_orientation(&mut self, degrees: u32) -> Result<(), DeviceError> {
        self.backend.journal.push(format!("device:orientation:{degrees}"));
        Ok(())
    }

    fn bind_output(&mut self, producer: FrameProducer) -> Result<(), DeviceError> {
        self.backend.retained.lock().unwrap().push(producer.clone());
        *self.backend.producer.lock().unwrap() = Some(producer);
        self.backend.journal.push("device:bind");
        Ok(())
    }

    fn start_streaming(&mut self) -> Result<(), DeviceError> {
        if self.backend.faults.start.load(Ordering::SeqCst) {
            return Err(DeviceError::new("startPreview failed"));
        }
        self.backend.journal.push("device:start");
        Ok(())
    }

    fn stop_streaming(&mut self) {
        self.backend.journal.push("device:stop");
    }

    fn release(self: Box<Self>) {
        self.backend.producer.lock().unwrap().take();
        self.backend.journal.push("device:release");
    }
}

// ---------------------------------------------------------------------------------------------
// Host callbacks

#[derive(Default)]
pub struct RecordingObserver {
    pub errors: Mutex<Vec<PipelineError>>,
    pub viewports: Mutex<Vec<ViewportRect>>,
    pub preview_sizes: Mutex<Vec<PhysicalSize<u32>>>,
    pub render_requests: AtomicUsize,
}

impl RecordingObserver {
    pub fn errors(&self) -> Vec<PipelineError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn last_viewport(&self) -> Option<ViewportRect> {
        self.viewports.lock().unwrap().last().copied()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_prepared_error(&self, error: &PipelineError) {
        self.errors.lock().unwrap().push(error.clone());
    }

    fn on_viewport_changed(&self, rect: ViewportRect) {
        self.viewports.lock().unwrap().push(rect);
    }

    fn on_preview_size_resolved(&self, size: PhysicalSize<u32>) {
        self.preview_sizes.lock().unwrap().push(size);
    }

    fn on_render_requested(&self) {
        self.render_requests.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------------------------
// Primary context

pub const PRIMARY_CONTEXT: usize = 0xC0_47E7;

pub struct FakeRenderBackend {
    pub journal: Journal,
    pub capable: bool,
    next_texture: u32,
}

impl FakeRenderBackend {
    pub fn new(journal: &Journal) -> Box<Self> {
        Box::new(Self {
            journal: journal.clone(),
            capable: true,
            next_texture: 1,
        })
    }

    pub fn incapable(journal: &Journal) -> Box<Self> {
        let mut backend = Self::new(journal);
        backend.capable = false;
        backend
    }
}

impl RenderBackend for FakeRenderBackend {
    fn check_capabilities(&self) -> PipelineResult<()> {
        if self.capable {
            Ok(())
        } else {
            Err(PipelineError::MissingGpuCapability(
                "GL_OES_texture_npot".to_string(),
            ))
        }
    }

    fn shared_context(&self) -> SharedContextHandle {
        SharedContextHandle::from_addr(PRIMARY_CONTEXT)
    }

    fn create_texture(&mut self) -> PipelineResult<TextureId> {
        let texture = TextureId::new(self.next_texture).unwrap();
        self.next_texture += 1;
        self.journal.push(format!("gpu:create_texture:{}", texture.get()));
        Ok(texture)
    }

    fn upload_image(&mut self, _texture: TextureId, _image: &CapturedImage) {
        self.journal.push("gpu:upload");
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.journal.push(format!("gpu:delete_texture:{}", texture.get()));
    }

    fn create_drawer(&mut self) -> PipelineResult<Box<dyn QuadDrawer>> {
        Ok(Box::new(FakeDrawer {
            journal: self.journal.clone(),
            prefix: "gpu",
        }))
    }

    fn set_viewport(&mut self, _rect: ViewportRect) {}

    fn clear(&mut self) {}
}

pub struct FakeDrawer {
    journal: Journal,
    prefix: &'static str,
}

impl QuadDrawer for FakeDrawer {
    fn draw(&mut self, _texture: TextureId, _tex_matrix: &Mat4, _mvp: &Mat4) {}

    fn release(self: Box<Self>) {
        self.journal.push(format!("{}:release_drawer", self.prefix));
    }
}

// ---------------------------------------------------------------------------------------------
// Secondary context

#[derive(Default)]
pub struct ContextFaults {
    pub create: AtomicBool,
    pub swap: AtomicBool,
}

/// Shared-context factory recording everything the bridge thread does.
pub struct FakeContextFactory {
    pub journal: Journal,
    pub faults: ContextFaults,
    pub created: AtomicUsize,
    pub drawn: Mutex<Vec<(TextureId, Mat4, Mat4)>>,
    pub last_shared: Mutex<Option<(SharedContextHandle, OutputSurfaceHandle)>>,
    pub bridge_threads: Mutex<Vec<Option<String>>>,
}

impl FakeContextFactory {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            faults: ContextFaults::default(),
            created: AtomicUsize::new(0),
            drawn: Mutex::new(Vec::new()),
            last_shared: Mutex::new(None),
            bridge_threads: Mutex::new(Vec::new()),
        })
    }

    pub fn draw_count(&self) -> usize {
        self.drawn.lock().unwrap().len()
    }
}

struct FactoryRef(Arc<FakeContextFactory>);

pub fn context_factory(factory: &Arc<FakeContextFactory>) -> Arc<dyn SharedContextFactory> {
    Arc::new(FactoryRef(factory.clone()))
}

impl SharedContextFactory for FactoryRef {
    fn create(
        &self,
        shared: SharedContextHandle,
        surface: OutputSurfaceHandle,
    ) -> PipelineResult<Box<dyn EncoderContext>> {
        let factory = &self.0;
        factory
            .bridge_threads
            .lock()
            .unwrap()
            .push(thread::current().name().map(str::to_string));
        if factory.faults.create.load(Ordering::SeqCst) {
            return Err(PipelineError::Gpu("eglCreateContext failed".to_string()));
        }
        let id = factory.created.fetch_add(1, Ordering::SeqCst) + 1;
        *factory.last_shared.lock().unwrap() = Some((shared, surface));
        factory.journal.push(format!("encoder:create:{id}"));
        Ok(Box::new(FakeEncoderContext {
            factory: factory.clone(),
            id,
        }))
    }
}

struct FakeEncoderContext {
    factory: Arc<FakeContextFactory>,
    id: usize,
}

impl EncoderContext for FakeEncoderContext {
    fn make_current(&mut self) -> PipelineResult<()> {
        Ok(())
    }

    fn draw(&mut self, texture: TextureId, tex_matrix: &Mat4, mvp: &Mat4) {
        self.factory
            .drawn
            .lock()
            .unwrap()
            .push((texture, *tex_matrix, *mvp));
    }

    fn swap_buffers(&mut self) -> PipelineResult<()> {
        if self.factory.faults.swap.load(Ordering::SeqCst) {
            return Err(PipelineError::ContextLost("EGL_CONTEXT_LOST".to_string()));
        }
        self.factory.journal.push("encoder:swap");
        Ok(())
    }

    fn release(self: Box<Self>) {
        self.factory
            .journal
            .push(format!("encoder:release:{}", self.id));
    }
}

pub const ENCODER_SURFACE: usize = 0x5EF_ACE;

/// Encoder stand-in counting `frame_available_soon` notifications.
#[derive(Clone, Default)]
pub struct FakeEncoderInput {
    pub notified: Arc<AtomicUsize>,
}

impl EncoderInput for FakeEncoderInput {
    fn input_surface(&self) -> OutputSurfaceHandle {
        OutputSurfaceHandle::from_addr(ENCODER_SURFACE)
    }

    fn frame_available_soon(&mut self) {
        self.notified.fetch_add(1, Ordering::SeqCst);
    }
}
