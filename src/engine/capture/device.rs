//! ### English
//! Capture device abstraction implemented by platform camera backends.
//!
//! ### 中文
//! 由平台相机后端实现的采集设备抽象。

use dpi::PhysicalSize;

use crate::engine::error::DeviceError;
use crate::engine::frame::FrameProducer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    Front,
    Back,
}

/// ### English
/// Static description of one camera.
///
/// ### 中文
/// 单个相机的静态描述。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CameraInfo {
    pub facing: Facing,
    /// ### English
    /// Clockwise angle the sensor image must be rotated to be upright in the device's natural
    /// orientation (0/90/180/270).
    ///
    /// ### 中文
    /// 传感器图像需顺时针旋转多少度才能在设备自然方向下正立（0/90/180/270）。
    pub sensor_orientation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FocusMode {
    Auto,
    ContinuousVideo,
    ContinuousPicture,
    Fixed,
    Infinity,
    Macro,
}

/// ### English
/// Supported preview frame-rate range, in frames per second scaled by 1000.
///
/// ### 中文
/// 支持的预览帧率范围，单位为帧每秒乘以 1000。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FpsRange {
    pub min: u32,
    pub max: u32,
}

impl FpsRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// ### English
/// Parameter space advertised by an opened device.
///
/// ### 中文
/// 已打开设备声明的参数空间。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub preview_sizes: Vec<PhysicalSize<u32>>,
    pub picture_sizes: Vec<PhysicalSize<u32>>,
    pub fps_ranges: Vec<FpsRange>,
    pub focus_modes: Vec<FocusMode>,
}

/// ### English
/// Parameter set applied to a device before streaming. `None` leaves the device default.
///
/// ### 中文
/// 推流前应用到设备的参数集。`None` 表示保留设备默认值。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    pub preview_size: PhysicalSize<u32>,
    pub picture_size: Option<PhysicalSize<u32>>,
    pub fps_range: Option<FpsRange>,
    pub focus_mode: Option<FocusMode>,
    pub recording_hint: bool,
}

/// ### English
/// Opens capture devices. Shared with the capture thread.
///
/// ### 中文
/// 打开采集设备。与采集线程共享。
pub trait CaptureBackend: Send + Sync {
    fn open(&self, camera_id: u32) -> Result<Box<dyn CaptureDevice>, DeviceError>;
}

/// ### English
/// One opened capture device, exclusively owned by the capture thread.
///
/// ### 中文
/// 一个已打开的采集设备，由采集线程独占。
pub trait CaptureDevice: Send {
    fn info(&self) -> CameraInfo;

    fn capabilities(&self) -> Result<DeviceCapabilities, DeviceError>;

    /// ### English
    /// Applies `config`; returns the preview size the device actually settled on.
    ///
    /// ### 中文
    /// 应用 `config`；返回设备实际采用的预览尺寸。
    fn configure(&mut self, config: &DeviceConfig) -> Result<PhysicalSize<u32>, DeviceError>;

    fn set_display_orientation(&mut self, degrees: u32) -> Result<(), DeviceError>;

    /// ### English
    /// Binds the device output to the renderer's frame slot. The device publishes every frame
    /// through `producer` from whatever thread it captures on.
    ///
    /// ### 中文
    /// 将设备输出绑定到渲染器的帧槽。设备在其采集线程上通过 `producer` 发布每一帧。
    fn bind_output(&mut self, producer: FrameProducer) -> Result<(), DeviceError>;

    fn start_streaming(&mut self) -> Result<(), DeviceError>;

    fn stop_streaming(&mut self);

    /// ### English
    /// Releases the device handle and drops the output binding.
    ///
    /// ### 中文
    /// 释放设备句柄并丢弃输出绑定。
    fn release(self: Box<Self>);
}
