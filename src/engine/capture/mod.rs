//! ### English
//! Capture device controller and the device-facing seams it drives.
//!
//! ### 中文
//! 采集设备控制器及其驱动的设备侧接口。
mod capture_thread;
mod command;
mod controller;
mod device;
mod rotation;
mod selection;

pub use controller::{CaptureContext, CaptureDeviceController, CaptureState};
pub use device::{
    CameraInfo, CaptureBackend, CaptureDevice, DeviceCapabilities, DeviceConfig, Facing,
    FocusMode, FpsRange,
};
pub use rotation::display_orientation;
pub use selection::{closest_size, fastest_fps_range, preferred_focus_mode, resolve_config};
