//! ### English
//! Error taxonomy shared by every actor of the pipeline.
//!
//! Device-layer failures are caught at the capture controller boundary and reported to the host;
//! GPU capability failures abort renderer setup. Nothing is retried automatically.
//!
//! ### 中文
//! 管线中所有 actor 共用的错误分类。
//!
//! 设备层错误在采集控制器边界被捕获并上报给宿主；GPU 能力缺失会中止渲染器初始化。
//! 所有错误都不会自动重试。

use thiserror::Error;

/// ### English
/// Result alias used across the crate.
///
/// ### 中文
/// crate 内通用的 Result 别名。
pub type PipelineResult<T> = Result<T, PipelineError>;

/// ### English
/// Errors surfaced by the capture controller, the preview renderer and the encoder bridge.
///
/// ### 中文
/// 采集控制器、预览渲染器与编码桥接器对外暴露的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// ### English
    /// The capture device could not be opened (recoverable; the host may re-issue `start`).
    ///
    /// ### 中文
    /// 无法打开采集设备（可恢复；宿主可以重新调用 `start`）。
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    /// ### English
    /// The device rejected its parameter set, output binding or stream start; the device has
    /// already been released when this is reported.
    ///
    /// ### 中文
    /// 设备拒绝了参数集、输出绑定或开始推流；上报时设备已被释放。
    #[error("capture device rejected configuration: {0}")]
    DeviceConfigRejected(String),
    /// ### English
    /// The GPU lacks a capability required to sample camera frames (fatal, no fallback path).
    ///
    /// ### 中文
    /// GPU 缺少采样相机帧所需的能力（致命，无回退路径）。
    #[error("required GPU capability missing: {0}")]
    MissingGpuCapability(String),
    /// ### English
    /// A GPU context was invalidated; every object owned by it must be considered destroyed.
    ///
    /// ### 中文
    /// GPU 上下文已失效；其持有的所有对象都应视为已销毁。
    #[error("GPU context lost: {0}")]
    ContextLost(String),
    /// ### English
    /// Shader/program/buffer creation failed on an otherwise capable context.
    ///
    /// ### 中文
    /// 在具备能力的上下文上创建 shader/program/buffer 失败。
    #[error("GPU error: {0}")]
    Gpu(String),
    /// ### English
    /// An actor thread could not be spawned, or has already terminated.
    ///
    /// ### 中文
    /// actor 线程无法创建，或已经退出。
    #[error("{0} is not running")]
    ActorUnavailable(&'static str),
}

impl PipelineError {
    /// ### English
    /// Returns whether the host may simply re-issue the failed request.
    ///
    /// ### 中文
    /// 返回宿主是否可以直接重新发起失败的请求。
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable(_) | Self::DeviceConfigRejected(_) | Self::ActorUnavailable(_)
        )
    }
}

/// ### English
/// Error returned by capture device backends.
///
/// ### 中文
/// 采集设备后端返回的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DeviceError {
    message: String,
}

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
