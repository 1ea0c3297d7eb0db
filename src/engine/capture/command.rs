//! ### English
//! Command protocol of the capture thread.
//!
//! ### 中文
//! 采集线程的命令协议。

use crossbeam_channel as channel;
use dpi::PhysicalSize;

#[derive(Debug)]
pub(super) enum CaptureCommand {
    /// ### English
    /// Opens and configures the device for `requested`, then starts streaming. Ignored if a
    /// device is already open.
    ///
    /// ### 中文
    /// 按 `requested` 打开并配置设备，然后开始推流。若设备已打开则忽略。
    Start { requested: PhysicalSize<u32> },
    /// ### English
    /// Stops streaming, releases the device and ends the thread.
    ///
    /// ### 中文
    /// 停止推流、释放设备并结束线程。
    Stop {
        /// ### English
        /// Signaled once the device is fully released (`stop(true)` callers wait on it).
        ///
        /// ### 中文
        /// 设备完全释放后发出信号（`stop(true)` 的调用方会等待它）。
        done: Option<channel::Sender<()>>,
    },
}
