//! ### English
//! Capture device controller: spawns and owns the capture thread.
//!
//! ### 中文
//! 采集设备控制器：创建并持有采集线程。

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use crossbeam_channel as channel;
use dpi::PhysicalSize;

use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::frame::FrameSlot;
use crate::engine::observer::{DisplayRotation, PipelineObserver};
use crate::engine::rendering::PreviewHandle;

use super::capture_thread::run_capture_thread;
use super::command::CaptureCommand;
use super::device::CaptureBackend;

/// ### English
/// Externally observable capture state. Stopping is transient and reported as `Idle`.
///
/// ### 中文
/// 对外可见的采集状态。停止过程是瞬态的，报告为 `Idle`。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CaptureState {
    #[default]
    Idle = 0,
    Opening = 1,
    Previewing = 2,
}

impl CaptureState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Opening,
            2 => Self::Previewing,
            _ => Self::Idle,
        }
    }
}

/// ### English
/// Collaborators handed to every capture thread.
///
/// ### 中文
/// 交给每个采集线程的协作对象。
#[derive(Clone)]
pub struct CaptureContext {
    pub backend: Arc<dyn CaptureBackend>,
    pub camera_id: u32,
    /// ### English
    /// Frame slot the device output is bound to.
    ///
    /// ### 中文
    /// 设备输出所绑定的帧槽。
    pub slot: Arc<FrameSlot>,
    /// ### English
    /// Receives the applied rotation and the resolved source size.
    ///
    /// ### 中文
    /// 接收已应用的旋转角度与确定的源尺寸。
    pub preview: PreviewHandle,
    pub display: Arc<dyn DisplayRotation>,
    pub observer: Arc<dyn PipelineObserver>,
}

struct Worker {
    command_tx: channel::Sender<CaptureCommand>,
    thread: thread::JoinHandle<()>,
    state: Arc<AtomicU8>,
}

/// ### English
/// Owns the capture device lifecycle through a dedicated thread.
///
/// The thread starts lazily on the first `start` and ends permanently after `Stop`; the next
/// `start` spins up a fresh one.
///
/// ### 中文
/// 通过独立线程管理采集设备的生命周期。
///
/// 线程在第一次 `start` 时惰性启动，处理 `Stop` 后永久结束；之后的 `start` 会创建新线程。
pub struct CaptureDeviceController {
    context: CaptureContext,
    thread_name: String,
    worker: Mutex<Option<Worker>>,
}

impl CaptureDeviceController {
    pub fn new(context: CaptureContext, thread_name: impl Into<String>) -> Self {
        Self {
            context,
            thread_name: thread_name.into(),
            worker: Mutex::new(None),
        }
    }

    /// ### English
    /// Requests capture at `requested` (closest supported size). Ignored while a device is open.
    ///
    /// Only blocks for the thread startup rendezvous. Device failures are reported through
    /// `PipelineObserver::on_prepared_error`; the returned error only covers the thread itself.
    ///
    /// ### 中文
    /// 以 `requested`（最接近的支持尺寸）请求采集。设备已打开时忽略。
    ///
    /// 仅在线程启动握手时阻塞。设备错误通过 `PipelineObserver::on_prepared_error` 上报；
    /// 返回的错误只涉及线程本身。
    pub fn start(&self, requested: PhysicalSize<u32>) -> PipelineResult<()> {
        let mut worker = self.lock_worker();
        if let Some(current) = worker.as_ref() {
            if CaptureState::from_u8(current.state.load(Ordering::Acquire)) != CaptureState::Idle {
                tracing::debug!("capture session already open; start ignored");
                return Ok(());
            }
        }

        let mut command = CaptureCommand::Start { requested };
        if let Some(current) = worker.as_ref() {
            match current.command_tx.send(command) {
                Ok(()) => return Ok(()),
                Err(err) => command = err.into_inner(),
            }
        }
        // The previous thread (if any) exited on its own.
        if let Some(stale) = worker.take() {
            let _ = stale.thread.join();
        }

        let spawned = self.spawn_worker()?;
        if spawned.command_tx.send(command).is_err() {
            return Err(PipelineError::ActorUnavailable("capture thread"));
        }
        *worker = Some(spawned);
        Ok(())
    }

    /// ### English
    /// Stops capture and ends the capture thread.
    ///
    /// #### Parameters
    /// - `wait`: Block until the device is fully released and the thread has exited.
    ///
    /// ### 中文
    /// 停止采集并结束采集线程。
    ///
    /// #### 参数
    /// - `wait`：阻塞直到设备完全释放且线程退出。
    pub fn stop(&self, wait: bool) {
        let Some(worker) = self.lock_worker().take() else {
            return;
        };

        let (done_tx, done_rx) = channel::bounded(1);
        let done = wait.then_some(done_tx);
        if worker.command_tx.send(CaptureCommand::Stop { done }).is_err() {
            tracing::debug!("capture thread already exited");
        }
        drop(worker.command_tx);

        if wait {
            // Disconnection also means the thread is done.
            let _ = done_rx.recv();
            if worker.thread.join().is_err() {
                tracing::error!("capture thread panicked");
            }
        }
    }

    pub fn state(&self) -> CaptureState {
        self.lock_worker()
            .as_ref()
            .map_or(CaptureState::Idle, |worker| {
                CaptureState::from_u8(worker.state.load(Ordering::Acquire))
            })
    }

    /// ### English
    /// Whether a capture thread is alive.
    ///
    /// ### 中文
    /// 采集线程是否存活。
    pub fn is_running(&self) -> bool {
        self.lock_worker()
            .as_ref()
            .is_some_and(|worker| !worker.thread.is_finished())
    }

    fn spawn_worker(&self) -> PipelineResult<Worker> {
        let (command_tx, command_rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded(1);
        let state = Arc::new(AtomicU8::new(CaptureState::Idle as u8));

        let context = self.context.clone();
        let state_for_thread = state.clone();
        let thread = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || run_capture_thread(context, state_for_thread, command_rx, ready_tx))
            .map_err(|err| {
                tracing::error!(%err, "failed to spawn capture thread");
                PipelineError::ActorUnavailable("capture thread")
            })?;

        if ready_rx.recv().is_err() {
            let _ = thread.join();
            return Err(PipelineError::ActorUnavailable("capture thread"));
        }
        Ok(Worker {
            command_tx,
            thread,
            state,
        })
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for CaptureDeviceController {
    fn drop(&mut self) {
        self.stop(true);
    }
}
