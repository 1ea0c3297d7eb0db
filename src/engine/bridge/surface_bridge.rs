//! ### English
//! Caller-side handle of the encoder bridge thread.
//!
//! ### 中文
//! 编码桥接线程的调用方句柄。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel as channel;

use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::rendering::{SharedContextHandle, TextureId};
use crate::engine::viewport::{IDENTITY, Mat4};

use super::bridge_thread::run_bridge_thread;
use super::command::{Ack, BridgeCommand};
use super::context::{OutputSurfaceHandle, SharedContextFactory};

const ACTOR: &str = "encoder bridge thread";

/// ### English
/// Redraws the shared camera texture into an encoder-owned surface on its own thread and GPU
/// context.
///
/// Every call blocks until the bridge thread has finished that exact command, so consecutive
/// calls from one caller are strictly ordered. If the thread has already exited, calls return
/// immediately instead of hanging.
///
/// ### 中文
/// 在独立线程与 GPU 上下文中，将共享的相机纹理重绘到编码器持有的表面。
///
/// 每次调用都会阻塞到桥接线程处理完该条命令，因此同一调用方的连续调用严格有序。
/// 若线程已退出，调用会立即返回而不会挂起。
pub struct EncoderSurfaceBridge {
    command_tx: channel::Sender<BridgeCommand>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
    released: AtomicBool,
}

impl EncoderSurfaceBridge {
    /// ### English
    /// Spawns the bridge thread and waits until it is ready to accept commands.
    ///
    /// #### Parameters
    /// - `thread_name`: Name of the bridge thread.
    /// - `factory`: Creates the secondary context on the bridge thread.
    ///
    /// ### 中文
    /// 创建桥接线程，并等待其准备好接收命令。
    ///
    /// #### 参数
    /// - `thread_name`：桥接线程名。
    /// - `factory`：在桥接线程上创建副上下文。
    pub fn spawn(
        thread_name: impl Into<String>,
        factory: Arc<dyn SharedContextFactory>,
    ) -> PipelineResult<Self> {
        let (command_tx, command_rx) = channel::unbounded();
        let (ready_tx, ready_rx) = channel::bounded(1);

        let thread = thread::Builder::new()
            .name(thread_name.into())
            .spawn(move || run_bridge_thread(factory, command_rx, ready_tx))
            .map_err(|err| {
                tracing::error!(%err, "failed to spawn encoder bridge thread");
                PipelineError::ActorUnavailable(ACTOR)
            })?;

        if ready_rx.recv().is_err() {
            let _ = thread.join();
            return Err(PipelineError::ActorUnavailable(ACTOR));
        }
        Ok(Self {
            command_tx,
            thread: Mutex::new(Some(thread)),
            released: AtomicBool::new(false),
        })
    }

    /// ### English
    /// Replaces any existing secondary context with one sharing objects with `shared` and
    /// drawing into `surface`. `texture` becomes the one [`Self::draw_bound`] draws.
    /// Blocks until done.
    ///
    /// ### 中文
    /// 用与 `shared` 共享对象、绘制到 `surface` 的新副上下文替换现有上下文。
    /// `texture` 成为 [`Self::draw_bound`] 绘制的纹理。阻塞直到完成。
    pub fn set_context(
        &self,
        shared: SharedContextHandle,
        texture: TextureId,
        surface: OutputSurfaceHandle,
    ) -> PipelineResult<()> {
        self.request(|ack| BridgeCommand::SetContext {
            shared,
            texture,
            surface,
            ack,
        })
    }

    /// ### English
    /// Draws `texture` with the texture transform `matrix` over the whole output surface.
    /// No-op without a context. Blocks until done.
    ///
    /// ### 中文
    /// 以纹理变换 `matrix` 将 `texture` 绘制到整个输出表面。没有上下文时为空操作。阻塞直到完成。
    pub fn draw(&self, texture: TextureId, matrix: &Mat4) -> PipelineResult<()> {
        self.draw_transformed(texture, matrix, &IDENTITY)
    }

    /// ### English
    /// Draws the texture given to [`Self::set_context`] with the texture transform `matrix`.
    ///
    /// ### 中文
    /// 以纹理变换 `matrix` 绘制 [`Self::set_context`] 给定的纹理。
    pub fn draw_bound(&self, matrix: &Mat4) -> PipelineResult<()> {
        self.submit(None, matrix, &IDENTITY)
    }

    /// ### English
    /// Like [`Self::draw`], with an additional vertex transform (the preview's viewport matrix).
    ///
    /// ### 中文
    /// 与 [`Self::draw`] 相同，但额外带有顶点变换（预览的视口矩阵）。
    pub fn draw_transformed(
        &self,
        texture: TextureId,
        tex_matrix: &Mat4,
        mvp: &Mat4,
    ) -> PipelineResult<()> {
        self.submit(Some(texture), tex_matrix, mvp)
    }

    fn submit(
        &self,
        texture: Option<TextureId>,
        tex_matrix: &Mat4,
        mvp: &Mat4,
    ) -> PipelineResult<()> {
        let (tex_matrix, mvp) = (*tex_matrix, *mvp);
        self.request(|ack| BridgeCommand::Draw {
            texture,
            tex_matrix,
            mvp,
            ack,
        })
    }

    /// ### English
    /// Tears down the context and ends the thread. Idempotent; later calls on this bridge are
    /// no-ops.
    ///
    /// ### 中文
    /// 销毁上下文并结束线程。幂等；之后对该桥接器的调用均为空操作。
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let (ack_tx, ack_rx) = channel::bounded(1);
        if self.command_tx.send(BridgeCommand::Release { ack: ack_tx }).is_ok() {
            let _ = ack_rx.recv();
        }
        let thread = self
            .thread
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(thread) = thread {
            if thread.join().is_err() {
                tracing::error!("encoder bridge thread panicked");
            }
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    fn request(&self, command: impl FnOnce(Ack) -> BridgeCommand) -> PipelineResult<()> {
        if self.is_released() {
            return Ok(());
        }
        let (ack_tx, ack_rx) = channel::bounded(1);
        if self.command_tx.send(command(ack_tx)).is_err() {
            return Err(PipelineError::ActorUnavailable(ACTOR));
        }
        ack_rx
            .recv()
            .unwrap_or(Err(PipelineError::ActorUnavailable(ACTOR)))
    }
}

impl Drop for EncoderSurfaceBridge {
    fn drop(&mut self) {
        self.release();
    }
}
