//! ### English
//! Encoder bridge thread: owns the secondary context and answers every command before taking
//! the next one.
//!
//! ### 中文
//! 编码桥接线程：持有副上下文，并在处理下一条命令前应答当前命令。

use std::sync::Arc;

use crossbeam_channel as channel;

use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::rendering::{SharedContextHandle, TextureId};
use crate::engine::viewport::Mat4;

use super::command::BridgeCommand;
use super::context::{EncoderContext, OutputSurfaceHandle, SharedContextFactory};

/// ### English
/// Bridge thread entry function. Returns after `Release`, or when the bridge handle is gone.
///
/// ### 中文
/// 桥接线程入口函数。处理完 `Release` 或桥接句柄被丢弃后返回。
pub(super) fn run_bridge_thread(
    factory: Arc<dyn SharedContextFactory>,
    command_rx: channel::Receiver<BridgeCommand>,
    ready_tx: channel::Sender<()>,
) {
    tracing::debug!("encoder bridge thread started");
    let _ = ready_tx.send(());

    let mut state = BridgeState {
        factory,
        context: None,
        texture: None,
    };
    while let Ok(command) = command_rx.recv() {
        tracing::trace!(command = command.name(), "bridge command");
        match command {
            BridgeCommand::SetContext {
                shared,
                texture,
                surface,
                ack,
            } => {
                let _ = ack.send(state.prepare(shared, texture, surface));
            }
            BridgeCommand::Draw {
                texture,
                tex_matrix,
                mvp,
                ack,
            } => {
                let _ = ack.send(state.draw(texture, &tex_matrix, &mvp));
            }
            BridgeCommand::Release { ack } => {
                state.release();
                let _ = ack.send(Ok(()));
                break;
            }
        }
    }

    state.release();
    tracing::debug!("encoder bridge thread finished");
}

struct BridgeState {
    factory: Arc<dyn SharedContextFactory>,
    context: Option<Box<dyn EncoderContext>>,
    /// ### English
    /// Texture named by the last successful `SetContext`; drawn when `Draw` names none.
    ///
    /// ### 中文
    /// 最近一次成功的 `SetContext` 指定的纹理；`Draw` 未指定纹理时绘制它。
    texture: Option<TextureId>,
}

impl BridgeState {
    fn prepare(
        &mut self,
        shared: SharedContextHandle,
        texture: TextureId,
        surface: OutputSurfaceHandle,
    ) -> PipelineResult<()> {
        self.release();
        let context = self.factory.create(shared, surface)?;
        tracing::debug!(texture = texture.get(), "encoder context ready");
        self.context = Some(context);
        self.texture = Some(texture);
        Ok(())
    }

    fn draw(
        &mut self,
        texture: Option<TextureId>,
        tex_matrix: &Mat4,
        mvp: &Mat4,
    ) -> PipelineResult<()> {
        let (Some(context), Some(texture)) = (self.context.as_mut(), texture.or(self.texture))
        else {
            return Ok(());
        };

        let submitted = context.make_current().and_then(|()| {
            context.draw(texture, tex_matrix, mvp);
            context.swap_buffers()
        });
        if let Err(err) = submitted {
            tracing::warn!(%err, "encoder context lost; dropping it");
            self.release();
            return Err(match err {
                PipelineError::ContextLost(_) => err,
                other => PipelineError::ContextLost(other.to_string()),
            });
        }
        Ok(())
    }

    fn release(&mut self) {
        self.texture = None;
        if let Some(context) = self.context.take() {
            context.release();
            tracing::debug!("encoder context released");
        }
    }
}
