//! ### English
//! Synchronous command protocol of the encoder bridge thread. Every command carries its own
//! acknowledgement channel.
//!
//! ### 中文
//! 编码桥接线程的同步命令协议。每条命令都携带自己的应答通道。

use crossbeam_channel as channel;

use crate::engine::error::PipelineResult;
use crate::engine::rendering::{SharedContextHandle, TextureId};
use crate::engine::viewport::Mat4;

use super::context::OutputSurfaceHandle;

pub(super) type Ack = channel::Sender<PipelineResult<()>>;

pub(super) enum BridgeCommand {
    SetContext {
        shared: SharedContextHandle,
        texture: TextureId,
        surface: OutputSurfaceHandle,
        ack: Ack,
    },
    /// ### English
    /// Draws `texture`, or the texture given to `SetContext` when `None`.
    ///
    /// ### 中文
    /// 绘制 `texture`；为 `None` 时绘制 `SetContext` 给定的纹理。
    Draw {
        texture: Option<TextureId>,
        tex_matrix: Mat4,
        mvp: Mat4,
        ack: Ack,
    },
    /// ### English
    /// Tears everything down and ends the thread.
    ///
    /// ### 中文
    /// 销毁所有资源并结束线程。
    Release { ack: Ack },
}

impl BridgeCommand {
    pub(super) fn name(&self) -> &'static str {
        match self {
            Self::SetContext { .. } => "SetContext",
            Self::Draw { .. } => "Draw",
            Self::Release { .. } => "Release",
        }
    }
}
