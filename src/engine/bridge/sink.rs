//! ### English
//! Frame sink that feeds a video encoder's input surface through an encoder bridge.
//!
//! ### 中文
//! 通过编码桥接器向视频编码器输入表面送帧的 frame sink。

use std::sync::Arc;

use crate::engine::rendering::{SharedContextHandle, TextureId};
use crate::engine::sink::FrameSink;
use crate::engine::viewport::Mat4;

use super::context::{OutputSurfaceHandle, SharedContextFactory};
use super::surface_bridge::EncoderSurfaceBridge;

/// ### English
/// The encoder side of the pipeline: owns the input surface and drains it when told a frame
/// was submitted.
///
/// ### 中文
/// 管线的编码器一侧：持有输入表面，并在得知有帧提交后从中取帧。
pub trait EncoderInput: Send {
    fn input_surface(&self) -> OutputSurfaceHandle;

    /// ### English
    /// A frame has just been swapped into the input surface.
    ///
    /// ### 中文
    /// 刚有一帧被交换到输入表面。
    fn frame_available_soon(&mut self);
}

/// ### English
/// [`FrameSink`] that lazily spawns an [`EncoderSurfaceBridge`] once the primary context is
/// known, redraws every forwarded frame through it, then notifies the encoder.
///
/// ### 中文
/// 在主上下文可用后惰性创建 [`EncoderSurfaceBridge`] 的 [`FrameSink`]；
/// 通过它重绘每个转发帧，然后通知编码器。
pub struct EncoderSink {
    thread_name: String,
    factory: Arc<dyn SharedContextFactory>,
    input: Box<dyn EncoderInput>,
    bridge: Option<EncoderSurfaceBridge>,
    submitted: u64,
}

impl EncoderSink {
    pub fn new(
        thread_name: impl Into<String>,
        factory: Arc<dyn SharedContextFactory>,
        input: Box<dyn EncoderInput>,
    ) -> Self {
        Self {
            thread_name: thread_name.into(),
            factory,
            input,
            bridge: None,
            submitted: 0,
        }
    }

    pub fn is_bridged(&self) -> bool {
        self.bridge.is_some()
    }

    /// ### English
    /// Frames successfully drawn into the encoder surface.
    ///
    /// ### 中文
    /// 成功绘制到编码器表面的帧数。
    pub fn submitted_frames(&self) -> u64 {
        self.submitted
    }

    fn drop_bridge(&mut self) {
        if let Some(bridge) = self.bridge.take() {
            bridge.release();
        }
    }
}

impl FrameSink for EncoderSink {
    fn on_context_ready(&mut self, shared_context: SharedContextHandle, texture: TextureId) {
        self.drop_bridge();
        let bridge = match EncoderSurfaceBridge::spawn(self.thread_name.clone(), self.factory.clone())
        {
            Ok(bridge) => bridge,
            Err(err) => {
                tracing::error!(%err, "encoder bridge unavailable");
                return;
            }
        };
        match bridge.set_context(shared_context, texture, self.input.input_surface()) {
            Ok(()) => self.bridge = Some(bridge),
            Err(err) => {
                tracing::error!(%err, "encoder context setup failed");
                bridge.release();
            }
        }
    }

    fn on_frame(&mut self, texture: TextureId, source_transform: &Mat4, viewport_transform: &Mat4) {
        let Some(bridge) = self.bridge.as_ref() else {
            return;
        };
        match bridge.draw_transformed(texture, source_transform, viewport_transform) {
            Ok(()) => {
                self.submitted += 1;
                self.input.frame_available_soon();
            }
            Err(err) => {
                tracing::warn!(%err, "encoder frame dropped; bridge released");
                self.drop_bridge();
            }
        }
    }

    fn on_context_lost(&mut self) {
        self.drop_bridge();
    }
}

impl Drop for EncoderSink {
    fn drop(&mut self) {
        self.drop_bridge();
    }
}
