//! ### English
//! Encoder-facing consumer of forwarded preview frames.
//!
//! ### 中文
//! 接收预览转发帧的编码侧消费者。

use crate::engine::rendering::{SharedContextHandle, TextureId};
use crate::engine::viewport::Mat4;

/// ### English
/// Capability interface the preview renderer forwards frames to.
///
/// Every method runs on the thread that owns the primary GPU context, between two draws, so an
/// implementation never races with the renderer.
///
/// ### 中文
/// 预览渲染器向其转发帧的能力接口。
///
/// 所有方法都在持有主 GPU 上下文的线程上、两次绘制之间调用，因此实现不会与渲染器竞争。
pub trait FrameSink: Send {
    /// ### English
    /// Called when the sink is attached to a renderer with a live surface, and again after every
    /// surface re-creation.
    ///
    /// #### Parameters
    /// - `shared_context`: Primary context to share GPU objects with.
    /// - `texture`: Texture id the forwarded frames will reference.
    ///
    /// ### 中文
    /// 当 sink 挂接到拥有有效表面的渲染器时调用，且每次表面重建后会再次调用。
    ///
    /// #### 参数
    /// - `shared_context`：用于共享 GPU 对象的主上下文。
    /// - `texture`：转发帧将引用的纹理 id。
    fn on_context_ready(&mut self, shared_context: SharedContextHandle, texture: TextureId);

    /// ### English
    /// One forwarded frame: the per-frame texture transform and the current viewport transform.
    ///
    /// ### 中文
    /// 一次转发帧：逐帧纹理变换与当前视口变换。
    fn on_frame(&mut self, texture: TextureId, source_transform: &Mat4, viewport_transform: &Mat4);

    /// ### English
    /// The primary context is about to be torn down (or the sink is being detached); anything
    /// created from `shared_context` must be released now.
    ///
    /// ### 中文
    /// 主上下文即将销毁（或 sink 正在被分离）；由 `shared_context` 创建的一切必须立即释放。
    fn on_context_lost(&mut self) {}
}
