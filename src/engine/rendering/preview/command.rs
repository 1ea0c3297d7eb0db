//! ### English
//! Commands executed on the renderer's own context, between two draws.
//!
//! ### 中文
//! 在渲染器自身上下文中、两次绘制之间执行的命令。

use std::fmt;

use crate::engine::sink::FrameSink;

pub(crate) enum RendererCommand {
    /// ### English
    /// Replaces the attached sink (the previous one, if any, is told its context is gone).
    ///
    /// ### 中文
    /// 替换已挂接的 sink（若存在旧 sink，会通知其上下文已失效）。
    AttachSink(Box<dyn FrameSink>),
    DetachSink,
    /// ### English
    /// Scale mode or source size changed; recompute the viewport transform.
    ///
    /// ### 中文
    /// 缩放模式或源尺寸已变化；重新计算视口变换。
    UpdateViewport,
}

impl fmt::Debug for RendererCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttachSink(_) => f.write_str("AttachSink"),
            Self::DetachSink => f.write_str("DetachSink"),
            Self::UpdateViewport => f.write_str("UpdateViewport"),
        }
    }
}
