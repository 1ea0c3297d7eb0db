//! ### English
//! Secondary-context seams used by the encoder bridge thread.
//!
//! ### 中文
//! 编码桥接线程使用的副上下文接口。

use std::ffi::c_void;

use crate::engine::error::PipelineResult;
use crate::engine::rendering::{SharedContextHandle, TextureId};
use crate::engine::viewport::Mat4;

/// ### English
/// Opaque handle of the encoder's input surface (e.g. an `ANativeWindow*` or `EGLSurface`
/// target), carried across threads as an address.
///
/// ### 中文
/// 编码器输入表面的不透明句柄（例如 `ANativeWindow*` 或 `EGLSurface` 目标），以地址形式跨线程传递。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutputSurfaceHandle(usize);

impl OutputSurfaceHandle {
    pub fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr as usize)
    }

    pub fn from_addr(addr: usize) -> Self {
        Self(addr)
    }

    pub fn addr(self) -> usize {
        self.0
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

/// ### English
/// Creates secondary contexts sharing GPU objects with a primary context. Called on the bridge
/// thread only.
///
/// ### 中文
/// 创建与主上下文共享 GPU 对象的副上下文。仅在桥接线程上调用。
pub trait SharedContextFactory: Send + Sync {
    /// ### English
    /// Creates a context sharing with `shared`, a drawable bound to `surface`, makes it current
    /// and prepares a quad drawer on it.
    ///
    /// ### 中文
    /// 创建与 `shared` 共享的上下文及绑定到 `surface` 的 drawable，将其设为 current 并在其上
    /// 准备四边形绘制器。
    fn create(
        &self,
        shared: SharedContextHandle,
        surface: OutputSurfaceHandle,
    ) -> PipelineResult<Box<dyn EncoderContext>>;
}

/// ### English
/// A live secondary context + drawable. Never leaves the bridge thread.
///
/// ### 中文
/// 存活的副上下文与 drawable。不会离开桥接线程。
pub trait EncoderContext {
    fn make_current(&mut self) -> PipelineResult<()>;

    fn draw(&mut self, texture: TextureId, tex_matrix: &Mat4, mvp: &Mat4);

    /// ### English
    /// Submits the drawn frame to the output surface. Failure means the context is lost.
    ///
    /// ### 中文
    /// 将绘制结果提交到输出表面。失败表示上下文已丢失。
    fn swap_buffers(&mut self) -> PipelineResult<()>;

    /// ### English
    /// Tears down drawer, drawable and context, in that order.
    ///
    /// ### 中文
    /// 依次销毁绘制器、drawable 与上下文。
    fn release(self: Box<Self>);
}
