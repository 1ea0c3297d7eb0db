//! ### English
//! GPU seams used by the preview renderer (primary context).
//!
//! Every method runs on the thread that owns the primary context; implementations are therefore
//! not required to be `Send`.
//!
//! ### 中文
//! 预览渲染器（主上下文）使用的 GPU 接口。
//!
//! 所有方法都在持有主上下文的线程上执行，因此实现无需 `Send`。

use std::ffi::c_void;
use std::num::NonZeroU32;

use crate::engine::error::PipelineResult;
use crate::engine::frame::CapturedImage;
use crate::engine::viewport::{Mat4, ViewportRect};

/// ### English
/// GPU texture name. Valid in every context that shares objects with the creating context.
///
/// ### 中文
/// GPU 纹理名。在所有与创建者上下文共享对象的上下文中均有效。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(NonZeroU32);

impl TextureId {
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub(crate) fn raw(self) -> NonZeroU32 {
        self.0
    }
}

/// ### English
/// Opaque platform context handle (e.g. `EGLContext`) carried across threads as an address so a
/// second context can be created sharing objects with it.
///
/// ### 中文
/// 不透明的平台上下文句柄（例如 `EGLContext`），以地址形式跨线程传递，
/// 以便创建与之共享对象的第二个上下文。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SharedContextHandle(usize);

impl SharedContextHandle {
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
/// Primary-context operations needed by the preview renderer.
///
/// ### 中文
/// 预览渲染器需要的主上下文操作。
pub trait RenderBackend {
    /// ### English
    /// Fails with `MissingGpuCapability` if camera frames cannot be sampled on this context.
    ///
    /// ### 中文
    /// 若该上下文无法采样相机帧，则返回 `MissingGpuCapability`。
    fn check_capabilities(&self) -> PipelineResult<()>;

    /// ### English
    /// Handle of the primary context, handed to sinks so they can create a sharing context.
    ///
    /// ### 中文
    /// 主上下文句柄，交给 sink 以便其创建共享上下文。
    fn shared_context(&self) -> SharedContextHandle;

    fn create_texture(&mut self) -> PipelineResult<TextureId>;

    /// ### English
    /// Latches `image` into `texture` (reallocating storage when the size changes).
    ///
    /// ### 中文
    /// 将 `image` 锁存到 `texture`（尺寸变化时重新分配存储）。
    fn upload_image(&mut self, texture: TextureId, image: &CapturedImage);

    fn delete_texture(&mut self, texture: TextureId);

    fn create_drawer(&mut self) -> PipelineResult<Box<dyn QuadDrawer>>;

    fn set_viewport(&mut self, rect: ViewportRect);

    fn clear(&mut self);
}

/// ### English
/// Draws a full-screen textured quad. Owned by exactly one context.
///
/// ### 中文
/// 绘制全屏纹理四边形。只归属于一个上下文。
pub trait QuadDrawer {
    /// ### English
    /// Draws `texture` with the texture-coordinate transform `tex_matrix` and vertex transform
    /// `mvp`.
    ///
    /// ### 中文
    /// 使用纹理坐标变换 `tex_matrix` 与顶点变换 `mvp` 绘制 `texture`。
    fn draw(&mut self, texture: TextureId, tex_matrix: &Mat4, mvp: &Mat4);

    /// ### English
    /// Deletes the GPU objects of this drawer. The owning context must be current.
    ///
    /// ### 中文
    /// 删除该绘制器的 GPU 对象。调用时其所属上下文必须为 current。
    fn release(self: Box<Self>);
}
