//! ### English
//! Secondary GL context backed by context primitives the embedder installs (EGL/WGL/GLX
//! wrappers living in the host).
//!
//! ### 中文
//! 由宿主安装的上下文原语（位于宿主中的 EGL/WGL/GLX 封装）支撑的副 GL 上下文。

use std::cell::Cell;
use std::ffi::{CString, c_char, c_int, c_void};
use std::sync::OnceLock;

use glow::HasContext as _;

use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::rendering::gles::{GlLoaders, GlesQuadDrawer, check_frame_sampling};
use crate::engine::rendering::{QuadDrawer, SharedContextHandle, TextureId};
use crate::engine::viewport::Mat4;

use super::context::{EncoderContext, OutputSurfaceHandle, SharedContextFactory};

type CreateSharedContext = unsafe extern "C" fn(*mut c_void, *mut c_void) -> *mut c_void;
type MakeCurrent = unsafe extern "C" fn(*mut c_void) -> c_int;
type SwapBuffers = unsafe extern "C" fn(*mut c_void) -> c_int;
type GetProcAddress = unsafe extern "C" fn(*const c_char) -> *const c_void;
type DestroyContext = unsafe extern "C" fn(*mut c_void);

#[repr(C)]
#[derive(Clone, Copy, Default)]
/// ### English
/// Function pointer table for the context primitives provided by the embedder.
///
/// All fields are raw addresses (`usize`) and must be non-zero when installing:
/// - `create_shared_context(shared, surface) -> context`: new context sharing objects with
///   `shared`, with a drawable bound to `surface`; null on failure.
/// - `make_current(context) -> ok`: non-zero on success; `context == null` releases the thread.
/// - `swap_buffers(context) -> ok`: non-zero on success.
/// - `get_proc_address(name) -> fn`: GL entry point lookup for the current context.
/// - `destroy_context(context)`: destroys drawable and context.
///
/// ### 中文
/// 由宿主提供的上下文原语函数指针表。
///
/// 所有字段都是原始地址（`usize`），安装时必须全部为非 0：
/// - `create_shared_context(shared, surface) -> context`：创建与 `shared` 共享对象、
///   drawable 绑定到 `surface` 的新上下文；失败返回 null。
/// - `make_current(context) -> ok`：成功返回非 0；`context == null` 表示解除当前线程绑定。
/// - `swap_buffers(context) -> ok`：成功返回非 0。
/// - `get_proc_address(name) -> fn`：为当前上下文查找 GL 入口。
/// - `destroy_context(context)`：销毁 drawable 与上下文。
pub struct EmbedderGlApi {
    pub create_shared_context: usize,
    pub make_current: usize,
    pub swap_buffers: usize,
    pub get_proc_address: usize,
    pub destroy_context: usize,
}

#[derive(Clone, Copy)]
struct GlApi {
    create_shared_context: CreateSharedContext,
    make_current: MakeCurrent,
    swap_buffers: SwapBuffers,
    get_proc_address: GetProcAddress,
    destroy_context: DestroyContext,
}

static EMBEDDER_GL_API: OnceLock<GlApi> = OnceLock::new();

/// ### English
/// Installs the embedder-provided context primitives for this process.
///
/// This is a one-time installation backed by `OnceLock`; repeated calls return an error.
///
/// ### 中文
/// 为当前进程安装宿主提供的上下文原语。
///
/// 该安装由 `OnceLock` 保证只执行一次；重复调用会返回错误。
pub fn install_embedder_gl_api(api: EmbedderGlApi) -> PipelineResult<()> {
    for (name, addr) in [
        ("create_shared_context", api.create_shared_context),
        ("make_current", api.make_current),
        ("swap_buffers", api.swap_buffers),
        ("get_proc_address", api.get_proc_address),
        ("destroy_context", api.destroy_context),
    ] {
        if addr == 0 {
            return Err(PipelineError::Gpu(format!("EmbedderGlApi.{name} is NULL")));
        }
    }

    let table = unsafe {
        GlApi {
            create_shared_context: std::mem::transmute::<usize, CreateSharedContext>(
                api.create_shared_context,
            ),
            make_current: std::mem::transmute::<usize, MakeCurrent>(api.make_current),
            swap_buffers: std::mem::transmute::<usize, SwapBuffers>(api.swap_buffers),
            get_proc_address: std::mem::transmute::<usize, GetProcAddress>(api.get_proc_address),
            destroy_context: std::mem::transmute::<usize, DestroyContext>(api.destroy_context),
        }
    };

    EMBEDDER_GL_API
        .set(table)
        .map_err(|_| PipelineError::Gpu("EmbedderGlApi is already installed".to_string()))
}

thread_local! {
    /// ### English
    /// Per-thread "current context" cache to avoid redundant `make_current` calls.
    ///
    /// ### 中文
    /// 每线程缓存“当前上下文”，避免重复 `make_current` 调用。
    static CURRENT_CONTEXT: Cell<usize> = const { Cell::new(0) };
}

impl GlApi {
    fn installed() -> PipelineResult<Self> {
        EMBEDDER_GL_API.get().copied().ok_or_else(|| {
            PipelineError::Gpu(
                "EmbedderGlApi is not installed; call install_embedder_gl_api first".to_string(),
            )
        })
    }

    fn make_current(&self, context: *mut c_void) -> bool {
        let addr = context as usize;
        if CURRENT_CONTEXT.with(Cell::get) == addr {
            return true;
        }
        let ok = unsafe { (self.make_current)(context) } != 0;
        CURRENT_CONTEXT.with(|current| current.set(if ok { addr } else { 0 }));
        ok
    }

    fn proc_address(&self, name: &str) -> *const c_void {
        match CString::new(name) {
            Ok(name) => unsafe { (self.get_proc_address)(name.as_ptr()) },
            Err(_) => std::ptr::null(),
        }
    }
}

/// ### English
/// [`SharedContextFactory`] using the installed [`EmbedderGlApi`].
///
/// ### 中文
/// 使用已安装 [`EmbedderGlApi`] 的 [`SharedContextFactory`]。
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbedderContextFactory;

impl SharedContextFactory for EmbedderContextFactory {
    fn create(
        &self,
        shared: SharedContextHandle,
        surface: OutputSurfaceHandle,
    ) -> PipelineResult<Box<dyn EncoderContext>> {
        let api = GlApi::installed()?;
        let handle = unsafe { (api.create_shared_context)(shared.as_ptr(), surface.as_ptr()) };
        if handle.is_null() {
            return Err(PipelineError::Gpu(
                "embedder failed to create a shared context".to_string(),
            ));
        }

        let mut context = EmbedderContext {
            api,
            handle,
            drawer: None,
            destroyed: false,
        };
        if !api.make_current(handle) {
            context.destroy();
            return Err(PipelineError::ContextLost(
                "new encoder context cannot be made current".to_string(),
            ));
        }

        let GlLoaders { glow, version, .. } =
            unsafe { GlLoaders::load(&|name: &str| api.proc_address(name)) };
        check_frame_sampling(version, glow.supported_extensions())?;
        context.drawer = Some(Box::new(GlesQuadDrawer::new(glow, version)?));
        Ok(Box::new(context))
    }
}

/// ### English
/// Secondary context created by the embedder, plus the quad drawer living in it.
/// Drop is idempotent with `release`.
///
/// ### 中文
/// 宿主创建的副上下文及其中的四边形绘制器。Drop 与 `release` 幂等。
struct EmbedderContext {
    api: GlApi,
    handle: *mut c_void,
    drawer: Option<Box<GlesQuadDrawer>>,
    destroyed: bool,
}

impl EmbedderContext {
    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let Some(drawer) = self.drawer.take() {
            if self.api.make_current(self.handle) {
                QuadDrawer::release(drawer);
            }
        }
        self.api.make_current(std::ptr::null_mut());
        unsafe { (self.api.destroy_context)(self.handle) };
        CURRENT_CONTEXT.with(|current| current.set(0));
    }
}

impl EncoderContext for EmbedderContext {
    fn make_current(&mut self) -> PipelineResult<()> {
        if self.api.make_current(self.handle) {
            Ok(())
        } else {
            Err(PipelineError::ContextLost("make_current failed".to_string()))
        }
    }

    fn draw(&mut self, texture: TextureId, tex_matrix: &Mat4, mvp: &Mat4) {
        if let Some(drawer) = self.drawer.as_mut() {
            drawer.draw(texture, tex_matrix, mvp);
        }
    }

    fn swap_buffers(&mut self) -> PipelineResult<()> {
        if unsafe { (self.api.swap_buffers)(self.handle) } != 0 {
            Ok(())
        } else {
            Err(PipelineError::ContextLost("swap_buffers failed".to_string()))
        }
    }

    fn release(mut self: Box<Self>) {
        self.destroy();
    }
}

impl Drop for EmbedderContext {
    fn drop(&mut self) {
        self.destroy();
    }
}
