//! ### English
//! OpenGL / OpenGL ES implementation of the primary-context backend.
//!
//! Texture allocation and uploads go through `gleam`; the quad program uses `glow`.
//!
//! ### 中文
//! 主上下文后端的 OpenGL / OpenGL ES 实现。
//!
//! 纹理分配与上传使用 `gleam`；四边形 program 使用 `glow`。

mod drawer;
mod version;

pub use drawer::GlesQuadDrawer;
pub use version::{GlVersion, NPOT_EXTENSION, check_frame_sampling};

use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::Arc;

use dpi::PhysicalSize;
use gleam::gl::{self, Gl};
use glow::HasContext as _;

use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::frame::CapturedImage;
use crate::engine::viewport::ViewportRect;

use super::backend::{QuadDrawer, RenderBackend, SharedContextHandle, TextureId};

/// ### English
/// GL function loaders for the context that is current on the calling thread.
///
/// ### 中文
/// 调用线程上当前上下文的 GL 函数加载器。
pub(crate) struct GlLoaders {
    pub gl: Rc<dyn Gl>,
    pub glow: Arc<glow::Context>,
    pub version: GlVersion,
}

impl GlLoaders {
    /// ### English
    /// Loads `gleam` and `glow` through `get_proc_address`.
    ///
    /// # Safety
    /// A GL context must be current on the calling thread and `get_proc_address` must return
    /// valid entry points for it.
    ///
    /// ### 中文
    /// 通过 `get_proc_address` 加载 `gleam` 与 `glow`。
    ///
    /// # Safety
    /// 调用线程上必须已有 current 的 GL 上下文，且 `get_proc_address` 必须为其返回有效入口。
    pub(crate) unsafe fn load(get_proc_address: &dyn Fn(&str) -> *const c_void) -> Self {
        let glow = unsafe { glow::Context::from_loader_function(|name| get_proc_address(name)) };
        let version = GlVersion::parse(&unsafe { glow.get_parameter_string(glow::VERSION) });
        let gl: Rc<dyn Gl> = unsafe {
            if version.is_gles {
                gl::GlesFns::load_with(|name| get_proc_address(name))
            } else {
                gl::GlFns::load_with(|name| get_proc_address(name))
            }
        };
        Self {
            gl,
            glow: Arc::new(glow),
            version,
        }
    }
}

/// ### English
/// Primary-context backend for hosts that own a GL/GLES display surface.
///
/// ### 中文
/// 面向持有 GL/GLES 显示表面的宿主的主上下文后端。
pub struct GlesRenderBackend {
    gl: Rc<dyn Gl>,
    glow: Arc<glow::Context>,
    version: GlVersion,
    shared_context: SharedContextHandle,
    /// ### English
    /// Allocated storage size per texture, to pick `glTexImage2D` vs `glTexSubImage2D`.
    ///
    /// ### 中文
    /// 每个纹理已分配的存储尺寸，用于选择 `glTexImage2D` 或 `glTexSubImage2D`。
    storage: HashMap<TextureId, PhysicalSize<u32>>,
    clear_color: [f32; 4],
}

impl GlesRenderBackend {
    /// ### English
    /// Wraps the context that is current on the calling thread.
    ///
    /// #### Parameters
    /// - `shared_context`: Platform handle of that context (handed to sinks for sharing).
    /// - `get_proc_address`: GL entry point loader.
    ///
    /// # Safety
    /// The context identified by `shared_context` must be current on the calling thread for the
    /// whole lifetime of the backend.
    ///
    /// ### 中文
    /// 包装调用线程上当前的上下文。
    ///
    /// #### 参数
    /// - `shared_context`：该上下文的平台句柄（交给 sink 用于共享）。
    /// - `get_proc_address`：GL 入口加载器。
    ///
    /// # Safety
    /// 在后端整个生命周期内，`shared_context` 对应的上下文必须在调用线程上为 current。
    pub unsafe fn new(
        shared_context: SharedContextHandle,
        get_proc_address: &dyn Fn(&str) -> *const c_void,
    ) -> Self {
        let GlLoaders { gl, glow, version } = unsafe { GlLoaders::load(get_proc_address) };
        tracing::info!(?version, "primary GL context loaded");
        Self {
            gl,
            glow,
            version,
            shared_context,
            storage: HashMap::new(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// ### English
    /// Color used to clear the surface outside the viewport rectangle.
    ///
    /// ### 中文
    /// 视口矩形之外区域的清屏颜色。
    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    pub fn version(&self) -> GlVersion {
        self.version
    }
}

impl RenderBackend for GlesRenderBackend {
    fn check_capabilities(&self) -> PipelineResult<()> {
        check_frame_sampling(self.version, self.glow.supported_extensions())
    }

    fn shared_context(&self) -> SharedContextHandle {
        self.shared_context
    }

    fn create_texture(&mut self) -> PipelineResult<TextureId> {
        let ids = self.gl.gen_textures(1);
        let Some(texture) = ids.first().copied().and_then(TextureId::new) else {
            return Err(PipelineError::Gpu("glGenTextures returned no name".to_string()));
        };
        self.gl.bind_texture(gl::TEXTURE_2D, texture.get());
        for (pname, param) in [
            (gl::TEXTURE_MIN_FILTER, gl::LINEAR),
            (gl::TEXTURE_MAG_FILTER, gl::LINEAR),
            (gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE),
            (gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE),
        ] {
            self.gl
                .tex_parameter_i(gl::TEXTURE_2D, pname, param as gl::GLint);
        }
        self.gl.bind_texture(gl::TEXTURE_2D, 0);
        Ok(texture)
    }

    fn upload_image(&mut self, texture: TextureId, image: &CapturedImage) {
        let size = image.size;
        let (width, height) = (size.width as gl::GLsizei, size.height as gl::GLsizei);
        self.gl.bind_texture(gl::TEXTURE_2D, texture.get());
        self.gl.pixel_store_i(gl::UNPACK_ALIGNMENT, 4);
        if self.storage.get(&texture) == Some(&size) {
            self.gl.tex_sub_image_2d(
                gl::TEXTURE_2D,
                0,
                0,
                0,
                width,
                height,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                &image.pixels,
            );
        } else {
            self.gl.tex_image_2d(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as gl::GLint,
                width,
                height,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                Some(&image.pixels),
            );
            self.storage.insert(texture, size);
        }
        self.gl.bind_texture(gl::TEXTURE_2D, 0);
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.storage.remove(&texture);
        self.gl.delete_textures(&[texture.get()]);
    }

    fn create_drawer(&mut self) -> PipelineResult<Box<dyn QuadDrawer>> {
        let drawer = GlesQuadDrawer::new(self.glow.clone(), self.version)?;
        Ok(Box::new(drawer))
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.gl.viewport(rect.x, rect.y, rect.width, rect.height);
    }

    fn clear(&mut self) {
        let [r, g, b, a] = self.clear_color;
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(gl::COLOR_BUFFER_BIT);
    }
}
