//! ### English
//! Full-screen textured quad drawer (glow).
//!
//! ### 中文
//! 全屏纹理四边形绘制器（glow）。

use std::sync::Arc;

use glow::HasContext as _;

use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::rendering::backend::{QuadDrawer, TextureId};
use crate::engine::viewport::Mat4;

use super::version::GlVersion;

const VERTEX_SHADER: &str = "\
uniform mat4 uMVPMatrix;
uniform mat4 uTexMatrix;
attribute vec4 aPosition;
attribute vec4 aTextureCoord;
varying vec2 vTextureCoord;
void main() {
    gl_Position = uMVPMatrix * aPosition;
    vTextureCoord = (uTexMatrix * aTextureCoord).xy;
}
";

const FRAGMENT_SHADER: &str = "\
uniform sampler2D sTexture;
varying vec2 vTextureCoord;
void main() {
    gl_FragColor = texture2D(sTexture, vTextureCoord);
}
";

/// ### English
/// Same program for desktop GL 3.0+ (GLSL 1.30 and later).
///
/// ### 中文
/// 桌面 GL 3.0+（GLSL 1.30 及以上）使用的同一 program。
const VERTEX_SHADER_MODERN: &str = "\
uniform mat4 uMVPMatrix;
uniform mat4 uTexMatrix;
in vec4 aPosition;
in vec4 aTextureCoord;
out vec2 vTextureCoord;
void main() {
    gl_Position = uMVPMatrix * aPosition;
    vTextureCoord = (uTexMatrix * aTextureCoord).xy;
}
";

const FRAGMENT_SHADER_MODERN: &str = "\
uniform sampler2D sTexture;
in vec2 vTextureCoord;
out vec4 fragColor;
void main() {
    fragColor = texture(sTexture, vTextureCoord);
}
";

/// ### English
/// Vertex and fragment sources for `version`, header included.
///
/// ### 中文
/// 适用于 `version` 的顶点与片元 shader 源码（含版本头）。
fn quad_sources(version: GlVersion) -> [(u32, String); 2] {
    let header = version.shader_header();
    let (vertex, fragment) = if version.uses_modern_glsl() {
        (VERTEX_SHADER_MODERN, FRAGMENT_SHADER_MODERN)
    } else {
        (VERTEX_SHADER, FRAGMENT_SHADER)
    };
    [
        (glow::VERTEX_SHADER, format!("{header}{vertex}")),
        (glow::FRAGMENT_SHADER, format!("{header}{fragment}")),
    ]
}

/// ### English
/// Interleaved `(x, y, s, t)` for a triangle strip covering clip space.
///
/// ### 中文
/// 覆盖裁剪空间的三角形带，交错存储 `(x, y, s, t)`。
const QUAD: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0, //
    1.0, -1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0, 1.0, //
    1.0, 1.0, 1.0, 1.0,
];
const STRIDE: i32 = 4 * 4;

/// ### English
/// Shader program + vertex buffer for drawing one texture over the current viewport.
///
/// ### 中文
/// 在当前视口上绘制单个纹理所需的 shader program 与顶点缓冲。
pub struct GlesQuadDrawer {
    glow: Arc<glow::Context>,
    program: glow::Program,
    vbo: glow::Buffer,
    /// ### English
    /// Only created on GL/GLES 3.0+ (core profiles require one).
    ///
    /// ### 中文
    /// 仅在 GL/GLES 3.0+ 上创建（core profile 需要）。
    vao: Option<glow::VertexArray>,
    a_position: u32,
    a_texture_coord: u32,
    u_mvp: Option<glow::UniformLocation>,
    u_tex: Option<glow::UniformLocation>,
    u_sampler: Option<glow::UniformLocation>,
}

impl GlesQuadDrawer {
    /// ### English
    /// Compiles the quad program on the current context.
    ///
    /// #### Parameters
    /// - `glow`: GL API bound to the current context.
    /// - `version`: Parsed context version (selects the GLSL header and VAO usage).
    ///
    /// ### 中文
    /// 在当前上下文上编译四边形 program。
    ///
    /// #### 参数
    /// - `glow`：绑定到当前上下文的 GL API。
    /// - `version`：解析后的上下文版本（决定 GLSL 头与是否使用 VAO）。
    pub fn new(glow: Arc<glow::Context>, version: GlVersion) -> PipelineResult<Self> {
        unsafe {
            let program = glow.create_program().map_err(PipelineError::Gpu)?;
            let mut shaders = Vec::with_capacity(2);
            for (kind, source) in quad_sources(version) {
                let shader = match glow.create_shader(kind) {
                    Ok(shader) => shader,
                    Err(err) => {
                        glow.delete_program(program);
                        return Err(PipelineError::Gpu(err));
                    }
                };
                glow.shader_source(shader, &source);
                glow.compile_shader(shader);
                if !glow.get_shader_compile_status(shader) {
                    let log = glow.get_shader_info_log(shader);
                    glow.delete_shader(shader);
                    for shader in shaders {
                        glow.delete_shader(shader);
                    }
                    glow.delete_program(program);
                    return Err(PipelineError::Gpu(format!("shader compile failed: {log}")));
                }
                glow.attach_shader(program, shader);
                shaders.push(shader);
            }
            glow.link_program(program);
            for shader in shaders {
                glow.detach_shader(program, shader);
                glow.delete_shader(shader);
            }
            if !glow.get_program_link_status(program) {
                let log = glow.get_program_info_log(program);
                glow.delete_program(program);
                return Err(PipelineError::Gpu(format!("program link failed: {log}")));
            }

            let (Some(a_position), Some(a_texture_coord)) = (
                glow.get_attrib_location(program, "aPosition"),
                glow.get_attrib_location(program, "aTextureCoord"),
            ) else {
                glow.delete_program(program);
                return Err(PipelineError::Gpu("quad attributes not found".to_string()));
            };
            let u_mvp = glow.get_uniform_location(program, "uMVPMatrix");
            let u_tex = glow.get_uniform_location(program, "uTexMatrix");
            let u_sampler = glow.get_uniform_location(program, "sTexture");

            let vbo = match glow.create_buffer() {
                Ok(vbo) => vbo,
                Err(err) => {
                    glow.delete_program(program);
                    return Err(PipelineError::Gpu(err));
                }
            };
            let bytes: Vec<u8> = QUAD.iter().flat_map(|v| v.to_ne_bytes()).collect();
            glow.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            glow.buffer_data_u8_slice(glow::ARRAY_BUFFER, &bytes, glow::STATIC_DRAW);
            glow.bind_buffer(glow::ARRAY_BUFFER, None);

            let vao = if version.has_vertex_arrays() {
                glow.create_vertex_array().ok()
            } else {
                None
            };

            Ok(Self {
                glow,
                program,
                vbo,
                vao,
                a_position,
                a_texture_coord,
                u_mvp,
                u_tex,
                u_sampler,
            })
        }
    }
}

impl QuadDrawer for GlesQuadDrawer {
    fn draw(&mut self, texture: TextureId, tex_matrix: &Mat4, mvp: &Mat4) {
        let gl = &self.glow;
        unsafe {
            gl.use_program(Some(self.program));
            if let Some(vao) = self.vao {
                gl.bind_vertex_array(Some(vao));
            }
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            gl.enable_vertex_attrib_array(self.a_position);
            gl.vertex_attrib_pointer_f32(self.a_position, 2, glow::FLOAT, false, STRIDE, 0);
            gl.enable_vertex_attrib_array(self.a_texture_coord);
            gl.vertex_attrib_pointer_f32(self.a_texture_coord, 2, glow::FLOAT, false, STRIDE, 8);

            gl.uniform_matrix_4_f32_slice(self.u_mvp.as_ref(), false, mvp);
            gl.uniform_matrix_4_f32_slice(self.u_tex.as_ref(), false, tex_matrix);
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(glow::NativeTexture(texture.raw())));
            gl.uniform_1_i32(self.u_sampler.as_ref(), 0);

            gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);

            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.disable_vertex_attrib_array(self.a_position);
            gl.disable_vertex_attrib_array(self.a_texture_coord);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            if self.vao.is_some() {
                gl.bind_vertex_array(None);
            }
            gl.use_program(None);
        }
    }

    fn release(self: Box<Self>) {
        unsafe {
            if let Some(vao) = self.vao {
                self.glow.delete_vertex_array(vao);
            }
            self.glow.delete_buffer(self.vbo);
            self.glow.delete_program(self.program);
        }
    }
}
