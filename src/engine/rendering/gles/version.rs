//! ### English
//! GL version parsing and the frame-sampling capability check.
//!
//! ### 中文
//! GL 版本解析与帧采样能力检查。

use std::collections::HashSet;

use crate::engine::error::{PipelineError, PipelineResult};

/// ### English
/// Extension that enables non-power-of-two texture sampling on GLES 2.0.
///
/// ### 中文
/// 在 GLES 2.0 上启用非 2 的幂纹理采样的扩展。
pub const NPOT_EXTENSION: &str = "GL_OES_texture_npot";

/// ### English
/// Parsed `GL_VERSION` information.
///
/// ### 中文
/// 解析后的 `GL_VERSION` 信息。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
    pub is_gles: bool,
}

impl GlVersion {
    /// ### English
    /// Expected forms: `"4.6.0 ..."` or `"OpenGL ES 3.2 ..."`.
    ///
    /// ### 中文
    /// 期望的版本字符串形式：`"4.6.0 ..."` 或 `"OpenGL ES 3.2 ..."`。
    pub fn parse(version: &str) -> Self {
        let is_gles = version.starts_with("OpenGL ES");
        let mut major = 0u32;
        let mut minor = 0u32;
        let number_token = version
            .split_whitespace()
            .find(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()));
        if let Some(token) = number_token {
            let mut parts = token.split('.');
            if let Some(m) = parts.next().and_then(|s| s.parse::<u32>().ok()) {
                major = m;
            }
            if let Some(n) = parts.next().and_then(|s| s.parse::<u32>().ok()) {
                minor = n;
            }
        }
        Self {
            major,
            minor,
            is_gles,
        }
    }

    /// ### English
    /// Whether vertex array objects are available (GL 3.0 / GLES 3.0).
    ///
    /// ### 中文
    /// 是否支持 VAO（GL 3.0 / GLES 3.0）。
    pub fn has_vertex_arrays(self) -> bool {
        self.major >= 3
    }

    /// ### English
    /// Whether shaders must use `in`/`out` instead of `attribute`/`varying`. True on desktop
    /// GL 3.0+, where core profiles reject GLSL 1.20.
    ///
    /// ### 中文
    /// shader 是否必须使用 `in`/`out` 而非 `attribute`/`varying`。在桌面 GL 3.0+ 上为真，
    /// 其 core profile 不接受 GLSL 1.20。
    pub fn uses_modern_glsl(self) -> bool {
        !self.is_gles && self.major >= 3
    }

    /// ### English
    /// GLSL header matching this context.
    ///
    /// ### 中文
    /// 与该上下文匹配的 GLSL 头。
    pub fn shader_header(self) -> &'static str {
        if self.is_gles {
            "#version 100\nprecision mediump float;\n"
        } else if self.major > 3 || (self.major == 3 && self.minor >= 2) {
            "#version 150\n"
        } else if self.major == 3 {
            "#version 130\n"
        } else {
            "#version 120\n"
        }
    }
}

/// ### English
/// Camera frames are NPOT RGBA textures drawn with shaders: requires GL >= 2.0 and, on GLES 2.0,
/// the NPOT extension.
///
/// ### 中文
/// 相机帧是使用 shader 绘制的非 2 的幂 RGBA 纹理：需要 GL >= 2.0；在 GLES 2.0 上还需要
/// NPOT 扩展。
pub fn check_frame_sampling(version: GlVersion, extensions: &HashSet<String>) -> PipelineResult<()> {
    if version.major < 2 {
        return Err(PipelineError::MissingGpuCapability(format!(
            "programmable pipeline (GL {}.{})",
            version.major, version.minor
        )));
    }
    if version.is_gles && version.major < 3 && !extensions.contains(NPOT_EXTENSION) {
        return Err(PipelineError::MissingGpuCapability(NPOT_EXTENSION.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_desktop_and_gles_strings() {
        let desktop = GlVersion::parse("4.6.0 NVIDIA 535.54");
        assert_eq!((desktop.major, desktop.minor, desktop.is_gles), (4, 6, false));
        let gles = GlVersion::parse("OpenGL ES 2.0 build 1.2");
        assert_eq!((gles.major, gles.minor, gles.is_gles), (2, 0, true));
        assert_eq!(GlVersion::parse("garbage").major, 0);
    }

    #[test]
    fn desktop_core_contexts_get_a_modern_glsl_header() {
        let core = GlVersion::parse("3.3.0 Mesa 23.1");
        assert!(core.uses_modern_glsl());
        assert_eq!(core.shader_header(), "#version 150\n");
        assert_eq!(GlVersion::parse("4.6.0 NVIDIA").shader_header(), "#version 150\n");
        assert_eq!(GlVersion::parse("3.0 Mesa").shader_header(), "#version 130\n");

        let legacy = GlVersion::parse("2.1 Mesa");
        assert!(!legacy.uses_modern_glsl());
        assert_eq!(legacy.shader_header(), "#version 120\n");

        let gles3 = GlVersion::parse("OpenGL ES 3.2");
        assert!(!gles3.uses_modern_glsl());
        assert!(gles3.shader_header().starts_with("#version 100\n"));
    }

    #[test]
    fn gles2_needs_npot_extension() {
        let gles2 = GlVersion::parse("OpenGL ES 2.0");
        let mut extensions = HashSet::new();
        assert!(matches!(
            check_frame_sampling(gles2, &extensions),
            Err(PipelineError::MissingGpuCapability(_))
        ));
        extensions.insert(NPOT_EXTENSION.to_string());
        assert!(check_frame_sampling(gles2, &extensions).is_ok());
        assert!(check_frame_sampling(GlVersion::parse("OpenGL ES 3.1"), &HashSet::new()).is_ok());
        assert!(check_frame_sampling(GlVersion::parse("1.5.0"), &HashSet::new()).is_err());
    }
}
