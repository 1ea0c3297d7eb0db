//! ### English
//! Primary-context rendering: GPU seams, the concrete GL/GLES backend, and the preview renderer.
//!
//! ### 中文
//! 主上下文渲染：GPU 接口、具体的 GL/GLES 后端与预览渲染器。
mod backend;
pub mod gles;
pub mod preview;

pub use backend::{QuadDrawer, RenderBackend, SharedContextHandle, TextureId};
pub use preview::{PreviewHandle, PreviewRenderer};
