//! ### English
//! Encoder surface bridge: a second GPU context, sharing objects with the primary one, that
//! redraws forwarded frames into an encoder-owned surface.
//!
//! ### 中文
//! 编码表面桥接器：与主上下文共享对象的第二个 GPU 上下文，将转发帧重绘到编码器持有的表面。
mod bridge_thread;
mod command;
mod context;
mod embedder;
mod sink;
mod surface_bridge;

pub use context::{EncoderContext, OutputSurfaceHandle, SharedContextFactory};
pub use embedder::{EmbedderContextFactory, EmbedderGlApi, install_embedder_gl_api};
pub use sink::{EncoderInput, EncoderSink};
pub use surface_bridge::EncoderSurfaceBridge;
