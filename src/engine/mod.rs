/// ### English
/// Pipeline internals (actors, rendering, frame handoff and shared configuration).
///
/// ### 中文
/// 管线内部模块（actor、渲染、帧交接与共享配置等）。
pub mod bridge;
pub mod capture;
pub mod config;
pub mod error;
pub mod frame;
pub mod observer;
pub mod rendering;
pub mod runtime;
pub mod sink;
pub mod viewport;
