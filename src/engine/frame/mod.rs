//! ### English
//! Latest-frame handoff between the capture device (producer thread) and the preview renderer
//! (GL thread). There is no queue: a new frame overwrites the previous one.
//!
//! ### 中文
//! 采集设备（生产者线程）与预览渲染器（GL 线程）之间的最新帧交接。
//! 不存在队列：新帧直接覆盖上一帧。
mod slot;

use std::fmt;
use std::sync::Arc;

use dpi::PhysicalSize;

use crate::engine::viewport::{IDENTITY, Mat4};

pub use slot::FrameSlot;

use slot::Binding;

/// ### English
/// Callback fired on the producer thread after each accepted frame. Must not block.
///
/// ### 中文
/// 每接受一帧后在生产者线程触发的回调。不得阻塞。
pub type FrameAvailableListener = Arc<dyn Fn() + Send + Sync>;

/// ### English
/// One captured image: tightly packed RGBA8 pixels plus the per-frame texture transform.
///
/// ### 中文
/// 一帧采集图像：紧密排列的 RGBA8 像素，以及逐帧纹理变换。
#[derive(Clone, PartialEq)]
pub struct CapturedImage {
    pub size: PhysicalSize<u32>,
    pub pixels: Vec<u8>,
    /// ### English
    /// Texture-coordinate transform for this frame (identity unless the device flips/crops).
    ///
    /// ### 中文
    /// 该帧的纹理坐标变换（除非设备翻转/裁剪，否则为单位矩阵）。
    pub transform: Mat4,
    pub timestamp_ns: u64,
}

impl CapturedImage {
    pub fn new(size: PhysicalSize<u32>, pixels: Vec<u8>, timestamp_ns: u64) -> Self {
        Self {
            size,
            pixels,
            transform: IDENTITY,
            timestamp_ns,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// ### English
    /// Expected byte length for `size` in RGBA8.
    ///
    /// ### 中文
    /// `size` 在 RGBA8 下应有的字节长度。
    pub fn expected_len(size: PhysicalSize<u32>) -> usize {
        size.width as usize * size.height as usize * 4
    }

    pub fn is_well_formed(&self) -> bool {
        self.size.width > 0
            && self.size.height > 0
            && self.pixels.len() == Self::expected_len(self.size)
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("size", &self.size)
            .field("bytes", &self.pixels.len())
            .field("timestamp_ns", &self.timestamp_ns)
            .finish()
    }
}

/// ### English
/// Write handle given to a capture device while it is bound to the frame slot.
///
/// The binding ends when the slot detaches or when the capture session revokes its producers;
/// publishes after that are ignored, on this handle and on every clone of it.
///
/// ### 中文
/// 采集设备绑定到帧槽期间持有的写句柄。
///
/// 帧槽分离或采集会话撤销生产者时绑定即结束；之后该句柄及其所有克隆的发布都会被忽略。
#[derive(Clone)]
pub struct FrameProducer {
    slot: Arc<FrameSlot>,
    binding: Binding,
    listener: Option<FrameAvailableListener>,
}

impl FrameProducer {
    fn new(
        slot: Arc<FrameSlot>,
        binding: Binding,
        listener: Option<FrameAvailableListener>,
    ) -> Self {
        Self {
            slot,
            binding,
            listener,
        }
    }

    /// ### English
    /// Overwrites the slot with `image` and signals frame availability.
    /// Returns `false` if the binding is stale or the image is malformed.
    ///
    /// ### 中文
    /// 用 `image` 覆盖帧槽并发出帧可用信号。
    /// 若绑定已失效或图像格式不正确，返回 `false`。
    pub fn publish(&self, image: CapturedImage) -> bool {
        if !image.is_well_formed() {
            tracing::warn!(?image, "dropping malformed frame");
            return false;
        }
        if !self.slot.publish(self.binding, image) {
            return false;
        }
        if let Some(listener) = &self.listener {
            listener();
        }
        true
    }

    /// ### English
    /// Returns whether this handle still belongs to the slot's current epoch and session.
    ///
    /// ### 中文
    /// 返回该句柄是否仍属于帧槽的当前 epoch 与会话。
    pub fn is_current(&self) -> bool {
        self.slot.binding() == self.binding
    }

    pub fn default_buffer_size(&self) -> PhysicalSize<u32> {
        self.slot.default_buffer_size()
    }
}

impl fmt::Debug for FrameProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameProducer")
            .field("epoch", &self.binding.epoch)
            .field("session", &self.binding.session)
            .finish()
    }
}
