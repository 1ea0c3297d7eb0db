use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dpi::PhysicalSize;

use crate::engine::rendering::TextureId;

use super::{CapturedImage, FrameAvailableListener, FrameProducer};

/// ### English
/// What a producer was bound to: the surface epoch and the producer session.
///
/// ### 中文
/// 生产者所绑定的对象：表面 epoch 与生产者会话号。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Binding {
    pub(super) epoch: u64,
    pub(super) session: u64,
}

/// ### English
/// The single per-session frame slot shared between the capture device (writer) and the preview
/// renderer (reader).
///
/// The slot is overwritten in place on every frame; readers only ever observe the latest image.
/// Each renderer surface opens a new epoch; producers from an older epoch are ignored.
/// Each capture session gets its own producer session as well, so revoking the session cuts off
/// every producer handed to the device even while the surface stays attached.
///
/// ### 中文
/// 每个采集会话唯一的帧槽，由采集设备（写端）与预览渲染器（读端）共享。
///
/// 每一帧都会就地覆盖该槽；读端只会看到最新的图像。
/// 每个渲染表面开启一个新的 epoch；旧 epoch 的生产者会被忽略。
/// 每个采集会话另有独立的生产者会话号，撤销会话即可在表面仍挂接时切断交给设备的所有生产者。
pub struct FrameSlot {
    /// ### English
    /// Latest pending image (latest-wins, null when nothing is pending).
    ///
    /// ### 中文
    /// 最新的待处理图像（只保留最新值；无待处理时为 null）。
    latest: AtomicPtr<CapturedImage>,
    /// ### English
    /// Texture the renderer samples the frames from (`0` = no surface).
    ///
    /// ### 中文
    /// 渲染器采样帧所用的纹理（`0` 表示无表面）。
    texture_id: AtomicU32,
    /// ### English
    /// Current surface epoch (`0` = detached).
    ///
    /// ### 中文
    /// 当前表面 epoch（`0` 表示已分离）。
    epoch: AtomicU64,
    next_epoch: AtomicU64,
    /// ### English
    /// Producer session; bumped whenever the capture device bound to the slot goes away.
    ///
    /// ### 中文
    /// 生产者会话号；每当绑定到帧槽的采集设备离开时递增。
    session: AtomicU64,
    /// ### English
    /// Number of frames published in the current epoch.
    ///
    /// ### 中文
    /// 当前 epoch 内已发布的帧数。
    generation: AtomicU64,
    buffer_width: AtomicU32,
    buffer_height: AtomicU32,
    /// ### English
    /// Listener installed by the renderer; cloned into every producer handed out.
    ///
    /// ### 中文
    /// 渲染器安装的监听器；会克隆进每个发出的生产者句柄。
    listener: Mutex<Option<FrameAvailableListener>>,
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self {
            latest: AtomicPtr::new(ptr::null_mut()),
            texture_id: AtomicU32::new(0),
            epoch: AtomicU64::new(0),
            next_epoch: AtomicU64::new(1),
            session: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            buffer_width: AtomicU32::new(0),
            buffer_height: AtomicU32::new(0),
            listener: Mutex::new(None),
        }
    }
}

impl FrameSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// ### English
    /// Opens a new epoch bound to `texture` and installs the frame-available listener.
    /// Called by the renderer once its texture exists.
    ///
    /// #### Parameters
    /// - `texture`: Texture the frames will be latched into.
    /// - `listener`: Invoked (from the producer thread) after every publish.
    ///
    /// ### 中文
    /// 开启一个绑定到 `texture` 的新 epoch，并安装帧可用监听器。
    /// 由渲染器在纹理创建完成后调用。
    ///
    /// #### 参数
    /// - `texture`：帧将被锁存到的纹理。
    /// - `listener`：每次发布后（在生产者线程）调用。
    pub fn attach(&self, texture: TextureId, listener: FrameAvailableListener) {
        self.drop_pending();
        *self.lock_listener() = Some(listener);
        self.texture_id.store(texture.get(), Ordering::Release);
        self.generation.store(0, Ordering::Relaxed);
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        self.epoch.store(epoch, Ordering::SeqCst);
    }

    /// ### English
    /// Closes the current epoch: outstanding producers become inert and any pending image is
    /// dropped.
    ///
    /// ### 中文
    /// 关闭当前 epoch：未回收的生产者失效，并丢弃所有待处理图像。
    pub fn detach(&self) {
        self.epoch.store(0, Ordering::SeqCst);
        self.texture_id.store(0, Ordering::Release);
        self.lock_listener().take();
        self.drop_pending();
    }

    /// ### English
    /// Returns a producer for the current epoch, or `None` if no surface is attached.
    ///
    /// ### 中文
    /// 返回当前 epoch 的生产者；若未挂接表面则返回 `None`。
    pub fn producer(self: &Arc<Self>) -> Option<FrameProducer> {
        let binding = self.binding();
        if binding.epoch == 0 {
            return None;
        }
        let listener = self.lock_listener().clone();
        Some(FrameProducer::new(self.clone(), binding, listener))
    }

    /// ### English
    /// Ends the current producer session. Every producer handed out so far becomes inert,
    /// including clones the device may still hold; the surface epoch is left untouched.
    ///
    /// ### 中文
    /// 结束当前生产者会话。此前发出的所有生产者（包括设备可能仍持有的克隆）全部失效；
    /// 表面 epoch 保持不变。
    pub fn revoke_producers(&self) {
        let session = self.session.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(session, "frame producers revoked");
    }

    pub fn texture_id(&self) -> Option<TextureId> {
        TextureId::new(self.texture_id.load(Ordering::Acquire))
    }

    pub fn is_attached(&self) -> bool {
        self.epoch.load(Ordering::Acquire) != 0
    }

    pub(super) fn binding(&self) -> Binding {
        Binding {
            epoch: self.epoch.load(Ordering::SeqCst),
            session: self.session.load(Ordering::SeqCst),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// ### English
    /// Records the buffer size negotiated with the device (used to size the texture storage).
    ///
    /// ### 中文
    /// 记录与设备协商的缓冲区尺寸（用于确定纹理存储尺寸）。
    pub fn set_default_buffer_size(&self, size: PhysicalSize<u32>) {
        self.buffer_width.store(size.width, Ordering::Relaxed);
        self.buffer_height.store(size.height, Ordering::Relaxed);
    }

    pub fn default_buffer_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(
            self.buffer_width.load(Ordering::Relaxed),
            self.buffer_height.load(Ordering::Relaxed),
        )
    }

    /// ### English
    /// Takes the latest pending image, leaving the slot empty.
    ///
    /// ### 中文
    /// 取走最新的待处理图像，槽变为空。
    pub fn take_latest(&self) -> Option<Box<CapturedImage>> {
        let ptr = self.latest.swap(ptr::null_mut(), Ordering::SeqCst);
        if ptr.is_null() {
            None
        } else {
            Some(unsafe { Box::from_raw(ptr) })
        }
    }

    /// ### English
    /// Publishes `image` if `binding` is still current. Returns whether the image was accepted.
    ///
    /// The binding is checked again after the swap: a detach, re-attach or revoke that lands
    /// in between must not leave this image behind for the next surface or session.
    ///
    /// ### 中文
    /// 若 `binding` 仍为当前绑定则发布 `image`。返回图像是否被接受。
    ///
    /// 交换之后会再次检查绑定：期间发生的分离、重新挂接或撤销不得让该图像残留给下一个表面或会话。
    pub(super) fn publish(&self, binding: Binding, image: CapturedImage) -> bool {
        if self.binding() != binding {
            return false;
        }
        let new_ptr = Box::into_raw(Box::new(image));
        let old_ptr = self.latest.swap(new_ptr, Ordering::SeqCst);
        if !old_ptr.is_null() {
            unsafe {
                drop(Box::from_raw(old_ptr));
            }
        }
        if self.binding() != binding {
            // Only reclaim the image if the reader has not latched it yet.
            if self
                .latest
                .compare_exchange(new_ptr, ptr::null_mut(), Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                unsafe {
                    drop(Box::from_raw(new_ptr));
                }
            }
            return false;
        }
        self.generation.fetch_add(1, Ordering::Release);
        true
    }

    fn drop_pending(&self) {
        drop(self.take_latest());
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<FrameAvailableListener>> {
        self.listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for FrameSlot {
    fn drop(&mut self) {
        self.drop_pending();
    }
}
