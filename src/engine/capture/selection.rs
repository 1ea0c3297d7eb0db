//! ### English
//! Device parameter selection (resolution, frame rate, focus).
//!
//! ### 中文
//! 设备参数选择（分辨率、帧率、对焦）。

use dpi::PhysicalSize;

use super::device::{DeviceCapabilities, DeviceConfig, FocusMode, FpsRange};

/// ### English
/// Closest candidate to `requested` by `|dw| + |dh|`; the first minimal candidate wins ties.
///
/// ### 中文
/// 按 `|dw| + |dh|` 选出最接近 `requested` 的候选；并列时取列表中第一个。
pub fn closest_size(
    candidates: &[PhysicalSize<u32>],
    requested: PhysicalSize<u32>,
) -> Option<PhysicalSize<u32>> {
    candidates.iter().copied().min_by_key(|size| {
        u64::from(size.width.abs_diff(requested.width))
            + u64::from(size.height.abs_diff(requested.height))
    })
}

/// ### English
/// Continuous video focus, else single-shot auto focus, else the device default (`None`).
///
/// ### 中文
/// 优先连续视频对焦，其次单次自动对焦，否则保留设备默认值（`None`）。
pub fn preferred_focus_mode(supported: &[FocusMode]) -> Option<FocusMode> {
    [FocusMode::ContinuousVideo, FocusMode::Auto]
        .into_iter()
        .find(|mode| supported.contains(mode))
}

/// ### English
/// Highest frame-rate range (by max, then min).
///
/// ### 中文
/// 帧率最高的范围（先比较 max，再比较 min）。
pub fn fastest_fps_range(supported: &[FpsRange]) -> Option<FpsRange> {
    supported
        .iter()
        .copied()
        .max_by_key(|range| (range.max, range.min))
}

/// ### English
/// Resolves the full parameter set for a capture request. `None` if the device advertises no
/// preview size at all.
///
/// ### 中文
/// 为一次采集请求确定完整参数集。若设备未声明任何预览尺寸则返回 `None`。
pub fn resolve_config(
    capabilities: &DeviceCapabilities,
    requested: PhysicalSize<u32>,
) -> Option<DeviceConfig> {
    let preview_size = closest_size(&capabilities.preview_sizes, requested)?;
    Some(DeviceConfig {
        preview_size,
        picture_size: closest_size(&capabilities.picture_sizes, requested),
        fps_range: fastest_fps_range(&capabilities.fps_ranges),
        focus_mode: preferred_focus_mode(&capabilities.focus_modes),
        recording_hint: true,
    })
}
