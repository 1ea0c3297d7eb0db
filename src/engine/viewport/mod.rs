//! ### English
//! Viewport/transform computation for drawing a camera frame into a view.
//!
//! Pure functions only: the same `(mode, view, source)` always yields the same result, and a zero
//! source dimension yields `None` so callers keep their previous transform.
//!
//! ### 中文
//! 将相机帧绘制到 view 时的视口/变换计算。
//!
//! 仅包含纯函数：相同的 `(mode, view, source)` 总是得到相同结果；源尺寸任一维为 0 时返回
//! `None`，调用方保留之前的变换。

mod matrix;

pub use matrix::{IDENTITY, Mat4, scale_in_place, scaled};

use dpi::PhysicalSize;

/// ### English
/// How the source aspect ratio maps onto the view aspect ratio.
///
/// ### 中文
/// 源宽高比映射到 view 宽高比的方式。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScaleMode {
    /// ### English
    /// Fill the whole view, ignoring aspect ratio.
    ///
    /// ### 中文
    /// 填满整个 view，忽略宽高比。
    #[default]
    Stretch = 0,
    /// ### English
    /// Keep aspect by shrinking the viewport rectangle (letterbox/pillarbox).
    ///
    /// ### 中文
    /// 通过缩小视口矩形保持宽高比（上下/左右留黑边）。
    FitLetterbox = 1,
    /// ### English
    /// Keep aspect by scaling the quad inside a full viewport; the whole frame stays visible.
    ///
    /// ### 中文
    /// 在完整视口内缩放四边形以保持宽高比；整帧可见。
    FitMatrix = 2,
    /// ### English
    /// Keep aspect by scaling the quad inside a full viewport; the frame is center-cropped.
    ///
    /// ### 中文
    /// 在完整视口内缩放四边形以保持宽高比；帧被居中裁剪。
    CropMatrix = 3,
}

impl ScaleMode {
    pub const ALL: [ScaleMode; 4] = [
        ScaleMode::Stretch,
        ScaleMode::FitLetterbox,
        ScaleMode::FitMatrix,
        ScaleMode::CropMatrix,
    ];

    /// ### English
    /// Maps `0..=3` to a scale mode; anything else is `None`.
    ///
    /// ### 中文
    /// 将 `0..=3` 映射为缩放模式；其它值返回 `None`。
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// ### English
    /// Next mode in the UI cycle (wraps back to `Stretch`).
    ///
    /// ### 中文
    /// UI 循环中的下一个模式（末尾回到 `Stretch`）。
    pub fn next(self) -> Self {
        Self::ALL[(usize::from(self.index()) + 1) % Self::ALL.len()]
    }

    /// ### English
    /// Short human-readable label for status text.
    ///
    /// ### 中文
    /// 用于状态文字的简短可读标签。
    pub fn label(self) -> &'static str {
        match self {
            ScaleMode::Stretch => "scale to fit",
            ScaleMode::FitLetterbox => "keep aspect(viewport)",
            ScaleMode::FitMatrix => "keep aspect(matrix)",
            ScaleMode::CropMatrix => "keep aspect(crop center)",
        }
    }
}

/// ### English
/// Viewport rectangle in window pixels (GL convention: origin bottom-left).
///
/// ### 中文
/// 以窗口像素表示的视口矩形（GL 约定：原点在左下角）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewportRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ViewportRect {
    pub fn full(view: PhysicalSize<u32>) -> Self {
        Self {
            x: 0,
            y: 0,
            width: clamp_i32(u64::from(view.width)),
            height: clamp_i32(u64::from(view.height)),
        }
    }
}

/// ### English
/// Result of one viewport computation: where to draw, and the model-view-projection matrix for
/// the full-screen quad.
///
/// ### 中文
/// 一次视口计算的结果：绘制区域，以及全屏四边形使用的 MVP 矩阵。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub rect: ViewportRect,
    pub mvp: Mat4,
}

impl ViewportTransform {
    /// ### English
    /// Full-view viewport with identity transform (used before any source size is known).
    ///
    /// ### 中文
    /// 全 view 视口 + 单位矩阵（在源尺寸未知前使用）。
    pub fn identity(view: PhysicalSize<u32>) -> Self {
        Self {
            rect: ViewportRect::full(view),
            mvp: IDENTITY,
        }
    }
}

fn clamp_i32(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// ### English
/// Computes the viewport and transform for drawing `source` into `view` with `mode`.
///
/// Returns `None` when either source dimension is zero (the caller keeps its previous transform).
/// Letterbox dimensions are computed with exact integer arithmetic and truncated toward zero.
///
/// #### Parameters
/// - `mode`: Requested scale mode.
/// - `view`: View (surface) size in pixels.
/// - `source`: Logical source size (already rotation-adjusted).
///
/// ### 中文
/// 计算以 `mode` 将 `source` 绘制到 `view` 时的视口与变换。
///
/// 源尺寸任一维为 0 时返回 `None`（调用方保留之前的变换）。
/// letterbox 尺寸使用精确整数运算，并向零截断。
///
/// #### 参数
/// - `mode`：请求的缩放模式。
/// - `view`：view（表面）像素尺寸。
/// - `source`：逻辑源尺寸（已按旋转调整）。
pub fn compute(
    mode: ScaleMode,
    view: PhysicalSize<u32>,
    source: PhysicalSize<u32>,
) -> Option<ViewportTransform> {
    if source.width == 0 || source.height == 0 {
        return None;
    }

    let (view_w, view_h) = (u64::from(view.width), u64::from(view.height));
    let (src_w, src_h) = (u64::from(source.width), u64::from(source.height));

    let transform = match mode {
        ScaleMode::Stretch => ViewportTransform::identity(view),
        ScaleMode::FitLetterbox => {
            // view_w / view_h > src_w / src_h, cross-multiplied.
            let rect = if view_w * src_h > src_w * view_h {
                let width = src_w * view_h / src_h;
                ViewportRect {
                    x: clamp_i32((view_w - width) / 2),
                    y: 0,
                    width: clamp_i32(width),
                    height: clamp_i32(view_h),
                }
            } else {
                let height = view_w * src_h / src_w;
                ViewportRect {
                    x: 0,
                    y: clamp_i32((view_h - height) / 2),
                    width: clamp_i32(view_w),
                    height: clamp_i32(height),
                }
            };
            ViewportTransform {
                rect,
                mvp: IDENTITY,
            }
        }
        ScaleMode::FitMatrix | ScaleMode::CropMatrix => {
            if view_w == 0 || view_h == 0 {
                return Some(ViewportTransform::identity(view));
            }
            let scale_x = view_w as f64 / src_w as f64;
            let scale_y = view_h as f64 / src_h as f64;
            let scale = if mode == ScaleMode::CropMatrix {
                scale_x.max(scale_y)
            } else {
                scale_x.min(scale_y)
            };
            let width = scale * src_w as f64;
            let height = scale * src_h as f64;
            ViewportTransform {
                rect: ViewportRect::full(view),
                mvp: scaled(
                    (width / view_w as f64) as f32,
                    (height / view_h as f64) as f32,
                    1.0,
                ),
            }
        }
    };

    Some(transform)
}
