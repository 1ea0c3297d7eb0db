//! ### English
//! Column-major 4x4 matrices as consumed by GL `uniformMatrix4fv` (no transpose).
//!
//! ### 中文
//! 列主序 4x4 矩阵，直接用于 GL `uniformMatrix4fv`（不转置）。

/// ### English
/// Column-major 4x4 float matrix.
///
/// ### 中文
/// 列主序 4x4 浮点矩阵。
pub type Mat4 = [f32; 16];

/// ### English
/// Identity matrix.
///
/// ### 中文
/// 单位矩阵。
pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// ### English
/// Post-multiplies `m` by a scale of `(x, y, z)` in place (scales the first three columns).
///
/// ### 中文
/// 就地对 `m` 右乘缩放 `(x, y, z)`（缩放前三列）。
pub fn scale_in_place(m: &mut Mat4, x: f32, y: f32, z: f32) {
    for (column, factor) in [x, y, z].into_iter().enumerate() {
        let base = column * 4;
        for value in &mut m[base..base + 4] {
            *value *= factor;
        }
    }
}

/// ### English
/// Returns a scale matrix `diag(x, y, z, 1)`.
///
/// ### 中文
/// 返回缩放矩阵 `diag(x, y, z, 1)`。
pub fn scaled(x: f32, y: f32, z: f32) -> Mat4 {
    let mut m = IDENTITY;
    scale_in_place(&mut m, x, y, z);
    m
}
