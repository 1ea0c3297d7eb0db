//! ### English
//! Display orientation for the camera preview, from the sensor mount and the display rotation.
//!
//! ### 中文
//! 根据传感器安装角度与显示旋转计算相机预览的显示方向。

use crate::engine::observer::Rotation;

use super::device::{CameraInfo, Facing};

/// ### English
/// Display orientation (clockwise degrees) to apply to a camera's preview so it appears upright
/// for the current display rotation. Front cameras are mirror-compensated.
///
/// ### 中文
/// 为使相机预览在当前显示旋转下正立而应用的显示方向（顺时针角度）。前置相机会做镜像补偿。
pub fn display_orientation(info: CameraInfo, rotation: Rotation) -> u32 {
    let sensor = info.sensor_orientation % 360;
    let display = rotation.degrees();
    match info.facing {
        Facing::Front => (360 - (sensor + display) % 360) % 360,
        Facing::Back => (sensor + 360 - display) % 360,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(facing: Facing, sensor_orientation: u32) -> CameraInfo {
        CameraInfo {
            facing,
            sensor_orientation,
        }
    }

    #[test]
    fn back_camera() {
        assert_eq!(display_orientation(camera(Facing::Back, 90), Rotation::Deg90), 0);
        assert_eq!(display_orientation(camera(Facing::Back, 90), Rotation::Deg0), 90);
        assert_eq!(display_orientation(camera(Facing::Back, 90), Rotation::Deg270), 180);
    }

    #[test]
    fn front_camera_is_mirrored() {
        assert_eq!(display_orientation(camera(Facing::Front, 270), Rotation::Deg0), 90);
        assert_eq!(display_orientation(camera(Facing::Front, 270), Rotation::Deg90), 0);
        assert_eq!(display_orientation(camera(Facing::Front, 90), Rotation::Deg180), 90);
    }
}
