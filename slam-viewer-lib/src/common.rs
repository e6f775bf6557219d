pub const DEFAULT_RESIZE: f32 = 0.04;
pub const DEFAULT_RESIZE_FOR_LINKS: f32 = 0.05;
pub const DEFAULT_DOWNSAMPLE_CAMERAS: i32 = 40;
pub const DEFAULT_DOWNSAMPLE_LINKS: i32 = 1;

pub const CAMERA_NUM_POINTS: usize = 9;
pub const CAMERA_NUM_TRIANGLES: usize = 9;
pub const LINK_NUM_POINTS: usize = 26;
pub const LINK_NUM_TRIANGLES: usize = 48;

/// Margin used for all rotation / pose matrix checks.
pub const EPSILON_MARGIN: f32 = 10.0 * f32::EPSILON;

#[inline]
pub(crate) fn clamp_u8(x: f32) -> u8 {
    x.round().clamp(0.0, 255.0) as u8
}

#[inline]
pub(crate) fn clamp_channel(x: i32) -> u8 {
    x.clamp(0, 255) as u8
}

#[inline]
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
