use crate::common::clamp_channel;
use crate::error::ViewerError;
use crate::linalg::{Vec3, Vec4};
use std::ops::Mul;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn to_array(self) -> Vec3 {
        [self.x, self.y, self.z]
    }
}

/// Orientation stored as `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub const fn to_array(self) -> Vec4 {
        [self.x, self.y, self.z, self.w]
    }

    #[inline]
    pub const fn from_array(q: Vec4) -> Self {
        Self::new(q[0], q[1], q[2], q[3])
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Unit-norm copy, or `None` when the norm is zero or not finite.
    pub fn try_normalized(&self) -> Option<Self> {
        let norm = self.norm();
        if !norm.is_finite() || norm == 0.0 {
            return None;
        }
        Some(Self::new(
            self.x / norm,
            self.y / norm,
            self.z / norm,
            self.w / norm,
        ))
    }

    /// Rotation about X by `rx`, then Y by `ry`, then Z by `rz` (degrees).
    pub fn from_euler_degrees(rx: f32, ry: f32, rz: f32) -> Self {
        let half = |deg: f32| (deg.to_radians() * 0.5).sin_cos();
        let (sx, cx) = half(rx);
        let (sy, cy) = half(ry);
        let (sz, cz) = half(rz);
        let qx = Self::new(sx, 0.0, 0.0, cx);
        let qy = Self::new(0.0, sy, 0.0, cy);
        let qz = Self::new(0.0, 0.0, sz, cz);
        qz * qy * qx
    }
}

/// Hamilton product: `(a * b)` applies `b` first, then `a`.
impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, b: Quaternion) -> Quaternion {
        let a = self;
        Quaternion {
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub p: Position,
    pub q: Quaternion,
}

impl CameraPose {
    pub const fn new(p: Position, q: Quaternion) -> Self {
        Self { p, q }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color::new(255, 0, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from arbitrary integers, clamping each channel to 0..=255.
    pub fn from_ints(r: i32, g: i32, b: i32) -> Self {
        Self::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub color: Color,
}

impl Point {
    #[inline]
    pub const fn new(position: Vec3, color: Color) -> Self {
        Self {
            x: position[0],
            y: position[1],
            z: position[2],
            color,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Triangle {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub const fn biased(self, bias: u32) -> Self {
        Self::new(self.a + bias, self.b + bias, self.c + bias)
    }
}

/// Accumulated point cloud and faces of one trajectory.
#[derive(Debug, Default, Clone)]
pub struct Mesh {
    pub points: Vec<Point>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.triangles.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.triangles.clear();
    }

    /// Index bias for a glyph of `incoming` vertices appended to this mesh.
    #[inline]
    pub(crate) fn bias(&self, incoming: usize) -> Result<u32, ViewerError> {
        index_bias(self.points.len(), incoming)
    }
}

/// Fails when the glyph's last vertex would not fit a 32-bit face index.
fn index_bias(len: usize, incoming: usize) -> Result<u32, ViewerError> {
    let too_large = || ViewerError::MeshTooLarge {
        vertices: len.saturating_add(incoming),
    };
    let end = len.checked_add(incoming).ok_or_else(too_large)?;
    u32::try_from(end).map_err(|_| too_large())?;
    u32::try_from(len).map_err(|_| too_large())
}
