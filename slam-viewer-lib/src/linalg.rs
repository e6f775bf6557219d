//! Fixed-size vector and matrix helpers.
//!
//! Matrices are row-major: `m[row][col]`. Quaternions are stored as
//! `[x, y, z, w]`.

pub type Vec3 = [f32; 3];
pub type Vec4 = [f32; 4];
pub type Mat3 = [[f32; 3]; 3];
pub type Mat4 = [[f32; 4]; 4];

/// Double precision variants used where f32 rounding would exceed the
/// rotation margin.
pub type DVec3 = [f64; 3];
pub type DMat3 = [[f64; 3]; 3];

#[inline]
pub fn widen3(v: Vec3) -> DVec3 {
    v.map(f64::from)
}

#[inline]
pub fn widen_mat3(m: &Mat3) -> DMat3 {
    m.map(|row| row.map(f64::from))
}

#[inline]
pub fn narrow_mat3(m: &DMat3) -> Mat3 {
    m.map(|row| row.map(|v| v as f32))
}

#[inline]
pub const fn identity3() -> Mat3 {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

#[inline]
pub const fn identity4() -> Mat4 {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

#[inline]
pub fn mul_mat3_vec3(m: &Mat3, v: Vec3) -> Vec3 {
    let mut out = [0.0; 3];
    for (row, o) in m.iter().zip(out.iter_mut()) {
        *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}

#[inline]
pub fn mul_mat4_vec4(m: &Mat4, v: Vec4) -> Vec4 {
    let mut out = [0.0; 4];
    for (row, o) in m.iter().zip(out.iter_mut()) {
        *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2] + row[3] * v[3];
    }
    out
}

pub fn mul_mat3(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

pub fn mul_mat4(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            out[i][j] = (0..4).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

pub fn transpose3(m: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[j][i] = m[i][j];
        }
    }
    out
}

pub fn transpose4(m: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            out[j][i] = m[i][j];
        }
    }
    out
}

#[inline]
pub fn add3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub3(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale3(v: Vec3, s: f32) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

#[inline]
pub fn dot3(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn norm3(v: Vec3) -> f32 {
    dot3(v, v).sqrt()
}

/// Divides by the Euclidean norm. A zero vector yields NaN components.
#[inline]
pub fn normalize3(v: Vec3) -> Vec3 {
    scale3(v, 1.0 / norm3(v))
}

#[inline]
pub fn normalize4(v: Vec4) -> Vec4 {
    let n = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2] + v[3] * v[3]).sqrt();
    [v[0] / n, v[1] / n, v[2] / n, v[3] / n]
}

#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn dot3_f64(a: DVec3, b: DVec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn norm3_f64(v: DVec3) -> f64 {
    dot3_f64(v, v).sqrt()
}

/// A zero vector yields NaN components, as with [`normalize3`].
#[inline]
pub fn normalize3_f64(v: DVec3) -> DVec3 {
    let n = norm3_f64(v);
    v.map(|c| c / n)
}

#[inline]
pub fn cross_f64(a: DVec3, b: DVec3) -> DVec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn determinant3(m: &Mat3) -> f32 {
    determinant3_f64(&widen_mat3(m)) as f32
}

pub fn determinant3_f64(m: &DMat3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Unit quaternion `[x, y, z, w]` to the rotation matrix it applies to
/// column vectors.
pub fn quaternion_to_rotation_matrix(q: Vec4) -> Mat3 {
    let [x, y, z, w] = q;
    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - z * w),
            2.0 * (x * z + y * w),
        ],
        [
            2.0 * (x * y + z * w),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - x * w),
        ],
        [
            2.0 * (x * z - y * w),
            2.0 * (y * z + x * w),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

/// Inverse of [`quaternion_to_rotation_matrix`], up to the sign of the result.
pub fn rotation_matrix_to_quaternion(m: &Mat3) -> Vec4 {
    let trace = m[0][0] + m[1][1] + m[2][2];
    if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        [
            (m[2][1] - m[1][2]) / s,
            (m[0][2] - m[2][0]) / s,
            (m[1][0] - m[0][1]) / s,
            0.25 * s,
        ]
    } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
        let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
        [
            0.25 * s,
            (m[0][1] + m[1][0]) / s,
            (m[0][2] + m[2][0]) / s,
            (m[2][1] - m[1][2]) / s,
        ]
    } else if m[1][1] > m[2][2] {
        let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
        [
            (m[0][1] + m[1][0]) / s,
            0.25 * s,
            (m[1][2] + m[2][1]) / s,
            (m[0][2] - m[2][0]) / s,
        ]
    } else {
        let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
        [
            (m[0][2] + m[2][0]) / s,
            (m[1][2] + m[2][1]) / s,
            0.25 * s,
            (m[1][0] - m[0][1]) / s,
        ]
    }
}

/// Rotation of `angle` radians about the unit `axis` (right-handed).
pub fn axis_angle_to_rotation(axis: Vec3, angle: f32) -> Mat3 {
    narrow_mat3(&axis_angle_to_rotation_f64(widen3(axis), f64::from(angle)))
}

pub fn axis_angle_to_rotation_f64(axis: DVec3, angle: f64) -> DMat3 {
    let [x, y, z] = axis;
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    [
        [t * x * x + c, t * x * y - s * z, t * x * z + s * y],
        [t * x * y + s * z, t * y * y + c, t * y * z - s * x],
        [t * x * z - s * y, t * y * z + s * x, t * z * z + c],
    ]
}
