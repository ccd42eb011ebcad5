use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Quaternion, Rad, SquareMatrix, Vector3};

pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;

/// Tolerance used when comparing composed transforms against the identity.
pub const MAT_EPSILON: f32 = 1.0e-4;

/// Convert a row-major 4x4 transform (the import library's convention) into
/// the engine's column-major convention, repacked from its translation and
/// basis vectors so the projective row is always (0,0,0,1).
pub fn scene_matrix_to_engine(rows: [[f32; 4]; 4]) -> Matrix4<f32> {
    // Matrix4::new takes column-major arguments, so feeding the source rows
    // directly stores the transpose; one more transpose yields the same
    // transform in column-major storage.
    let n = Matrix4::new(
        rows[0][0], rows[0][1], rows[0][2], rows[0][3], //
        rows[1][0], rows[1][1], rows[1][2], rows[1][3], //
        rows[2][0], rows[2][1], rows[2][2], rows[2][3], //
        rows[3][0], rows[3][1], rows[3][2], rows[3][3],
    )
    .transpose();

    let pos = n.w.truncate();
    let x = n.x.truncate();
    let y = n.y.truncate();
    let z = n.z.truncate();

    Matrix4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), pos.extend(1.0))
}

/// Rotation matrix of a unit quaternion in the import library's row-major
/// layout. Combined with [`scene_matrix_to_engine`] this bakes an imported
/// rotation into an engine matrix.
pub fn quat_rotation_rows(q: Quaternion<f32>) -> [[f32; 4]; 4] {
    let m = Matrix4::from(q).transpose();
    [
        [m.x.x, m.x.y, m.x.z, m.x.w],
        [m.y.x, m.y.y, m.y.z, m.y.w],
        [m.z.x, m.z.y, m.z.z, m.z.w],
        [m.w.x, m.w.y, m.w.z, m.w.w],
    ]
}

/// Decompose a row-major local transform into scale, unit rotation
/// quaternion and translation. Zero-length basis vectors keep a zero scale
/// component instead of producing NaNs.
pub fn decompose_row_major(rows: [[f32; 4]; 4]) -> (Vector3<f32>, Quaternion<f32>, Vector3<f32>) {
    let translation = Vector3::new(rows[0][3], rows[1][3], rows[2][3]);

    let mut col0 = Vector3::new(rows[0][0], rows[1][0], rows[2][0]);
    let mut col1 = Vector3::new(rows[0][1], rows[1][1], rows[2][1]);
    let mut col2 = Vector3::new(rows[0][2], rows[1][2], rows[2][2]);

    let scale = Vector3::new(col0.magnitude(), col1.magnitude(), col2.magnitude());

    if scale.x != 0.0 {
        col0 /= scale.x;
    }
    if scale.y != 0.0 {
        col1 /= scale.y;
    }
    if scale.z != 0.0 {
        col2 /= scale.z;
    }

    let rotation = Quaternion::from(Matrix3::from_cols(col0, col1, col2)).normalize();

    (scale, rotation, translation)
}

/// Euler angles (radians) of a unit quaternion, guarded against the
/// gimbal-lock singularities at the poles. Kept for overlay tooling that
/// wants to express imported rotations in degrees.
pub fn quaternion_to_radian_angles(q: Quaternion<f32>) -> Vector3<f32> {
    let sqw = q.s * q.s;
    let sqx = q.v.x * q.v.x;
    let sqy = q.v.y * q.v.y;
    let sqz = q.v.z * q.v.z;
    // if the quaternion is normalised this is one, otherwise a correction factor
    let unit = sqx + sqy + sqz + sqw;
    let test = q.v.x * q.v.y + q.v.z * q.s;

    if test > 0.499 * unit {
        // singularity at north pole
        Vector3::new(2.0 * q.v.x.atan2(q.s), std::f32::consts::FRAC_PI_2, 0.0)
    } else if test < -0.499 * unit {
        // singularity at south pole
        Vector3::new(-2.0 * q.v.x.atan2(q.s), -std::f32::consts::FRAC_PI_2, 0.0)
    } else {
        Vector3::new(
            (2.0 * q.v.y * q.s - 2.0 * q.v.x * q.v.z).atan2(sqx - sqy - sqz + sqw),
            ((2.0 * test) / unit).asin(),
            (2.0 * q.v.x * q.s - 2.0 * q.v.y * q.v.z).atan2(-sqx + sqy - sqz + sqw),
        )
    }
}

/// Rotation matrix for Euler angles applied in X, then Y, then Z order.
pub fn euler_rotation_matrix(r: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_angle_z(Rad(r.z)) * Matrix4::from_angle_y(Rad(r.y)) * Matrix4::from_angle_x(Rad(r.x))
}

/// Post-multiply a linear transform by a non-uniform scale (M * S), i.e.
/// scale each basis column by the matching scale component.
pub fn scale_columns(m: Matrix4<f32>, s: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_cols(m.x * s.x, m.y * s.y, m.z * s.z, m.w)
}

/// Apply a 4x4 transform to a point.
pub fn apply_transform(m: &Matrix4<f32>, p: Vector3<f32>) -> Vector3<f32> {
    (m * p.extend(1.0)).truncate()
}

pub fn is_identity(m: &Matrix4<f32>) -> bool {
    let id = Matrix4::<f32>::identity();
    let a: &[f32; 16] = m.as_ref();
    let b: &[f32; 16] = id.as_ref();
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= MAT_EPSILON)
}

pub fn vec_min(a: Vector3<f32>, b: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
}

pub fn vec_max(a: Vector3<f32>, b: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
}

pub fn vec_abs(a: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(a.x.abs(), a.y.abs(), a.z.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Rotation3, Zero};

    fn row_major_trs(scale: Vector3<f32>, trans: Vector3<f32>) -> [[f32; 4]; 4] {
        [
            [scale.x, 0.0, 0.0, trans.x],
            [0.0, scale.y, 0.0, trans.y],
            [0.0, 0.0, scale.z, trans.z],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    #[test]
    fn decomposes_scale_and_translation() {
        let rows = row_major_trs(Vector3::new(2.0, 3.0, 4.0), Vector3::new(1.0, -2.0, 5.0));
        let (scale, rot, trans) = decompose_row_major(rows);

        assert!((scale.x - 2.0).abs() < 1e-5);
        assert!((scale.y - 3.0).abs() < 1e-5);
        assert!((scale.z - 4.0).abs() < 1e-5);
        assert!((trans.x - 1.0).abs() < 1e-5);
        assert!((trans.y + 2.0).abs() < 1e-5);
        assert!((trans.z - 5.0).abs() < 1e-5);
        // axis-aligned scaling carries no rotation
        assert!((rot.s - 1.0).abs() < 1e-4);
    }

    #[test]
    fn engine_conversion_preserves_translation_and_basis() {
        let rows = row_major_trs(Vector3::new(1.0, 1.0, 1.0), Vector3::new(7.0, 8.0, 9.0));
        let m = scene_matrix_to_engine(rows);

        assert!((m.w.x - 7.0).abs() < 1e-6);
        assert!((m.w.y - 8.0).abs() < 1e-6);
        assert!((m.w.z - 9.0).abs() < 1e-6);
        assert!(is_identity(
            &(Matrix4::from_translation(-Vector3::new(7.0, 8.0, 9.0)) * m)
        ));
    }

    #[test]
    fn quat_rotation_round_trips_through_engine_convention() {
        let q = Quaternion::from_angle_y(Rad(0.75));
        let engine = scene_matrix_to_engine(quat_rotation_rows(q));
        let direct = Matrix4::from(q);

        let a: &[f32; 16] = engine.as_ref();
        let b: &[f32; 16] = direct.as_ref();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn euler_angles_of_identity_are_zero() {
        let r = quaternion_to_radian_angles(Quaternion::new(1.0, 0.0, 0.0, 0.0));
        assert!(r.x.abs() < 1e-6 && r.y.abs() < 1e-6 && r.z.abs() < 1e-6);
    }

    #[test]
    fn euler_rotation_of_zero_is_identity() {
        assert!(is_identity(&euler_rotation_matrix(Vector3::zero())));
    }

    #[test]
    fn scale_columns_scales_basis_only() {
        let m = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let s = scale_columns(m, Vector3::new(2.0, 2.0, 2.0));
        assert!((s.x.x - 2.0).abs() < 1e-6);
        assert!((s.w.x - 1.0).abs() < 1e-6);
    }
}
