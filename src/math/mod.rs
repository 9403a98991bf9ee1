use cgmath::{InnerSpace, Matrix3, Matrix4, Quaternion, SquareMatrix, Vector3};
use serde::Serialize;

/// Scale components below this magnitude make a matrix non-decomposable.
const DEGENERATE_SCALE_EPSILON: f32 = 1e-8;

/// Local transform of a scene node in the target (Z-up) convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// True iff every translation and scale component is finite.
    pub fn is_finite(&self) -> bool {
        is_vector_finite(&self.position) && is_vector_finite(&self.scale)
    }

    /// Recompose into a column-major matrix (`T * R * S`).
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

pub fn is_vector_finite(v: &Vector3<f32>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Swap the Y and Z components, mapping the source up-axis onto the target one.
/// (x, y, z) → (x, z, y)
pub fn remap_axes(v: [f32; 3]) -> Vector3<f32> {
    Vector3::new(v[0], v[2], v[1])
}

/// Convert a column-major 4x4 node matrix into a target-convention transform.
///
/// Translation and scale get their Y/Z components swapped, the quaternion gets
/// the same swap on its vector part plus a flipped `w`. `unit_scale` multiplies
/// the resulting scale (100 turns metre-based sources into centimetres).
///
/// A matrix that cannot be decomposed (zero or non-finite scale) keeps its
/// translation and falls back to identity rotation and scale. Non-finite input
/// stays non-finite in the translation, so [`Transform::is_finite`] rejects it.
pub fn convert_matrix(matrix: &[[f32; 4]; 4], unit_scale: f32) -> Transform {
    let mat = Matrix4::from(*matrix);
    let position = mat.w.truncate();

    let (rotation, scale) = match decompose_rotation_scale(&mat) {
        Some(rs) => rs,
        None => {
            log::debug!("degenerate node matrix, falling back to identity rotation/scale");
            (
                Quaternion::new(1.0, 0.0, 0.0, 0.0),
                Vector3::new(1.0, 1.0, 1.0),
            )
        }
    };

    Transform {
        position: Vector3::new(position.x, position.z, position.y),
        rotation: Quaternion::new(-rotation.s, rotation.v.x, rotation.v.z, rotation.v.y),
        scale: Vector3::new(scale.x, scale.z, scale.y) * unit_scale,
    }
}

/// Split the upper 3x3 block into a unit rotation and a non-uniform scale.
fn decompose_rotation_scale(mat: &Matrix4<f32>) -> Option<(Quaternion<f32>, Vector3<f32>)> {
    let col0 = mat.x.truncate();
    let col1 = mat.y.truncate();
    let col2 = mat.z.truncate();

    let mut scale_x = col0.magnitude();
    let scale_y = col1.magnitude();
    let scale_z = col2.magnitude();

    let scale_ok = |s: f32| s.is_finite() && s.abs() > DEGENERATE_SCALE_EPSILON;
    if !(scale_ok(scale_x) && scale_ok(scale_y) && scale_ok(scale_z)) {
        return None;
    }

    let basis = Matrix3::from_cols(col0, col1, col2);
    // Mirrored basis: fold the reflection into the X scale.
    if basis.determinant() < 0.0 {
        scale_x = -scale_x;
    }

    let rotation_matrix = Matrix3::from_cols(col0 / scale_x, col1 / scale_y, col2 / scale_z);
    let rotation = Quaternion::from(rotation_matrix).normalize();
    if !(rotation.s.is_finite() && is_vector_finite(&rotation.v)) {
        return None;
    }

    Some((rotation, Vector3::new(scale_x, scale_y, scale_z)))
}

/// Column-major identity, handy for sources without node matrices.
pub const IDENTITY_MATRIX: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn same_rotation(a: Quaternion<f32>, b: Quaternion<f32>) -> bool {
        // q and -q encode the same rotation
        a.dot(b).abs() > 1.0 - 1e-4
    }

    #[test]
    fn identity_matrix_converts_to_identity() {
        let t = convert_matrix(&IDENTITY_MATRIX, 1.0);
        assert_eq!(t.position, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(t.scale, Vector3::new(1.0, 1.0, 1.0));
        assert!(same_rotation(t.rotation, Quaternion::new(1.0, 0.0, 0.0, 0.0)));
        assert!(t.is_finite());
    }

    #[test]
    fn unit_scale_multiplies_scale_only() {
        let mut m = IDENTITY_MATRIX;
        m[3] = [1.0, 2.0, 3.0, 1.0];
        let t = convert_matrix(&m, 100.0);
        assert_eq!(t.scale, Vector3::new(100.0, 100.0, 100.0));
        assert_eq!(t.position, Vector3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn translation_and_scale_swap_y_and_z() {
        let m: [[f32; 4]; 4] = (Matrix4::from_translation(Vector3::new(5.0, 6.0, 7.0))
            * Matrix4::from_nonuniform_scale(2.0, 3.0, 4.0))
        .into();
        let t = convert_matrix(&m, 1.0);
        assert_eq!(t.position, Vector3::new(5.0, 7.0, 6.0));
        assert!(approx(t.scale.x, 2.0));
        assert!(approx(t.scale.y, 4.0));
        assert!(approx(t.scale.z, 3.0));
    }

    #[test]
    fn rotation_swaps_vector_part_and_flips_w() {
        let q = Quaternion::from_angle_x(Deg(90.0f32));
        let m: [[f32; 4]; 4] = Matrix4::from(q).into();
        let t = convert_matrix(&m, 1.0);
        let expected = Quaternion::new(-q.s, q.v.x, q.v.z, q.v.y);
        assert!(same_rotation(t.rotation, expected));
        assert!(approx(t.rotation.magnitude(), 1.0));
    }

    #[test]
    fn degenerate_matrix_keeps_translation() {
        let mut m = [[0.0f32; 4]; 4];
        m[3] = [4.0, 5.0, 6.0, 1.0];
        let t = convert_matrix(&m, 1.0);
        assert_eq!(t.position, Vector3::new(4.0, 6.0, 5.0));
        assert_eq!(t.scale, Vector3::new(1.0, 1.0, 1.0));
        assert!(t.is_finite());
    }

    #[test]
    fn non_finite_matrix_is_flagged() {
        let mut m = IDENTITY_MATRIX;
        m[3] = [f32::NAN, 0.0, 0.0, 1.0];
        let t = convert_matrix(&m, 1.0);
        assert!(!t.is_finite());

        let mut m = IDENTITY_MATRIX;
        m[0][0] = f32::INFINITY;
        let t = convert_matrix(&m, 1.0);
        // rotation/scale fall back, translation is fine
        assert!(t.is_finite());
    }

    #[test]
    fn mirrored_matrix_yields_negative_scale() {
        let m: [[f32; 4]; 4] = Matrix4::from_nonuniform_scale(-1.0, 1.0, 1.0).into();
        let t = convert_matrix(&m, 1.0);
        assert!(approx(t.scale.x, -1.0));
        assert!(approx(t.rotation.magnitude(), 1.0));
    }

    #[test]
    fn rotation_and_scale_survive_decomposition() {
        for angle in [10.0f32, 95.0, 179.0, 270.0] {
            let q = Quaternion::from_axis_angle(Vector3::new(1.0, 2.0, 3.0).normalize(), Deg(angle));
            let m: [[f32; 4]; 4] =
                (Matrix4::from(q) * Matrix4::from_nonuniform_scale(2.0, 3.0, 4.0)).into();
            let t = convert_matrix(&m, 1.0);
            let expected = Quaternion::new(-q.s, q.v.x, q.v.z, q.v.y);
            assert!(same_rotation(t.rotation, expected));
            assert!(approx(t.scale.x, 2.0) && approx(t.scale.y, 4.0) && approx(t.scale.z, 3.0));
        }
    }

    #[test]
    fn remap_axes_swaps_y_and_z() {
        assert_eq!(remap_axes([1.0, 2.0, 3.0]), Vector3::new(1.0, 3.0, 2.0));
    }
}
