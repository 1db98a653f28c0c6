use cgmath::{Deg, Euler, Matrix4, Quaternion, SquareMatrix, Vector3};

/// Placement of an entity in world space.
///
/// `rotation` holds Euler angles in degrees, applied X, then Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn orientation(&self) -> Quaternion<f32> {
        Quaternion::from(Euler::new(
            Deg(self.rotation.x),
            Deg(self.rotation.y),
            Deg(self.rotation.z),
        ))
    }

    /// Model matrix: translation * rotation * scale.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.orientation())
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse-transpose of the model matrix, used to transform normals.
    /// Falls back to identity for degenerate (zero-scale) transforms.
    pub fn normal_matrix(&self) -> Matrix4<f32> {
        use cgmath::Matrix;
        self.to_matrix()
            .invert()
            .map(|m| m.transpose())
            .unwrap_or_else(Matrix4::identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn matrix_translates_scaled_points() {
        let transform = TransformComponent {
            position: Vector3::new(1.0, 2.0, 3.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
            ..Default::default()
        };
        let p = transform.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 3.0).abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
        assert!((p.z - 3.0).abs() < 1e-5);
    }

    #[test]
    fn normal_matrix_of_pure_translation_ignores_translation() {
        let transform = TransformComponent::at(Vector3::new(5.0, 0.0, 0.0));
        let n = transform.normal_matrix();
        assert!(n.w.x.abs() < 1e-5);
        assert!((n.x.w + 5.0).abs() < 1e-5);
    }

    #[test]
    fn zero_scale_yields_identity_normal_matrix() {
        let transform = TransformComponent {
            scale: Vector3::new(0.0, 0.0, 0.0),
            ..Default::default()
        };
        assert_eq!(transform.normal_matrix(), Matrix4::identity());
    }
}
