//! Transform component

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Local placement of a scene node
///
/// Rotation is stored as XYZ Euler angles in radians so the animation can
/// write a single axis without touching the others.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            scale,
            ..Default::default()
        }
    }

    /// Create transform from position, rotation (euler angles in radians), and scale
    pub fn from_components(position: Vec3, rotation_euler: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation: rotation_euler,
            scale,
        }
    }

    pub fn with_rotation(mut self, rotation_euler: Vec3) -> Self {
        self.rotation = rotation_euler;
        self
    }

    /// Rotation as a quaternion
    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Get the model matrix for this transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }

    /// Translate by an offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }
}

/// Per-object uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TransformUniformData {
    pub model: Mat4,
}

impl TransformUniformData {
    pub fn new(model: Mat4) -> Self {
        Self { model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn quarter_turn_about_x_lifts_plus_z_to_plus_y() {
        let t = Transform::new().with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0));
        let normal = t.matrix().transform_vector3(Vec3::Z);
        assert!((normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let t = Transform::from_components(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, FRAC_PI_2, 0.0),
            Vec3::splat(2.0),
        );
        let p = t.matrix().transform_point3(Vec3::X);
        // X scaled to 2, yawed onto -Z, then offset
        assert!((p - Vec3::new(1.0, 2.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn translate_accumulates() {
        let mut t = Transform::from_position(Vec3::ONE);
        t.translate(Vec3::new(0.5, -1.0, 0.0));
        t.translate(Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(t.position, Vec3::new(2.0, 0.0, 1.0));
    }
}
