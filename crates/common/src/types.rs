use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Rotation stored as an axis and an angle in degrees.
///
/// Mirrors the `vec4(axis, degrees)` convention used by scene descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAngle {
    pub axis: Vec3,
    pub degrees: f32,
}

impl AxisAngle {
    pub const NONE: Self = Self {
        axis: Vec3::Y,
        degrees: 0.0,
    };

    pub fn new(axis: Vec3, degrees: f32) -> Self {
        Self { axis, degrees }
    }

    /// `xyz` is the axis, `w` the angle in degrees.
    pub fn from_vec4(v: Vec4) -> Self {
        Self {
            axis: v.truncate(),
            degrees: v.w,
        }
    }

    pub fn to_vec4(self) -> Vec4 {
        self.axis.extend(self.degrees)
    }

    /// Rotation matrix. A degenerate axis or a zero angle is the identity.
    pub fn matrix(self) -> Mat4 {
        let axis = self.axis.normalize_or_zero();
        if axis == Vec3::ZERO || self.degrees == 0.0 {
            return Mat4::IDENTITY;
        }
        Mat4::from_axis_angle(axis, self.degrees.to_radians())
    }
}

impl Default for AxisAngle {
    fn default() -> Self {
        Self::NONE
    }
}

/// Spatial transform: position, scale, axis-angle rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation: AxisAngle,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: AxisAngle) -> Self {
        self.rotation = rotation;
        self
    }

    /// Translate, then scale, then rotate.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_scale(self.scale)
            * self.rotation.matrix()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: AxisAngle::NONE,
        }
    }
}

/// Linear RGB colour with a fourth channel whose meaning depends on the
/// consumer (intensity for lights, alpha for surfaces).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub rgb: Vec3,
    pub w: f32,
}

impl Rgba {
    pub const WHITE: Self = Self {
        rgb: Vec3::ONE,
        w: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32, w: f32) -> Self {
        Self {
            rgb: Vec3::new(r, g, b),
            w,
        }
    }

    /// Same colour with `w` replaced.
    pub fn with_w(self, w: f32) -> Self {
        Self { rgb: self.rgb, w }
    }

    pub fn to_vec4(self) -> Vec4 {
        self.rgb.extend(self.w)
    }

    pub fn to_array(self) -> [f32; 4] {
        self.to_vec4().to_array()
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Vec4> for Rgba {
    fn from(v: Vec4) -> Self {
        Self {
            rgb: v.truncate(),
            w: v.w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn zero_axis_does_not_produce_nan() {
        let t = Transform::default().with_rotation(AxisAngle::new(Vec3::ZERO, 45.0));
        let m = t.model_matrix();
        assert!(!m.is_nan());
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn translation_is_applied_last() {
        // Scale must not affect the translation column.
        let t = Transform::at(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::splat(10.0));
        let origin = t.model_matrix().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rotation_applies_before_scale() {
        let t = Transform::default()
            .with_scale(Vec3::new(2.0, 1.0, 1.0))
            .with_rotation(AxisAngle::new(Vec3::Z, 90.0));
        // +Y rotated by 90 degrees about Z lands on -X, then gets scaled by 2.
        let p = t.model_matrix().transform_point3(Vec3::Y);
        assert!((p - Vec3::new(-2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn axis_angle_vec4_round_trip() {
        let v = Vec4::new(0.0, 1.0, 0.0, 30.0);
        assert_eq!(AxisAngle::from_vec4(v).to_vec4(), v);
    }

    #[test]
    fn rgba_with_w_keeps_rgb() {
        let c = Rgba::new(0.2, 0.4, 0.6, 1.0).with_w(0.5);
        assert_eq!(c.rgb, Vec3::new(0.2, 0.4, 0.6));
        assert_eq!(c.w, 0.5);
    }
}
