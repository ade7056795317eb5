use glam::{Mat4, Quat, Vec2, Vec3};
use glint_render::RenderView;

/// Free-fly camera driven by discrete key input.
///
/// `front` and `up` rotate together, so the camera can roll through any
/// orientation; there is no world-up clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeCamera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    /// Units per second.
    pub speed: f32,
    /// Radians per second.
    pub rot_speed: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for FreeCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 12.0),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            speed: 5.0,
            rot_speed: 1.0,
            fov: 45.0,
            aspect: 4.0 / 3.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl FreeCamera {
    pub fn new(position: Vec3, front: Vec3, speed: f32) -> Self {
        Self {
            position,
            front: front.normalize_or_zero(),
            speed,
            ..Self::default()
        }
    }

    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize_or_zero()
    }

    /// Apply one frame of input. Only the sign of each `dis`/`look`
    /// component matters: `look.y > 0` turns right, `look.x > 0` pitches
    /// up, `dis.x > 0` moves forward, `dis.y > 0` strafes right.
    pub fn update(&mut self, dis: Vec2, look: Vec2, dt: f32) {
        let step = self.rot_speed * dt;
        let right = self.right();

        let yaw = if look.y > 0.0 {
            Quat::from_axis_angle(self.up, -step)
        } else if look.y < 0.0 {
            Quat::from_axis_angle(self.up, step)
        } else {
            Quat::IDENTITY
        };
        let pitch = if look.x > 0.0 {
            Quat::from_axis_angle(right, step)
        } else if look.x < 0.0 {
            Quat::from_axis_angle(right, -step)
        } else {
            Quat::IDENTITY
        };

        let rot = yaw * pitch;
        self.front = (rot * self.front).normalize();
        self.up = (rot * self.up).normalize();

        let mut delta = Vec3::ZERO;
        if dis.x > 0.0 {
            delta += self.front;
        } else if dis.x < 0.0 {
            delta -= self.front;
        }
        let right = self.right();
        if dis.y > 0.0 {
            delta += right;
        } else if dis.y < 0.0 {
            delta -= right;
        }

        if delta.length_squared() > 0.0 {
            self.position += self.speed * dt * delta.normalize();
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn render_view(&self) -> RenderView {
        RenderView {
            eye: self.position,
            target: self.position + self.front,
            fov_degrees: self.fov,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn default_camera() {
        let cam = FreeCamera::default();
        let vp = cam.view_projection();
        assert!(!vp.is_nan());
        assert_eq!(cam.right(), Vec3::X);
    }

    #[test]
    fn forward_moves_along_front() {
        let mut cam = FreeCamera::default();
        let start = cam.position;
        cam.update(Vec2::new(1.0, 0.0), Vec2::ZERO, 0.5);
        assert!(close(cam.position, start + Vec3::NEG_Z * 2.5));
    }

    #[test]
    fn diagonal_movement_is_normalised() {
        let mut cam = FreeCamera::default();
        let start = cam.position;
        cam.update(Vec2::new(1.0, 1.0), Vec2::ZERO, 1.0);
        assert!(((cam.position - start).length() - cam.speed).abs() < 1e-4);
    }

    #[test]
    fn strafe_right() {
        let mut cam = FreeCamera::default();
        let start = cam.position;
        cam.update(Vec2::new(0.0, -3.0), Vec2::ZERO, 1.0);
        assert!(close(cam.position, start - Vec3::X * cam.speed));
    }

    #[test]
    fn look_right_turns_clockwise_from_above() {
        let mut cam = FreeCamera::default();
        cam.update(Vec2::ZERO, Vec2::new(0.0, 1.0), std::f32::consts::FRAC_PI_2);
        assert!(close(cam.front, Vec3::X));
        assert!(close(cam.up, Vec3::Y));
    }

    #[test]
    fn look_up_pitches_front_and_up() {
        let mut cam = FreeCamera::default();
        cam.update(Vec2::ZERO, Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(close(cam.front, Vec3::Y));
        assert!(close(cam.up, Vec3::Z));
    }

    #[test]
    fn rotation_keeps_unit_vectors() {
        let mut cam = FreeCamera::default();
        for _ in 0..1000 {
            cam.update(Vec2::ZERO, Vec2::new(1.0, -1.0), 0.016);
        }
        assert!((cam.front.length() - 1.0).abs() < 1e-4);
        assert!((cam.up.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn idle_input_changes_nothing() {
        let mut cam = FreeCamera::default();
        let before = cam;
        cam.update(Vec2::ZERO, Vec2::ZERO, 1.0);
        assert_eq!(cam, before);
    }

    #[test]
    fn render_view_targets_front() {
        let cam = FreeCamera::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0), 1.0);
        let view = cam.render_view();
        assert!(close(view.target, Vec3::NEG_Z));
        assert_eq!(view.fov_degrees, 45.0);
    }
}
