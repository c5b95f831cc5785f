use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use glam::{Mat4, Vec3};

pub const NEAR: f32 = 1.0;
pub const FAR: f32 = 10.0;

/// Vertical field of view of a frustum spanning `[-1, 1]` at the near plane.
const FOV_Y: f32 = FRAC_PI_2;

/// Eye orbiting an ellipse at a fixed height, looking at `target`.
///
/// The eye completes half a revolution per second.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    pub radius_x: f32,
    pub radius_y: f32,
    pub height: f32,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            radius_x: 6.8,
            radius_y: 6.0,
            height: 5.0,
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl OrbitCamera {
    /// Orbit angle in radians after `elapsed`.
    pub fn angle(elapsed: Duration) -> f32 {
        let ms = elapsed.as_millis() as f64;
        (ms * std::f64::consts::PI) as f32 / 1000.0
    }

    pub fn eye(&self, elapsed: Duration) -> Vec3 {
        let angle = Self::angle(elapsed) as f64;
        Vec3::new(
            (self.radius_x as f64 * angle.cos()) as f32,
            (self.radius_y as f64 * angle.sin()) as f32,
            self.height,
        )
    }

    pub fn view(&self, elapsed: Duration) -> Mat4 {
        Mat4::look_at_rh(self.eye(elapsed), self.target, self.up)
    }
}

/// Perspective frustum spanning `[-aspect, aspect] x [-1, 1]` at the near plane,
/// with GL clip depth.
///
/// Returns `None` for a zero height.
pub fn projection(width: u32, height: u32) -> Option<Mat4> {
    if height == 0 {
        return None;
    }
    let ratio = width as f32 / height as f32;
    Some(Mat4::perspective_rh_gl(FOV_Y, ratio, NEAR, FAR))
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn eye_starts_on_the_x_axis() {
        let eye = OrbitCamera::default().eye(Duration::ZERO);
        assert!(close(eye, Vec3::new(6.8, 0.0, 5.0)), "{eye:?}");
    }

    #[test]
    fn eye_reaches_the_y_axis_after_half_a_second() {
        let eye = OrbitCamera::default().eye(Duration::from_millis(500));
        assert!(close(eye, Vec3::new(0.0, 6.0, 5.0)), "{eye:?}");
    }

    #[test]
    fn angle_uses_whole_milliseconds() {
        let a = OrbitCamera::angle(Duration::from_micros(1_999));
        assert!((a - std::f32::consts::PI / 1000.0).abs() < 1e-7);
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let camera = OrbitCamera::default();
        let eye = camera.eye(Duration::from_millis(250));
        let p = camera.view(Duration::from_millis(250)).transform_point3(eye);
        assert!(p.length() < 1e-4, "{p:?}");
    }

    #[test]
    fn view_maps_target_in_front_of_the_eye() {
        let camera = OrbitCamera::default();
        let view = camera.view(Duration::from_millis(250));
        let p = view.transform_point3(camera.target);
        let distance = camera.eye(Duration::from_millis(250)).length();

        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
        assert!((p.z + distance).abs() < 1e-4);
    }

    #[test]
    fn projection_needs_a_height() {
        assert!(projection(800, 0).is_none());

        let p = projection(800, 400).unwrap();
        let corner = p * Vec4::new(2.0, 1.0, -NEAR, 1.0);
        assert!(approx(corner.x / corner.w, 1.0));
        assert!(approx(corner.y / corner.w, 1.0));
    }

    #[test]
    fn projection_matches_gl_frustum_layout() {
        // glFrustum(-2, 2, -1, 1, 1, 10), column-major.
        let m = projection(800, 400).unwrap().to_cols_array();
        let expected = [
            0.5, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, -11.0 / 9.0, -1.0, //
            0.0, 0.0, -20.0 / 9.0, 0.0,
        ];
        for (i, (a, b)) in m.iter().zip(expected.iter()).enumerate() {
            assert!(approx(*a, *b), "element {i}: {a} != {b}");
        }
    }

    #[test]
    fn projection_maps_near_and_far_to_gl_depth_range() {
        let p = projection(600, 600).unwrap();

        let near = p * Vec4::new(0.0, 0.0, -NEAR, 1.0);
        assert!(approx(near.z / near.w, -1.0));

        let far = p * Vec4::new(0.0, 0.0, -FAR, 1.0);
        assert!(approx(far.z / far.w, 1.0));
    }
}
