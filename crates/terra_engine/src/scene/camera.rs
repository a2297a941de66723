//! First-person camera
//!
//! Orientation is stored as Euler angles in degrees: positive pitch looks
//! down, positive yaw turns right, and the camera looks along -Z when both
//! are zero.

use crate::foundation::math::{utils::deg_to_rad, Mat4, Vec3};

/// Camera pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position in world space
    pub position: Vec3,
    /// Rotation about the camera's X axis in degrees
    pub pitch: f32,
    /// Rotation about the world Y axis in degrees
    pub yaw: f32,
    /// Rotation about the view axis in degrees
    pub roll: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::zeros())
    }
}

impl Camera {
    /// Camera at `position` looking down -Z
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
        }
    }

    /// Set pitch and yaw
    pub fn with_orientation(mut self, pitch: f32, yaw: f32) -> Self {
        self.pitch = pitch;
        self.yaw = yaw;
        self
    }

    fn rotation(&self) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), deg_to_rad(self.roll))
            * Mat4::from_axis_angle(&Vec3::x_axis(), deg_to_rad(self.pitch))
            * Mat4::from_axis_angle(&Vec3::y_axis(), deg_to_rad(self.yaw))
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.rotation() * Mat4::new_translation(&-self.position)
    }

    /// View matrix with the translation removed (skybox)
    pub fn rotation_matrix(&self) -> Mat4 {
        self.rotation()
    }

    /// Unit view direction in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation()
            .transpose()
            .transform_vector(&Vec3::new(0.0, 0.0, -1.0))
    }

    /// Unit right vector in world space
    pub fn right(&self) -> Vec3 {
        self.rotation().transpose().transform_vector(&Vec3::x())
    }

    /// Unit up vector in world space
    pub fn up(&self) -> Vec3 {
        self.rotation().transpose().transform_vector(&Vec3::y())
    }

    /// Flip the pitch (used when mirroring across a water plane)
    pub fn invert_pitch(&mut self) {
        self.pitch = -self.pitch;
    }

    /// Copy of this camera mirrored below a horizontal plane at `height`
    ///
    /// The original is never touched, so the caller's pose stays exact.
    pub fn mirrored(&self, height: f32) -> Self {
        let mut reflected = *self;
        let distance = 2.0 * (self.position.y - height);
        reflected.position.y -= distance;
        reflected.invert_pitch();
        reflected
    }
}

/// OpenGL perspective projection from a vertical field of view in degrees
pub fn perspective_projection(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::new_perspective(aspect, deg_to_rad(fov_degrees), near, far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = Camera::default();
        assert_relative_eq!(camera.forward(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(camera.view_matrix(), Mat4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_positive_pitch_looks_down_positive_yaw_turns_right() {
        let down = Camera::default().with_orientation(30.0, 0.0);
        assert!(down.forward().y < 0.0);

        let right = Camera::default().with_orientation(0.0, 90.0);
        assert_relative_eq!(right.forward(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_view_matrix_moves_world_opposite_to_camera() {
        let camera = Camera::new(Vec3::new(0.0, 10.0, 0.0));
        let p = camera.view_matrix().transform_point(&crate::foundation::math::Point3::origin());
        assert_relative_eq!(p.y, -10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mirror_across_water() {
        let camera = Camera::new(Vec3::new(3.0, 12.0, -4.0)).with_orientation(20.0, 45.0);
        let mirrored = camera.mirrored(2.0);
        assert_relative_eq!(mirrored.position.y, -8.0, epsilon = 1e-5);
        assert_relative_eq!(mirrored.pitch, -20.0);
        assert_relative_eq!(mirrored.yaw, 45.0);
        assert_eq!(camera.position, Vec3::new(3.0, 12.0, -4.0));
    }
}
