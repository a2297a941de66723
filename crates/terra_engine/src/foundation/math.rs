//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics and the transform
//! helpers shared by the scene renderers. All matrices follow the OpenGL
//! convention: column vectors, right-handed view space, clip-space depth in
//! `[-1, 1]`.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Build a model matrix from translation, Euler rotation (degrees) and scale
///
/// Rotation order is X, then Y, then Z applied to the scaled model.
pub fn transformation_matrix(translation: &Vec3, rotation_degrees: &Vec3, scale: &Vec3) -> Mat4 {
    let rx = Mat4::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(rotation_degrees.x));
    let ry = Mat4::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(rotation_degrees.y));
    let rz = Mat4::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(rotation_degrees.z));
    Mat4::new_translation(translation) * rx * ry * rz * Mat4::new_nonuniform_scaling(scale)
}

/// Build a 2D overlay transform (translation in NDC plus scale)
pub fn gui_transformation_matrix(translation: &Vec2, scale: &Vec2) -> Mat4 {
    Mat4::new_translation(&Vec3::new(translation.x, translation.y, 0.0))
        * Mat4::new_nonuniform_scaling(&Vec3::new(scale.x, scale.y, 1.0))
}

/// Interpolate a height inside a triangle using barycentric weights
///
/// `p1`, `p2`, `p3` carry `(x, height, z)`; `pos` is the `(x, z)` query.
pub fn barycentric(p1: &Vec3, p2: &Vec3, p3: &Vec3, pos: &Vec2) -> f32 {
    let det = (p2.z - p3.z) * (p1.x - p3.x) + (p3.x - p2.x) * (p1.z - p3.z);
    let l1 = ((p2.z - p3.z) * (pos.x - p3.x) + (p3.x - p2.x) * (pos.y - p3.z)) / det;
    let l2 = ((p3.z - p1.z) * (pos.x - p3.x) + (p1.x - p3.x) * (pos.y - p3.z)) / det;
    let l3 = 1.0 - l1 - l2;
    l1 * p1.y + l2 * p2.y + l3 * p3.y
}

/// Common math utilities
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * std::f32::consts::PI / 180.0
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * 180.0 / std::f32::consts::PI
    }

    /// Cosine interpolation between `a` and `b`
    pub fn cosine_interpolate(a: f32, b: f32, blend: f32) -> f32 {
        let theta = blend * std::f32::consts::PI;
        let f = (1.0 - theta.cos()) * 0.5;
        a * (1.0 - f) + b * f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_transformation() {
        let m = transformation_matrix(&Vec3::zeros(), &Vec3::zeros(), &Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(m, Mat4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_transformation_applies_scale_before_translation() {
        let m = transformation_matrix(
            &Vec3::new(10.0, 0.0, 0.0),
            &Vec3::zeros(),
            &Vec3::new(2.0, 2.0, 2.0),
        );
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 12.0, epsilon = 1e-5);
    }

    #[test]
    fn test_yaw_rotation() {
        let m = transformation_matrix(&Vec3::zeros(), &Vec3::new(0.0, 90.0, 0.0), &Vec3::new(1.0, 1.0, 1.0));
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_barycentric_at_vertices() {
        let p1 = Vec3::new(0.0, 1.0, 0.0);
        let p2 = Vec3::new(1.0, 2.0, 0.0);
        let p3 = Vec3::new(0.0, 3.0, 1.0);
        assert_relative_eq!(barycentric(&p1, &p2, &p3, &Vec2::new(0.0, 0.0)), 1.0, epsilon = 1e-5);
        assert_relative_eq!(barycentric(&p1, &p2, &p3, &Vec2::new(1.0, 0.0)), 2.0, epsilon = 1e-5);
        assert_relative_eq!(barycentric(&p1, &p2, &p3, &Vec2::new(0.0, 1.0)), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_cosine_interpolate_endpoints() {
        assert_relative_eq!(utils::cosine_interpolate(2.0, 4.0, 0.0), 2.0, epsilon = 1e-6);
        assert_relative_eq!(utils::cosine_interpolate(2.0, 4.0, 1.0), 4.0, epsilon = 1e-6);
        assert_relative_eq!(utils::cosine_interpolate(2.0, 4.0, 0.5), 3.0, epsilon = 1e-6);
    }
}
