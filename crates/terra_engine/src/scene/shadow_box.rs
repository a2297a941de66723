//! Light-space bounding box for the shadow pass
//!
//! Each frame the part of the camera frustum between the near plane and
//! the shadow distance is wrapped in an axis-aligned box in light space.
//! The box is a pure function of the camera pose, the light direction and
//! the parameters; nothing is cached between frames.

use crate::config::EngineConfig;
use crate::foundation::math::{utils::deg_to_rad, Mat4, Point3, Vec3};
use crate::scene::camera::Camera;

/// Inputs of the box computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowBoxParams {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Viewport aspect ratio
    pub aspect: f32,
    /// Camera near plane
    pub near: f32,
    /// Far end of the shadowed slice
    pub shadow_distance: f32,
    /// Extension of the box toward the light
    pub offset: f32,
}

impl ShadowBoxParams {
    /// Parameters from configuration
    pub fn from_config(config: &EngineConfig, aspect: f32) -> Self {
        Self {
            fov_degrees: config.render.fov_degrees,
            aspect,
            near: config.render.near_plane,
            shadow_distance: config.shadows.shadow_distance,
            offset: config.shadows.offset,
        }
    }
}

/// Light view and orthographic projection enclosing the shadowed slice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowBox {
    light_view: Mat4,
    projection: Mat4,
    center: Vec3,
    width: f32,
    height: f32,
    length: f32,
}

fn light_up(direction: &Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 {
        Vec3::z()
    } else {
        Vec3::y()
    }
}

impl ShadowBox {
    /// World-space corners of the camera slice `[near, shadow_distance]`
    pub fn frustum_corners(camera: &Camera, params: &ShadowBoxParams) -> [Vec3; 8] {
        let forward = camera.forward();
        let right = camera.right();
        let up = camera.up();
        let tan_half = (deg_to_rad(params.fov_degrees) / 2.0).tan();

        let mut corners = [Vec3::zeros(); 8];
        for (i, distance) in [params.near, params.shadow_distance].into_iter().enumerate() {
            let centre = camera.position + forward * distance;
            let half_height = distance * tan_half;
            let half_width = half_height * params.aspect;
            for (j, (sx, sy)) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)].into_iter().enumerate() {
                corners[i * 4 + j] = centre + right * (half_width * sx) + up * (half_height * sy);
            }
        }
        corners
    }

    /// Fit the box for this frame
    pub fn compute(camera: &Camera, light_direction: &Vec3, params: &ShadowBoxParams) -> Self {
        let direction = light_direction
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| Vec3::new(0.0, -1.0, 0.0));
        let up = light_up(&direction);
        let rotation = Mat4::look_at_rh(&Point3::origin(), &Point3::from(direction), &up);

        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);
        for corner in Self::frustum_corners(camera, params) {
            let p = rotation.transform_point(&Point3::from(corner)).coords;
            min = min.inf(&p);
            max = max.sup(&p);
        }
        max.z += params.offset;

        let center_light = (min + max) / 2.0;
        let center = rotation
            .try_inverse()
            .unwrap_or_else(Mat4::identity)
            .transform_point(&Point3::from(center_light))
            .coords;
        let light_view = rotation * Mat4::new_translation(&-center);

        let width = max.x - min.x;
        let height = max.y - min.y;
        let length = max.z - min.z;
        let projection = Mat4::new_orthographic(
            -width / 2.0,
            width / 2.0,
            -height / 2.0,
            height / 2.0,
            -length / 2.0,
            length / 2.0,
        );
        log::trace!("Shadow box {}x{}x{} centred at {:?}", width, height, length, center);

        Self { light_view, projection, center, width, height, length }
    }

    /// World-to-light view matrix
    pub const fn light_view(&self) -> &Mat4 {
        &self.light_view
    }

    /// Orthographic projection
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Box centre in world space
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Width, height and length in light space
    pub const fn dimensions(&self) -> (f32, f32, f32) {
        (self.width, self.height, self.length)
    }

    /// Projection times light view
    pub fn light_space_matrix(&self) -> Mat4 {
        self.projection * self.light_view
    }

    /// Matrix taking world positions to shadow map texture space `[0, 1]`
    pub fn to_shadow_map_space(&self) -> Mat4 {
        let bias = Mat4::new_translation(&Vec3::repeat(0.5)) * Mat4::new_scaling(0.5);
        bias * self.light_space_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ShadowBoxParams {
        ShadowBoxParams {
            fov_degrees: 70.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            shadow_distance: 150.0,
            offset: 10.0,
        }
    }

    fn sun() -> Vec3 {
        Vec3::new(0.3, -1.0, 0.2)
    }

    #[test]
    fn test_deterministic() {
        let camera = Camera::new(Vec3::new(10.0, 5.0, -3.0)).with_orientation(15.0, 40.0);
        let a = ShadowBox::compute(&camera, &sun(), &params());
        let b = ShadowBox::compute(&camera, &sun(), &params());
        assert_eq!(a, b);
    }

    #[test]
    fn test_encloses_camera_slice() {
        let camera = Camera::new(Vec3::new(0.0, 20.0, 0.0)).with_orientation(10.0, -30.0);
        let shadow_box = ShadowBox::compute(&camera, &sun(), &params());
        let matrix = shadow_box.light_space_matrix();
        for corner in ShadowBox::frustum_corners(&camera, &params()) {
            let ndc = matrix.transform_point(&Point3::from(corner));
            for axis in 0..3 {
                assert!(ndc[axis].abs() <= 1.0 + 1e-3, "corner {:?} maps to {:?}", corner, ndc);
            }
        }
    }

    #[test]
    fn test_follows_camera() {
        let a = ShadowBox::compute(&Camera::new(Vec3::zeros()), &sun(), &params());
        let b = ShadowBox::compute(&Camera::new(Vec3::new(50.0, 0.0, 0.0)), &sun(), &params());
        assert!((b.center().x - a.center().x - 50.0).abs() < 1e-2);
        let (wa, ha, la) = a.dimensions();
        let (wb, hb, lb) = b.dimensions();
        assert!((wa - wb).abs() < 1e-2 && (ha - hb).abs() < 1e-2 && (la - lb).abs() < 1e-2);
    }

    #[test]
    fn test_vertical_light() {
        let camera = Camera::new(Vec3::zeros());
        let shadow_box = ShadowBox::compute(&camera, &Vec3::new(0.0, -1.0, 0.0), &params());
        assert!(shadow_box.light_view().iter().all(|v| v.is_finite()));
    }
}
