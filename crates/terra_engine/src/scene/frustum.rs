//! View frustum extraction and culling tests

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Plane in Hessian normal form: `normal · p + d = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the kept half-space
    pub normal: Vec3,
    /// Signed offset
    pub d: f32,
}

impl Plane {
    fn from_row(row: Vec4) -> Self {
        let normal = row.xyz();
        let length = normal.norm();
        if length > f32::EPSILON {
            Self { normal: normal / length, d: row.w / length }
        } else {
            Self { normal, d: row.w }
        }
    }

    /// Signed distance from the plane; positive on the kept side
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// Six clip planes of a view-projection matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extract planes from `projection * view` (Gribb-Hartmann)
    ///
    /// Assumes OpenGL clip space, so the near plane is `row3 + row2`.
    pub fn from_matrix(m: &Mat4) -> Self {
        let row = |r: usize| Vec4::new(m[(r, 0)], m[(r, 1)], m[(r, 2)], m[(r, 3)]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r3 + r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// The six planes: left, right, bottom, top, near, far
    pub const fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Whether a point lies inside every plane
    pub fn contains_point(&self, point: &Vec3) -> bool {
        self.contains_sphere(point, 0.0)
    }

    /// Whether a sphere touches the frustum
    pub fn contains_sphere(&self, center: &Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }
}
