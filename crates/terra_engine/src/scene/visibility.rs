//! Per-pass visibility filter
//!
//! The predicate is evaluated for every object on the rayon pool and
//! written into a renderer-owned `Vec<bool>`; the objects themselves are
//! never touched. Callers join the work before consuming the flags.

use rayon::prelude::*;

use crate::foundation::math::{Vec3, Vec4};
use crate::scene::frustum::Frustum;
use crate::scene::object::RenderableObject;

/// Inputs shared by every visibility test in one pass
#[derive(Debug, Clone, Copy)]
pub struct VisibilityQuery<'a> {
    /// Camera position of the pass
    pub camera_position: Vec3,
    /// View frustum; `None` when culling is disabled
    pub frustum: Option<&'a Frustum>,
    /// Sphere radius used for the frustum test
    pub test_radius: f32,
    /// Clip plane of the pass, `(nx, ny, nz, d)`
    pub clip_plane: Option<Vec4>,
}

impl VisibilityQuery<'_> {
    /// Whether `object` takes part in this pass
    pub fn is_visible(&self, object: &RenderableObject) -> bool {
        if !object.renderable {
            return false;
        }
        if (object.position - self.camera_position).norm() >= object.render_distance {
            return false;
        }
        if let Some(frustum) = self.frustum {
            if !frustum.contains_sphere(&object.position, self.test_radius) {
                return false;
            }
        }
        match self.clip_plane {
            Some(plane) => plane.dot(&object.position.push(1.0)) >= 0.0,
            None => true,
        }
    }
}

/// Evaluate `query` for every object into `out` (resized to match)
pub fn compute_visibility(objects: &[RenderableObject], query: &VisibilityQuery<'_>, out: &mut Vec<bool>) {
    objects
        .par_iter()
        .map(|object| query.is_visible(object))
        .collect_into_vec(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::render::api::{TextureId, VertexArrayId};
    use crate::render::{Model, ModelId};
    use crate::scene::camera::{perspective_projection, Camera};
    use crate::scene::material::{Material, TexturedModel};

    fn textured() -> TexturedModel {
        let model = Model::new(ModelId(1), VertexArrayId(1), 36, true);
        TexturedModel::new(model, Material::new(TextureId(1)).shared())
    }

    fn query(clip_plane: Option<Vec4>) -> VisibilityQuery<'static> {
        VisibilityQuery {
            camera_position: Vec3::zeros(),
            frustum: None,
            test_radius: 15.0,
            clip_plane,
        }
    }

    #[test]
    fn test_clip_plane_exclusion() {
        let object = RenderableObject::new(textured(), Vec3::new(0.0, -5.0, -10.0));
        assert!(!query(Some(Vec4::new(0.0, 1.0, 0.0, 0.0))).is_visible(&object));
        assert!(query(Some(Vec4::new(0.0, -1.0, 0.0, 0.0))).is_visible(&object));
        assert!(query(None).is_visible(&object));
    }

    #[test]
    fn test_render_distance_and_flag() {
        let near = RenderableObject::new(textured(), Vec3::new(0.0, 0.0, -10.0)).with_render_distance(20.0);
        let far = RenderableObject::new(textured(), Vec3::new(0.0, 0.0, -30.0)).with_render_distance(20.0);
        let mut hidden = near.clone();
        hidden.renderable = false;

        let mut flags = Vec::new();
        compute_visibility(&[near, far, hidden], &query(None), &mut flags);
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_matches_predicate_for_random_scenes() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let camera = Camera::new(Vec3::new(0.0, 2.0, 0.0)).with_orientation(5.0, 30.0);
        let frustum = Frustum::from_matrix(&(perspective_projection(70.0, 16.0 / 9.0, 0.1, 1000.0) * camera.view_matrix()));

        for _ in 0..8 {
            let objects: Vec<RenderableObject> = (0..200)
                .map(|_| {
                    let position = Vec3::new(
                        rng.gen_range(-300.0..300.0),
                        rng.gen_range(-20.0..20.0),
                        rng.gen_range(-300.0..300.0),
                    );
                    let mut object = RenderableObject::new(textured(), position)
                        .with_render_distance(rng.gen_range(50.0..400.0));
                    object.renderable = rng.gen_bool(0.9);
                    object
                })
                .collect();
            let plane = if rng.gen_bool(0.5) { Some(Vec4::new(0.0, 1.0, 0.0, 1.0)) } else { None };
            let query = VisibilityQuery {
                camera_position: camera.position,
                frustum: Some(&frustum),
                test_radius: 15.0,
                clip_plane: plane,
            };

            let mut flags = Vec::new();
            compute_visibility(&objects, &query, &mut flags);
            assert_eq!(flags.len(), objects.len());

            for (object, visible) in objects.iter().zip(&flags) {
                let expected = object.renderable
                    && (object.position - camera.position).norm() < object.render_distance
                    && frustum.contains_sphere(&object.position, 15.0)
                    && plane.map_or(true, |p| p.x * object.position.x
                        + p.y * object.position.y
                        + p.z * object.position.z
                        + p.w
                        >= 0.0);
                assert_eq!(*visible, expected);
            }
        }
    }
}
