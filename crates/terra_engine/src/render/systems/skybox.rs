//! Skybox renderer
//!
//! A large cube drawn around the camera with the view translation removed,
//! slowly rotating about the vertical axis and blended into the fog colour
//! near the horizon.

use crate::foundation::math::{utils::deg_to_rad, Mat4, Vec3};
use crate::render::api::{GraphicsDevice, TextureId, TextureTarget};
use crate::render::shader::sources;
use crate::render::systems::DrawStats;
use crate::render::{Loader, Model, RenderResult, ShaderProgram};

/// Half-extent of the sky cube
pub const SKY_SIZE: f32 = 500.0;

const CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

// Inward-facing triangles, two per face
const TRIANGLES: [usize; 36] = [
    3, 0, 1, 1, 2, 3, // back
    4, 0, 3, 3, 7, 4, // left
    1, 5, 6, 6, 2, 1, // right
    4, 7, 6, 6, 5, 4, // front
    3, 2, 6, 6, 7, 3, // top
    0, 4, 1, 1, 4, 5, // bottom
];

/// Cube positions for the sky, 36 vertices
pub fn sky_cube_positions(size: f32) -> Vec<f32> {
    TRIANGLES
        .iter()
        .flat_map(|i| CORNERS[*i].map(|c| c * size))
        .collect()
}

/// Renders the cube-mapped sky
#[derive(Debug)]
pub struct SkyboxRenderer {
    shader: ShaderProgram,
    cube: Model,
    cube_map: Option<TextureId>,
    rotation: f32,
    rotation_speed: f32,
}

impl SkyboxRenderer {
    /// Upload the sky cube; without a cube map nothing is drawn
    pub fn new(
        device: &mut dyn GraphicsDevice,
        loader: &mut Loader,
        cube_map: Option<TextureId>,
        rotation_speed: f32,
    ) -> RenderResult<Self> {
        let cube = loader.load_positions(device, &sky_cube_positions(SKY_SIZE), 3)?;
        let shader = ShaderProgram::new(
            device,
            &sources::SKYBOX,
            &["projectionMatrix", "viewMatrix", "cubeMap", "fogColour"],
        )?;
        shader.connect_texture_units(device, &[("cubeMap", 0)])?;
        if cube_map.is_none() {
            log::warn!("Skybox has no cube map; sky will show the clear colour");
        }
        Ok(Self {
            shader,
            cube,
            cube_map,
            rotation: 0.0,
            rotation_speed,
        })
    }

    /// Current rotation in degrees
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Advance the rotation by one frame
    pub fn advance(&mut self, frame_time: f32) {
        self.rotation = (self.rotation + self.rotation_speed * frame_time).rem_euclid(360.0);
    }

    /// View matrix with translation removed and the sky rotation applied
    pub fn sky_view(&self, view: &Mat4) -> Mat4 {
        let mut view = *view;
        view[(0, 3)] = 0.0;
        view[(1, 3)] = 0.0;
        view[(2, 3)] = 0.0;
        view * Mat4::from_axis_angle(&Vec3::y_axis(), deg_to_rad(self.rotation))
    }

    /// Draw the sky
    pub fn render(
        &self,
        device: &mut dyn GraphicsDevice,
        projection: &Mat4,
        view: &Mat4,
        fog_colour: Vec3,
    ) -> RenderResult<DrawStats> {
        let Some(cube_map) = self.cube_map else {
            return Ok(DrawStats::default());
        };
        self.shader.with_active(device, |device| {
            self.shader.set(device, "projectionMatrix", *projection);
            self.shader.set(device, "viewMatrix", self.sky_view(view));
            self.shader.set(device, "fogColour", fog_colour);
            device.bind_vertex_array(Some(self.cube.vao()));
            device.bind_texture(0, TextureTarget::CubeMap, Some(cube_map));
            self.cube.draw(device);
            device.bind_vertex_array(None);
            Ok(DrawStats { model_binds: 1, draw_calls: 1 })
        })
    }

    /// Delete the program (the cube belongs to the loader)
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.shader.dispose(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingDevice;
    use crate::scene::Camera;

    #[test]
    fn test_cube_positions() {
        let positions = sky_cube_positions(SKY_SIZE);
        assert_eq!(positions.len(), 36 * 3);
        assert!(positions.iter().all(|p| p.abs() == SKY_SIZE));
    }

    #[test]
    fn test_sky_ignores_camera_position() {
        let mut device = RecordingDevice::new(8, 8);
        let mut loader = Loader::new();
        let mut sky = SkyboxRenderer::new(&mut device, &mut loader, Some(TextureId(99)), 1.0).unwrap();

        let near = Camera::new(Vec3::zeros()).with_orientation(10.0, 20.0);
        let mut far = near;
        far.position = Vec3::new(300.0, 40.0, -90.0);
        assert_eq!(sky.sky_view(&near.view_matrix()), sky.sky_view(&far.view_matrix()));

        sky.advance(400.0);
        assert!((sky.rotation() - 40.0).abs() < 1e-3);

        sky.dispose(&mut device);
        loader.dispose_all(&mut device);
    }
}
