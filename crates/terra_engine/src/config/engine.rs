//! # Engine Configuration
//!
//! Settings for the window, the scene renderer, the shadow pass, the water
//! passes and terrain generation. Every struct uses `#[serde(default)]`, so a
//! config file only has to name the values it changes.
//!
//! The numeric defaults are one consistent set: 70° field of view, near
//! plane 0.1, far plane 1000, shadow distance 150, 2048² shadow map,
//! 320×180 reflection target and 1280×720 refraction target.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial framebuffer width in pixels
    pub width: u32,
    /// Initial framebuffer height in pixels
    pub height: u32,
    /// Synchronize buffer swaps with the display refresh
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Terra Engine".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Main pass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip plane distance
    pub near_plane: f32,
    /// Far clip plane distance
    pub far_plane: f32,
    /// Clear and fog colour (linear RGB)
    pub sky_colour: [f32; 3],
    /// Draw polygon outlines instead of filled triangles
    pub wireframe: bool,
    /// Reject objects whose bounding sphere lies outside the view frustum
    pub frustum_culling: bool,
    /// Radius of the sphere used for the frustum test
    pub frustum_test_radius: f32,
    /// Draw the skybox cube after the scene
    pub render_skybox: bool,
    /// Render the main pass offscreen and run the contrast post-process
    pub post_processing: bool,
    /// Contrast boost applied by the post-process pass
    pub contrast: f32,
    /// Number of rows in a texture atlas when a material does not override it
    pub texture_atlas_rows: u32,
    /// Skybox rotation speed in degrees per second
    pub skybox_rotation_speed: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            sky_colour: [0.5444, 0.62, 0.69],
            wireframe: false,
            frustum_culling: true,
            frustum_test_radius: 15.0,
            render_skybox: true,
            post_processing: false,
            contrast: 0.3,
            texture_atlas_rows: 1,
            skybox_rotation_speed: 1.0,
        }
    }
}

/// Shadow pass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Render the shadow pass at all
    pub enabled: bool,
    /// Distance from the near plane covered by the shadow map
    pub shadow_distance: f32,
    /// Shadow map width and height in texels
    pub map_size: u32,
    /// Extra depth added towards the light so off-screen casters still cast
    pub offset: f32,
    /// Distance over which shadows fade out before `shadow_distance`
    pub transition_distance: f32,
    /// Percentage-closer filter radius in texels
    pub pcf_count: i32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shadow_distance: 150.0,
            map_size: 2048,
            offset: 10.0,
            transition_distance: 10.0,
            pcf_count: 1,
        }
    }
}

/// Water pass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    /// Reflection target width
    pub reflection_width: u32,
    /// Reflection target height
    pub reflection_height: u32,
    /// Refraction target width
    pub refraction_width: u32,
    /// Refraction target height
    pub refraction_height: u32,
    /// Ripple scroll speed in texture units per second
    pub wave_speed: f32,
    /// Distortion strength of the dudv map
    pub wave_strength: f32,
    /// Clip plane bias so the water edge does not show seams
    pub clip_bias: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            reflection_width: 320,
            reflection_height: 180,
            refraction_width: 1280,
            refraction_height: 720,
            wave_speed: 0.03,
            wave_strength: 0.04,
            clip_bias: 0.0,
        }
    }
}

/// Terrain generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Edge length of one terrain tile in world units
    pub size: f32,
    /// Grid vertices per tile edge for generated terrain
    pub vertex_count: usize,
    /// Maximum absolute height
    pub max_height: f32,
    /// Noise octaves for generated terrain
    pub octaves: u32,
    /// Amplitude falloff per octave
    pub roughness: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 800.0,
            vertex_count: 128,
            max_height: 40.0,
            octaves: 3,
            roughness: 0.3,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: LogLevel,
    /// Window settings
    pub window: WindowConfig,
    /// Main pass settings
    pub render: RenderConfig,
    /// Shadow pass settings
    pub shadows: ShadowConfig,
    /// Water pass settings
    pub water: WaterConfig,
    /// Terrain generation settings
    pub terrain: TerrainConfig,
}

/// Log filter string wrapper with a sensible default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Load and validate a configuration file
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Set the window size
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Enable or disable the skybox
    pub fn with_skybox(mut self, enabled: bool) -> Self {
        self.render.render_skybox = enabled;
        self
    }

    /// Enable or disable the shadow pass
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadows.enabled = enabled;
        self
    }

    /// Enable or disable offscreen post-processing
    pub fn with_post_processing(mut self, enabled: bool) -> Self {
        self.render.post_processing = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err("Window dimensions must be non-zero".to_string());
        }
        let render = &self.render;
        if !(1.0..179.0).contains(&render.fov_degrees) {
            return Err(format!("Field of view {} is out of range", render.fov_degrees));
        }
        if render.near_plane <= 0.0 || render.far_plane <= render.near_plane {
            return Err("Clip planes must satisfy 0 < near < far".to_string());
        }
        if render.frustum_test_radius < 0.0 {
            return Err("Frustum test radius cannot be negative".to_string());
        }
        if render.texture_atlas_rows == 0 {
            return Err("Texture atlas needs at least one row".to_string());
        }
        if self.shadows.map_size == 0 {
            return Err("Shadow map size must be non-zero".to_string());
        }
        if self.shadows.shadow_distance <= render.near_plane {
            return Err("Shadow distance must lie beyond the near plane".to_string());
        }
        let water = &self.water;
        if water.reflection_width == 0
            || water.reflection_height == 0
            || water.refraction_width == 0
            || water.refraction_height == 0
        {
            return Err("Water framebuffer dimensions must be non-zero".to_string());
        }
        if self.terrain.vertex_count < 2 {
            return Err("Terrain needs at least 2 vertices per edge".to_string());
        }
        if self.terrain.size <= 0.0 {
            return Err("Terrain size must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.water.reflection_width, 320);
        assert_eq!(config.water.refraction_height, 720);
        assert!((config.render.fov_degrees - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            log_level = "debug"

            [render]
            fov_degrees = 60.0
            render_skybox = false

            [shadows]
            shadow_distance = 100.0
        "#;
        let config = EngineConfig::from_str_with_format(text, "engine.toml").unwrap();
        assert_eq!(config.log_level.0, "debug");
        assert!((config.render.fov_degrees - 60.0).abs() < f32::EPSILON);
        assert!(!config.render.render_skybox);
        assert!((config.shadows.shadow_distance - 100.0).abs() < f32::EPSILON);
        assert_eq!(config.shadows.map_size, 2048);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_ron_parsing() {
        let text = "(window: (width: 800, height: 600), water: (wave_speed: 0.05))";
        let config = EngineConfig::from_str_with_format(text, "engine.ron").unwrap();
        assert_eq!(config.window.width, 800);
        assert!((config.water.wave_speed - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = EngineConfig::from_str_with_format("", "engine.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validation_rejects_bad_planes() {
        let mut config = EngineConfig::default();
        config.render.far_plane = 0.05;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_window_size(640, 480)
            .with_skybox(false)
            .with_shadows(false)
            .with_post_processing(true);
        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert!(!config.render.render_skybox);
        assert!(!config.shadows.enabled);
        assert!(config.render.post_processing);
    }
}
