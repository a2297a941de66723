//! Scene lights
//!
//! Lights are a closed sum type. A frame has exactly one directional sun
//! plus any number of point and spot lights; the shaders have
//! [`MAX_LIGHTS`] slots, so uploads take the lights nearest the camera and
//! pad the rest with black lights alongside an explicit active count.

use crate::foundation::math::{utils::deg_to_rad, Vec3};
use crate::render::{RenderError, RenderResult};

/// Uniform array size in the lit shaders
pub const MAX_LIGHTS: usize = 4;

/// Infinitely distant light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels (normalized on use)
    pub direction: Vec3,
    /// Linear RGB colour
    pub colour: Vec3,
    /// Colour multiplier
    pub intensity: f32,
}

/// Positional light with distance attenuation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World position
    pub position: Vec3,
    /// Linear RGB colour
    pub colour: Vec3,
    /// Constant, linear and quadratic attenuation coefficients
    pub attenuation: Vec3,
}

/// Point light restricted to a cone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    /// Position, colour and attenuation
    pub light: PointLight,
    /// Cone axis
    pub direction: Vec3,
    /// Half-angle of the cone in degrees
    pub cone_angle: f32,
}

/// Any light in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Sun
    Directional(DirectionalLight),
    /// Omnidirectional local light
    Point(PointLight),
    /// Cone-limited local light
    Spot(SpotLight),
}

impl DirectionalLight {
    /// White light travelling along `direction`
    pub fn new(direction: Vec3, colour: Vec3) -> Self {
        Self { direction, colour, intensity: 1.0 }
    }

    /// Normalized travel direction (falls back to straight down)
    pub fn unit_direction(&self) -> Vec3 {
        self.direction
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| Vec3::new(0.0, -1.0, 0.0))
    }
}

impl PointLight {
    /// Light without falloff
    pub fn new(position: Vec3, colour: Vec3) -> Self {
        Self {
            position,
            colour,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
        }
    }

    /// Set attenuation coefficients
    pub fn with_attenuation(mut self, attenuation: Vec3) -> Self {
        self.attenuation = attenuation;
        self
    }
}

impl Light {
    fn position(&self) -> Option<Vec3> {
        match self {
            Self::Directional(_) => None,
            Self::Point(p) => Some(p.position),
            Self::Spot(s) => Some(s.light.position),
        }
    }
}

/// One slot of the shader light arrays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSlot {
    /// World position
    pub position: Vec3,
    /// Colour; zero for unused slots
    pub colour: Vec3,
    /// Attenuation coefficients
    pub attenuation: Vec3,
    /// Cone axis (spot lights)
    pub spot_direction: Vec3,
    /// Cosine of the cone half-angle, `-1` for point lights
    pub spot_cutoff: f32,
}

impl LightSlot {
    /// Black light used to pad unused slots
    pub const EMPTY: Self = Self {
        position: Vec3::new(0.0, 0.0, 0.0),
        colour: Vec3::new(0.0, 0.0, 0.0),
        attenuation: Vec3::new(1.0, 0.0, 0.0),
        spot_direction: Vec3::new(0.0, -1.0, 0.0),
        spot_cutoff: -1.0,
    };

    fn from_light(light: &Light) -> Option<Self> {
        match light {
            Light::Directional(_) => None,
            Light::Point(p) => Some(Self {
                position: p.position,
                colour: p.colour,
                attenuation: p.attenuation,
                ..Self::EMPTY
            }),
            Light::Spot(s) => Some(Self {
                position: s.light.position,
                colour: s.light.colour,
                attenuation: s.light.attenuation,
                spot_direction: s.direction,
                spot_cutoff: deg_to_rad(s.cone_angle).cos(),
            }),
        }
    }
}

/// Light values ready for upload, always [`MAX_LIGHTS`] slots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightUniforms {
    /// Sun travel direction
    pub sun_direction: Vec3,
    /// Sun colour times intensity
    pub sun_colour: Vec3,
    /// Padded local light slots
    pub slots: [LightSlot; MAX_LIGHTS],
    /// Slots holding real lights
    pub active: usize,
}

/// The lights of one frame: one sun plus local lights
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLights {
    sun: DirectionalLight,
    local: Vec<Light>,
}

impl SceneLights {
    /// Lights with only a sun
    pub fn new(sun: DirectionalLight) -> Self {
        Self { sun, local: Vec::new() }
    }

    /// Build from a mixed list; exactly one directional light is required
    pub fn from_lights(lights: &[Light]) -> RenderResult<Self> {
        let mut suns = lights.iter().filter_map(|l| match l {
            Light::Directional(d) => Some(*d),
            _ => None,
        });
        let sun = suns
            .next()
            .ok_or_else(|| RenderError::InvalidLightSetup("no directional light".to_string()))?;
        if suns.next().is_some() {
            return Err(RenderError::InvalidLightSetup(
                "more than one directional light".to_string(),
            ));
        }
        Ok(Self {
            sun,
            local: lights.iter().filter(|l| l.position().is_some()).copied().collect(),
        })
    }

    /// Add a point or spot light
    pub fn push(&mut self, light: Light) -> RenderResult<()> {
        if light.position().is_none() {
            return Err(RenderError::InvalidLightSetup(
                "the sun is set at construction; a second directional light is not allowed".to_string(),
            ));
        }
        self.local.push(light);
        Ok(())
    }

    /// Remove all local lights
    pub fn clear_local(&mut self) {
        self.local.clear();
    }

    /// The sun
    pub const fn sun(&self) -> &DirectionalLight {
        &self.sun
    }

    /// Mutable sun
    pub fn sun_mut(&mut self) -> &mut DirectionalLight {
        &mut self.sun
    }

    /// Point and spot lights
    pub fn local_lights(&self) -> &[Light] {
        &self.local
    }

    /// Select the nearest local lights to `camera` and pad to [`MAX_LIGHTS`]
    pub fn uniforms(&self, camera: &Vec3) -> LightUniforms {
        let mut nearest: Vec<(f32, &Light)> = self
            .local
            .iter()
            .filter_map(|l| l.position().map(|p| ((p - camera).norm_squared(), l)))
            .collect();
        nearest.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut slots = [LightSlot::EMPTY; MAX_LIGHTS];
        let mut active = 0;
        for (slot, (_, light)) in slots.iter_mut().zip(nearest.iter()) {
            if let Some(filled) = LightSlot::from_light(light) {
                *slot = filled;
                active += 1;
            }
        }

        LightUniforms {
            sun_direction: self.sun.unit_direction(),
            sun_colour: self.sun.colour * self.sun.intensity,
            slots,
            active,
        }
    }
}
