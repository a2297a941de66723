//! Light uniform upload for the lit programs
//!
//! Every slot of the light arrays is written on every upload, so a frame
//! with fewer lights than the last never shows a stale light.

use crate::render::api::GraphicsDevice;
use crate::render::shader::array_uniform;
use crate::render::ShaderProgram;
use crate::scene::{LightUniforms, MAX_LIGHTS};

const ARRAYS: [&str; 5] = ["lightPosition", "lightColour", "attenuation", "spotDirection", "spotCutoff"];

/// Names of every light uniform, array elements expanded
pub fn light_uniform_names() -> Vec<String> {
    let mut names = vec![
        "sunDirection".to_string(),
        "sunColour".to_string(),
        "activeLights".to_string(),
    ];
    for array in ARRAYS {
        names.extend((0..MAX_LIGHTS).map(|i| array_uniform(array, i)));
    }
    names
}

/// Write the sun, all slots and the active count
pub fn load_lights(program: &ShaderProgram, device: &mut dyn GraphicsDevice, lights: &LightUniforms) {
    program.set(device, "sunDirection", lights.sun_direction);
    program.set(device, "sunColour", lights.sun_colour);
    for (i, slot) in lights.slots.iter().enumerate() {
        program.set(device, &array_uniform("lightPosition", i), slot.position);
        program.set(device, &array_uniform("lightColour", i), slot.colour);
        program.set(device, &array_uniform("attenuation", i), slot.attenuation);
        program.set(device, &array_uniform("spotDirection", i), slot.spot_direction);
        program.set(device, &array_uniform("spotCutoff", i), slot.spot_cutoff);
    }
    program.set(device, "activeLights", lights.active as i32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::api::{ShaderSource, UniformValue};
    use crate::render::RecordingDevice;
    use crate::scene::{DirectionalLight, Light, PointLight, SceneLights};

    const SOURCE: ShaderSource = ShaderSource { name: "lit", vertex: "", fragment: "", attributes: &[] };

    #[test]
    fn test_fewer_lights_clear_old_slots() {
        let mut device = RecordingDevice::new(8, 8);
        let program = ShaderProgram::new(&mut device, &SOURCE, &light_uniform_names()).unwrap();
        let sun = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let red = Vec3::new(1.0, 0.0, 0.0);

        let mut lights = SceneLights::new(sun);
        for x in 1..=4 {
            lights.push(Light::Point(PointLight::new(Vec3::new(x as f32, 0.0, 0.0), red))).unwrap();
        }
        program.start(&mut device).unwrap();
        load_lights(&program, &mut device, &lights.uniforms(&Vec3::zeros()));
        assert_eq!(device.uniform_value(program.id(), "lightColour[3]"), Some(UniformValue::Vec3(red)));

        let mut fewer = SceneLights::new(sun);
        fewer.push(Light::Point(PointLight::new(Vec3::new(1.0, 0.0, 0.0), red))).unwrap();
        fewer.push(Light::Point(PointLight::new(Vec3::new(2.0, 0.0, 0.0), red))).unwrap();
        load_lights(&program, &mut device, &fewer.uniforms(&Vec3::zeros()));
        program.stop(&mut device).unwrap();

        assert_eq!(device.uniform_value(program.id(), "activeLights"), Some(UniformValue::Int(2)));
        assert_eq!(
            device.uniform_value(program.id(), "lightColour[3]"),
            Some(UniformValue::Vec3(Vec3::zeros()))
        );
        assert_eq!(
            device.uniform_value(program.id(), "lightColour[2]"),
            Some(UniformValue::Vec3(Vec3::zeros()))
        );
    }
}
