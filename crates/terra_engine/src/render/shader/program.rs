//! Linked program with cached uniform locations

use std::collections::HashMap;

use crate::render::api::{GraphicsDevice, ProgramId, ShaderSource, UniformLocation, UniformValue};
use crate::render::{RenderError, RenderResult};

/// Name of element `index` of a uniform array, e.g. `lightColour[2]`
pub fn array_uniform(name: &str, index: usize) -> String {
    format!("{name}[{index}]")
}

/// Compiled program plus its uniform location cache
#[derive(Debug)]
pub struct ShaderProgram {
    name: &'static str,
    program: ProgramId,
    locations: HashMap<String, UniformLocation>,
    disposed: bool,
}

impl ShaderProgram {
    /// Compile, link, and resolve the listed uniforms once
    ///
    /// Uniforms the linker optimised away are logged and skipped; setting
    /// them later is a no-op, matching GL's location `-1` behaviour.
    pub fn new<S: AsRef<str>>(
        device: &mut dyn GraphicsDevice,
        source: &ShaderSource,
        uniforms: &[S],
    ) -> RenderResult<Self> {
        let program = device.create_program(source).map_err(|e| {
            log::error!("Shader program '{}' failed: {}", source.name, e);
            e
        })?;

        let mut locations = HashMap::with_capacity(uniforms.len());
        for uniform in uniforms {
            let uniform = uniform.as_ref();
            match device.uniform_location(program, uniform) {
                Some(location) => {
                    locations.insert(uniform.to_string(), location);
                }
                None => log::warn!("Uniform '{}' not active in program '{}'", uniform, source.name),
            }
        }

        log::info!("Linked shader program '{}' ({} uniforms)", source.name, locations.len());
        Ok(Self {
            name: source.name,
            program,
            locations,
            disposed: false,
        })
    }

    /// Program name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Program handle
    pub const fn id(&self) -> ProgramId {
        self.program
    }

    /// Whether a uniform location was cached at link time
    pub fn has_uniform(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    /// Make this program current
    ///
    /// Fails if any program, this one included, is already active.
    pub fn start(&self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        if let Some(active) = device.active_program() {
            return Err(RenderError::ProgramAlreadyActive {
                active,
                requested: self.program,
            });
        }
        device.use_program(Some(self.program));
        Ok(())
    }

    /// Release this program; fails unless it is the active one
    pub fn stop(&self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        if device.active_program() != Some(self.program) {
            return Err(RenderError::ProgramNotActive(self.program));
        }
        device.use_program(None);
        Ok(())
    }

    /// Run `body` with this program active, stopping it even if `body` fails
    pub fn with_active<R>(
        &self,
        device: &mut dyn GraphicsDevice,
        body: impl FnOnce(&mut dyn GraphicsDevice) -> RenderResult<R>,
    ) -> RenderResult<R> {
        self.start(device)?;
        let result = body(device);
        let stopped = self.stop(device);
        let value = result?;
        stopped?;
        Ok(value)
    }

    /// Upload a value using the cached location
    pub fn set(&self, device: &mut dyn GraphicsDevice, name: &str, value: impl Into<UniformValue>) {
        if let Some(location) = self.locations.get(name) {
            device.set_uniform(*location, &value.into());
        } else {
            log::trace!("Skipping uniform '{}' on '{}'", name, self.name);
        }
    }

    /// Assign sampler uniforms to texture units (start, set, stop)
    pub fn connect_texture_units(&self, device: &mut dyn GraphicsDevice, units: &[(&str, i32)]) -> RenderResult<()> {
        self.start(device)?;
        for (name, unit) in units {
            self.set(device, name, *unit);
        }
        self.stop(device)
    }

    /// Delete the program; further calls do nothing
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        if self.disposed {
            return;
        }
        if device.active_program() == Some(self.program) {
            device.use_program(None);
        }
        device.delete_program(self.program);
        self.locations.clear();
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{DeviceCommand, RecordingDevice};

    const SOURCE: ShaderSource = ShaderSource {
        name: "unit",
        vertex: "",
        fragment: "",
        attributes: &["position"],
    };

    #[test]
    fn test_locations_cached_at_link_time() {
        let mut device = RecordingDevice::new(100, 100);
        let program = ShaderProgram::new(&mut device, &SOURCE, &["a", "b"]).unwrap();
        assert!(program.has_uniform("a"));
        assert!(!program.has_uniform("c"));

        device.clear_commands();
        program.start(&mut device).unwrap();
        program.set(&mut device, "a", 1.5_f32);
        program.set(&mut device, "c", 1.5_f32);
        program.stop(&mut device).unwrap();
        assert_eq!(device.count(|c| matches!(c, DeviceCommand::SetUniform(..))), 1);
        assert_eq!(device.uniform_value(program.id(), "a"), Some(UniformValue::Float(1.5)));
    }

    #[test]
    fn test_nesting_rejected() {
        let mut device = RecordingDevice::new(100, 100);
        let first = ShaderProgram::new(&mut device, &SOURCE, &[] as &[&str]).unwrap();
        let second = ShaderProgram::new(&mut device, &SOURCE, &[] as &[&str]).unwrap();

        first.start(&mut device).unwrap();
        assert!(matches!(
            second.start(&mut device),
            Err(RenderError::ProgramAlreadyActive { .. })
        ));
        assert!(matches!(second.stop(&mut device), Err(RenderError::ProgramNotActive(_))));
        first.stop(&mut device).unwrap();
        second.start(&mut device).unwrap();
        second.stop(&mut device).unwrap();
    }

    #[test]
    fn test_link_failure_is_fatal() {
        let mut device = RecordingDevice::new(100, 100);
        device.fail_program("unit");
        let result = ShaderProgram::new(&mut device, &SOURCE, &["a"]);
        assert!(matches!(result, Err(RenderError::ShaderLink { .. })));
    }

    #[test]
    fn test_dispose_twice() {
        let mut device = RecordingDevice::new(100, 100);
        let mut program = ShaderProgram::new(&mut device, &SOURCE, &["a"]).unwrap();
        program.dispose(&mut device);
        program.dispose(&mut device);
        assert_eq!(device.count(|c| matches!(c, DeviceCommand::DeleteProgram(_))), 1);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_array_uniform_name() {
        assert_eq!(array_uniform("lightColour", 3), "lightColour[3]");
    }
}
