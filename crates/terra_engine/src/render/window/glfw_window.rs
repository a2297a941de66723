//! GLFW window with an OpenGL 3.3 core context

#![allow(unsafe_code)]

use glfw::Context as _;

use crate::config::WindowConfig;
use crate::foundation::time::Timer;
use crate::render::api::Viewport;
use crate::render::window::{WindowError, WindowResult, WindowSurface};

/// Native window owning the GL context
pub struct GlfwWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    timer: Timer,
    size: Viewport,
    resized: bool,
}

impl GlfwWindow {
    /// Open a window, make its context current and load GL functions
    pub fn new(config: &WindowConfig) -> WindowResult<(Self, glow::Context)> {
        let mut glfw =
            glfw::init(glfw::fail_on_errors).map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        glfw.set_swap_interval(if config.vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        });

        // SAFETY: the context was made current on this thread above.
        let gl = unsafe { glow::Context::from_loader_function(|name| window.get_proc_address(name) as *const _) };

        let (width, height) = window.get_framebuffer_size();
        log::info!("Opened window '{}' ({}x{})", config.title, width, height);
        Ok((
            Self {
                glfw,
                window,
                events,
                timer: Timer::new(),
                size: Viewport::new(width.max(1) as u32, height.max(1) as u32),
                resized: false,
            },
            gl,
        ))
    }

    /// Whether the framebuffer changed size since the last call
    pub fn take_resize(&mut self) -> Option<Viewport> {
        std::mem::take(&mut self.resized).then_some(self.size)
    }

    /// Frame timer
    pub const fn timer(&self) -> &Timer {
        &self.timer
    }
}

impl WindowSurface for GlfwWindow {
    fn size(&self) -> Viewport {
        self.size
    }

    fn frame_time(&self) -> f32 {
        self.timer.delta_time()
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn swap_buffers(&mut self) {
        self.window.swap_buffers();
        self.timer.update();
    }

    fn poll_events(&mut self) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                glfw::WindowEvent::FramebufferSize(width, height) if width > 0 && height > 0 => {
                    self.size = Viewport::new(width as u32, height as u32);
                    self.resized = true;
                }
                glfw::WindowEvent::Key(glfw::Key::Escape, _, glfw::Action::Press, _) => {
                    self.window.set_should_close(true);
                }
                _ => {}
            }
        }
    }
}
