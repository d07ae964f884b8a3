//! Window management using GLFW
//!
//! Creates the window with an OpenGL 4.1 core context, pumps its events and
//! switches between windowed and fullscreen mode.

use std::ffi::c_void;

use glfw::Context;
use thiserror::Error;

use crate::core::config::WindowConfig;
use crate::render::device::GlowDevice;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// `glfwInit` failed
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window or its GL context could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Any other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper owning the OpenGL context
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    fullscreen: bool,
    windowed_size: (u32, u32),
}

impl Window {
    /// Create the window and make its GL context current
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(e.to_string()))?;

        let (major, minor) = config.gl_version;
        glfw.window_hint(glfw::WindowHint::ContextVersion(major, minor));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::StencilBits(Some(8)));
        glfw.window_hint(glfw::WindowHint::Resizable(false));

        let (mut window, events) = glfw
            .with_primary_monitor(|glfw, monitor| {
                let mode = match monitor {
                    Some(monitor) if config.fullscreen => glfw::WindowMode::FullScreen(monitor),
                    _ => glfw::WindowMode::Windowed,
                };
                glfw.create_window(config.width, config.height, &config.title, mode)
            })
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        glfw.set_swap_interval(glfw::SwapInterval::None);

        window.set_key_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!(
            "Created {}x{} window '{}' (OpenGL {}.{} core{})",
            config.width,
            config.height,
            config.title,
            major,
            minor,
            if config.fullscreen { ", fullscreen" } else { "" }
        );

        Ok(Self {
            glfw,
            window,
            events,
            fullscreen: config.fullscreen,
            windowed_size: (config.width, config.height),
        })
    }

    /// Load the OpenGL functions of this window's context
    ///
    /// The returned device must be dropped before the window.
    #[allow(unsafe_code)]
    pub fn create_device(&mut self) -> GlowDevice {
        let window = &mut self.window;
        // SAFETY: `new` made this context current on the calling thread and
        // the caller keeps the window alive for as long as the device.
        unsafe { GlowDevice::from_loader(|name| window.get_proc_address(name) as *const c_void) }
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request (or cancel) closing the window
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Process pending window system events
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Events received since the last call
    pub fn drain_events(&self) -> Vec<glfw::WindowEvent> {
        glfw::flush_messages(&self.events).map(|(_, event)| event).collect()
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    /// Window size in screen coordinates
    pub fn size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width as u32, height as u32)
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width as u32, height as u32)
    }

    /// Switch between windowed and fullscreen mode on the primary monitor
    pub fn toggle_fullscreen(&mut self) {
        if self.fullscreen {
            let (width, height) = self.windowed_size;
            self.window
                .set_monitor(glfw::WindowMode::Windowed, 100, 100, width, height, None);
            self.fullscreen = false;
            log::info!("Switched to windowed mode");
            return;
        }

        self.windowed_size = self.size();
        let window = &mut self.window;
        let switched = self.glfw.with_primary_monitor(|_, monitor| {
            let Some(monitor) = monitor else {
                return false;
            };
            let Some(mode) = monitor.get_video_mode() else {
                return false;
            };
            window.set_monitor(
                glfw::WindowMode::FullScreen(monitor),
                0,
                0,
                mode.width,
                mode.height,
                Some(mode.refresh_rate),
            );
            true
        });

        if switched {
            self.fullscreen = true;
            log::info!("Switched to fullscreen mode");
        } else {
            log::warn!("No primary monitor available for fullscreen");
        }
    }
}
