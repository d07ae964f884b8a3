//! Core engine implementation

use std::rc::Rc;
use std::thread;
use std::time::Duration;

use crate::{
    application::{AppError, AppEvent, Application},
    core::config::{ApplicationConfig, ViewportConfig},
    foundation::time::Timer,
    input::{InputManager, KeyCode},
    render::{GlContext, SharedDevice, TextureCache, Viewport, Window},
};
use thiserror::Error;

/// Main engine struct
///
/// Owns the window, the GL context and the shared resources, and drives the
/// main loop. Fields drop in declaration order, so every GPU resource is
/// released while the window's context is still alive.
pub struct Engine {
    /// Textures shared by meshes and models
    textures: TextureCache,

    /// Shader programs, render contexts and the draw gateway
    gl: GlContext,

    /// Input handling system
    input: InputManager,

    /// Frame timing
    timer: Timer,

    /// Engine configuration
    config: ApplicationConfig,

    /// Whether the engine should continue running
    running: bool,

    window: Window,
}

impl Engine {
    /// Create the window, load OpenGL and add one render context per viewport
    pub fn new(config: ApplicationConfig) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");

        let mut window = Window::new(&config.window)
            .map_err(|e| EngineError::InitializationFailed(format!("Window: {}", e)))?;
        let device: SharedDevice = Rc::new(window.create_device());

        let mut gl = GlContext::new(device.clone());
        let (width, height) = window.framebuffer_size();
        for viewport in &config.render.viewports {
            let index = gl.add_render_context(
                pixel_viewport(viewport, width, height),
                viewport.fov,
                viewport.near,
                viewport.far,
            );
            log::debug!("Render context {} covers {:?}", index, viewport);
        }
        gl.set_depth_test(true);

        log::info!(
            "Engine ready: {}x{} framebuffer, {} render context(s)",
            width,
            height,
            gl.render_context_count()
        );

        Ok(Self {
            textures: TextureCache::new(device),
            gl,
            input: InputManager::new(),
            timer: Timer::new(),
            config,
            running: true,
            window,
        })
    }

    /// Run the engine main loop with the given application
    ///
    /// `cleanup` runs on every exit path before the engine is dropped.
    pub fn run<T: Application>(config: ApplicationConfig, app: &mut T) -> Result<(), EngineError> {
        let mut engine = Self::new(config)?;

        let result = engine.main_loop(app);
        app.cleanup(&mut engine);

        log::info!(
            "Engine shutdown complete after {} frames ({:.1} fps average)",
            engine.timer.frame_count(),
            engine.timer.average_fps()
        );
        result
    }

    fn main_loop<T: Application>(&mut self, app: &mut T) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {}", e)))?;

        log::info!("Starting main loop...");
        let frame_delay = Duration::from_millis(self.config.render.frame_delay_ms);

        while self.running {
            let delta_time = self.timer.update();

            self.input.begin_frame();
            self.window.poll_events();
            for event in self.window.drain_events() {
                if let Some(event) = AppEvent::from_window_event(&event) {
                    app.handle_event(self, event)
                        .map_err(|e| EngineError::InputError(format!("App event: {}", e)))?;
                }
            }
            if self.window.should_close() {
                self.running = false;
            }
            if !self.running {
                break;
            }

            app.update(self, delta_time)
                .map_err(|e| EngineError::ApplicationError(format!("App update: {}", e)))?;
            app.render(self)
                .map_err(|e| EngineError::RenderError(format!("App render: {}", e)))?;

            self.window.swap_buffers();
            thread::sleep(frame_delay);
        }

        Ok(())
    }

    /// Handle an application event
    pub fn handle_event(&mut self, event: AppEvent) -> Result<(), AppError> {
        match event {
            AppEvent::WindowCloseRequested => {
                self.quit();
            }
            AppEvent::WindowResized { width, height } => {
                self.resize_render_contexts(width, height)?;
            }
            AppEvent::KeyInput { key, pressed } => {
                let newly_pressed = pressed && !self.input.is_key_down(key);
                self.input.handle_key_input(key, pressed);
                match key {
                    KeyCode::Escape if newly_pressed => self.quit(),
                    KeyCode::F11 if newly_pressed => self.window.toggle_fullscreen(),
                    _ => {}
                }
            }
            AppEvent::MouseButton { button, pressed } => {
                self.input.handle_mouse_button(button, pressed);
            }
            AppEvent::MouseMoved { x, y } => {
                self.input.handle_mouse_move(x, y);
            }
        }
        Ok(())
    }

    fn resize_render_contexts(&mut self, width: u32, height: u32) -> Result<(), AppError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        for (index, viewport) in self.config.render.viewports.iter().enumerate() {
            self.gl
                .render_context_mut(index)?
                .set_viewport(pixel_viewport(viewport, width, height));
        }
        log::debug!("Render contexts resized to {}x{}", width, height);
        Ok(())
    }

    /// Stop the main loop after the current frame
    pub fn quit(&mut self) {
        log::info!("Quit requested");
        self.running = false;
    }

    /// GL context
    pub fn gl(&self) -> &GlContext {
        &self.gl
    }

    /// Mutable GL context
    pub fn gl_mut(&mut self) -> &mut GlContext {
        &mut self.gl
    }

    /// Shared graphics device
    pub fn device(&self) -> SharedDevice {
        self.gl.device().clone()
    }

    /// Texture cache
    pub fn textures_mut(&mut self) -> &mut TextureCache {
        &mut self.textures
    }

    /// Input state
    pub fn input(&self) -> &InputManager {
        &self.input
    }

    /// Window
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Engine configuration
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }
}

fn pixel_viewport(viewport: &ViewportConfig, width: u32, height: u32) -> Viewport {
    let (x, y, w, h) = viewport.to_pixels(width, height);
    Viewport::new(x, y, w, h)
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Rendering error
    #[error("Rendering error: {0}")]
    RenderError(String),

    /// Input handling error
    #[error("Input error: {0}")]
    InputError(String),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
