//! Application trait and lifecycle management

use crate::assets::AssetError;
use crate::engine::{Engine, EngineError};
use crate::input::{key_from_glfw, mouse_button_from_glfw, KeyCode, MouseButton};
use crate::render::{ModelError, RenderError, ShaderError, TextureError};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to put a scene on screen with [`Engine::run`].
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the window and GL context exist. Load shaders,
    /// textures, meshes and models here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame before [`render`](Self::render).
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Draw one frame into every render context
    fn render(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Handle application events
    ///
    /// The default forwards to the engine, which keeps the input state and
    /// the running flag current.
    fn handle_event(&mut self, engine: &mut Engine, event: AppEvent) -> Result<(), AppError> {
        engine.handle_event(event)
    }

    /// Cleanup the application
    ///
    /// Called before the GL context is destroyed, also after a failed frame.
    /// Drop every GPU resource the application holds here.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Draw or GPU resource error
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Shader source, compile or link error
    #[error("Shader error: {0}")]
    Shader(#[from] ShaderError),

    /// Texture loading error
    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    /// Model import error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Asset loading error
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}

/// Application events
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Framebuffer was resized
    WindowResized {
        /// New framebuffer width
        width: u32,
        /// New framebuffer height
        height: u32,
    },

    /// Window close requested
    WindowCloseRequested,

    /// Key input event
    KeyInput {
        /// The key that was pressed/released
        key: KeyCode,
        /// Whether the key was pressed (true) or released (false)
        pressed: bool,
    },

    /// Mouse button event
    MouseButton {
        /// The mouse button that was pressed/released
        button: MouseButton,
        /// Whether the button was pressed (true) or released (false)
        pressed: bool,
    },

    /// Mouse movement
    MouseMoved {
        /// New X coordinate
        x: f64,
        /// New Y coordinate
        y: f64,
    },
}

impl AppEvent {
    /// Translate a window event; `None` for events the engine ignores
    pub fn from_window_event(event: &glfw::WindowEvent) -> Option<Self> {
        use glfw::{Action, WindowEvent};

        match *event {
            WindowEvent::Close => Some(Self::WindowCloseRequested),
            WindowEvent::FramebufferSize(width, height) => Some(Self::WindowResized {
                width: width.max(0) as u32,
                height: height.max(0) as u32,
            }),
            WindowEvent::Key(key, _, action, _) => Some(Self::KeyInput {
                key: key_from_glfw(key)?,
                pressed: action != Action::Release,
            }),
            WindowEvent::MouseButton(button, action, _) => Some(Self::MouseButton {
                button: mouse_button_from_glfw(button)?,
                pressed: action == Action::Press,
            }),
            WindowEvent::CursorPos(x, y) => Some(Self::MouseMoved { x, y }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glfw::{Action, Modifiers, WindowEvent};

    #[test]
    fn test_key_events_translate() {
        let press = WindowEvent::Key(glfw::Key::W, 0, Action::Press, Modifiers::empty());
        let repeat = WindowEvent::Key(glfw::Key::W, 0, Action::Repeat, Modifiers::empty());
        let release = WindowEvent::Key(glfw::Key::W, 0, Action::Release, Modifiers::empty());

        assert_eq!(
            AppEvent::from_window_event(&press),
            Some(AppEvent::KeyInput { key: KeyCode::W, pressed: true })
        );
        assert_eq!(
            AppEvent::from_window_event(&repeat),
            Some(AppEvent::KeyInput { key: KeyCode::W, pressed: true })
        );
        assert_eq!(
            AppEvent::from_window_event(&release),
            Some(AppEvent::KeyInput { key: KeyCode::W, pressed: false })
        );
    }

    #[test]
    fn test_untracked_events_are_dropped() {
        let unknown_key = WindowEvent::Key(glfw::Key::F1, 0, Action::Press, Modifiers::empty());
        assert_eq!(AppEvent::from_window_event(&unknown_key), None);
        assert_eq!(AppEvent::from_window_event(&WindowEvent::Focus(true)), None);
    }

    #[test]
    fn test_window_events_translate() {
        assert_eq!(
            AppEvent::from_window_event(&WindowEvent::Close),
            Some(AppEvent::WindowCloseRequested)
        );
        assert_eq!(
            AppEvent::from_window_event(&WindowEvent::FramebufferSize(1024, 768)),
            Some(AppEvent::WindowResized { width: 1024, height: 768 })
        );
        let click = WindowEvent::MouseButton(glfw::MouseButton::Button1, Action::Press, Modifiers::empty());
        assert_eq!(
            AppEvent::from_window_event(&click),
            Some(AppEvent::MouseButton { button: MouseButton::Left, pressed: true })
        );
    }
}
