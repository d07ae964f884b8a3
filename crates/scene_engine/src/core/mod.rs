//! Startup settings shared by [`Engine`](crate::Engine) and the demo binary

pub mod config;

pub use config::{
    ApplicationConfig, AssetConfig, Config, ConfigError, RenderConfig, ViewportConfig, WindowConfig,
};
