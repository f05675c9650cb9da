//! Idle Vignette - a small looping 3D scene rendered with wgpu
//!
//! A blocky figure idles beside a tree on a green plane while a field of
//! stars wobbles overhead, all seen from a fixed camera.
//!
//! The crate is split into a headless core and the renderer:
//! - [`scene`], [`resources`] and [`animation`] build and animate the scene
//!   graph without touching the GPU
//! - [`vignette::Vignette`] owns a scene and its start/tick/resize/stop lifecycle
//! - [`Engine`] draws a scene graph through the wgpu backend
//! - [`window::run`] (native) and the `web` module (wasm32) drive the loop

pub mod animation;
pub mod backend;
pub mod engine;
pub mod error;
pub mod resources;
pub mod scene;
pub mod vignette;

#[cfg(not(target_arch = "wasm32"))]
pub mod window;

// Web-specific modules
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use animation::{FigureSpin, StarMotion};
pub use backend::wgpu_backend::WgpuBackend;
pub use engine::Engine;
pub use error::VignetteError;
pub use vignette::{Vignette, VignetteState};

/// Configuration for the vignette and its window
#[derive(Debug, Clone)]
pub struct VignetteConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Enable vsync
    pub vsync: bool,
    /// How stars move each tick
    pub star_motion: StarMotion,
    /// How the figure turns
    pub figure_spin: FigureSpin,
    /// Fixed seed for star placement; entropy when unset
    pub seed: Option<u64>,
    /// Background color, linear RGBA
    pub clear_color: [f32; 4],
}

impl Default for VignetteConfig {
    fn default() -> Self {
        Self {
            title: "Idle Vignette".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            star_motion: StarMotion::default(),
            figure_spin: FigureSpin::default(),
            seed: None,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Install `env_logger`, defaulting to `info` unless `RUST_LOG` says otherwise
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

// Web initialization helper
#[cfg(target_arch = "wasm32")]
pub fn init_web_logging() {
    // Set up panic hook for better error messages in console
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set: {}", e).into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = VignetteConfig::default();
        assert_eq!(config.title, "Idle Vignette");
        assert_eq!((config.width, config.height), (1280, 720));
        assert!(config.vsync);
        assert_eq!(config.star_motion, StarMotion::Accumulate);
        assert_eq!(config.figure_spin, FigureSpin::PerTick { radians: 0.01 });
        assert_eq!(config.seed, None);
        assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
    }
}
