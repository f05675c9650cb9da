//! Top-level error type

use crate::backend::BackendError;
use crate::scene::SceneError;
use thiserror::Error;

/// Failures surfaced by the run loops and vignette construction
#[derive(Error, Debug)]
pub enum VignetteError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Failed to build scene: {0}")]
    Scene(#[from] SceneError),
    /// The browser page is missing something the renderer needs
    #[error("Browser environment unavailable: {0}")]
    Web(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_backend_errors_transparently() {
        let err: VignetteError = BackendError::SurfaceLost.into();
        assert!(matches!(err, VignetteError::Backend(BackendError::SurfaceLost)));
        assert_eq!(err.to_string(), "Surface lost");
    }

    #[test]
    fn describes_web_failures() {
        let err = VignetteError::Web("no document".into());
        assert_eq!(err.to_string(), "Browser environment unavailable: no document");
    }
}
