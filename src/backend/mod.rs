//! GPU backend
//!
//! The renderer refers to GPU objects through small copyable handles;
//! [`wgpu_backend::WgpuBackend`] owns the objects behind them.

pub mod types;
pub mod wgpu_backend;

pub use types::*;

use thiserror::Error;

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to initialize backend: {0}")]
    InitializationFailed(String),
    #[error("Failed to create surface: {0}")]
    SurfaceCreationFailed(String),
    #[error("Failed to create device: {0}")]
    DeviceCreationFailed(String),
    #[error("Failed to acquire next image: {0}")]
    AcquireImageFailed(String),
    #[error("Unknown {0} handle")]
    MissingResource(&'static str),
    #[error("Surface lost")]
    SurfaceLost,
    #[error("Out of memory")]
    OutOfMemory,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferHandle(pub(crate) u64);

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHandle(pub(crate) u64);

/// Handle to a texture view, including the current swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureViewHandle(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPipelineHandle(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupHandle(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupLayoutHandle(pub(crate) u64);
