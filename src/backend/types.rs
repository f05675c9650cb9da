//! Descriptors passed from the renderer to the backend

use super::{BindGroupLayoutHandle, TextureViewHandle};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Color and depth formats the renderer deals with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Depth32Float,
}

impl TextureFormat {
    /// Map a surface format; `None` for formats the renderer never picks
    pub fn from_wgpu(format: wgpu::TextureFormat) -> Option<Self> {
        match format {
            wgpu::TextureFormat::Rgba8Unorm => Some(Self::Rgba8Unorm),
            wgpu::TextureFormat::Rgba8UnormSrgb => Some(Self::Rgba8UnormSrgb),
            wgpu::TextureFormat::Bgra8Unorm => Some(Self::Bgra8Unorm),
            wgpu::TextureFormat::Bgra8UnormSrgb => Some(Self::Bgra8UnormSrgb),
            wgpu::TextureFormat::Depth32Float => Some(Self::Depth32Float),
            _ => None,
        }
    }

    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            Self::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            Self::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            Self::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            Self::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            Self::Depth32Float => wgpu::TextureFormat::Depth32Float,
        }
    }

    pub fn is_srgb(&self) -> bool {
        matches!(self, Self::Rgba8UnormSrgb | Self::Bgra8UnormSrgb)
    }
}

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferUsage(u32);

impl BufferUsage {
    pub const COPY_DST: Self = Self(1 << 0);
    pub const INDEX: Self = Self(1 << 1);
    pub const VERTEX: Self = Self(1 << 2);
    pub const UNIFORM: Self = Self(1 << 3);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub(crate) fn to_wgpu(self) -> wgpu::BufferUsages {
        [
            (Self::COPY_DST, wgpu::BufferUsages::COPY_DST),
            (Self::INDEX, wgpu::BufferUsages::INDEX),
            (Self::VERTEX, wgpu::BufferUsages::VERTEX),
            (Self::UNIFORM, wgpu::BufferUsages::UNIFORM),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .fold(wgpu::BufferUsages::empty(), |acc, (_, usage)| acc | usage)
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    pub usage: BufferUsage,
}

/// Shader stage that reads a uniform binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Triangle-list pipeline over [`Vertex`] buffers with `vs_main`/`fs_main` entry points
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor {
    pub label: Option<String>,
    /// WGSL source
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayoutHandle>,
    pub color_format: TextureFormat,
    /// Depth-tested with `Less` when set
    pub depth_format: Option<TextureFormat>,
}

/// A pass that clears its targets and then draws
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor {
    pub label: Option<String>,
    pub color_view: TextureViewHandle,
    pub clear_color: [f32; 4],
    /// Cleared to 1.0
    pub depth_view: Option<TextureViewHandle>,
}

/// Vertex with position only; materials are flat, unlit colors
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn new(position: Vec3) -> Self {
        Self { position }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, 12);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x3);
    }

    #[test]
    fn usage_flags_map_to_wgpu() {
        let usage = BufferUsage::UNIFORM | BufferUsage::COPY_DST;
        assert!(usage.contains(BufferUsage::UNIFORM));
        assert!(!usage.contains(BufferUsage::VERTEX));
        assert_eq!(
            usage.to_wgpu(),
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST
        );
        assert_eq!(BufferUsage::INDEX.to_wgpu(), wgpu::BufferUsages::INDEX);
    }

    #[test]
    fn surface_formats_round_trip() {
        assert_eq!(
            TextureFormat::from_wgpu(wgpu::TextureFormat::Bgra8UnormSrgb),
            Some(TextureFormat::Bgra8UnormSrgb)
        );
        assert_eq!(TextureFormat::from_wgpu(wgpu::TextureFormat::Rgba16Float), None);
        assert!(TextureFormat::Bgra8UnormSrgb.is_srgb());
        assert!(!TextureFormat::Bgra8Unorm.is_srgb());
        assert_eq!(TextureFormat::Depth32Float.to_wgpu(), wgpu::TextureFormat::Depth32Float);
    }
}
