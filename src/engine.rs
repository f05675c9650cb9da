//! Renderer for the vignette's scene graph

use crate::backend::*;
use crate::backend::wgpu_backend::WgpuBackend;
use crate::resources::MaterialUniformData;
use crate::scene::{Camera, CameraUniformData, NodeId, SceneGraph, TransformUniformData};
use crate::VignetteConfig;
use std::collections::HashMap;
use std::sync::Arc;
use winit::window::Window as WinitWindow;

/// GPU resources for a mesh
struct GpuMesh {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    index_count: u32,
}

/// Per-node GPU resources
struct GpuObject {
    transform_buffer: BufferHandle,
    transform_bind_group: BindGroupHandle,
}

/// Render state holding GPU resources
struct RenderState {
    pipeline: RenderPipelineHandle,

    // Camera resources
    camera_buffer: BufferHandle,
    camera_bind_group: BindGroupHandle,

    // Indexed by MaterialId
    material_buffers: Vec<BufferHandle>,
    material_bind_groups: Vec<BindGroupHandle>,

    // Indexed by MeshId
    gpu_meshes: Vec<GpuMesh>,

    gpu_objects: HashMap<NodeId, GpuObject>,

    // Depth buffer
    depth_texture: TextureHandle,
    depth_view: TextureViewHandle,
}

// Flat-color shader: every fragment takes its material's color
const UNLIT_SHADER: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
}

struct MaterialUniform {
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(1) @binding(0) var<uniform> object: ObjectUniform;
@group(2) @binding(0) var<uniform> material: MaterialUniform;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return camera.view_proj * object.model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return material.color;
}
"#;

/// Draws a [`SceneGraph`] to a window surface
///
/// All meshes, materials and per-node buffers are uploaded once at creation;
/// each frame only rewrites the camera and the world matrices.
pub struct Engine {
    backend: WgpuBackend,
    state: RenderState,
    width: u32,
    height: u32,
    clear_color: [f32; 4],
}

impl Engine {
    /// Create a new engine instance (native only - use new_async on web)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(
        window: Arc<WinitWindow>,
        config: &VignetteConfig,
        scene: &SceneGraph,
    ) -> BackendResult<Self> {
        let backend = WgpuBackend::new(Arc::clone(&window), config.vsync)?;
        Self::from_backend(backend, window, config, scene)
    }

    /// Create a new engine instance asynchronously (required on web)
    pub async fn new_async(
        window: Arc<WinitWindow>,
        config: &VignetteConfig,
        scene: &SceneGraph,
    ) -> BackendResult<Self> {
        let backend = WgpuBackend::new_async(Arc::clone(&window), config.vsync).await?;
        Self::from_backend(backend, window, config, scene)
    }

    fn from_backend(
        mut backend: WgpuBackend,
        window: Arc<WinitWindow>,
        config: &VignetteConfig,
        scene: &SceneGraph,
    ) -> BackendResult<Self> {
        let size = window.inner_size();
        backend.resize(size.width.max(1), size.height.max(1));
        let (width, height) = backend.surface_size();

        let state = Self::upload(&mut backend, scene, width, height)?;
        log::info!(
            "Uploaded {} meshes, {} materials, {} objects ({}x{})",
            state.gpu_meshes.len(),
            state.material_buffers.len(),
            state.gpu_objects.len(),
            width,
            height
        );

        Ok(Self {
            backend,
            state,
            width,
            height,
            clear_color: config.clear_color,
        })
    }

    fn upload(
        backend: &mut WgpuBackend,
        scene: &SceneGraph,
        width: u32,
        height: u32,
    ) -> BackendResult<RenderState> {
        let camera_layout = backend.create_uniform_layout(ShaderStage::Vertex);
        let object_layout = backend.create_uniform_layout(ShaderStage::Vertex);
        let material_layout = backend.create_uniform_layout(ShaderStage::Fragment);

        let camera_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some("Camera Buffer".into()),
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            bytemuck::bytes_of(&CameraUniformData {
                view_proj: glam::Mat4::IDENTITY,
            }),
        );
        let camera_bind_group = backend.create_uniform_bind_group(camera_layout, camera_buffer)?;

        let (depth_texture, depth_view) = backend.create_depth_texture(width, height);

        let swapchain_format = backend.swapchain_format();
        let pipeline = backend.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Unlit Pipeline".into()),
            shader: UNLIT_SHADER.into(),
            bind_group_layouts: vec![camera_layout, object_layout, material_layout],
            color_format: swapchain_format,
            depth_format: Some(TextureFormat::Depth32Float),
        })?;

        // Upload meshes to GPU
        let mut gpu_meshes = Vec::with_capacity(scene.meshes().len());
        for (id, mesh) in scene.meshes().iter().enumerate() {
            let vertex_buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("Vertex Buffer {} ({})", id, mesh.name)),
                    usage: BufferUsage::VERTEX,
                },
                mesh.vertex_bytes(),
            );

            let index_buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("Index Buffer {} ({})", id, mesh.name)),
                    usage: BufferUsage::INDEX,
                },
                mesh.index_bytes(),
            );

            gpu_meshes.push(GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: mesh.index_count() as u32,
            });
        }

        // Materials never change, so their uniforms are written once
        let srgb = swapchain_format.is_srgb();
        let mut material_buffers = Vec::with_capacity(scene.materials().len());
        let mut material_bind_groups = Vec::with_capacity(scene.materials().len());
        for material in scene.materials() {
            let uniform: MaterialUniformData = material.uniform_data(srgb);
            let buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("Material Buffer ({})", material.name)),
                    usage: BufferUsage::UNIFORM,
                },
                bytemuck::bytes_of(&uniform),
            );
            material_bind_groups.push(backend.create_uniform_bind_group(material_layout, buffer)?);
            material_buffers.push(buffer);
        }

        let mut gpu_objects = HashMap::new();
        for item in scene.draw_list() {
            let transform_buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("Transform Buffer {}", item.node.index())),
                    usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                },
                bytemuck::bytes_of(&TransformUniformData::new(item.world)),
            );
            let transform_bind_group =
                backend.create_uniform_bind_group(object_layout, transform_buffer)?;

            gpu_objects.insert(
                item.node,
                GpuObject {
                    transform_buffer,
                    transform_bind_group,
                },
            );
        }

        Ok(RenderState {
            pipeline,
            camera_buffer,
            camera_bind_group,
            material_buffers,
            material_bind_groups,
            gpu_meshes,
            gpu_objects,
            depth_texture,
            depth_view,
        })
    }

    /// Handle window resize, returning the surface size actually in use
    ///
    /// The surface may be smaller than requested when the device limits it
    /// (WebGL2 caps textures at 2048).
    pub fn resize(&mut self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (self.width, self.height);
        }

        self.backend.resize(width, height);
        let (actual_width, actual_height) = self.backend.surface_size();
        if actual_width == self.width && actual_height == self.height {
            return (self.width, self.height);
        }

        let (texture, view) = self.backend.create_depth_texture(actual_width, actual_height);
        self.backend.destroy_texture_view(self.state.depth_view);
        self.backend.destroy_texture(self.state.depth_texture);
        self.state.depth_texture = texture;
        self.state.depth_view = view;
        self.width = actual_width;
        self.height = actual_height;
        log::debug!("Surface resized to {}x{}", actual_width, actual_height);

        (self.width, self.height)
    }

    /// Render one frame, recovering from a lost surface
    ///
    /// Returns whether a frame was presented.
    pub fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> bool {
        match self.render(scene, camera) {
            Ok(()) => true,
            Err(BackendError::SurfaceLost) => {
                log::warn!("Surface lost, reconfiguring");
                self.backend.resize(self.width, self.height);
                false
            }
            Err(e) => {
                log::error!("Render error: {}", e);
                false
            }
        }
    }

    /// Render and present a frame
    pub fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> BackendResult<()> {
        let swapchain_view = self.backend.begin_frame()?;
        let state = &self.state;

        self.backend
            .write_buffer(state.camera_buffer, bytemuck::bytes_of(&camera.uniform_data()))?;

        let items = scene.draw_list();

        // Write world matrices before the pass so every draw sees this frame's pose
        for item in &items {
            if let Some(object) = state.gpu_objects.get(&item.node) {
                self.backend.write_buffer(
                    object.transform_buffer,
                    bytemuck::bytes_of(&TransformUniformData::new(item.world)),
                )?;
            }
        }

        self.backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Main Pass".into()),
            color_view: swapchain_view,
            clear_color: self.clear_color,
            depth_view: Some(state.depth_view),
        });

        self.backend.set_pipeline(state.pipeline);
        self.backend.set_bind_group(0, state.camera_bind_group);

        for item in &items {
            let Some(gpu_mesh) = state.gpu_meshes.get(item.renderable.mesh.index()) else {
                continue;
            };
            let Some(&material_bind_group) =
                state.material_bind_groups.get(item.renderable.material.index())
            else {
                continue;
            };
            let Some(object) = state.gpu_objects.get(&item.node) else {
                continue;
            };

            self.backend.set_bind_group(1, object.transform_bind_group);
            self.backend.set_bind_group(2, material_bind_group);
            self.backend.set_vertex_buffer(gpu_mesh.vertex_buffer);
            self.backend.set_index_buffer(gpu_mesh.index_buffer);
            self.backend.draw_indexed(gpu_mesh.index_count);
        }

        self.backend.end_render_pass()?;
        self.backend.end_frame();
        Ok(())
    }

    /// Get current dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let state = &self.state;
        let buffers = state
            .gpu_meshes
            .iter()
            .flat_map(|mesh| [mesh.vertex_buffer, mesh.index_buffer])
            .chain(state.material_buffers.iter().copied())
            .chain(state.gpu_objects.values().map(|object| object.transform_buffer))
            .chain(std::iter::once(state.camera_buffer))
            .collect::<Vec<_>>();

        for buffer in &buffers {
            self.backend.destroy_buffer(*buffer);
        }
        self.backend.destroy_texture_view(state.depth_view);
        self.backend.destroy_texture(state.depth_texture);

        log::info!("Render target released ({} buffers)", buffers.len());
    }
}
