//! wgpu device, surface and resource tables

use crate::backend::*;
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Draw command recorded between `begin_render_pass` and `end_render_pass`
#[derive(Debug, Clone, Copy)]
enum DrawCommand {
    SetPipeline(RenderPipelineHandle),
    SetBindGroup { index: u32, bind_group: BindGroupHandle },
    SetVertexBuffer(BufferHandle),
    SetIndexBuffer(BufferHandle),
    DrawIndexed { index_count: u32 },
}

struct PendingRenderPass {
    descriptor: RenderPassDescriptor,
    commands: Vec<DrawCommand>,
}

/// Swapchain image and encoder for the frame in flight
struct Frame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    view_id: u64,
    encoder: wgpu::CommandEncoder,
}

/// Owns the wgpu device and every GPU object the renderer created,
/// keyed by the ids inside the handles
pub struct WgpuBackend {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    swapchain_format: TextureFormat,

    buffers: HashMap<u64, wgpu::Buffer>,
    textures: HashMap<u64, wgpu::Texture>,
    texture_views: HashMap<u64, wgpu::TextureView>,
    bind_group_layouts: HashMap<u64, wgpu::BindGroupLayout>,
    bind_groups: HashMap<u64, wgpu::BindGroup>,
    render_pipelines: HashMap<u64, wgpu::RenderPipeline>,
    // Shared by every handle kind, so a swapchain view id never matches a stored view
    next_id: u64,

    frame: Option<Frame>,
    pending_render_pass: Option<PendingRenderPass>,
}

impl WgpuBackend {
    /// Clamp a requested size to the device limits while maintaining aspect ratio
    fn clamp_to_limits(max_size: u32, width: u32, height: u32) -> (u32, u32) {
        if width > max_size || height > max_size {
            let scale = (max_size as f32 / width as f32).min(max_size as f32 / height as f32);
            let new_width = ((width as f32 * scale) as u32).max(1);
            let new_height = ((height as f32 * scale) as u32).max(1);
            (new_width, new_height)
        } else {
            (width.max(1), height.max(1))
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Blocking initialization for native targets
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    /// Async initialization - used directly on web, wrapped by `new` on native
    pub async fn new_async(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        #[cfg(target_arch = "wasm32")]
        let (instance, surface, adapter, device, queue) = Self::init_web(window.clone()).await?;

        #[cfg(not(target_arch = "wasm32"))]
        let (instance, surface, adapter, device, queue) = Self::init_native(window.clone()).await?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let (surface_format, swapchain_format) = surface_caps
            .formats
            .iter()
            .filter_map(|&f| TextureFormat::from_wgpu(f).map(|ours| (f, ours)))
            .max_by_key(|(_, ours)| ours.is_srgb())
            .ok_or_else(|| {
                BackendError::SurfaceCreationFailed(format!(
                    "No 8-bit RGBA/BGRA surface format among {:?}",
                    surface_caps.formats
                ))
            })?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let (width, height) = Self::clamp_to_limits(
            device.limits().max_texture_dimension_2d,
            size.width,
            size.height,
        );

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);
        log::info!("Surface configured: {}x{} {:?}", width, height, surface_format);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            surface_config,
            swapchain_format,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            texture_views: HashMap::new(),
            bind_group_layouts: HashMap::new(),
            bind_groups: HashMap::new(),
            render_pipelines: HashMap::new(),
            next_id: 1,
            frame: None,
            pending_render_pass: None,
        })
    }

    /// Web-specific initialization with WebGL2 default and WebGPU fallback
    #[cfg(target_arch = "wasm32")]
    async fn init_web(
        window: Arc<winit::window::Window>,
    ) -> BackendResult<(
        wgpu::Instance,
        wgpu::Surface<'static>,
        wgpu::Adapter,
        wgpu::Device,
        wgpu::Queue,
    )> {
        log::info!("Trying WebGL2 backend...");
        match Self::try_init_backend(
            window.clone(),
            wgpu::Backends::GL,
            wgpu::Limits::downlevel_webgl2_defaults(),
        )
        .await
        {
            Ok(result) => return Ok(result),
            Err(e) => log::warn!("WebGL2 failed ({}), trying WebGPU backend...", e),
        }

        Self::try_init_backend(
            window,
            wgpu::Backends::BROWSER_WEBGPU,
            wgpu::Limits::default(),
        )
        .await
        .map_err(|e| {
            BackendError::InitializationFailed(format!(
                "Neither WebGL2 nor WebGPU backends could be initialized: {}",
                e
            ))
        })
    }

    #[cfg(target_arch = "wasm32")]
    async fn try_init_backend(
        window: Arc<winit::window::Window>,
        backends: wgpu::Backends,
        limits: wgpu::Limits,
    ) -> BackendResult<(
        wgpu::Instance,
        wgpu::Surface<'static>,
        wgpu::Adapter,
        wgpu::Device,
        wgpu::Queue,
    )> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| BackendError::SurfaceCreationFailed(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BackendError::InitializationFailed("No suitable adapter found".into()))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Found adapter: {} ({:?} backend)",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Vignette Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                },
                None,
            )
            .await
            .map_err(|e| BackendError::DeviceCreationFailed(e.to_string()))?;

        Ok((instance, surface, adapter, device, queue))
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn init_native(
        window: Arc<winit::window::Window>,
    ) -> BackendResult<(
        wgpu::Instance,
        wgpu::Surface<'static>,
        wgpu::Adapter,
        wgpu::Device,
        wgpu::Queue,
    )> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::util::backend_bits_from_env().unwrap_or_else(wgpu::Backends::all),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| BackendError::SurfaceCreationFailed(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BackendError::InitializationFailed("No suitable adapter found".into()))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Selected GPU: {} ({:?} backend)",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Vignette Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| BackendError::DeviceCreationFailed(e.to_string()))?;

        Ok((instance, surface, adapter, device, queue))
    }

    /// Reconfigure the surface; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            let (clamped_width, clamped_height) = Self::clamp_to_limits(
                self.device.limits().max_texture_dimension_2d,
                width,
                height,
            );

            self.surface_config.width = clamped_width;
            self.surface_config.height = clamped_height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn swapchain_format(&self) -> TextureFormat {
        self.swapchain_format
    }

    /// Acquire the next swapchain image, returning a handle to its view
    pub fn begin_frame(&mut self) -> BackendResult<TextureViewHandle> {
        let texture = self.surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => BackendError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => BackendError::OutOfMemory,
            _ => BackendError::AcquireImageFailed(e.to_string()),
        })?;

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        let view_id = self.next_id();

        self.frame = Some(Frame {
            texture,
            view,
            view_id,
            encoder,
        });
        Ok(TextureViewHandle(view_id))
    }

    /// Submit the frame's commands and present
    pub fn end_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.queue.submit(std::iter::once(frame.encoder.finish()));
            frame.texture.present();
        }
    }

    pub fn create_buffer_init(&mut self, desc: &BufferDescriptor, data: &[u8]) -> BufferHandle {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: desc.label.as_deref(),
                contents: data,
                usage: desc.usage.to_wgpu(),
            });

        let id = self.next_id();
        self.buffers.insert(id, buffer);
        BufferHandle(id)
    }

    pub fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> BackendResult<()> {
        let buf = self
            .buffers
            .get(&buffer.0)
            .ok_or(BackendError::MissingResource("buffer"))?;
        self.queue.write_buffer(buf, 0, data);
        Ok(())
    }

    /// Depth32Float render attachment and its view
    pub fn create_depth_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> (TextureHandle, TextureViewHandle) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TextureFormat::Depth32Float.to_wgpu(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let texture_id = self.next_id();
        let view_id = self.next_id();
        self.textures.insert(texture_id, texture);
        self.texture_views.insert(view_id, view);
        (TextureHandle(texture_id), TextureViewHandle(view_id))
    }

    /// Layout with a single uniform buffer at binding 0
    pub fn create_uniform_layout(&mut self, stage: ShaderStage) -> BindGroupLayoutHandle {
        let visibility = match stage {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
        };
        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let id = self.next_id();
        self.bind_group_layouts.insert(id, layout);
        BindGroupLayoutHandle(id)
    }

    /// Bind the whole of `buffer` at binding 0 of a uniform layout
    pub fn create_uniform_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        buffer: BufferHandle,
    ) -> BackendResult<BindGroupHandle> {
        let layout_ref = self
            .bind_group_layouts
            .get(&layout.0)
            .ok_or(BackendError::MissingResource("bind group layout"))?;
        let buf = self
            .buffers
            .get(&buffer.0)
            .ok_or(BackendError::MissingResource("buffer"))?;

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: layout_ref,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buf.as_entire_binding(),
            }],
        });

        let id = self.next_id();
        self.bind_groups.insert(id, bind_group);
        Ok(BindGroupHandle(id))
    }

    pub fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        let layouts = desc
            .bind_group_layouts
            .iter()
            .map(|h| {
                self.bind_group_layouts
                    .get(&h.0)
                    .ok_or(BackendError::MissingResource("bind group layout"))
            })
            .collect::<BackendResult<Vec<_>>>()?;

        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: desc.label.as_deref(),
                source: wgpu::ShaderSource::Wgsl(desc.shader.as_str().into()),
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let depth_stencil = desc.depth_format.map(|format| wgpu::DepthStencilState {
            format: format.to_wgpu(),
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: desc.label.as_deref(),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[Vertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.color_format.to_wgpu(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    // The ground plane is visible from both sides
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        let id = self.next_id();
        self.render_pipelines.insert(id, pipeline);
        Ok(RenderPipelineHandle(id))
    }

    /// Start recording a pass; commands are replayed at `end_render_pass`
    pub fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.pending_render_pass = Some(PendingRenderPass {
            descriptor: desc.clone(),
            commands: Vec::new(),
        });
    }

    fn record(&mut self, command: DrawCommand) {
        if let Some(ref mut pending) = self.pending_render_pass {
            pending.commands.push(command);
        }
    }

    pub fn set_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.record(DrawCommand::SetPipeline(pipeline));
    }

    pub fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        self.record(DrawCommand::SetBindGroup { index, bind_group });
    }

    pub fn set_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.record(DrawCommand::SetVertexBuffer(buffer));
    }

    /// Indices are always `u32`
    pub fn set_index_buffer(&mut self, buffer: BufferHandle) {
        self.record(DrawCommand::SetIndexBuffer(buffer));
    }

    pub fn draw_indexed(&mut self, index_count: u32) {
        self.record(DrawCommand::DrawIndexed { index_count });
    }

    /// Encode the recorded pass into the current frame
    pub fn end_render_pass(&mut self) -> BackendResult<()> {
        let Some(pending) = self.pending_render_pass.take() else {
            return Ok(());
        };

        let Self {
            frame,
            texture_views,
            buffers,
            bind_groups,
            render_pipelines,
            ..
        } = self;
        let Some(Frame {
            view: swapchain_view,
            view_id,
            encoder,
            ..
        }) = frame.as_mut()
        else {
            return Err(BackendError::AcquireImageFailed(
                "render pass recorded outside a frame".into(),
            ));
        };

        let swapchain = (&*swapchain_view, *view_id);
        let texture_views: &HashMap<u64, wgpu::TextureView> = texture_views;
        let buffers: &HashMap<u64, wgpu::Buffer> = buffers;

        let descriptor = &pending.descriptor;
        let [r, g, b, a] = descriptor.clear_color;
        let color_view = Self::resolve_view(texture_views, swapchain, descriptor.color_view)?;
        let depth_view = descriptor
            .depth_view
            .map(|handle| Self::resolve_view(texture_views, swapchain, handle))
            .transpose()?;

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: descriptor.label.as_deref(),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let buffer = move |handle: BufferHandle| {
            buffers
                .get(&handle.0)
                .ok_or(BackendError::MissingResource("buffer"))
        };

        for command in &pending.commands {
            match *command {
                DrawCommand::SetPipeline(handle) => {
                    let pipeline = render_pipelines
                        .get(&handle.0)
                        .ok_or(BackendError::MissingResource("render pipeline"))?;
                    render_pass.set_pipeline(pipeline);
                }
                DrawCommand::SetBindGroup { index, bind_group } => {
                    let group = bind_groups
                        .get(&bind_group.0)
                        .ok_or(BackendError::MissingResource("bind group"))?;
                    render_pass.set_bind_group(index, group, &[]);
                }
                DrawCommand::SetVertexBuffer(handle) => {
                    render_pass.set_vertex_buffer(0, buffer(handle)?.slice(..));
                }
                DrawCommand::SetIndexBuffer(handle) => {
                    render_pass.set_index_buffer(buffer(handle)?.slice(..), wgpu::IndexFormat::Uint32);
                }
                DrawCommand::DrawIndexed { index_count } => {
                    render_pass.draw_indexed(0..index_count, 0, 0..1);
                }
            }
        }

        Ok(())
    }

    /// A view handle names either a stored view or the current swapchain image
    fn resolve_view<'a>(
        texture_views: &'a HashMap<u64, wgpu::TextureView>,
        (swapchain_view, swapchain_id): (&'a wgpu::TextureView, u64),
        handle: TextureViewHandle,
    ) -> BackendResult<&'a wgpu::TextureView> {
        if handle.0 == swapchain_id {
            Ok(swapchain_view)
        } else {
            texture_views
                .get(&handle.0)
                .ok_or(BackendError::MissingResource("texture view"))
        }
    }

    pub fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
    }

    pub fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.0);
    }

    pub fn destroy_texture_view(&mut self, view: TextureViewHandle) {
        self.texture_views.remove(&view.0);
    }
}

impl Drop for WgpuBackend {
    fn drop(&mut self) {
        // Drop any in-flight frame before the surface goes away
        self.pending_render_pass = None;
        self.frame = None;
        log::debug!(
            "Releasing wgpu backend ({} buffers, {} textures)",
            self.buffers.len(),
            self.textures.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_aspect_ratio() {
        assert_eq!(WgpuBackend::clamp_to_limits(2048, 4096, 2048), (2048, 1024));
        assert_eq!(WgpuBackend::clamp_to_limits(2048, 800, 600), (800, 600));
        assert_eq!(WgpuBackend::clamp_to_limits(2048, 0, 0), (1, 1));
    }
}
