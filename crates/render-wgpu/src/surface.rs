use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use viewport_common::ViewportError;
use viewport_render::{OutputTarget, PerspectiveCamera};
use wgpu::util::DeviceExt;

const CLEAR: [f32; 3] = [0.1, 0.1, 0.15];
const FADE_DISTANCE: f32 = 40.0;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    fog: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GridVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Grid floor line vertices, with the two axes highlighted.
fn grid_mesh(half_extent: i32, spacing: f32) -> Vec<GridVertex> {
    let mut verts = Vec::new();
    let line = [0.4, 0.4, 0.4, 1.0];
    let extent = half_extent as f32 * spacing;

    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        let (along_x, along_z) = if i == 0 {
            ([0.8, 0.25, 0.25, 1.0], [0.25, 0.4, 0.8, 1.0])
        } else {
            (line, line)
        };
        verts.push(GridVertex {
            position: [-extent, 0.0, offset],
            color: along_x,
        });
        verts.push(GridVertex {
            position: [extent, 0.0, offset],
            color: along_x,
        });
        verts.push(GridVertex {
            position: [offset, 0.0, -extent],
            color: along_z,
        });
        verts.push(GridVertex {
            position: [offset, 0.0, extent],
            color: along_z,
        });
    }
    verts
}

/// Physical pixel extent of a logical size at a given density, at least 1x1.
pub fn physical_extent(width: f64, height: f64, pixel_density: f64) -> (u32, u32) {
    let scale = |v: f64| {
        let px = (v * pixel_density).round();
        if px.is_finite() { px.max(1.0) as u32 } else { 1 }
    };
    (scale(width), scale(height))
}

/// Physical extent for `logical` at `pixel_density`, or an error when either
/// side exceeds `max_dimension`.
fn checked_extent(
    logical: (f64, f64),
    pixel_density: f64,
    max_dimension: u32,
) -> Result<(u32, u32), ViewportError> {
    let (width, height) = physical_extent(logical.0, logical.1, pixel_density);
    if width > max_dimension || height > max_dimension {
        return Err(ViewportError::Backend(format!(
            "surface {width}x{height} exceeds the device limit of {max_dimension}"
        )));
    }
    Ok((width, height))
}

/// Window surface plus the grid renderer drawing into it.
///
/// The surface is reconfigured whenever the logical size or the pixel density
/// changes the physical extent.
pub struct SurfaceTarget {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    logical: (f64, f64),
    pixel_density: f64,
    grid_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    depth_texture: wgpu::TextureView,
}

impl SurfaceTarget {
    pub fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        logical: (f64, f64),
        pixel_density: f64,
    ) -> Self {
        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(caps.formats[0]);
        let (width, height) = physical_extent(logical.0, logical.1, pixel_density);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_uniforms"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                eye: [0.0; 4],
                fog: [CLEAR[0], CLEAR[1], CLEAR[2], FADE_DISTANCE],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grid_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grid_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GRID_SHADER.into()),
        });

        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GridVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let grid_verts = grid_mesh(50, 1.0);
        let grid_vertex_count = grid_verts.len() as u32;
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let depth_texture = Self::create_depth_texture(&device, width, height);

        Self {
            surface,
            device,
            queue,
            config,
            logical,
            pixel_density,
            grid_pipeline,
            uniform_buffer,
            uniform_bind_group,
            grid_vertex_buffer,
            grid_vertex_count,
            depth_texture,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn logical_size(&self) -> (f64, f64) {
        self.logical
    }

    pub fn pixel_density(&self) -> f64 {
        self.pixel_density
    }

    /// Current surface size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Next frame to draw into. `None` when the surface had to be reconfigured
    /// or is unavailable; the caller just skips the frame.
    pub fn acquire_frame(&self) -> Option<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                None
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                None
            }
        }
    }

    /// Draw the grid floor from `camera` into `view`.
    pub fn render(&self, view: &wgpu::TextureView, camera: &PerspectiveCamera) {
        let eye = camera.position;
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                eye: [eye.x, eye.y, eye.z, 1.0],
                fog: [CLEAR[0], CLEAR[1], CLEAR[2], FADE_DISTANCE],
            }),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("viewport_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("viewport_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: CLEAR[0] as f64,
                            g: CLEAR[1] as f64,
                            b: CLEAR[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.grid_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
            pass.draw(0..self.grid_vertex_count, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Adopt a new logical size and density, reconfiguring the surface if the
    /// physical extent changed. On error nothing is updated.
    fn apply(&mut self, logical: (f64, f64), pixel_density: f64) -> Result<(), ViewportError> {
        let max = self.device.limits().max_texture_dimension_2d;
        let (width, height) = checked_extent(logical, pixel_density, max)?;
        self.logical = logical;
        self.pixel_density = pixel_density;
        if (width, height) == (self.config.width, self.config.height) {
            return Ok(());
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Self::create_depth_texture(&self.device, width, height);
        tracing::debug!(width, height, "surface reconfigured");
        Ok(())
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

impl OutputTarget for SurfaceTarget {
    fn set_output_size(&mut self, width: f64, height: f64) -> Result<(), ViewportError> {
        self.apply((width, height), self.pixel_density)
    }

    fn set_pixel_density(&mut self, ratio: f64) -> Result<(), ViewportError> {
        self.apply(self.logical, ratio)
    }
}
