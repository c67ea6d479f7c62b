use crate::{
    error::{BlazonError, BlazonResult},
    params::GlowParams,
    render::Frame,
};

const SHADER: &str = r#"
struct VsOut {
  @builtin(position) pos: vec4<f32>,
  @location(0) uv: vec2<f32>,
};

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VsOut {
  var p = array<vec2<f32>, 3>(
    vec2<f32>(-1.0, -1.0),
    vec2<f32>( 3.0, -1.0),
    vec2<f32>(-1.0,  3.0),
  );
  let pos = p[vi];
  var o: VsOut;
  o.pos = vec4<f32>(pos, 0.0, 1.0);
  o.uv = vec2<f32>((pos.x + 1.0) * 0.5, 1.0 - (pos.y + 1.0) * 0.5);
  return o;
}

struct Params {
  // Glow color, normalized rgb in xyz.
  color: vec4<f32>,
  // x: intensity, y: size in pixels, z: 1/width, w: 1/height.
  cfg: vec4<f32>,
};

@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;
@group(0) @binding(2) var<uniform> params: Params;

const TAPS: i32 = 12;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let src = textureSample(t_src, s_src, in.uv);
  let size = max(params.cfg.y, 1.0);
  let step = max(size / f32(TAPS), 1.0);
  let texel = vec2<f32>(params.cfg.z, params.cfg.w);

  var acc = vec4<f32>(0.0);
  var wsum = 0.0;
  for (var j = -TAPS; j <= TAPS; j = j + 1) {
    for (var i = -TAPS; i <= TAPS; i = i + 1) {
      let offset = vec2<f32>(f32(i), f32(j)) * step;
      let d2 = dot(offset, offset);
      let w = exp(-d2 / (size * size));
      acc = acc + textureSample(t_src, s_src, in.uv + offset * texel) * w;
      wsum = wsum + w;
    }
  }
  let halo = acc / wsum;

  let energy = max(max(halo.r, halo.g), halo.b);
  let darkness = 1.0 - max(max(src.r, src.g), src.b);
  let transparency = 1.0 - src.a;
  let mask = max(darkness, transparency);

  let strength = energy * mask * params.cfg.x;
  let glow = vec4<f32>(params.color.rgb, 1.0) * strength;
  return clamp(src + glow, vec4<f32>(0.0), vec4<f32>(1.0));
}
"#;

/// GPU glow strategy: raster → texture, one fullscreen fragment pass with a
/// weighted-neighborhood blur, readback to a new frame.
///
/// Construction and every composite step return `Err` on GPU trouble; the
/// owning [`GlowCompositor`](crate::glow::GlowCompositor) treats any of these
/// as a non-fatal degradation and switches strategy.
#[derive(Debug)]
pub struct GpuGlow {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_buf: wgpu::Buffer,
    targets: Option<Targets>,
}

#[derive(Debug)]
struct Targets {
    width: u32,
    height: u32,
    src: wgpu::Texture,
    src_view: wgpu::TextureView,
    dst: wgpu::Texture,
    dst_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    bytes_per_row: u32,
}

impl GpuGlow {
    pub fn new() -> BlazonResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| BlazonError::render(format!("no gpu adapter available: {e:?}")))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| BlazonError::render(format!("wgpu request_device failed: {e:?}")))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blazon_glow_shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blazon_glow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let params_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blazon_glow_params"),
            size: 32,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blazon_glow_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(std::num::NonZeroU64::new(32).ok_or_else(
                            || BlazonError::render("uniform size must be nonzero"),
                        )?),
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blazon_glow_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blazon_glow_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            sampler,
            params_buf,
            targets: None,
        })
    }

    pub fn composite(&mut self, frame: &Frame, glow: &GlowParams) -> BlazonResult<Frame> {
        let expected = (frame.width as usize)
            .checked_mul(frame.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| BlazonError::render("glow buffer size overflow"))?;
        if frame.data.len() != expected {
            return Err(BlazonError::render("frame byte length mismatch"));
        }

        self.ensure_targets(frame.width, frame.height)?;
        let targets = self
            .targets
            .as_ref()
            .ok_or_else(|| BlazonError::render("glow targets not initialized"))?;

        let mut params = [0u8; 32];
        let values: [f32; 8] = [
            f32::from(glow.color.r) / 255.0,
            f32::from(glow.color.g) / 255.0,
            f32::from(glow.color.b) / 255.0,
            1.0,
            glow.intensity.clamp(0.0, 1.0) as f32,
            glow.size.max(0.0) as f32,
            1.0 / frame.width as f32,
            1.0 / frame.height as f32,
        ];
        for (chunk, v) in params.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        self.queue.write_buffer(&self.params_buf, 0, &params);

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &targets.src,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blazon_glow_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&targets.src_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("blazon_glow_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blazon_glow_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &targets.dst_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &bind_group, &[]);
            rp.draw(0..3, 0..1);
        }
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &targets.dst,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &targets.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(targets.bytes_per_row),
                    rows_per_image: Some(frame.height),
                },
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = targets.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| BlazonError::render(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| BlazonError::render("glow readback channel closed"))?
            .map_err(|e| BlazonError::render(format!("glow readback map failed: {e:?}")))?;

        let mapped = buffer_slice.get_mapped_range();
        let row_bytes = frame.width as usize * 4;
        let padded = targets.bytes_per_row as usize;
        let mut data = Vec::with_capacity(row_bytes * frame.height as usize);
        for row in 0..frame.height as usize {
            let start = row * padded;
            data.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        targets.readback.unmap();

        Ok(Frame {
            width: frame.width,
            height: frame.height,
            data,
            premultiplied: frame.premultiplied,
        })
    }

    fn ensure_targets(&mut self, width: u32, height: u32) -> BlazonResult<()> {
        if let Some(t) = &self.targets
            && t.width == width
            && t.height == height
        {
            return Ok(());
        }
        if width == 0 || height == 0 {
            return Err(BlazonError::validation(
                "glow target must have nonzero width and height",
            ));
        }

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let src = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("blazon_glow_src"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let dst = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("blazon_glow_dst"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let bytes_per_row_unpadded = width
            .checked_mul(4)
            .ok_or_else(|| BlazonError::render("glow target width overflow"))?;
        let bytes_per_row = align_to(bytes_per_row_unpadded, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer_size = u64::from(bytes_per_row)
            .checked_mul(u64::from(height))
            .ok_or_else(|| BlazonError::render("glow readback size overflow"))?;
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blazon_glow_readback"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let src_view = src.create_view(&wgpu::TextureViewDescriptor::default());
        let dst_view = dst.create_view(&wgpu::TextureViewDescriptor::default());
        self.targets = Some(Targets {
            width,
            height,
            src,
            src_view,
            dst,
            dst_view,
            readback,
            bytes_per_row,
        });
        Ok(())
    }
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_to_rounds_up_to_alignment() {
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(4, 256), 256);
    }
}
