//! wgpu-backed render context.
//!
//! GL-style calls are tracked as state and draw calls are recorded into a
//! frame list; [`WgpuContext::encode`] replays the list into one render pass.
//! Each attribute gets its own vertex-buffer slot that points into the shared
//! interleaved buffer, which mirrors per-attribute pointers. Pipelines are
//! created lazily per (program, attribute layout, raster state) and cached.

use std::collections::{BTreeMap, HashMap};

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::coords::{Color, Viewport};
use crate::shader::{BuildError, LinkedProgram};

use super::context::{
    AttribPointer, AttributeLocation, BufferId, ClearFlags, CullFace, DepthCompare, DepthTest,
    FrontFace, ProgramId, RasterState, RenderContext, UniformLocation, MAT4_BYTES,
};
use super::ctx::RenderTarget;

const FLOAT_BYTES: u64 = std::mem::size_of::<f32>() as u64;

struct GpuProgram {
    vertex: wgpu::ShaderModule,
    vertex_entry: String,
    fragment: wgpu::ShaderModule,
    fragment_entry: String,
    /// Locations the vertex stage reads; each needs a source before drawing.
    inputs: Vec<u32>,
    layout: wgpu::PipelineLayout,
    /// Indexed by group.
    bind_groups: Vec<wgpu::BindGroup>,
    /// Indexed by `UniformLocation`.
    uniforms: Vec<UniformSlot>,
}

struct UniformSlot {
    buffer: wgpu::Buffer,
    /// Declared size in bytes.
    size: u32,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    /// Length in floats.
    len: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct VertexSlot {
    location: u32,
    components: u8,
    stride: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    slots: Vec<VertexSlot>,
    raster: RasterState,
}

struct PendingDraw {
    key: PipelineKey,
    pointers: Vec<AttribPointer>,
    viewport: Option<Viewport>,
    first: u32,
    count: u32,
}

#[derive(Default)]
struct TrackedState {
    clear_color: Color,
    raster: RasterState,
    viewport: Option<Viewport>,
    program: Option<ProgramId>,
    attributes: BTreeMap<u32, AttribPointer>,
}

#[derive(Default)]
struct FrameCommands {
    clear: Option<(ClearFlags, Color)>,
    draws: Vec<PendingDraw>,
}

impl FrameCommands {
    /// Everything is replayed in one pass that starts with the clear, so draws
    /// recorded before it are dropped.
    fn clear(&mut self, flags: ClearFlags, color: Color) {
        if !self.draws.is_empty() {
            log::debug!("clear after {} draws; earlier draws discarded", self.draws.len());
            self.draws.clear();
        }
        self.clear = Some((flags, color));
    }
}

/// Whole vertices every pointer can fetch. `u32::MAX` when there are no pointers.
fn available_vertices(pointers: &[AttribPointer], len_of: impl Fn(BufferId) -> Option<u32>) -> u32 {
    pointers
        .iter()
        .map(|p| len_of(p.buffer).map_or(0, |len| p.available_vertices(len)))
        .min()
        .unwrap_or(u32::MAX)
}

/// Count of `first..first + count` that lies below `available`, or `None`
/// when nothing is left to draw.
fn clamp_draw(first: u32, count: u32, available: u32) -> Option<u32> {
    let end = first.saturating_add(count).min(available);
    (end > first).then(|| end - first)
}

pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,

    next_id: u32,
    programs: HashMap<ProgramId, GpuProgram>,
    buffers: HashMap<BufferId, GpuBuffer>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    state: TrackedState,
    frame: FrameCommands,

    warned_truncated: bool,
}

impl WgpuContext {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            color_format,
            depth_format,
            next_id: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            pipelines: HashMap::new(),
            state: TrackedState::default(),
            frame: FrameCommands::default(),
            warned_truncated: false,
        }
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Replays the commands recorded since the last call into `target`.
    pub fn encode(&mut self, target: &mut RenderTarget<'_>) {
        let frame = std::mem::take(&mut self.frame);

        for draw in &frame.draws {
            self.ensure_pipeline(&draw.key);
        }

        let (color_load, depth_load, stencil_load) = match frame.clear {
            Some((flags, color)) => (
                if flags.color { wgpu::LoadOp::Clear(color.to_wgpu()) } else { wgpu::LoadOp::Load },
                if flags.depth { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load },
                if flags.stencil { wgpu::LoadOp::Clear(0) } else { wgpu::LoadOp::Load },
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: self.depth_format.has_depth_aspect().then_some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: self.depth_format.has_stencil_aspect().then_some(wgpu::Operations {
                    load: stencil_load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let full = Viewport::full(target.size.0, target.size.1);

        'draws: for draw in &frame.draws {
            let Some(pipeline) = self.pipelines.get(&draw.key) else { continue };
            let Some(program) = self.programs.get(&draw.key.program) else { continue };
            let Some(rect) = draw.viewport.unwrap_or(full).to_top_left(target.size) else {
                log::debug!("viewport {:?} lies outside the surface; draw skipped", draw.viewport);
                continue;
            };

            let [x, y, w, h] = rect.viewport;
            rpass.set_viewport(x, y, w, h, 0.0, 1.0);
            let [sx, sy, sw, sh] = rect.scissor;
            rpass.set_scissor_rect(sx, sy, sw, sh);
            rpass.set_pipeline(pipeline);
            for (group, bind_group) in program.bind_groups.iter().enumerate() {
                rpass.set_bind_group(group as u32, bind_group, &[]);
            }
            for (slot, pointer) in draw.pointers.iter().enumerate() {
                let Some(buffer) = self.buffers.get(&pointer.buffer) else { continue 'draws };
                rpass.set_vertex_buffer(
                    slot as u32,
                    buffer.buffer.slice(pointer.offset as u64 * FLOAT_BYTES..),
                );
            }
            rpass.draw(draw.first..draw.first + draw.count, 0..1);
        }
    }

    fn ensure_pipeline(&mut self, key: &PipelineKey) {
        if self.pipelines.contains_key(key) {
            return;
        }
        let Some(program) = self.programs.get(&key.program) else { return };

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .slots
            .iter()
            .map(|s| {
                [wgpu::VertexAttribute {
                    format: vertex_format(s.components),
                    offset: 0,
                    shader_location: s.location,
                }]
            })
            .collect();

        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .slots
            .iter()
            .zip(&attributes)
            .map(|(s, attrs)| wgpu::VertexBufferLayout {
                array_stride: s.stride as u64 * FLOAT_BYTES,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let culling = key.raster.culling;

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("prism pipeline"),
            layout: Some(&program.layout),

            vertex: wgpu::VertexState {
                module: &program.vertex,
                entry_point: Some(&program.vertex_entry),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &program.fragment,
                entry_point: Some(&program.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: match culling.map(|c| c.front_face) {
                    Some(FrontFace::Cw) => wgpu::FrontFace::Cw,
                    _ => wgpu::FrontFace::Ccw,
                },
                cull_mode: culling.map(|c| match c.cull_face {
                    CullFace::Front => wgpu::Face::Front,
                    CullFace::Back => wgpu::Face::Back,
                }),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(depth_stencil_state(self.depth_format, key.raster.depth)),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("created pipeline for {:?} ({} vertex slots)", key.program, key.slots.len());
        self.pipelines.insert(key.clone(), pipeline);
    }
}

fn vertex_format(components: u8) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn depth_stencil_state(format: wgpu::TextureFormat, depth: Option<DepthTest>) -> wgpu::DepthStencilState {
    // The pass always carries a depth attachment, so pipelines always declare it;
    // a disabled test compares `Always` and never writes.
    let (depth_write_enabled, depth_compare) = match depth {
        Some(test) => (
            test.write,
            match test.compare {
                DepthCompare::Less => wgpu::CompareFunction::Less,
                DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
            },
        ),
        None => (false, wgpu::CompareFunction::Always),
    };

    wgpu::DepthStencilState {
        format,
        depth_write_enabled,
        depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

impl RenderContext for WgpuContext {
    fn create_program(&mut self, program: &LinkedProgram) -> Result<ProgramId, BuildError> {
        let uniforms = program.uniforms();
        let group_count = uniforms.iter().map(|u| u.group + 1).max().unwrap_or(0);
        let max_groups = self.device.limits().max_bind_groups;
        if group_count > max_groups {
            return Err(BuildError::link(format!(
                "program uses {group_count} bind groups; the device supports {max_groups}"
            )));
        }

        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prism vertex stage"),
            source: wgpu::ShaderSource::Wgsl(program.vertex().wgsl().into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prism fragment stage"),
            source: wgpu::ShaderSource::Wgsl(program.fragment().wgsl().into()),
        });

        let uniform_slots: Vec<UniformSlot> = uniforms
            .iter()
            .map(|u| UniformSlot {
                buffer: self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(u.name.as_str()),
                    size: u.size.max(16) as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }),
                size: u.size,
            })
            .collect();

        let mut layouts = Vec::new();
        let mut bind_groups = Vec::new();
        for group in 0..group_count {
            let members: Vec<_> = uniforms
                .iter()
                .enumerate()
                .filter(|(_, u)| u.group == group)
                .collect();

            let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = members
                .iter()
                .map(|(_, u)| wgpu::BindGroupLayoutEntry {
                    binding: u.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(u.size as u64),
                    },
                    count: None,
                })
                .collect();

            let layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("prism uniform bgl"),
                entries: &layout_entries,
            });

            let entries: Vec<wgpu::BindGroupEntry<'_>> = members
                .iter()
                .map(|(i, u)| wgpu::BindGroupEntry {
                    binding: u.binding,
                    resource: uniform_slots[*i].buffer.as_entire_binding(),
                })
                .collect();

            bind_groups.push(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("prism uniform bind group"),
                layout: &layout,
                entries: &entries,
            }));
            layouts.push(layout);
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().collect();
        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism pipeline layout"),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let id = ProgramId(self.next_id());
        self.programs.insert(
            id,
            GpuProgram {
                vertex,
                vertex_entry: program.vertex().entry_point().to_owned(),
                fragment,
                fragment_entry: program.fragment().entry_point().to_owned(),
                inputs: program.attributes().iter().map(|a| a.location).collect(),
                layout,
                bind_groups,
                uniforms: uniform_slots,
            },
        );
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.pipelines.retain(|key, _| key.program != program);
        if self.state.program == Some(program) {
            self.state.program = None;
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        self.state.program = Some(program);
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> BufferId {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let id = BufferId(self.next_id());
        self.buffers.insert(id, GpuBuffer { buffer, len: data.len() as u32 });
        id
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.state.attributes.retain(|_, p| p.buffer != buffer);
    }

    fn set_clear_color(&mut self, color: Color) {
        self.state.clear_color = color;
    }

    fn set_raster_state(&mut self, state: RasterState) {
        self.state.raster = state;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = Some(viewport);
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.frame.clear(flags, self.state.clear_color);
    }

    fn set_vertex_attribute(&mut self, location: AttributeLocation, pointer: AttribPointer) {
        self.state.attributes.insert(location.0, pointer);
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        let slot = self
            .state
            .program
            .and_then(|id| self.programs.get(&id))
            .and_then(|p| p.uniforms.get(location.0 as usize));

        match slot {
            Some(slot) if slot.size >= MAT4_BYTES => {
                self.queue.write_buffer(&slot.buffer, 0, bytemuck::bytes_of(value));
            }
            Some(slot) => {
                log::warn!("uniform {location:?} holds {} bytes; mat4 upload skipped", slot.size);
            }
            None => log::warn!("uniform {location:?} is not part of the current program"),
        }
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        let Some(program_id) = self.state.program else {
            log::warn!("draw without a current program; skipped");
            return;
        };
        let Some(program) = self.programs.get(&program_id) else { return };

        let mut slots = Vec::with_capacity(program.inputs.len());
        let mut pointers = Vec::with_capacity(program.inputs.len());
        for &location in &program.inputs {
            let Some(pointer) = self.state.attributes.get(&location) else {
                log::warn!("attribute location {location} has no source; draw skipped");
                return;
            };
            slots.push(VertexSlot {
                location,
                components: pointer.components,
                stride: pointer.stride,
            });
            pointers.push(*pointer);
        }

        let available = available_vertices(&pointers, |id| self.buffers.get(&id).map(|b| b.len));
        let clamped = clamp_draw(first, count, available);

        if clamped.unwrap_or(0) < count && !self.warned_truncated {
            log::debug!(
                "draw of {count} vertices from {first} exceeds the {available} available; truncated"
            );
            self.warned_truncated = true;
        }
        let Some(count) = clamped else { return };

        self.frame.draws.push(PendingDraw {
            key: PipelineKey {
                program: program_id,
                slots,
                raster: self.state.raster,
            },
            pointers,
            viewport: self.state.viewport,
            first,
            count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Mesh, PYRAMID_MESH};

    fn pending(first: u32, count: u32) -> PendingDraw {
        PendingDraw {
            key: PipelineKey {
                program: ProgramId(1),
                slots: Vec::new(),
                raster: RasterState::default(),
            },
            pointers: Vec::new(),
            viewport: None,
            first,
            count,
        }
    }

    fn pyramid_available() -> u32 {
        let buffer = BufferId(1);
        let pointers = [
            Mesh::LAYOUT.position_pointer(buffer),
            Mesh::LAYOUT.color_pointer(buffer),
        ];
        let len = PYRAMID_MESH.vertices().len() as u32;
        available_vertices(&pointers, |id| (id == buffer).then_some(len))
    }

    #[test]
    fn pyramid_buffer_supplies_every_vertex() {
        assert_eq!(pyramid_available(), 17);
    }

    #[test]
    fn missing_buffer_supplies_nothing() {
        let pointers = [Mesh::LAYOUT.position_pointer(BufferId(9))];
        assert_eq!(available_vertices(&pointers, |_| None), 0);
        assert_eq!(available_vertices(&[], |_| None), u32::MAX);
    }

    #[test]
    fn in_range_draws_keep_their_count() {
        let available = pyramid_available();
        assert_eq!(clamp_draw(0, 3, available), Some(3));
        assert_eq!(clamp_draw(12, 4, available), Some(4));
        assert_eq!(clamp_draw(14, 3, available), Some(3));
    }

    #[test]
    fn legacy_base_tail_is_truncated() {
        assert_eq!(clamp_draw(14, 4, pyramid_available()), Some(3));
    }

    #[test]
    fn draws_past_the_end_are_dropped() {
        let available = pyramid_available();
        assert_eq!(clamp_draw(17, 3, available), None);
        assert_eq!(clamp_draw(40, 3, available), None);
        assert_eq!(clamp_draw(3, 0, available), None);
    }

    #[test]
    fn overflowing_range_is_clamped() {
        assert_eq!(clamp_draw(u32::MAX - 1, 4, u32::MAX), Some(1));
        assert_eq!(clamp_draw(10, u32::MAX, 17), Some(7));
    }

    #[test]
    fn clear_discards_earlier_draws() {
        let mut frame = FrameCommands::default();
        frame.draws.push(pending(0, 3));
        frame.draws.push(pending(3, 3));

        frame.clear(ClearFlags::ALL, Color::BLACK);
        assert!(frame.draws.is_empty());
        assert_eq!(frame.clear, Some((ClearFlags::ALL, Color::BLACK)));

        frame.draws.push(pending(6, 3));
        frame.clear(ClearFlags::ALL, Color::BLACK);
        assert!(frame.draws.is_empty());
    }
}
