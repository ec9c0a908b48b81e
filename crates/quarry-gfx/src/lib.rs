//! GPU-facing types: vertex layout, owning buffer handles, and the backend trait.
#![forbid(unsafe_code)]

use std::num::NonZeroU32;

use hashbrown::HashMap;
use quarry_blocks::PackedCol;

/// Position + colour + texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub col: PackedCol,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, col: PackedCol, u: f32, v: f32) -> Self {
        Self { x, y, z, col, u, v }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VertexFormat {
    Textured,
}

/// Indices needed to draw `vertices` laid out as consecutive quads.
#[inline]
pub const fn quad_indices(vertices: u32) -> u32 {
    (vertices >> 2) * 6
}

/// Owning handle to a GPU buffer. Not `Clone`: exactly one owner frees it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GfxHandle(NonZeroU32);

impl GfxHandle {
    #[inline]
    pub fn id(&self) -> u32 {
        self.0.get()
    }
}

pub trait Gfx {
    fn create_vertex_buffer(&mut self, format: VertexFormat, data: &[Vertex]) -> GfxHandle;

    /// Frees the buffer and leaves `None` behind; calling it on `None` does nothing.
    fn delete_buffer(&mut self, handle: &mut Option<GfxHandle>);

    /// Draws `count` vertices starting at `first` as indexed quads.
    fn draw_quads(&mut self, handle: &GfxHandle, first: u32, count: u32);
}

/// Backend without a device. Keeps the uploaded vertices so geometry can be inspected,
/// and counts every create/delete/draw.
#[derive(Default, Debug)]
pub struct HeadlessGfx {
    next_id: u32,
    live: HashMap<u32, Vec<Vertex>>,
    pub created: usize,
    pub deleted: usize,
    pub unknown_deletes: usize,
    pub draw_calls: usize,
    pub triangles: u64,
}

impl HeadlessGfx {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn live_buffers(&self) -> usize {
        self.live.len()
    }

    pub fn vertices(&self, handle: &GfxHandle) -> Option<&[Vertex]> {
        self.live.get(&handle.id()).map(|v| v.as_slice())
    }

    pub fn reset_frame_counters(&mut self) {
        self.draw_calls = 0;
        self.triangles = 0;
    }
}

impl Gfx for HeadlessGfx {
    fn create_vertex_buffer(&mut self, _format: VertexFormat, data: &[Vertex]) -> GfxHandle {
        self.next_id += 1;
        let id = NonZeroU32::MIN.saturating_add(self.next_id - 1);
        self.live.insert(id.get(), data.to_vec());
        self.created += 1;
        GfxHandle(id)
    }

    fn delete_buffer(&mut self, handle: &mut Option<GfxHandle>) {
        let Some(h) = handle.take() else {
            return;
        };
        if self.live.remove(&h.id()).is_some() {
            self.deleted += 1;
        } else {
            self.unknown_deletes += 1;
            log::warn!("delete of unknown buffer {}", h.id());
        }
    }

    fn draw_quads(&mut self, handle: &GfxHandle, first: u32, count: u32) {
        debug_assert!(
            self.live
                .get(&handle.id())
                .is_some_and(|v| (first + count) as usize <= v.len()),
            "draw range outside buffer"
        );
        self.draw_calls += 1;
        self.triangles += u64::from(quad_indices(count) / 3);
    }
}
