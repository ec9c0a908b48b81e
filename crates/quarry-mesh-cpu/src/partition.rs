use quarry_blocks::Face;
use quarry_blocks::face::FACE_COUNT;
use quarry_gfx::{Gfx, GfxHandle, Vertex, VertexFormat, quad_indices};

use crate::alloc::ensure_len;
use crate::constants::{SPRITE_VERTS, VERTS_PER_QUAD};

/// One chunk's geometry for one atlas bucket and translucency class.
///
/// Counts are in vertices. The uploaded buffer holds the sprite range first, then one
/// range per face in `Face::ALL` order.
#[derive(Debug, Default, PartialEq)]
pub struct ChunkPartInfo {
    pub buffer: Option<GfxHandle>,
    pub vertex_count: u32,
    pub face_counts: [u32; FACE_COUNT],
    pub sprite_count: u32,
}

impl ChunkPartInfo {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Indices needed to draw every quad of this partition.
    #[inline]
    pub fn index_count(&self) -> u32 {
        quad_indices(self.vertex_count)
    }

    #[inline]
    pub fn sprite_range(&self) -> (u32, u32) {
        (0, self.sprite_count)
    }

    /// `(first_vertex, vertex_count)` of `face` within the buffer.
    pub fn face_range(&self, face: Face) -> (u32, u32) {
        let before: u32 = self.face_counts[..face.index()].iter().sum();
        (self.sprite_count + before, self.face_counts[face.index()])
    }

    /// Drops the buffer and zeroes the counters, returning the handle for deletion.
    pub fn take(&mut self) -> Option<GfxHandle> {
        let handle = self.buffer.take();
        *self = ChunkPartInfo::default();
        handle
    }
}

/// Vertex staging for one (atlas bucket, translucency) pair of the chunk being built.
///
/// Usage per chunk: `reset`, count every quad/sprite, `prepare`, write each quad into
/// the range of its face, then `finish`.
#[derive(Default)]
pub struct TexturePartitionWriter {
    face_counts: [u32; FACE_COUNT],
    sprite_count: u32,
    staging: Vec<Vertex>,
    // Write cursor per face into `staging`
    f_vertices: [usize; FACE_COUNT],
    sprite_cursor: usize,
}

impl TexturePartitionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.face_counts = [0; FACE_COUNT];
        self.sprite_count = 0;
        self.f_vertices = [0; FACE_COUNT];
        self.sprite_cursor = 0;
    }

    #[inline]
    pub fn count_quad(&mut self, face: Face) {
        self.face_counts[face.index()] += VERTS_PER_QUAD;
    }

    #[inline]
    pub fn count_sprite(&mut self) {
        self.sprite_count += SPRITE_VERTS;
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.sprite_count + self.face_counts.iter().sum::<u32>()
    }

    #[inline]
    pub fn face_count(&self, face: Face) -> u32 {
        self.face_counts[face.index()]
    }

    #[inline]
    pub fn sprite_count(&self) -> u32 {
        self.sprite_count
    }

    /// Next write position of `face`.
    #[inline]
    pub fn cursor(&self, face: Face) -> usize {
        self.f_vertices[face.index()]
    }

    /// Currently allocated staging length; kept across chunks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.staging.len()
    }

    /// Sizes the staging buffer for the counted totals and lays out the sub-ranges.
    pub fn prepare(&mut self) {
        let total = self.total() as usize;
        ensure_len(&mut self.staging, total, Vertex::default(), "partition staging buffer");

        self.sprite_cursor = 0;
        let mut offset = self.sprite_count as usize;
        for face in Face::ALL {
            self.f_vertices[face.index()] = offset;
            offset += self.face_counts[face.index()] as usize;
        }
        debug_assert_eq!(offset, total);
    }

    #[inline]
    pub fn write_quad(&mut self, face: Face, quad: &[Vertex; 4]) {
        let at = self.f_vertices[face.index()];
        debug_assert!(at + 4 <= self.range_end(face), "{face:?} range overflow");
        self.staging[at..at + 4].copy_from_slice(quad);
        self.f_vertices[face.index()] = at + 4;
    }

    #[inline]
    pub fn write_sprite(&mut self, cross: &[Vertex; SPRITE_VERTS as usize]) {
        let at = self.sprite_cursor;
        debug_assert!(at + cross.len() <= self.sprite_count as usize);
        self.staging[at..at + cross.len()].copy_from_slice(cross);
        self.sprite_cursor = at + cross.len();
    }

    fn range_end(&self, face: Face) -> usize {
        let (first, count) = self.layout().face_range(face);
        (first + count) as usize
    }

    fn layout(&self) -> ChunkPartInfo {
        ChunkPartInfo {
            buffer: None,
            vertex_count: self.total(),
            face_counts: self.face_counts,
            sprite_count: self.sprite_count,
        }
    }

    /// Vertices staged so far for the current chunk.
    #[inline]
    pub fn staged(&self) -> &[Vertex] {
        &self.staging[..self.total() as usize]
    }

    /// Uploads the staged vertices. Empty writers produce an empty part with no buffer.
    pub fn finish(&self, gfx: &mut dyn Gfx) -> ChunkPartInfo {
        let mut part = self.layout();
        if part.is_empty() {
            return part;
        }
        debug_assert_eq!(self.sprite_cursor, self.sprite_count as usize);
        debug_assert!(Face::ALL.iter().all(|&f| self.cursor(f) == self.range_end(f)));
        part.buffer = Some(gfx.create_vertex_buffer(VertexFormat::Textured, self.staged()));
        part
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_gfx::HeadlessGfx;

    #[test]
    fn prepare_lays_out_sprites_then_faces() {
        let mut w = TexturePartitionWriter::new();
        w.reset();
        w.count_sprite();
        w.count_quad(Face::PosY);
        w.count_quad(Face::PosY);
        w.count_quad(Face::NegX);
        w.prepare();
        assert_eq!(w.total(), 16 + 8 + 4);
        assert_eq!(w.cursor(Face::PosY), 16);
        assert_eq!(w.cursor(Face::NegY), 24);
        assert_eq!(w.cursor(Face::NegX), 24);
        assert_eq!(w.cursor(Face::NegZ), 28);
    }

    #[test]
    fn staging_is_reused_and_never_shrinks() {
        let mut w = TexturePartitionWriter::new();
        for _ in 0..10 {
            w.count_quad(Face::PosZ);
        }
        w.prepare();
        assert_eq!(w.capacity(), 40);
        w.reset();
        w.count_quad(Face::PosZ);
        w.prepare();
        assert_eq!(w.capacity(), 40);
        assert_eq!(w.staged().len(), 4);
    }

    #[test]
    fn finish_uploads_only_nonempty_writers() {
        let mut gfx = HeadlessGfx::new();
        let mut w = TexturePartitionWriter::new();
        w.prepare();
        let empty = w.finish(&mut gfx);
        assert!(empty.buffer.is_none() && empty.is_empty());
        assert_eq!(gfx.created, 0);

        w.reset();
        w.count_quad(Face::NegZ);
        w.prepare();
        let quad = [Vertex::new(1.0, 2.0, 3.0, Default::default(), 0.0, 0.0); 4];
        w.write_quad(Face::NegZ, &quad);
        let mut part = w.finish(&mut gfx);
        assert_eq!(part.index_count(), 6);
        assert_eq!(part.face_range(Face::NegZ), (0, 4));
        let buf = part.buffer.as_ref().unwrap();
        assert_eq!(gfx.vertices(buf).unwrap(), &quad[..]);

        let mut handle = part.take();
        assert!(part.is_empty() && part.buffer.is_none());
        gfx.delete_buffer(&mut handle);
        assert_eq!(gfx.live_buffers(), 0);
    }
}
