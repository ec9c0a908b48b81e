use quarry_blocks::face::FACE_COUNT;
use quarry_world::CHUNK_SIZE;

/// Bookkeeping for one 16³ region of the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkInfo {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
    /// World-space centre of the chunk.
    pub centre: (i32, i32, i32),
    /// In view and not known to be empty. Exactly these chunks are in the render list.
    pub visible: bool,
    /// Built, and produced no geometry.
    pub empty: bool,
    /// Must be rebuilt before it is drawn again.
    pub pending_delete: bool,
    pub all_air: bool,
    /// Back-face result per face, indexed by `Face::index`.
    pub draw_faces: [bool; FACE_COUNT],
    /// First slot of this chunk's opaque partitions in the flat partition array.
    pub normal_parts: Option<usize>,
    /// First slot of this chunk's translucent partitions.
    pub translucent_parts: Option<usize>,
}

impl ChunkInfo {
    pub fn new(cx: i32, cy: i32, cz: i32) -> Self {
        let s = CHUNK_SIZE as i32;
        let half = s / 2;
        Self {
            cx,
            cy,
            cz,
            centre: (cx * s + half, cy * s + half, cz * s + half),
            draw_faces: [true; FACE_COUNT],
            ..Self::default()
        }
    }

    #[inline]
    pub fn has_geometry(&self) -> bool {
        self.normal_parts.is_some() || self.translucent_parts.is_some()
    }
}
