use quarry_blocks::BlockId;
use quarry_blocks::types::AIR;
use serde::Deserialize;

pub const CHUNK_SHIFT: u32 = 4;
pub const CHUNK_SIZE: usize = 1 << CHUNK_SHIFT;

/// Blocks drawn around the outside of the map: a wall of `sides_block` up to
/// `sides_height` and a ring of `edge_block` (usually water) up to `edge_height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvEdges {
    pub sides_block: BlockId,
    pub sides_height: i32,
    pub edge_block: BlockId,
    pub edge_height: i32,
}

impl Default for EnvEdges {
    fn default() -> Self {
        Self {
            sides_block: 12,
            sides_height: 30,
            edge_block: 5,
            edge_height: 32,
        }
    }
}

impl EnvEdges {
    /// Highest y affected by the edge/sides settings.
    #[inline]
    pub fn clip_height(&self) -> i32 {
        self.sides_height.max(self.edge_height)
    }
}

/// Read access to a dense block grid.
pub trait VoxelField {
    /// World size in voxels as `(width, height, length)`.
    fn dims(&self) -> (i32, i32, i32);

    /// Block at an in-bounds coordinate.
    fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId;

    fn env(&self) -> &EnvEdges;

    #[inline]
    fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        let (w, h, l) = self.dims();
        x >= 0 && y >= 0 && z >= 0 && x < w && y < h && z < l
    }

    /// Block at any coordinate; out-of-range reads as air.
    #[inline]
    fn block_or_air(&self, x: i32, y: i32, z: i32) -> BlockId {
        if self.contains(x, y, z) {
            self.block_at(x, y, z)
        } else {
            AIR
        }
    }

    /// Chunk grid size, rounding partial chunks up.
    fn chunk_counts(&self) -> (usize, usize, usize) {
        let (w, h, l) = self.dims();
        let c = |v: i32| (v.max(0) as usize).div_ceil(CHUNK_SIZE);
        (c(w), c(h), c(l))
    }
}

#[derive(Clone, Debug)]
pub struct World {
    width: i32,
    height: i32,
    length: i32,
    blocks: Vec<BlockId>,
    pub env: EnvEdges,
}

impl World {
    pub fn new(width: usize, height: usize, length: usize) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            length: length as i32,
            blocks: vec![AIR; width * height * length],
            env: EnvEdges::default(),
        }
    }

    #[inline]
    fn idx(&self, x: i32, y: i32, z: i32) -> usize {
        ((y * self.length + z) * self.width + x) as usize
    }

    /// Stores `block` and returns the previous id, or `None` when out of bounds.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockId) -> Option<BlockId> {
        if !self.contains(x, y, z) {
            return None;
        }
        let i = self.idx(x, y, z);
        Some(std::mem::replace(&mut self.blocks[i], block))
    }

    /// Fills the inclusive box `min..=max`, clamped to the world.
    pub fn fill(&mut self, min: (i32, i32, i32), max: (i32, i32, i32), block: BlockId) {
        let (x0, y0, z0) = (min.0.max(0), min.1.max(0), min.2.max(0));
        let x1 = max.0.min(self.width - 1);
        let y1 = max.1.min(self.height - 1);
        let z1 = max.2.min(self.length - 1);
        for y in y0..=y1 {
            for z in z0..=z1 {
                for x in x0..=x1 {
                    let i = self.idx(x, y, z);
                    self.blocks[i] = block;
                }
            }
        }
    }

    #[inline]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }
}

impl VoxelField for World {
    #[inline]
    fn dims(&self) -> (i32, i32, i32) {
        (self.width, self.height, self.length)
    }

    #[inline]
    fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.blocks[self.idx(x, y, z)]
    }

    #[inline]
    fn env(&self) -> &EnvEdges {
        &self.env
    }
}
