//! Slicing of the terrain atlas into 1D atlas buckets.
//!
//! Every terrain tile lives in exactly one bucket. A bucket is a vertical strip of
//! `tiles_per_atlas` tiles, so geometry from one bucket can be drawn with a single
//! texture bound. Each tile spans the full strip width, so `u` may run past 1.0 and wrap
//! horizontally for merged quads.

use crate::face::{FACE_COUNT, Face};
use crate::registry::BlockRegistry;
use crate::types::BlockId;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct UvRect {
    pub u1: f32,
    pub v1: f32,
    pub u2: f32,
    pub v2: f32,
}

/// Locates the atlas bucket and texture rectangle used by a block face.
pub trait TextureAtlas {
    fn bucket_count(&self) -> usize;
    fn locate(&self, block: BlockId, face: Face) -> (usize, UvRect);
}

#[derive(Clone, Debug)]
pub struct Atlas1D {
    tiles_per_atlas: u16,
    count: usize,
    // Cached per-block tile ids; indexed by block id then face
    tiles: Vec<[u16; FACE_COUNT]>,
}

impl Atlas1D {
    pub fn from_registry(reg: &BlockRegistry, tiles_per_atlas: u16) -> Self {
        let tiles_per_atlas = tiles_per_atlas.max(1);
        let tiles: Vec<[u16; FACE_COUNT]> = reg.blocks.iter().map(|b| b.textures).collect();
        let max_tile = tiles
            .iter()
            .flat_map(|t| t.iter().copied())
            .max()
            .unwrap_or(0) as usize;
        let count = max_tile / tiles_per_atlas as usize + 1;
        log::debug!(
            "atlas: {} bucket(s) of {} tiles (highest tile {})",
            count,
            tiles_per_atlas,
            max_tile
        );
        Self {
            tiles_per_atlas,
            count,
            tiles,
        }
    }

    #[inline]
    pub fn tiles_per_atlas(&self) -> u16 {
        self.tiles_per_atlas
    }

    /// Splits a terrain tile id into `(bucket, row within bucket)`.
    #[inline]
    pub fn split(&self, tile: u16) -> (usize, u16) {
        (
            (tile / self.tiles_per_atlas) as usize,
            tile % self.tiles_per_atlas,
        )
    }
}

impl TextureAtlas for Atlas1D {
    #[inline]
    fn bucket_count(&self) -> usize {
        self.count
    }

    fn locate(&self, block: BlockId, face: Face) -> (usize, UvRect) {
        let tile = self
            .tiles
            .get(block as usize)
            .map(|t| t[face.index()])
            .unwrap_or(0);
        let (bucket, row) = self.split(tile);
        let inv = 1.0 / self.tiles_per_atlas as f32;
        let rect = UvRect {
            u1: 0.0,
            v1: row as f32 * inv,
            u2: 1.0,
            v2: (row + 1) as f32 * inv,
        };
        (bucket.min(self.count - 1), rect)
    }
}
