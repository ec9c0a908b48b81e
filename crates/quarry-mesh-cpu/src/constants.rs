//! Shared constants for quarry-mesh-cpu.

use quarry_world::CHUNK_SIZE;

// Chunk plus a one-voxel border on every side
pub(crate) const HALO: usize = CHUNK_SIZE + 2;
pub(crate) const HALO_VOLUME: usize = HALO * HALO * HALO;
pub(crate) const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

pub(crate) const VERTS_PER_QUAD: u32 = 4;
// Two double-sided diagonal quads
pub(crate) const SPRITE_VERTS: u32 = 16;

// Sprite cross inset from the cell walls, in block units
pub(crate) const SPRITE_MIN: f32 = 2.5 / 16.0;
pub(crate) const SPRITE_MAX: f32 = 13.5 / 16.0;
