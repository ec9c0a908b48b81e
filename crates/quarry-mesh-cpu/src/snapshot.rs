use quarry_blocks::types::AIR;
use quarry_blocks::{BlockId, BlockRegistry, DrawType};
use quarry_world::{CHUNK_SIZE, VoxelField};

use crate::alloc::ensure_len;
use crate::constants::{HALO, HALO_VOLUME};

/// What a freshly copied snapshot contains.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SnapshotKind {
    AllAir,
    /// Every cell, halo included, is a full opaque cube.
    AllOpaque,
    Mixed,
}

/// Halo-padded copy of one chunk's voxels, reused across builds.
pub struct Snapshot {
    cells: Vec<BlockId>,
    origin: (i32, i32, i32),
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot {
    pub fn new() -> Self {
        let mut cells = Vec::new();
        ensure_len(&mut cells, HALO_VOLUME, AIR, "voxel snapshot");
        Self {
            cells,
            origin: (0, 0, 0),
        }
    }

    /// World coordinate of local cell `(0,0,0)`.
    #[inline]
    pub fn origin(&self) -> (i32, i32, i32) {
        self.origin
    }

    /// Copies chunk `(cx,cy,cz)` plus its one-voxel border. Cells outside the world read as air.
    pub fn fill(
        &mut self,
        world: &dyn VoxelField,
        reg: &BlockRegistry,
        cx: i32,
        cy: i32,
        cz: i32,
    ) -> SnapshotKind {
        let s = CHUNK_SIZE as i32;
        let (x0, y0, z0) = (cx * s, cy * s, cz * s);
        self.origin = (x0, y0, z0);

        let mut all_air = true;
        let mut all_opaque = true;
        let mut i = 0usize;
        for y in -1..=s {
            for z in -1..=s {
                for x in -1..=s {
                    let b = world.block_or_air(x0 + x, y0 + y, z0 + z);
                    self.cells[i] = b;
                    i += 1;
                    if all_air && reg.draw(b) != DrawType::Gas {
                        all_air = false;
                    }
                    if all_opaque && !reg.is_full_opaque(b) {
                        all_opaque = false;
                    }
                }
            }
        }
        debug_assert_eq!(i, HALO_VOLUME);

        if all_air {
            SnapshotKind::AllAir
        } else if all_opaque {
            SnapshotKind::AllOpaque
        } else {
            SnapshotKind::Mixed
        }
    }

    /// Block at local coordinate; each axis may range over `-1..=16`.
    #[inline]
    pub fn at(&self, lx: i32, ly: i32, lz: i32) -> BlockId {
        let h = HALO as i32;
        self.cells[(((ly + 1) * h + (lz + 1)) * h + (lx + 1)) as usize]
    }
}
