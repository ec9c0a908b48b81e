//! Ambient lighting used by the mesher: a per-column sun heightmap with per-face shading.
#![forbid(unsafe_code)]

use quarry_blocks::{BlockId, BlockRegistry, DrawType, Face, PackedCol};
use quarry_world::{CHUNK_SIZE, VoxelField};

#[cfg(test)]
mod tests;

/// Ambient light queries made while meshing.
pub trait LightingEngine {
    /// Colour of a face of orientation `face`, sampled at cell `(x,y,z)`.
    fn ambient_color(&self, x: i32, y: i32, z: i32, face: Face) -> PackedCol;

    /// Colour for sprite geometry occupying cell `(x,y,z)`.
    fn sprite_color(&self, x: i32, y: i32, z: i32) -> PackedCol {
        self.ambient_color(x, y, z, Face::PosY)
    }

    /// Precompute whatever is needed to mesh chunk column `(cx, cz)` and its one-voxel halo.
    fn hint(&mut self, world: &dyn VoxelField, reg: &BlockRegistry, cx: i32, cz: i32);

    /// A block changed; refresh any cached state covering it.
    fn on_block_changed(&mut self, world: &dyn VoxelField, reg: &BlockRegistry, x: i32, y: i32, z: i32);

    /// Drop all cached state (new map).
    fn reset(&mut self, world: &dyn VoxelField);
}

// Not yet scanned
const HEIGHT_UNKNOWN: i16 = i16::MIN;

// Face shading factors (top, bottom, X sides, Z sides)
const SHADE_YMIN: f32 = 0.5;
const SHADE_X: f32 = 0.6;
const SHADE_Z: f32 = 0.8;

#[inline]
fn blocks_light(reg: &BlockRegistry, b: BlockId) -> bool {
    matches!(reg.draw(b), DrawType::Opaque | DrawType::Translucent)
}

/// Cells strictly above the highest light-blocking block of their column are in sunlight.
pub struct HeightmapLighting {
    width: i32,
    length: i32,
    heights: Vec<i16>,
    sun: [PackedCol; 6],
    shadow: [PackedCol; 6],
    columns_scanned: usize,
}

impl HeightmapLighting {
    pub fn new(world: &dyn VoxelField) -> Self {
        let mut l = Self {
            width: 0,
            length: 0,
            heights: Vec::new(),
            sun: [PackedCol::WHITE; 6],
            shadow: [PackedCol::WHITE; 6],
            columns_scanned: 0,
        };
        l.set_colors(PackedCol::WHITE, PackedCol::rgb(0x9B, 0x9B, 0x9B));
        l.reset(world);
        l
    }

    /// Sets the base sun/shadow colours and derives the per-face shaded variants.
    pub fn set_colors(&mut self, sun: PackedCol, shadow: PackedCol) {
        for face in Face::ALL {
            let t = match face {
                Face::PosY => 1.0,
                Face::NegY => SHADE_YMIN,
                Face::PosX | Face::NegX => SHADE_X,
                Face::PosZ | Face::NegZ => SHADE_Z,
            };
            self.sun[face.index()] = sun.scale(t);
            self.shadow[face.index()] = shadow.scale(t);
        }
    }

    #[inline]
    pub fn columns_scanned(&self) -> usize {
        self.columns_scanned
    }

    /// Cached height of the column, if it was scanned.
    #[inline]
    pub fn height(&self, x: i32, z: i32) -> Option<i16> {
        if x < 0 || z < 0 || x >= self.width || z >= self.length {
            return None;
        }
        let h = self.heights[(z * self.width + x) as usize];
        (h != HEIGHT_UNKNOWN).then_some(h)
    }

    fn scan_column(&mut self, world: &dyn VoxelField, reg: &BlockRegistry, x: i32, z: i32) {
        let (_, h, _) = world.dims();
        let mut y = h - 1;
        while y >= 0 && !blocks_light(reg, world.block_at(x, y, z)) {
            y -= 1;
        }
        self.heights[(z * self.width + x) as usize] = y as i16;
        self.columns_scanned += 1;
    }

    #[inline]
    fn is_lit(&self, x: i32, y: i32, z: i32) -> bool {
        match self.height(x, z) {
            Some(h) => y > h as i32,
            None => true,
        }
    }
}

impl LightingEngine for HeightmapLighting {
    #[inline]
    fn ambient_color(&self, x: i32, y: i32, z: i32, face: Face) -> PackedCol {
        if self.is_lit(x, y, z) {
            self.sun[face.index()]
        } else {
            self.shadow[face.index()]
        }
    }

    fn hint(&mut self, world: &dyn VoxelField, reg: &BlockRegistry, cx: i32, cz: i32) {
        let s = CHUNK_SIZE as i32;
        let x0 = (cx * s - 1).max(0);
        let z0 = (cz * s - 1).max(0);
        let x1 = (cx * s + s).min(self.width - 1);
        let z1 = (cz * s + s).min(self.length - 1);
        for z in z0..=z1 {
            for x in x0..=x1 {
                if self.heights[(z * self.width + x) as usize] == HEIGHT_UNKNOWN {
                    self.scan_column(world, reg, x, z);
                }
            }
        }
    }

    fn on_block_changed(&mut self, world: &dyn VoxelField, reg: &BlockRegistry, x: i32, _y: i32, z: i32) {
        if self.height(x, z).is_some() {
            self.scan_column(world, reg, x, z);
        }
    }

    fn reset(&mut self, world: &dyn VoxelField) {
        let (w, _, l) = world.dims();
        self.width = w;
        self.length = l;
        self.heights = vec![HEIGHT_UNKNOWN; (w.max(0) * l.max(0)) as usize];
        self.columns_scanned = 0;
        log::debug!("lighting reset for {}x{} columns", w, l);
    }
}
