use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use quarry_geom::{Aabb, Vec3};

use crate::config::{BlockDef, BlocksConfig, TexturesDef};
use crate::face::{FACE_COUNT, Face};
use crate::types::{AIR, BlockId, CollideType, DrawType, PackedCol};

/// Upper bound on registered ids; the hidden-face table is `n * n` bytes.
pub const MAX_BLOCK_ID: BlockId = 1023;

const BB_UNITS: f32 = 16.0;

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub draw: DrawType,
    pub collide: CollideType,
    /// Render bounds in block-local units.
    pub bounds: Aabb,
    /// Terrain-atlas tile per face, indexed by `Face::index`.
    pub textures: [u16; FACE_COUNT],
    pub tint: Option<PackedCol>,
    pub full_bright: bool,
    /// Bit per face: set when the face is flush with the cell wall, so its light is
    /// sampled from the neighbouring cell rather than the block's own cell.
    pub light_offset: u8,
}

impl BlockType {
    fn placeholder(id: BlockId) -> Self {
        BlockType {
            id,
            name: String::new(),
            draw: DrawType::Gas,
            collide: CollideType::Gas,
            bounds: Aabb::UNIT,
            textures: [0; FACE_COUNT],
            tint: None,
            full_bright: false,
            light_offset: 0,
        }
    }

    #[inline]
    pub fn is_liquid(&self) -> bool {
        self.collide == CollideType::Liquid
    }

    /// Opaque draw covering the whole cell.
    #[inline]
    pub fn is_full_opaque(&self) -> bool {
        self.draw == DrawType::Opaque && self.bounds == Aabb::UNIT
    }

    #[inline]
    pub fn texture(&self, face: Face) -> u16 {
        self.textures[face.index()]
    }

    #[inline]
    pub fn light_from_neighbor(&self, face: Face) -> bool {
        self.light_offset & face.bit() != 0
    }
}

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    // hidden[a * n + b] has bit `face` set when block `a` never shows that face against neighbour `b`
    hidden: Vec<u8>,
    stretch: Vec<u8>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn draw(&self, id: BlockId) -> DrawType {
        self.get(id).map(|t| t.draw).unwrap_or(DrawType::Gas)
    }

    #[inline]
    pub fn is_liquid(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|t| t.is_liquid())
    }

    #[inline]
    pub fn is_full_opaque(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|t| t.is_full_opaque())
    }

    /// True when `block` never shows `face` against `neighbor` placed across that face.
    #[inline]
    pub fn is_face_hidden(&self, block: BlockId, neighbor: BlockId, face: Face) -> bool {
        let n = self.blocks.len();
        let (a, b) = (block as usize, neighbor as usize);
        if a >= n || b >= n {
            return false;
        }
        self.hidden[a * n + b] & face.bit() != 0
    }

    /// Whether runs of this block's `face` may be merged into a single quad.
    #[inline]
    pub fn can_stretch(&self, block: BlockId, face: Face) -> bool {
        self.stretch
            .get(block as usize)
            .is_some_and(|m| m & face.bit() != 0)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(s)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::new();
        let mut next_id: u32 = 0;
        for def in cfg.blocks {
            let id = def.id.map(u32::from).unwrap_or(next_id);
            if id > MAX_BLOCK_ID as u32 {
                return Err(format!("block '{}' has id {} above {}", def.name, id, MAX_BLOCK_ID).into());
            }
            let id = id as BlockId;
            next_id = id as u32 + 1;
            let ty = compile_block(id, def)?;
            reg.insert(ty)?;
        }
        if reg.blocks.is_empty() {
            reg.insert(BlockType {
                name: "air".into(),
                ..BlockType::placeholder(AIR)
            })?;
        }
        reg.recompute_culling();
        log::debug!("block registry: {} ids", reg.blocks.len());
        Ok(reg)
    }

    fn insert(&mut self, ty: BlockType) -> Result<(), Box<dyn Error>> {
        let ix = ty.id as usize;
        if ix < self.blocks.len() && !self.blocks[ix].name.is_empty() {
            return Err(format!(
                "block id {} assigned to both '{}' and '{}'",
                ty.id, self.blocks[ix].name, ty.name
            )
            .into());
        }
        while self.blocks.len() <= ix {
            let gap = self.blocks.len() as BlockId;
            self.blocks.push(BlockType::placeholder(gap));
        }
        self.by_name.insert(ty.name.clone(), ty.id);
        self.blocks[ix] = ty;
        Ok(())
    }

    /// Rebuilds the hidden-face and stretch tables. Call after any definition change.
    pub fn recompute_culling(&mut self) {
        let n = self.blocks.len();
        self.hidden = vec![0; n * n];
        self.stretch = vec![0; n];
        for a in 0..n {
            let ta = &self.blocks[a];
            self.stretch[a] = stretch_mask(ta);
            for b in 0..n {
                self.hidden[a * n + b] = hidden_mask(ta, &self.blocks[b]);
            }
        }
    }
}

fn compile_block(id: BlockId, def: BlockDef) -> Result<BlockType, Box<dyn Error>> {
    let min = def.min.unwrap_or([0, 0, 0]);
    let max = def.max.unwrap_or([16, 16, 16]);
    for axis in 0..3 {
        if min[axis] > max[axis] || max[axis] > 16 {
            return Err(format!("block '{}' has invalid bounds {:?}..{:?}", def.name, min, max).into());
        }
    }
    let to_vec = |v: [u8; 3]| {
        Vec3::new(
            v[0] as f32 / BB_UNITS,
            v[1] as f32 / BB_UNITS,
            v[2] as f32 / BB_UNITS,
        )
    };
    let bounds = Aabb::new(to_vec(min), to_vec(max));
    let collide = def.collide.unwrap_or(match def.draw {
        DrawType::Gas => CollideType::Gas,
        DrawType::Sprite => CollideType::Gas,
        _ => CollideType::Solid,
    });
    Ok(BlockType {
        id,
        name: def.name,
        draw: def.draw,
        collide,
        bounds,
        textures: resolve_textures(&def.textures),
        tint: def.tint.map(|[r, g, b]| PackedCol::rgb(r, g, b)),
        full_bright: def.full_bright,
        light_offset: light_offset_mask(&bounds),
    })
}

fn resolve_textures(t: &TexturesDef) -> [u16; FACE_COUNT] {
    let all = t.all.unwrap_or(0);
    let mut out = [0u16; FACE_COUNT];
    for face in Face::ALL {
        out[face.index()] = match face {
            Face::PosY => t.top.unwrap_or(all),
            Face::NegY => t.bottom.unwrap_or(all),
            _ => t.side.unwrap_or(all),
        };
    }
    out
}

fn light_offset_mask(bb: &Aabb) -> u8 {
    let mut m = 0u8;
    let mut set = |face: Face, flush: bool| {
        if flush {
            m |= face.bit();
        }
    };
    set(Face::NegX, bb.min.x == 0.0);
    set(Face::PosX, bb.max.x == 1.0);
    set(Face::NegY, bb.min.y == 0.0);
    set(Face::PosY, bb.max.y == 1.0);
    set(Face::NegZ, bb.min.z == 0.0);
    set(Face::PosZ, bb.max.z == 1.0);
    m
}

// Side X faces merge along Z; Z faces and top/bottom merge along X.
fn stretch_mask(t: &BlockType) -> u8 {
    if t.draw == DrawType::Sprite || t.draw == DrawType::Gas {
        return 0;
    }
    let bb = &t.bounds;
    let mut m = 0u8;
    if bb.min.z == 0.0 && bb.max.z == 1.0 {
        m |= Face::PosX.bit() | Face::NegX.bit();
    }
    if bb.min.x == 0.0 && bb.max.x == 1.0 {
        m |= Face::PosZ.bit() | Face::NegZ.bit() | Face::PosY.bit() | Face::NegY.bit();
    }
    m
}

// Material rule, before geometry: does `other` cull faces of `block` at all?
fn culls(block: &BlockType, other: &BlockType) -> bool {
    if block.draw == DrawType::Sprite {
        return false;
    }
    if block.is_liquid() && other.is_liquid() && other.draw == DrawType::Opaque {
        return true;
    }
    if block.id == other.id {
        return block.draw != DrawType::TransparentThick;
    }
    if other.draw == DrawType::Opaque && !other.is_liquid() {
        return true;
    }
    if block.draw != DrawType::Translucent || other.draw != DrawType::Translucent {
        return false;
    }
    block.collide == other.collide
}

fn hidden_mask(block: &BlockType, other: &BlockType) -> u8 {
    if !culls(block, other) {
        return 0;
    }
    let (b, o) = (&block.bounds, &other.bounds);
    let covers_y = o.min.y <= b.min.y && o.max.y >= b.max.y;
    let covers_x = o.min.x <= b.min.x && o.max.x >= b.max.x;
    let covers_z = o.min.z <= b.min.z && o.max.z >= b.max.z;
    let both_liquid = block.is_liquid() && other.is_liquid();

    let mut m = 0u8;
    let mut set = |face: Face, hidden: bool| {
        if hidden {
            m |= face.bit();
        }
    };
    set(Face::NegX, covers_y && covers_z && b.min.x == 0.0 && o.max.x == 1.0);
    set(Face::PosX, covers_y && covers_z && b.max.x == 1.0 && o.min.x == 0.0);
    set(Face::NegZ, covers_x && covers_y && b.min.z == 0.0 && o.max.z == 1.0);
    set(Face::PosZ, covers_x && covers_y && b.max.z == 1.0 && o.min.z == 0.0);
    set(
        Face::NegY,
        covers_x && covers_z && (both_liquid || (b.min.y == 0.0 && o.max.y == 1.0)),
    );
    set(
        Face::PosY,
        covers_x && covers_z && (both_liquid || (b.max.y == 1.0 && o.min.y == 0.0)),
    );
    m
}
