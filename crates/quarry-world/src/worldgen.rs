use fastnoise_lite::{FastNoiseLite, NoiseType};
use quarry_blocks::types::AIR;
use quarry_blocks::{BlockId, BlockRegistry};
use serde::Deserialize;

use crate::field::{VoxelField, World};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub seed: i32,
    pub base_height: i32,
    pub amplitude: f32,
    pub frequency: f32,
    pub water_level: i32,
    /// Chance per grass column of a flower on top, in `[0, 1]`.
    pub flower_density: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 1337,
            base_height: 32,
            amplitude: 12.0,
            frequency: 0.02,
            water_level: 30,
            flower_density: 0.02,
        }
    }
}

struct Palette {
    stone: BlockId,
    dirt: BlockId,
    grass: BlockId,
    sand: BlockId,
    water: BlockId,
    flower: BlockId,
    bedrock: BlockId,
}

impl Palette {
    fn resolve(reg: &BlockRegistry) -> Self {
        let pick = |name: &str, fallback: BlockId| match reg.id_by_name(name) {
            Some(id) => id,
            None => {
                log::warn!("worldgen: block '{}' not registered, using {}", name, fallback);
                fallback
            }
        };
        let stone = pick("stone", 1);
        Self {
            stone,
            dirt: pick("dirt", stone),
            grass: pick("grass", stone),
            sand: pick("sand", stone),
            water: pick("water", AIR),
            flower: pick("flower", AIR),
            bedrock: pick("bedrock", stone),
        }
    }
}

/// Overwrites `world` with noise-driven terrain: bedrock floor, stone, dirt and grass
/// (sand at the shoreline), water up to `water_level`, and scattered flowers.
pub fn generate_terrain(world: &mut World, reg: &BlockRegistry, params: &TerrainParams) {
    let pal = Palette::resolve(reg);
    let (w, h, l) = world.dims();

    let mut height = FastNoiseLite::with_seed(params.seed);
    height.set_noise_type(Some(NoiseType::OpenSimplex2));
    height.set_frequency(Some(params.frequency));
    let mut scatter = FastNoiseLite::with_seed(params.seed ^ 0x5EED);
    scatter.set_noise_type(Some(NoiseType::Value));
    scatter.set_frequency(Some(0.9));

    let mut columns = 0usize;
    for z in 0..l {
        for x in 0..w {
            let n = height.get_noise_2d(x as f32, z as f32);
            let top = (params.base_height + (n * params.amplitude) as i32).clamp(1, h - 1);
            let shore = top <= params.water_level + 1;
            for y in 0..h {
                let b = if y == 0 {
                    pal.bedrock
                } else if y < top - 3 {
                    pal.stone
                } else if y < top {
                    if shore { pal.sand } else { pal.dirt }
                } else if y == top {
                    if shore { pal.sand } else { pal.grass }
                } else if y <= params.water_level {
                    pal.water
                } else {
                    AIR
                };
                world.set_block(x, y, z, b);
            }
            if !shore && top + 1 < h && pal.flower != AIR {
                let r = (scatter.get_noise_2d(x as f32, z as f32) + 1.0) * 0.5;
                if r < params.flower_density {
                    world.set_block(x, top + 1, z, pal.flower);
                }
            }
            columns += 1;
        }
    }
    log::info!(
        "generated terrain: {}x{}x{} ({} columns, seed {})",
        w,
        h,
        l,
        columns,
        params.seed
    );
}
