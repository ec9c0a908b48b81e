use serde::Deserialize;

use crate::types::{CollideType, DrawType};

// Top-level blocks config file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub draw: DrawType,
    // Derived from `draw` when absent (gas draws collide as gas, everything else is solid)
    #[serde(default)]
    pub collide: Option<CollideType>,
    // Render bounds in 1/16 block units
    #[serde(default)]
    pub min: Option<[u8; 3]>,
    #[serde(default)]
    pub max: Option<[u8; 3]>,
    #[serde(default)]
    pub textures: TexturesDef,
    #[serde(default)]
    pub tint: Option<[u8; 3]>,
    #[serde(default)]
    pub full_bright: bool,
}

// Terrain-atlas tile per face; `all` is the fallback for any unset role
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TexturesDef {
    #[serde(default)]
    pub all: Option<u16>,
    #[serde(default)]
    pub top: Option<u16>,
    #[serde(default)]
    pub bottom: Option<u16>,
    #[serde(default)]
    pub side: Option<u16>,
}
