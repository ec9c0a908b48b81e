use std::path::Path;

use quarry_runtime::StreamConfig;
use quarry_world::{EnvEdges, TerrainParams};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// `[width, height, length]` in blocks.
    pub size: [usize; 3],
    pub terrain: TerrainParams,
    pub env: EnvEdges,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: [256, 64, 256],
            terrain: TerrainParams::default(),
            env: EnvEdges::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub tiles_per_atlas: u16,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self { tiles_per_atlas: 16 }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlyConfig {
    /// Blocks per second along the orbit.
    pub speed: f32,
    /// Camera height above the terrain base.
    pub height: f32,
    /// Place or remove a block every this many frames; 0 disables edits.
    pub edit_every: u32,
}

impl Default for FlyConfig {
    fn default() -> Self {
        Self {
            speed: 12.0,
            height: 24.0,
            edit_every: 45,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub stream: StreamConfig,
    pub world: WorldConfig,
    pub atlas: AtlasConfig,
    pub fly: FlyConfig,
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.stream.validate().map_err(AppError::Config)?;
        if self.world.size.contains(&0) {
            return Err(AppError::Config(format!(
                "world size {:?} has an empty axis",
                self.world.size
            )));
        }
        if self.world.size[1] > i16::MAX as usize {
            return Err(AppError::Config("world height does not fit a column height".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let text = include_str!("../quarry.toml");
        let cfg: RuntimeConfig = toml::from_str(text).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.atlas.tiles_per_atlas, 16);
    }

    #[test]
    fn empty_axis_is_rejected() {
        let mut cfg = RuntimeConfig::default();
        cfg.world.size = [64, 0, 64];
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));
    }
}
