//! Voxel storage, world sizing and terrain generation.
#![forbid(unsafe_code)]

pub mod field;
pub mod worldgen;

pub use field::{CHUNK_SHIFT, CHUNK_SIZE, EnvEdges, VoxelField, World};
pub use worldgen::{TerrainParams, generate_terrain};
