//! CPU meshing crate: greedy chunk mesher and per-atlas vertex staging (engine-only).
#![forbid(unsafe_code)]

pub mod alloc;
mod builder;
mod constants;
mod emit;
mod partition;
mod snapshot;
mod strategy;

pub use builder::NormalMeshBuilder;
pub use emit::quad_normal;
pub use partition::{ChunkPartInfo, TexturePartitionWriter};
pub use snapshot::{Snapshot, SnapshotKind};
pub use strategy::{BuildContext, BuildOutcome, MeshBuilderStrategy, MesherKind};
