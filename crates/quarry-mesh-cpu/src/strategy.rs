use quarry_blocks::{BlockRegistry, TextureAtlas};
use quarry_gfx::Gfx;
use quarry_lighting::LightingEngine;
use quarry_world::VoxelField;
use serde::Deserialize;

use crate::builder::NormalMeshBuilder;
use crate::partition::ChunkPartInfo;

/// Collaborators a chunk build reads from (and uploads into).
pub struct BuildContext<'a> {
    pub world: &'a dyn VoxelField,
    pub registry: &'a BlockRegistry,
    pub lighting: &'a mut dyn LightingEngine,
    pub atlas: &'a dyn TextureAtlas,
    pub gfx: &'a mut dyn Gfx,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BuildOutcome {
    /// Snapshot held nothing but air; the chunk can be skipped until edited.
    pub all_air: bool,
    pub has_normal: bool,
    pub has_translucent: bool,
}

impl BuildOutcome {
    #[inline]
    pub fn has_mesh(&self) -> bool {
        self.has_normal || self.has_translucent
    }
}

/// Turns one chunk of voxels into uploaded partitions.
pub trait MeshBuilderStrategy {
    fn name(&self) -> &'static str;

    /// Meshes chunk `(cx,cy,cz)` into `parts`, which holds `2 * bucket_count` empty slots:
    /// opaque buckets first, then translucent ones.
    fn build(
        &mut self,
        ctx: &mut BuildContext<'_>,
        cx: i32,
        cy: i32,
        cz: i32,
        parts: &mut [ChunkPartInfo],
    ) -> BuildOutcome;
}

/// Mesher selected at map load.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MesherKind {
    #[default]
    Normal,
}

impl MesherKind {
    pub fn create(self) -> Box<dyn MeshBuilderStrategy> {
        match self {
            MesherKind::Normal => Box::new(NormalMeshBuilder::new()),
        }
    }
}
