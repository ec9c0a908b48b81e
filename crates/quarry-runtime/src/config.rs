use quarry_mesh_cpu::MesherKind;
use serde::Deserialize;

/// Streaming knobs; every field has a default so partial TOML tables work.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Radius in blocks within which chunks are built and drawn.
    pub view_distance: i32,
    /// Radius in blocks within which built chunks stay resident.
    pub user_view_distance: i32,
    /// Floor for the resident radius.
    pub min_resident_distance: i32,
    pub min_chunk_budget: i32,
    pub max_chunk_budget: i32,
    pub initial_chunk_budget: i32,
    /// Frames faster than this grow the build budget; slower ones shrink it.
    pub target_frame_secs: f32,
    /// Extra squared distance past the resident radius before a chunk is evicted.
    pub evict_margin_sq: i32,
    pub mesher: MesherKind,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            view_distance: 96,
            user_view_distance: 128,
            min_resident_distance: 32,
            min_chunk_budget: 4,
            max_chunk_budget: 30,
            initial_chunk_budget: 12,
            target_frame_secs: 1.0 / 30.0,
            evict_margin_sq: 32 * 16,
            mesher: MesherKind::Normal,
        }
    }
}

impl StreamConfig {
    /// Rejects settings the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.view_distance <= 0 {
            return Err(format!("view_distance must be positive, got {}", self.view_distance));
        }
        if self.min_chunk_budget < 1 || self.min_chunk_budget > self.max_chunk_budget {
            return Err(format!(
                "chunk budget range {}..={} is empty",
                self.min_chunk_budget, self.max_chunk_budget
            ));
        }
        if self.target_frame_secs <= 0.0 {
            return Err("target_frame_secs must be positive".into());
        }
        Ok(())
    }
}
