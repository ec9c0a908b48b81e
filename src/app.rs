use std::f32::consts::FRAC_PI_2;
use std::path::Path;
use std::time::Instant;

use quarry_blocks::{Atlas1D, BlockId, BlockRegistry, DrawType, TextureAtlas};
use quarry_geom::{Frustum, Vec3};
use quarry_gfx::HeadlessGfx;
use quarry_lighting::HeightmapLighting;
use quarry_mesh_cpu::BuildContext;
use quarry_runtime::{CameraView, ChunkStreamScheduler, FrameStats};
use quarry_world::{VoxelField, World, generate_terrain};

use crate::config::RuntimeConfig;
use crate::error::AppError;

// Simulated camera step; the build budget still adapts to measured frame time.
const FRAME_STEP: f32 = 1.0 / 60.0;
const FOV_Y: f32 = 70.0 * std::f32::consts::PI / 180.0;
const ASPECT: f32 = 16.0 / 9.0;

#[derive(Debug, Default)]
pub struct RunSummary {
    pub frames: u32,
    pub chunks_built: u64,
    pub evicted: u64,
    pub edits: u32,
    pub draw_calls: usize,
    pub triangles: u64,
    pub peak_buffers: usize,
    pub leaked_buffers: usize,
}

/// Generated map, headless device and scheduler flown through by an orbiting camera.
pub struct HeadlessApp {
    cfg: RuntimeConfig,
    world: World,
    registry: BlockRegistry,
    atlas: Atlas1D,
    lighting: HeightmapLighting,
    gfx: HeadlessGfx,
    scheduler: ChunkStreamScheduler,
    edit_block: BlockId,
    angle: f32,
}

impl HeadlessApp {
    pub fn new(cfg: RuntimeConfig, blocks: &Path) -> Result<Self, AppError> {
        let registry =
            BlockRegistry::load_from_path(blocks).map_err(|e| AppError::Registry(e.to_string()))?;
        let edit_block = registry
            .id_by_name("glowstone")
            .or_else(|| registry.id_by_name("stone"))
            .ok_or_else(|| AppError::Registry("neither 'glowstone' nor 'stone' is defined".into()))?;

        let [w, h, l] = cfg.world.size;
        let mut world = World::new(w, h, l);
        world.env = cfg.world.env;
        generate_terrain(&mut world, &registry, &cfg.world.terrain);

        let atlas = Atlas1D::from_registry(&registry, cfg.atlas.tiles_per_atlas);
        let lighting = HeightmapLighting::new(&world);
        let mut gfx = HeadlessGfx::new();
        let mut scheduler = ChunkStreamScheduler::new(cfg.stream.clone());
        scheduler.init(&world, &atlas, &mut gfx);
        log::info!(
            "map ready: {} block types, {} atlas bucket(s)",
            registry.len(),
            atlas.bucket_count()
        );

        Ok(Self {
            cfg,
            world,
            registry,
            atlas,
            lighting,
            gfx,
            scheduler,
            edit_block,
            angle: 0.0,
        })
    }

    fn camera(&self) -> CameraView {
        let (w, _, l) = self.world.dims();
        let radius = (w.min(l) as f32 / 3.0).max(1.0);
        let centre = Vec3::new(
            w as f32 * 0.5,
            self.cfg.world.terrain.base_height as f32 + self.cfg.fly.height,
            l as f32 * 0.5,
        );
        let (s, c) = self.angle.sin_cos();
        CameraView {
            position: centre + Vec3::new(s * radius, 0.0, -c * radius),
            // Facing along the orbit
            yaw: self.angle + FRAC_PI_2,
            pitch: -0.2,
        }
    }

    fn frustum(&self, view: &CameraView) -> Frustum {
        let far = (self.cfg.stream.view_distance as f32 * 1.5).max(16.0);
        Frustum::from_view(view.position, view.yaw, view.pitch, FOV_Y, ASPECT, 0.1, far)
    }

    /// Places the edit block on top of a column near the camera, or removes it if it is
    /// already there.
    fn edit_near(&mut self, view: &CameraView, frame: u32) -> bool {
        let (w, h, l) = self.world.dims();
        let x = (view.position.x as i32 + (frame * 7 % 17) as i32 - 8).clamp(0, w - 1);
        let z = (view.position.z as i32 + (frame * 11 % 17) as i32 - 8).clamp(0, l - 1);
        let Some(top) = (0..h)
            .rev()
            .find(|&y| self.registry.draw(self.world.block_at(x, y, z)) != DrawType::Gas)
        else {
            return false;
        };

        let (y, block) = if self.world.block_at(x, top, z) == self.edit_block {
            (top, quarry_blocks::types::AIR)
        } else if top + 1 < h {
            (top + 1, self.edit_block)
        } else {
            return false;
        };
        self.world.set_block(x, y, z, block);
        let mut ctx = BuildContext {
            world: &self.world,
            registry: &self.registry,
            lighting: &mut self.lighting,
            atlas: &self.atlas,
            gfx: &mut self.gfx,
        };
        self.scheduler.on_block_changed(&mut ctx, x, y, z);
        log::debug!("edit: ({x},{y},{z}) -> block {block}");
        true
    }

    fn step(&mut self, frame: u32, delta: f32) -> FrameStats {
        let view = self.camera();
        let frustum = self.frustum(&view);
        let mut ctx = BuildContext {
            world: &self.world,
            registry: &self.registry,
            lighting: &mut self.lighting,
            atlas: &self.atlas,
            gfx: &mut self.gfx,
        };
        let stats = self.scheduler.update_chunks(&mut ctx, &view, &frustum, delta);

        self.gfx.reset_frame_counters();
        self.scheduler.render_batches(&mut self.gfx, false);
        self.scheduler.render_batches(&mut self.gfx, true);

        let radius = (self.world.dims().0.min(self.world.dims().2) as f32 / 3.0).max(1.0);
        self.angle += self.cfg.fly.speed * FRAME_STEP / radius;
        if frame % 60 == 0 {
            log::info!(
                "frame {frame}: budget {} built {} render {} evicted {} buffers {}",
                stats.budget,
                stats.chunks_updated,
                stats.render_count,
                stats.evicted,
                self.gfx.live_buffers()
            );
        }
        stats
    }

    /// Runs `frames` frames, then unloads the map.
    pub fn run(&mut self, frames: u32) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut delta = FRAME_STEP;
        for frame in 0..frames {
            let start = Instant::now();
            let stats = self.step(frame, delta);
            summary.frames += 1;
            summary.evicted += u64::from(stats.evicted);
            summary.draw_calls += self.gfx.draw_calls;
            summary.triangles += self.gfx.triangles;
            summary.peak_buffers = summary.peak_buffers.max(self.gfx.live_buffers());

            let every = self.cfg.fly.edit_every;
            if every > 0 && frame > 0 && frame % every == 0 {
                let view = self.camera();
                if self.edit_near(&view, frame) {
                    summary.edits += 1;
                }
            }
            delta = start.elapsed().as_secs_f32();
        }

        summary.chunks_built = self.scheduler.total_built();
        self.scheduler.teardown(&mut self.gfx);
        summary.leaked_buffers = self.gfx.live_buffers();
        if summary.leaked_buffers > 0 {
            log::warn!("{} buffer(s) still alive after teardown", summary.leaked_buffers);
        }
        summary
    }
}
