use quarry_blocks::{DrawType, TextureAtlas};
use quarry_geom::{FrustumTest, Vec3};
use quarry_gfx::Gfx;
use quarry_mesh_cpu::alloc::{ensure_len, ensure_len_with};
use quarry_mesh_cpu::{BuildContext, ChunkPartInfo, MeshBuilderStrategy};
use quarry_world::{CHUNK_SHIFT, CHUNK_SIZE, EnvEdges, VoxelField};

use crate::chunk::ChunkInfo;
use crate::config::StreamConfig;
use crate::sorter::ChunkDistanceSorter;

// Bounding sphere of a chunk around its centre (8·√3 rounded up)
const CHUNK_RADIUS: f32 = 14.0;

/// Camera state the scheduler compares between frames.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// Per-frame counters returned by [`ChunkStreamScheduler::update_chunks`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub budget: i32,
    pub chunks_updated: u32,
    pub render_count: usize,
    pub evicted: u32,
    pub moved: bool,
}

#[inline]
fn adjust_dist(dist: i32) -> i32 {
    (std::f32::consts::SQRT_2 * dist as f32) as i32
}

#[inline]
fn radius_sq(dist: i32) -> i32 {
    let d = adjust_dist(dist) + 24;
    d * d
}

/// Owns every chunk record, the flat partition array and the GPU buffers behind it for
/// the currently loaded map. `init` and `teardown` bracket a map's lifetime.
pub struct ChunkStreamScheduler {
    cfg: StreamConfig,
    mesher: Box<dyn MeshBuilderStrategy>,
    sorter: ChunkDistanceSorter,
    initialised: bool,

    chunk_counts: (i32, i32, i32),
    chunks: Vec<ChunkInfo>,
    sorted: Vec<usize>,
    distances: Vec<i32>,
    render: Vec<usize>,
    render_count: usize,

    buckets: usize,
    parts: Vec<ChunkPartInfo>,
    pub(crate) normal_used: Vec<u32>,
    pub(crate) translucent_used: Vec<u32>,
    pub(crate) has_normal_parts: Vec<bool>,
    pub(crate) check_normal_parts: Vec<bool>,
    pub(crate) has_translucent_parts: Vec<bool>,
    pub(crate) check_translucent_parts: Vec<bool>,

    budget: i32,
    render_dist_sq: i32,
    user_dist_sq: i32,
    last_view: Option<CameraView>,
    total_built: u64,
}

impl ChunkStreamScheduler {
    pub fn new(cfg: StreamConfig) -> Self {
        let mesher = cfg.mesher.create();
        let budget = cfg.initial_chunk_budget.clamp(cfg.min_chunk_budget, cfg.max_chunk_budget);
        let mut s = Self {
            cfg,
            mesher,
            sorter: ChunkDistanceSorter::new(),
            initialised: false,
            chunk_counts: (0, 0, 0),
            chunks: Vec::new(),
            sorted: Vec::new(),
            distances: Vec::new(),
            render: Vec::new(),
            render_count: 0,
            buckets: 0,
            parts: Vec::new(),
            normal_used: Vec::new(),
            translucent_used: Vec::new(),
            has_normal_parts: Vec::new(),
            check_normal_parts: Vec::new(),
            has_translucent_parts: Vec::new(),
            check_translucent_parts: Vec::new(),
            budget,
            render_dist_sq: 0,
            user_dist_sq: 0,
            last_view: None,
            total_built: 0,
        };
        s.calc_view_dists();
        s
    }

    fn calc_view_dists(&mut self) {
        self.render_dist_sq = radius_sq(self.cfg.view_distance);
        let resident = self.cfg.user_view_distance.max(self.cfg.min_resident_distance);
        self.user_dist_sq = radius_sq(resident);
    }

    /// Map loaded: sizes every per-chunk array for `world` and schedules all chunks.
    /// A previously loaded map is torn down first.
    pub fn init(&mut self, world: &dyn VoxelField, atlas: &dyn TextureAtlas, gfx: &mut dyn Gfx) {
        if self.initialised {
            self.teardown(gfx);
        }
        let (nx, ny, nz) = world.chunk_counts();
        let count = nx * ny * nz;
        self.chunk_counts = (nx as i32, ny as i32, nz as i32);

        ensure_len_with(&mut self.chunks, count, ChunkInfo::default, "chunk records");
        ensure_len(&mut self.sorted, count, 0, "sorted chunk list");
        ensure_len(&mut self.distances, count, 0, "chunk distances");
        ensure_len(&mut self.render, count, 0, "render chunk list");
        self.chunks.truncate(count);
        self.sorted.truncate(count);
        self.distances.truncate(count);
        self.render.truncate(count);
        let mut i = 0;
        for cy in 0..ny as i32 {
            for cz in 0..nz as i32 {
                for cx in 0..nx as i32 {
                    self.chunks[i] = ChunkInfo::new(cx, cy, cz);
                    self.sorted[i] = i;
                    i += 1;
                }
            }
        }
        self.alloc_parts(atlas.bucket_count());

        self.render_count = 0;
        self.last_view = None;
        self.sorter.invalidate();
        self.initialised = true;
        log::info!(
            target: "stream",
            "map init: {}x{}x{} chunks, {} atlas bucket(s), mesher '{}'",
            nx,
            ny,
            nz,
            self.buckets,
            self.mesher.name()
        );
    }

    /// Map unloaded: frees every GPU buffer and drops all per-chunk storage.
    pub fn teardown(&mut self, gfx: &mut dyn Gfx) {
        if !self.initialised {
            return;
        }
        self.clear_chunk_cache(gfx);
        self.chunks = Vec::new();
        self.sorted = Vec::new();
        self.distances = Vec::new();
        self.render = Vec::new();
        self.render_count = 0;
        self.parts = Vec::new();
        self.buckets = 0;
        self.chunk_counts = (0, 0, 0);
        self.last_view = None;
        self.initialised = false;
        log::info!(target: "stream", "map teardown");
    }

    fn alloc_parts(&mut self, buckets: usize) {
        self.buckets = buckets;
        let slots = self.chunks.len() * buckets * 2;
        self.parts = Vec::new();
        ensure_len_with(&mut self.parts, slots, ChunkPartInfo::default, "chunk partitions");
        for v in [&mut self.normal_used, &mut self.translucent_used] {
            v.clear();
            ensure_len(v, buckets, 0, "partition usage counters");
        }
        for v in [
            &mut self.has_normal_parts,
            &mut self.check_normal_parts,
            &mut self.has_translucent_parts,
            &mut self.check_translucent_parts,
        ] {
            v.clear();
            ensure_len(v, buckets, false, "partition flags");
        }
        self.reset_part_flags();
    }

    #[inline]
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    #[inline]
    pub fn config(&self) -> &StreamConfig {
        &self.cfg
    }

    #[inline]
    pub fn budget(&self) -> i32 {
        self.budget
    }

    #[inline]
    pub fn total_built(&self) -> u64 {
        self.total_built
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets
    }

    #[inline]
    pub fn chunks(&self) -> &[ChunkInfo] {
        &self.chunks
    }

    pub fn chunk_index(&self, cx: i32, cy: i32, cz: i32) -> Option<usize> {
        let (nx, ny, nz) = self.chunk_counts;
        if cx < 0 || cy < 0 || cz < 0 || cx >= nx || cy >= ny || cz >= nz {
            return None;
        }
        Some(((cy * nz + cz) * nx + cx) as usize)
    }

    pub fn chunk(&self, cx: i32, cy: i32, cz: i32) -> Option<&ChunkInfo> {
        self.chunk_index(cx, cy, cz).map(|i| &self.chunks[i])
    }

    /// Chunk indices ordered nearest first as of the last resort.
    #[inline]
    pub fn sorted(&self) -> &[usize] {
        &self.sorted
    }

    /// Chunk indices to draw this frame.
    #[inline]
    pub fn render_chunks(&self) -> &[usize] {
        &self.render[..self.render_count]
    }

    #[inline]
    pub fn parts(&self) -> &[ChunkPartInfo] {
        &self.parts
    }

    /// Chunks currently contributing `(opaque, translucent)` geometry to `bucket`.
    pub fn bucket_usage(&self, bucket: usize) -> (u32, u32) {
        (self.normal_used[bucket], self.translucent_used[bucket])
    }

    pub(crate) fn reset_part_flags(&mut self) {
        self.check_normal_parts.fill(true);
        self.check_translucent_parts.fill(true);
        self.has_normal_parts.fill(false);
        self.has_translucent_parts.fill(false);
    }

    fn adapt_budget(&mut self, delta: f32) {
        self.budget += if delta < self.cfg.target_frame_secs { 1 } else { -1 };
        self.budget = self.budget.clamp(self.cfg.min_chunk_budget, self.cfg.max_chunk_budget);
    }

    /// Per-frame update: resorts around the camera, adapts the budget, then builds,
    /// evicts and classifies chunks. `delta` is the previous frame's duration in seconds.
    pub fn update_chunks(
        &mut self,
        ctx: &mut BuildContext<'_>,
        view: &CameraView,
        frustum: &dyn FrustumTest,
        delta: f32,
    ) -> FrameStats {
        if !self.initialised {
            return FrameStats::default();
        }
        if self.sorter.update_order(view.position, &mut self.chunks, &mut self.sorted, &mut self.distances) {
            self.reset_part_flags();
        }
        self.adapt_budget(delta);

        let moved = self.last_view != Some(*view);
        let mut stats = FrameStats {
            budget: self.budget,
            moved,
            ..FrameStats::default()
        };
        self.render_count = if moved {
            self.update_moved(ctx, frustum, &mut stats)
        } else {
            self.update_still(ctx, frustum, &mut stats)
        };
        self.last_view = Some(*view);
        stats.render_count = self.render_count;

        if moved || stats.chunks_updated > 0 {
            self.reset_part_flags();
        }
        log::trace!(
            target: "stream",
            "frame: budget={} updated={} render={} evicted={} moved={}",
            stats.budget,
            stats.chunks_updated,
            stats.render_count,
            stats.evicted,
            moved
        );
        stats
    }

    // Camera unchanged: only finish chunks still waiting for a build.
    fn update_still(
        &mut self,
        ctx: &mut BuildContext<'_>,
        frustum: &dyn FrustumTest,
        stats: &mut FrameStats,
    ) -> usize {
        let mut j = self.render_count;
        let mut dropped = false;
        for slot in 0..self.sorted.len() {
            let ix = self.sorted[slot];
            let info = &self.chunks[ix];
            if info.empty {
                continue;
            }
            let needs_build = !info.has_geometry() || info.pending_delete;
            if !needs_build
                || self.distances[slot] > self.render_dist_sq
                || stats.chunks_updated as i32 >= self.budget
            {
                continue;
            }
            // Already in the render list from an earlier frame
            let listed = info.visible;
            self.delete_chunk(ctx.gfx, ix);
            self.build_chunk(ctx, ix, stats);

            let visible = self.sphere_visible(ix, frustum);
            let info = &mut self.chunks[ix];
            info.visible = visible && !info.empty;
            if info.visible && !listed && j < self.render.len() {
                self.render[j] = ix;
                j += 1;
            }
            dropped |= listed && !info.visible;
        }

        if dropped {
            let mut kept = 0;
            for n in 0..j {
                let ix = self.render[n];
                if self.chunks[ix].visible {
                    self.render[kept] = ix;
                    kept += 1;
                }
            }
            j = kept;
        }
        j
    }

    // Camera moved: evict far chunks, build near ones, and redo visibility for all.
    fn update_moved(
        &mut self,
        ctx: &mut BuildContext<'_>,
        frustum: &dyn FrustumTest,
        stats: &mut FrameStats,
    ) -> usize {
        let mut j = 0;
        for slot in 0..self.sorted.len() {
            let ix = self.sorted[slot];
            if self.chunks[ix].empty {
                continue;
            }
            let dist = self.distances[slot];
            let has_geometry = self.chunks[ix].has_geometry();
            if has_geometry && dist >= self.user_dist_sq + self.cfg.evict_margin_sq {
                self.delete_chunk(ctx.gfx, ix);
                self.chunks[ix].visible = false;
                stats.evicted += 1;
                log::trace!(target: "stream", "evicted chunk {ix} (dist² {dist})");
                continue;
            }

            let needs_build = !has_geometry || self.chunks[ix].pending_delete;
            if needs_build && dist <= self.render_dist_sq && (stats.chunks_updated as i32) < self.budget {
                self.delete_chunk(ctx.gfx, ix);
                self.build_chunk(ctx, ix, stats);
            }

            let visible = dist <= self.render_dist_sq && self.sphere_visible(ix, frustum);
            let info = &mut self.chunks[ix];
            info.visible = visible && !info.empty;
            if info.visible {
                self.render[j] = ix;
                j += 1;
            }
        }
        j
    }

    fn sphere_visible(&self, ix: usize, frustum: &dyn FrustumTest) -> bool {
        let (x, y, z) = self.chunks[ix].centre;
        frustum.sphere_visible(Vec3::new(x as f32, y as f32, z as f32), CHUNK_RADIUS)
    }

    /// Frees a chunk's buffers and returns it to the unbuilt state.
    fn delete_chunk(&mut self, gfx: &mut dyn Gfx, ix: usize) {
        let buckets = self.buckets;
        let info = &mut self.chunks[ix];
        info.empty = false;
        info.all_air = false;
        let ranges = [
            (info.normal_parts.take(), &mut self.normal_used),
            (info.translucent_parts.take(), &mut self.translucent_used),
        ];
        for (base, used) in ranges {
            let Some(base) = base else {
                continue;
            };
            for (bucket, part) in self.parts[base..base + buckets].iter_mut().enumerate() {
                if !part.is_empty() {
                    used[bucket] -= 1;
                }
                let mut handle = part.take();
                gfx.delete_buffer(&mut handle);
            }
        }
    }

    fn build_chunk(&mut self, ctx: &mut BuildContext<'_>, ix: usize, stats: &mut FrameStats) {
        self.total_built += 1;
        stats.chunks_updated += 1;
        let buckets = self.buckets;
        let base = ix * buckets * 2;
        let info = &mut self.chunks[ix];
        info.pending_delete = false;

        let parts = &mut self.parts[base..base + buckets * 2];
        let out = self.mesher.build(ctx, info.cx, info.cy, info.cz, parts);
        info.all_air = out.all_air;
        if !out.has_mesh() {
            info.empty = true;
            return;
        }
        if out.has_normal {
            info.normal_parts = Some(base);
            for (bucket, part) in parts[..buckets].iter().enumerate() {
                if !part.is_empty() {
                    self.normal_used[bucket] += 1;
                }
            }
        }
        if out.has_translucent {
            info.translucent_parts = Some(base + buckets);
            for (bucket, part) in parts[buckets..].iter().enumerate() {
                if !part.is_empty() {
                    self.translucent_used[bucket] += 1;
                }
            }
        }
    }

    /// Frees every chunk's geometry so everything is rebuilt.
    fn clear_chunk_cache(&mut self, gfx: &mut dyn Gfx) {
        for ix in 0..self.chunks.len() {
            self.delete_chunk(gfx, ix);
        }
        self.render_count = 0;
        self.last_view = None;
    }

    /// Marks a chunk for rebuild. All-air chunks stay skipped.
    pub fn refresh_chunk(&mut self, cx: i32, cy: i32, cz: i32) {
        let Some(ix) = self.chunk_index(cx, cy, cz) else {
            return;
        };
        let info = &mut self.chunks[ix];
        if info.all_air {
            return;
        }
        info.empty = false;
        info.pending_delete = true;
    }

    /// Marks every chunk for rebuild, keeping current geometry until then.
    pub fn refresh_all(&mut self) {
        let (nx, ny, nz) = self.chunk_counts;
        for cy in 0..ny {
            for cz in 0..nz {
                for cx in 0..nx {
                    self.refresh_chunk(cx, cy, cz);
                }
            }
        }
    }

    /// A block changed: updates lighting and refreshes every chunk whose mesh can see it,
    /// plus the chunks below it in its column whose shadows may have moved.
    pub fn on_block_changed(&mut self, ctx: &mut BuildContext<'_>, x: i32, y: i32, z: i32) {
        if !self.initialised || !ctx.world.contains(x, y, z) {
            return;
        }
        ctx.lighting.on_block_changed(ctx.world, ctx.registry, x, y, z);
        let solid = ctx.registry.draw(ctx.world.block_at(x, y, z)) != DrawType::Gas;

        let (cx, cy, cz) = (x >> CHUNK_SHIFT, y >> CHUNK_SHIFT, z >> CHUNK_SHIFT);
        let last = CHUNK_SIZE as i32 - 1;
        let near = |local: i32| -> (i32, i32) {
            match local {
                0 => (-1, 0),
                l if l == last => (0, 1),
                _ => (0, 0),
            }
        };
        let (x0, x1) = near(x & last);
        let (y0, y1) = near(y & last);
        let (z0, z1) = near(z & last);
        for dy in y0..=y1 {
            for dz in z0..=z1 {
                for dx in x0..=x1 {
                    if solid {
                        self.clear_all_air(cx + dx, cy + dy, cz + dz);
                    }
                    self.refresh_chunk(cx + dx, cy + dy, cz + dz);
                }
            }
        }
        for below in 0..cy {
            self.refresh_chunk(cx, below, cz);
        }
    }

    fn clear_all_air(&mut self, cx: i32, cy: i32, cz: i32) {
        if let Some(ix) = self.chunk_index(cx, cy, cz) {
            self.chunks[ix].all_air = false;
        }
    }

    /// Sides/edge settings changed: only boundary chunks below the affected height rebuild.
    pub fn on_env_edges_changed(&mut self, old: &EnvEdges, new: &EnvEdges) {
        if old == new {
            return;
        }
        let max_height = old.clip_height().max(new.clip_height());
        let (nx, ny, nz) = self.chunk_counts;
        let s = CHUNK_SIZE as i32;
        let mut refreshed = 0;
        for cz in 0..nz {
            for cx in 0..nx {
                let on_border = cx == 0 || cz == 0 || cx == nx - 1 || cz == nz - 1;
                if !on_border {
                    continue;
                }
                for cy in (0..ny).take_while(|cy| cy * s < max_height) {
                    self.refresh_chunk(cx, cy, cz);
                    refreshed += 1;
                }
            }
        }
        log::debug!(target: "stream", "env edges changed: {refreshed} border chunks refreshed");
    }

    /// Render or resident distance changed.
    pub fn on_view_distance_changed(&mut self, view_distance: i32, user_view_distance: i32) {
        self.cfg.view_distance = view_distance;
        self.cfg.user_view_distance = user_view_distance;
        self.calc_view_dists();
        self.sorter.invalidate();
        self.last_view = None;
    }

    /// Atlas bucket count may have changed (texture pack swap).
    pub fn on_atlas_changed(&mut self, atlas: &dyn TextureAtlas, gfx: &mut dyn Gfx) {
        if !self.initialised {
            return;
        }
        let buckets = atlas.bucket_count();
        if buckets == self.buckets {
            return;
        }
        self.clear_chunk_cache(gfx);
        self.alloc_parts(buckets);
        log::info!(target: "stream", "atlas now has {buckets} bucket(s); partitions reallocated");
    }

    /// Block definitions changed: draw types and atlas usage may have moved.
    pub fn on_block_definitions_changed(&mut self, atlas: &dyn TextureAtlas, gfx: &mut dyn Gfx) {
        if !self.initialised {
            return;
        }
        self.on_atlas_changed(atlas, gfx);
        self.clear_chunk_cache(gfx);
        self.reset_part_flags();
    }

    /// Graphics context lost: every handle is gone, CPU-side arrays are kept.
    pub fn on_context_lost(&mut self, gfx: &mut dyn Gfx) {
        self.clear_chunk_cache(gfx);
        log::info!(target: "stream", "context lost: chunk buffers released");
    }

    /// Graphics context back: chunks rebuild over the next frames.
    pub fn on_context_recreated(&mut self) {
        self.sorter.invalidate();
        self.last_view = None;
        self.reset_part_flags();
    }
}
