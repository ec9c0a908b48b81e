//! Greedy mesher for full and partial cubes.
//!
//! A build runs two passes over the chunk in the same `y, z, x` order. The counting pass
//! decides which faces are visible and merges runs of identical faces: side X faces merge
//! along Z, every other face along X. Each run's length is stored in the first voxel's
//! counter and the merged voxels are zeroed, so the emission pass writes exactly the
//! quads that were counted into staging sized beforehand.

use quarry_blocks::face::FACE_COUNT;
use quarry_blocks::{BlockRegistry, BlockType, DrawType, Face, PackedCol, TextureAtlas};
use quarry_geom::Vec3;
use quarry_lighting::LightingEngine;
use quarry_world::{CHUNK_SIZE, EnvEdges, VoxelField};

use crate::alloc::ensure_len;
use crate::constants::CHUNK_VOLUME;
use crate::emit::{QuadUv, face_quad, sprite_cross};
use crate::partition::{ChunkPartInfo, TexturePartitionWriter};
use crate::snapshot::{Snapshot, SnapshotKind};
use crate::strategy::{BuildContext, BuildOutcome, MeshBuilderStrategy};

const S: i32 = CHUNK_SIZE as i32;

#[inline]
fn count_index(lx: i32, ly: i32, lz: i32, face: Face) -> usize {
    ((ly * S + lz) * S + lx) as usize * FACE_COUNT + face.index()
}

#[inline]
fn stretches_along_z(face: Face) -> bool {
    matches!(face, Face::PosX | Face::NegX)
}

// Opaque buckets first, then translucent
#[inline]
fn slot(bucket: usize, draw: DrawType, buckets: usize) -> usize {
    if draw == DrawType::Translucent {
        buckets + bucket
    } else {
        bucket
    }
}

fn on_world_boundary(world: &dyn VoxelField, cx: i32, cy: i32, cz: i32) -> bool {
    let (w, h, l) = world.dims();
    let (x0, y0, z0) = (cx * S, cy * S, cz * S);
    x0 == 0 || y0 == 0 || z0 == 0 || x0 + S >= w || y0 + S >= h || z0 + S >= l
}

/// Snapshot plus the collaborators needed to answer visibility and light queries.
struct Surroundings<'p> {
    snap: &'p Snapshot,
    reg: &'p BlockRegistry,
    lighting: &'p dyn LightingEngine,
    dims: (i32, i32, i32),
    env: EnvEdges,
}

impl Surroundings<'_> {
    #[inline]
    fn world_pos(&self, lx: i32, ly: i32, lz: i32) -> (i32, i32, i32) {
        let (x0, y0, z0) = self.snap.origin();
        (x0 + lx, y0 + ly, z0 + lz)
    }

    fn face_hidden(&self, bt: &BlockType, lx: i32, ly: i32, lz: i32, face: Face) -> bool {
        let (wx, wy, wz) = self.world_pos(lx, ly, lz);
        let (w, _, l) = self.dims;
        match face {
            // The map bottom is never drawn, whatever the sides height
            Face::NegY if wy == 0 => return true,
            Face::NegX if wx == 0 => return self.edge_hides(bt, wy, face),
            Face::PosX if wx == w - 1 => return self.edge_hides(bt, wy, face),
            Face::NegZ if wz == 0 => return self.edge_hides(bt, wy, face),
            Face::PosZ if wz == l - 1 => return self.edge_hides(bt, wy, face),
            Face::PosY if bt.is_liquid() && self.liquid_covered(lx, ly, lz) => return true,
            _ => {}
        }
        let (dx, dy, dz) = face.delta();
        self.reg
            .is_face_hidden(bt.id, self.snap.at(lx + dx, ly + dy, lz + dz), face)
    }

    // Outside the map stands a wall of the sides block, then the edge block above it.
    fn edge_hides(&self, bt: &BlockType, wy: i32, face: Face) -> bool {
        let env = &self.env;
        if wy < env.sides_height {
            self.reg.is_face_hidden(bt.id, env.sides_block, face)
        } else if wy < env.edge_height {
            self.reg.is_face_hidden(bt.id, env.edge_block, face)
        } else {
            false
        }
    }

    // Liquid under a solid lid whose four sides are all filled.
    fn liquid_covered(&self, lx: i32, ly: i32, lz: i32) -> bool {
        let above = self.snap.at(lx, ly + 1, lz);
        if !self.reg.is_full_opaque(above) || self.reg.is_liquid(above) {
            return false;
        }
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .all(|&(dx, dz)| self.reg.draw(self.snap.at(lx + dx, ly + 1, lz + dz)) != DrawType::Gas)
    }

    fn light(&self, bt: &BlockType, lx: i32, ly: i32, lz: i32, face: Face) -> PackedCol {
        if bt.full_bright {
            return PackedCol::WHITE;
        }
        let (mut x, mut y, mut z) = self.world_pos(lx, ly, lz);
        if bt.light_from_neighbor(face) {
            let (dx, dy, dz) = face.delta();
            x += dx;
            y += dy;
            z += dz;
        }
        self.lighting.ambient_color(x, y, z, face)
    }

    fn stretch(&self, counts: &mut [u8], bt: &BlockType, lx: i32, ly: i32, lz: i32, face: Face) -> u8 {
        let (sx, sz) = if stretches_along_z(face) { (0, 1) } else { (1, 0) };
        let light = (!bt.full_bright).then(|| self.light(bt, lx, ly, lz, face));
        let mut run = 1u8;
        let (mut x, mut z) = (lx + sx, lz + sz);
        while x < S && z < S {
            let ci = count_index(x, ly, z, face);
            if self.snap.at(x, ly, z) != bt.id || counts[ci] == 0 || self.face_hidden(bt, x, ly, z, face) {
                break;
            }
            if light.is_some_and(|l| self.light(bt, x, ly, z, face) != l) {
                break;
            }
            counts[ci] = 0;
            run += 1;
            x += sx;
            z += sz;
        }
        run
    }
}

/// The standard mesher: per-face greedy runs for cubes and partial cubes, crosses for sprites.
pub struct NormalMeshBuilder {
    snapshot: Snapshot,
    // 0 = hidden or merged into an earlier run, otherwise run length
    counts: Vec<u8>,
    writers: Vec<TexturePartitionWriter>,
}

impl Default for NormalMeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalMeshBuilder {
    pub fn new() -> Self {
        let mut counts = Vec::new();
        ensure_len(&mut counts, CHUNK_VOLUME * FACE_COUNT, 0, "face counts");
        Self {
            snapshot: Snapshot::new(),
            counts,
            writers: Vec::new(),
        }
    }

    fn reset_writers(&mut self, buckets: usize) {
        if self.writers.len() != buckets * 2 {
            self.writers.resize_with(buckets * 2, TexturePartitionWriter::new);
        }
        for w in &mut self.writers {
            w.reset();
        }
    }
}

fn count_pass(
    s: &Surroundings<'_>,
    atlas: &dyn TextureAtlas,
    counts: &mut [u8],
    writers: &mut [TexturePartitionWriter],
    buckets: usize,
) {
    counts.fill(1);
    for ly in 0..S {
        for lz in 0..S {
            for lx in 0..S {
                let Some(bt) = s.reg.get(s.snap.at(lx, ly, lz)) else {
                    continue;
                };
                match bt.draw {
                    DrawType::Gas => continue,
                    DrawType::Sprite => {
                        let (bucket, _) = atlas.locate(bt.id, Face::PosX);
                        writers[slot(bucket, bt.draw, buckets)].count_sprite();
                        continue;
                    }
                    _ => {}
                }
                for face in Face::ALL {
                    let ci = count_index(lx, ly, lz, face);
                    if counts[ci] == 0 {
                        continue;
                    }
                    if s.face_hidden(bt, lx, ly, lz, face) {
                        counts[ci] = 0;
                        continue;
                    }
                    let run = if s.reg.can_stretch(bt.id, face) {
                        s.stretch(counts, bt, lx, ly, lz, face)
                    } else {
                        1
                    };
                    counts[ci] = run;
                    let (bucket, _) = atlas.locate(bt.id, face);
                    writers[slot(bucket, bt.draw, buckets)].count_quad(face);
                }
            }
        }
    }
}

fn emit_pass(
    s: &Surroundings<'_>,
    atlas: &dyn TextureAtlas,
    counts: &[u8],
    writers: &mut [TexturePartitionWriter],
    buckets: usize,
) {
    for ly in 0..S {
        for lz in 0..S {
            for lx in 0..S {
                let Some(bt) = s.reg.get(s.snap.at(lx, ly, lz)) else {
                    continue;
                };
                let (wx, wy, wz) = s.world_pos(lx, ly, lz);
                let cell = Vec3::new(wx as f32, wy as f32, wz as f32);
                match bt.draw {
                    DrawType::Gas => continue,
                    DrawType::Sprite => {
                        let (bucket, rect) = atlas.locate(bt.id, Face::PosX);
                        let mut col = if bt.full_bright {
                            PackedCol::WHITE
                        } else {
                            s.lighting.sprite_color(wx, wy, wz)
                        };
                        if let Some(t) = bt.tint {
                            col = col.tint(t);
                        }
                        let cross = sprite_cross(cell, bt.bounds.max.y, rect, col);
                        writers[slot(bucket, bt.draw, buckets)].write_sprite(&cross);
                        continue;
                    }
                    _ => {}
                }
                for face in Face::ALL {
                    let run = counts[count_index(lx, ly, lz, face)];
                    if run == 0 {
                        continue;
                    }
                    let (bucket, rect) = atlas.locate(bt.id, face);
                    let bb = &bt.bounds;
                    let extra = (run - 1) as f32;
                    let lo = cell + bb.min;
                    let mut hi = cell + bb.max;
                    let (u1, u2) = if stretches_along_z(face) {
                        hi.z += extra;
                        (bb.min.z, bb.max.z + extra)
                    } else {
                        hi.x += extra;
                        (bb.min.x, bb.max.x + extra)
                    };
                    let tile_w = rect.u2 - rect.u1;
                    let tile_h = rect.v2 - rect.v1;
                    let (v1, v2) = if face.is_side() {
                        (1.0 - bb.max.y, 1.0 - bb.min.y)
                    } else {
                        (bb.min.z, bb.max.z)
                    };
                    let uv = QuadUv {
                        u1: rect.u1 + u1 * tile_w,
                        u2: rect.u1 + u2 * tile_w,
                        v1: rect.v1 + v1 * tile_h,
                        v2: rect.v1 + v2 * tile_h,
                    };
                    let mut col = s.light(bt, lx, ly, lz, face);
                    if let Some(t) = bt.tint {
                        col = col.tint(t);
                    }
                    writers[slot(bucket, bt.draw, buckets)].write_quad(face, &face_quad(face, lo, hi, uv, col));
                }
            }
        }
    }
}

impl MeshBuilderStrategy for NormalMeshBuilder {
    fn name(&self) -> &'static str {
        "normal"
    }

    fn build(
        &mut self,
        ctx: &mut BuildContext<'_>,
        cx: i32,
        cy: i32,
        cz: i32,
        parts: &mut [ChunkPartInfo],
    ) -> BuildOutcome {
        let buckets = ctx.atlas.bucket_count();
        debug_assert_eq!(parts.len(), buckets * 2);

        match self.snapshot.fill(ctx.world, ctx.registry, cx, cy, cz) {
            SnapshotKind::AllAir => {
                log::trace!(target: "mesh", "chunk ({cx},{cy},{cz}) is all air");
                return BuildOutcome {
                    all_air: true,
                    ..BuildOutcome::default()
                };
            }
            SnapshotKind::AllOpaque if !on_world_boundary(ctx.world, cx, cy, cz) => {
                log::trace!(target: "mesh", "chunk ({cx},{cy},{cz}) is buried");
                return BuildOutcome::default();
            }
            _ => {}
        }

        ctx.lighting.hint(ctx.world, ctx.registry, cx, cz);
        self.reset_writers(buckets);

        let s = Surroundings {
            snap: &self.snapshot,
            reg: ctx.registry,
            lighting: &*ctx.lighting,
            dims: ctx.world.dims(),
            env: *ctx.world.env(),
        };
        count_pass(&s, ctx.atlas, &mut self.counts, &mut self.writers, buckets);
        for w in self.writers.iter_mut().filter(|w| w.total() > 0) {
            w.prepare();
        }
        emit_pass(&s, ctx.atlas, &self.counts, &mut self.writers, buckets);

        let mut out = BuildOutcome::default();
        let mut vertices = 0u32;
        for (i, w) in self.writers.iter().enumerate() {
            if w.total() == 0 {
                continue;
            }
            debug_assert!(parts[i].buffer.is_none(), "partition slot {i} still owns a buffer");
            parts[i] = w.finish(&mut *ctx.gfx);
            vertices += parts[i].vertex_count;
            if i < buckets {
                out.has_normal = true;
            } else {
                out.has_translucent = true;
            }
        }
        log::trace!(
            target: "mesh",
            "chunk ({cx},{cy},{cz}): {} vertices, normal={} translucent={}",
            vertices,
            out.has_normal,
            out.has_translucent
        );
        out
    }
}
