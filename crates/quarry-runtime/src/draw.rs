use quarry_blocks::Face;
use quarry_blocks::face::FACE_COUNT;
use quarry_gfx::Gfx;
use quarry_mesh_cpu::ChunkPartInfo;

use crate::scheduler::ChunkStreamScheduler;

/// A partition to draw this frame and the vertex ranges that survive back-face culling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartDraw {
    pub chunk: usize,
    /// Slot in the flat partition array.
    pub part: usize,
    pub bucket: usize,
    /// `(first_vertex, vertex_count)`, adjacent ranges merged.
    pub ranges: Vec<(u32, u32)>,
}

fn push_range(ranges: &mut Vec<(u32, u32)>, first: u32, count: u32) {
    if count == 0 {
        return;
    }
    match ranges.last_mut() {
        Some(last) if last.0 + last.1 == first => last.1 += count,
        _ => ranges.push((first, count)),
    }
}

// Sprites are drawn from every side; faces only when the chunk's flag allows it.
fn draw_ranges(part: &ChunkPartInfo, faces: &[bool; FACE_COUNT]) -> Vec<(u32, u32)> {
    let mut ranges = Vec::new();
    let (first, count) = part.sprite_range();
    push_range(&mut ranges, first, count);
    for face in Face::ALL {
        if faces[face.index()] {
            let (first, count) = part.face_range(face);
            push_range(&mut ranges, first, count);
        }
    }
    ranges
}

impl ChunkStreamScheduler {
    /// Partitions of the render list, grouped by atlas bucket.
    ///
    /// Buckets no chunk uses are skipped outright. A bucket that turned out to have
    /// nothing visible is not rescanned until the part flags are reset by a resort,
    /// camera move or rebuild.
    pub fn collect_batch_draws(&mut self, translucent: bool) -> Vec<PartDraw> {
        let mut draws = Vec::new();
        for bucket in 0..self.bucket_count() {
            let (used, has, check) = if translucent {
                (
                    self.translucent_used[bucket],
                    self.has_translucent_parts[bucket],
                    self.check_translucent_parts[bucket],
                )
            } else {
                (
                    self.normal_used[bucket],
                    self.has_normal_parts[bucket],
                    self.check_normal_parts[bucket],
                )
            };
            if used == 0 || !(has || check) {
                continue;
            }

            let before = draws.len();
            for &ix in self.render_chunks() {
                let info = &self.chunks()[ix];
                let base = if translucent {
                    info.translucent_parts
                } else {
                    info.normal_parts
                };
                let Some(base) = base else {
                    continue;
                };
                let slot = base + bucket;
                let part = &self.parts()[slot];
                if part.is_empty() {
                    continue;
                }
                draws.push(PartDraw {
                    chunk: ix,
                    part: slot,
                    bucket,
                    ranges: draw_ranges(part, &info.draw_faces),
                });
            }

            let found = draws.len() > before;
            if translucent {
                self.has_translucent_parts[bucket] = found;
                self.check_translucent_parts[bucket] = false;
            } else {
                self.has_normal_parts[bucket] = found;
                self.check_normal_parts[bucket] = false;
            }
        }
        draws
    }

    /// Issues the draw calls for one pass; returns the number of partitions drawn.
    pub fn render_batches(&mut self, gfx: &mut dyn Gfx, translucent: bool) -> usize {
        let draws = self.collect_batch_draws(translucent);
        for d in &draws {
            let Some(handle) = self.parts()[d.part].buffer.as_ref() else {
                continue;
            };
            for &(first, count) in &d.ranges {
                gfx.draw_quads(handle, first, count);
            }
        }
        draws.len()
    }
}
