use quarry_blocks::Face;
use quarry_geom::Vec3;
use quarry_world::CHUNK_SIZE;

use crate::chunk::ChunkInfo;

/// Orders chunks front to back from the camera and decides which chunk faces can
/// possibly be seen.
#[derive(Debug, Default)]
pub struct ChunkDistanceSorter {
    last_cell: Option<(i32, i32, i32)>,
}

/// Centre of the chunk cell containing `pos`.
pub fn camera_cell(pos: Vec3) -> (i32, i32, i32) {
    let s = CHUNK_SIZE as i32;
    let mask = !(s - 1);
    let half = s / 2;
    let p = pos.floor();
    (
        (p.x as i32 & mask) + half,
        (p.y as i32 & mask) + half,
        (p.z as i32 & mask) + half,
    )
}

impl ChunkDistanceSorter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the next `update_order` to resort.
    pub fn invalidate(&mut self) {
        self.last_cell = None;
    }

    /// Recomputes distance keys and face flags and sorts `sorted` (chunk indices) with
    /// `distances` as keys. Returns `false` without touching anything when the camera
    /// is still in the same chunk cell.
    pub fn update_order(
        &mut self,
        camera: Vec3,
        chunks: &mut [ChunkInfo],
        sorted: &mut [usize],
        distances: &mut [i32],
    ) -> bool {
        let cell = camera_cell(camera);
        if self.last_cell == Some(cell) {
            return false;
        }
        self.last_cell = Some(cell);

        let half = CHUNK_SIZE as i32 / 2;
        let (px, py, pz) = cell;
        for (slot, &ix) in sorted.iter().enumerate() {
            let info = &mut chunks[ix];
            let (cx, cy, cz) = info.centre;
            let (dx, dy, dz) = (cx - px, cy - py, cz - pz);
            distances[slot] = dx * dx + dy * dy + dz * dz;

            // A face set is skipped only when the camera is wholly behind its planes.
            let d = &mut info.draw_faces;
            d[Face::NegX.index()] = px <= cx + half;
            d[Face::PosX.index()] = px >= cx - half;
            d[Face::NegY.index()] = py <= cy + half;
            d[Face::PosY.index()] = py >= cy - half;
            d[Face::NegZ.index()] = pz <= cz + half;
            d[Face::PosZ.index()] = pz >= cz - half;
        }
        quicksort(distances, sorted);
        log::trace!(target: "sort", "resorted {} chunks around {:?}", sorted.len(), cell);
        true
    }
}

/// Sorts `keys` ascending, applying the same swaps to `values`.
///
/// Middle-element pivot with a two-pointer partition. The smaller side is recursed
/// into and the larger one looped on, so the stack depth stays logarithmic.
pub fn quicksort(keys: &mut [i32], values: &mut [usize]) {
    debug_assert_eq!(keys.len(), values.len());
    if keys.len() > 1 {
        sort_range(keys, values, 0, keys.len() as isize - 1);
    }
}

fn sort_range(keys: &mut [i32], values: &mut [usize], mut left: isize, mut right: isize) {
    while left < right {
        let (mut i, mut j) = (left, right);
        let pivot = keys[((left + right) / 2) as usize];
        while i <= j {
            while keys[i as usize] < pivot {
                i += 1;
            }
            while keys[j as usize] > pivot {
                j -= 1;
            }
            if i <= j {
                keys.swap(i as usize, j as usize);
                values.swap(i as usize, j as usize);
                i += 1;
                j -= 1;
            }
        }

        if j - left <= right - i {
            if left < j {
                sort_range(keys, values, left, j);
            }
            left = i;
        } else {
            if i < right {
                sort_range(keys, values, i, right);
            }
            right = j;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sorted_pairs(keys: &[i32]) -> (Vec<i32>, Vec<usize>) {
        let mut k = keys.to_vec();
        let mut v: Vec<usize> = (0..keys.len()).collect();
        quicksort(&mut k, &mut v);
        (k, v)
    }

    #[test]
    fn sorts_three() {
        let (k, v) = sorted_pairs(&[10, 1, 5]);
        assert_eq!(k, vec![1, 5, 10]);
        assert_eq!(v, vec![1, 2, 0]);
    }

    #[test]
    fn sorts_two_and_ordered_inputs() {
        assert_eq!(sorted_pairs(&[9, 3]).0, vec![3, 9]);
        assert_eq!(sorted_pairs(&[3, 9]).0, vec![3, 9]);
        let asc: Vec<i32> = (0..50).collect();
        assert_eq!(sorted_pairs(&asc).0, asc);
        let desc: Vec<i32> = (0..50).rev().collect();
        assert_eq!(sorted_pairs(&desc).0, asc);
        assert_eq!(sorted_pairs(&[]).0, Vec::<i32>::new());
    }

    #[test]
    fn camera_cell_snaps_to_chunk_centres() {
        assert_eq!(camera_cell(Vec3::new(0.5, 17.0, 31.9)), (8, 24, 24));
        assert_eq!(camera_cell(Vec3::new(-0.5, 0.0, 0.0)).0, -8);
    }

    #[test]
    fn faces_behind_the_camera_are_culled() {
        let mut chunks = vec![ChunkInfo::new(0, 0, 0), ChunkInfo::new(3, 0, 0)];
        let mut sorted = vec![0, 1];
        let mut dist = vec![0; 2];
        let mut sorter = ChunkDistanceSorter::new();
        assert!(sorter.update_order(Vec3::new(20.0, 8.0, 8.0), &mut chunks, &mut sorted, &mut dist));
        // Camera is in the x = 16..32 column; chunk 0 lies wholly on its -X side.
        let far = &chunks[0].draw_faces;
        assert!(far[Face::PosX.index()] && !far[Face::NegX.index()]);
        let near = &chunks[1].draw_faces;
        assert!(!near[Face::PosX.index()] && near[Face::NegX.index()]);
        assert_eq!(sorted, vec![0, 1]);
        assert_eq!(dist, vec![256, 1024]);
    }

    #[test]
    fn unchanged_cell_is_a_no_op() {
        let mut chunks: Vec<ChunkInfo> = (0..4).map(|i| ChunkInfo::new(i, 0, 0)).collect();
        let mut sorted = vec![0, 1, 2, 3];
        let mut dist = vec![0; 4];
        let mut sorter = ChunkDistanceSorter::new();
        assert!(sorter.update_order(Vec3::new(60.0, 8.0, 8.0), &mut chunks, &mut sorted, &mut dist));
        let (order, keys, flags) = (sorted.clone(), dist.clone(), chunks.clone());
        assert!(!sorter.update_order(Vec3::new(56.5, 2.0, 14.0), &mut chunks, &mut sorted, &mut dist));
        assert_eq!((order, keys, flags), (sorted.clone(), dist.clone(), chunks.clone()));

        sorter.invalidate();
        assert!(sorter.update_order(Vec3::new(56.5, 2.0, 14.0), &mut chunks, &mut sorted, &mut dist));
    }

    proptest! {
        #[test]
        fn quicksort_matches_std(keys in prop::collection::vec(-1000i32..1000, 0..200)) {
            let (k, v) = sorted_pairs(&keys);
            let mut expect = keys.clone();
            expect.sort_unstable();
            prop_assert_eq!(&k, &expect);
            for (slot, &orig) in v.iter().enumerate() {
                prop_assert_eq!(keys[orig], k[slot]);
            }
        }
    }
}
