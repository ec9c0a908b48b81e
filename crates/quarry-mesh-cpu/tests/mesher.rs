use quarry_blocks::{Atlas1D, BlockId, BlockRegistry, Face, PackedCol, TextureAtlas};
use quarry_geom::Vec3;
use quarry_gfx::{HeadlessGfx, Vertex};
use quarry_lighting::HeightmapLighting;
use quarry_mesh_cpu::{BuildContext, BuildOutcome, ChunkPartInfo, MeshBuilderStrategy, NormalMeshBuilder, quad_normal};
use quarry_world::{TerrainParams, VoxelField, World, generate_terrain};

const STONE: BlockId = 1;
const WATER: BlockId = 5;
const LEAVES: BlockId = 8;
const FLOWER: BlockId = 9;
const SLAB: BlockId = 10;
const GLOWSTONE: BlockId = 13;

fn load_registry() -> BlockRegistry {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    BlockRegistry::load_from_path(root.join("../../assets/blocks.toml")).unwrap()
}

/// A world with no sides/edge ring so only real neighbours hide faces.
fn open_world(w: usize, h: usize, l: usize) -> World {
    let mut world = World::new(w, h, l);
    world.env.sides_height = 0;
    world.env.edge_height = 0;
    world
}

struct Rig {
    world: World,
    reg: BlockRegistry,
    atlas: Atlas1D,
    lighting: HeightmapLighting,
    gfx: HeadlessGfx,
    mesher: NormalMeshBuilder,
}

impl Rig {
    fn new(world: World) -> Self {
        let reg = load_registry();
        let atlas = Atlas1D::from_registry(&reg, 16);
        let lighting = HeightmapLighting::new(&world);
        Self {
            world,
            reg,
            atlas,
            lighting,
            gfx: HeadlessGfx::new(),
            mesher: NormalMeshBuilder::new(),
        }
    }

    fn build(&mut self, cx: i32, cy: i32, cz: i32) -> (BuildOutcome, Vec<ChunkPartInfo>) {
        let mut parts: Vec<ChunkPartInfo> = (0..self.atlas.bucket_count() * 2)
            .map(|_| ChunkPartInfo::default())
            .collect();
        let mut ctx = BuildContext {
            world: &self.world,
            registry: &self.reg,
            lighting: &mut self.lighting,
            atlas: &self.atlas,
            gfx: &mut self.gfx,
        };
        let out = self.mesher.build(&mut ctx, cx, cy, cz, &mut parts);
        (out, parts)
    }

    fn face_vertices<'a>(&'a self, part: &ChunkPartInfo, face: Face) -> &'a [Vertex] {
        let (first, count) = part.face_range(face);
        let all = self.gfx.vertices(part.buffer.as_ref().unwrap()).unwrap();
        &all[first as usize..(first + count) as usize]
    }

    fn slot(&self, block: BlockId, face: Face) -> usize {
        self.atlas.locate(block, face).0
    }
}

fn extent(vs: &[Vertex]) -> (Vec3, Vec3) {
    let mut lo = Vec3::splat(f32::MAX);
    let mut hi = Vec3::splat(f32::MIN);
    for v in vs {
        lo = Vec3::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z));
        hi = Vec3::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z));
    }
    (lo, hi)
}

#[test]
fn run_of_identical_blocks_is_one_quad() {
    let mut world = open_world(16, 16, 16);
    world.fill((3, 5, 5), (7, 5, 5), STONE);
    let mut rig = Rig::new(world);
    let (out, parts) = rig.build(0, 0, 0);
    assert!(out.has_normal && !out.has_translucent && !out.all_air);

    let part = &parts[rig.slot(STONE, Face::PosY)];
    for face in Face::ALL {
        assert_eq!(part.face_counts[face.index()], 4, "{face:?}");
    }
    assert_eq!(part.vertex_count, 24);
    assert_eq!(part.index_count(), 36);

    let (lo, hi) = extent(rig.face_vertices(part, Face::PosY));
    assert_eq!((lo.x, hi.x, lo.y, hi.y), (3.0, 8.0, 6.0, 6.0));
    let (lo, hi) = extent(rig.face_vertices(part, Face::PosX));
    assert_eq!((lo.x, hi.x, lo.z, hi.z), (8.0, 8.0, 5.0, 6.0));
}

#[test]
fn different_light_splits_a_run() {
    let mut world = open_world(16, 16, 16);
    world.fill((3, 5, 5), (7, 5, 5), STONE);
    // Shades the cell above the middle of the row
    world.set_block(5, 8, 5, STONE);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(STONE, Face::PosY)];
    // Row splits into 3..5, 5..6, 6..8; plus the shading block's own top.
    assert_eq!(part.face_counts[Face::PosY.index()], 16);
}

#[test]
fn full_bright_runs_ignore_light() {
    let mut world = open_world(16, 16, 16);
    world.fill((3, 5, 5), (7, 5, 5), GLOWSTONE);
    world.set_block(5, 8, 5, GLOWSTONE);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(GLOWSTONE, Face::PosY)];
    assert_eq!(part.face_counts[Face::PosY.index()], 8);
    let col = rig.face_vertices(part, Face::NegY)[0].col;
    assert_eq!(col, PackedCol::WHITE);
}

#[test]
fn shared_face_is_drawn_by_neither_block() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 4, 4, GLOWSTONE);
    world.set_block(5, 4, 4, GLOWSTONE);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(GLOWSTONE, Face::PosX)];
    assert_eq!(part.vertex_count, 24);
    assert!(rig.face_vertices(part, Face::PosX).iter().all(|v| v.x == 6.0));
    assert!(rig.face_vertices(part, Face::NegX).iter().all(|v| v.x == 4.0));
}

#[test]
fn slab_on_stone_covers_the_stone_top() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 4, 4, STONE);
    world.set_block(4, 5, 4, SLAB);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    assert_eq!(rig.slot(STONE, Face::PosY), rig.slot(SLAB, Face::PosY));
    let part = &parts[rig.slot(STONE, Face::PosY)];
    // Slab top only, at half height
    assert_eq!(part.face_counts[Face::PosY.index()], 4);
    assert!(rig.face_vertices(part, Face::PosY).iter().all(|v| v.y == 5.5));
    // Stone bottom only
    assert_eq!(part.face_counts[Face::NegY.index()], 4);
    assert!(rig.face_vertices(part, Face::NegY).iter().all(|v| v.y == 4.0));
    assert_eq!(part.face_counts[Face::PosX.index()], 8);
}

#[test]
fn stone_on_slab_leaves_the_gap_faces() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 4, 4, SLAB);
    world.set_block(4, 5, 4, STONE);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(STONE, Face::PosY)];
    let mut tops: Vec<f32> = rig.face_vertices(part, Face::PosY).iter().map(|v| v.y).collect();
    tops.dedup();
    assert_eq!(tops, [4.5, 6.0]);
    let mut bottoms: Vec<f32> = rig.face_vertices(part, Face::NegY).iter().map(|v| v.y).collect();
    bottoms.dedup();
    assert_eq!(bottoms, [4.0, 5.0]);
}

#[test]
fn stone_beside_slab_hides_only_the_slab_side() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 4, 4, SLAB);
    world.set_block(5, 4, 4, STONE);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(STONE, Face::PosX)];
    assert_eq!(part.face_counts[Face::PosX.index()], 4);
    assert!(rig.face_vertices(part, Face::PosX).iter().all(|v| v.x == 6.0));
    let mut west: Vec<f32> = rig.face_vertices(part, Face::NegX).iter().map(|v| v.x).collect();
    west.dedup();
    assert_eq!(west, [4.0, 5.0]);
}

#[test]
fn thick_transparent_blocks_keep_inner_faces() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 4, 4, LEAVES);
    world.set_block(5, 4, 4, LEAVES);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(LEAVES, Face::PosX)];
    assert_eq!(part.face_counts[Face::PosX.index()], 8);
    assert_eq!(part.face_counts[Face::NegX.index()], 8);
    assert_eq!(part.face_counts[Face::PosY.index()], 4);
    let top = rig.face_vertices(part, Face::PosY);
    assert!(top.iter().all(|v| v.col == PackedCol::rgb(120, 200, 90)));
}

#[test]
fn corner_air_voxel_exposes_three_faces() {
    let mut world = World::new(48, 48, 48);
    world.fill((0, 0, 0), (47, 47, 47), STONE);
    world.set_block(31, 31, 31, 0);
    let mut rig = Rig::new(world);
    let (out, parts) = rig.build(1, 1, 1);
    assert!(out.has_normal);
    let part = &parts[rig.slot(STONE, Face::PosY)];
    let expect = |face: Face| match face {
        Face::PosY | Face::PosX | Face::PosZ => 4,
        _ => 0,
    };
    for face in Face::ALL {
        assert_eq!(part.face_counts[face.index()], expect(face), "{face:?}");
    }
    assert_eq!(rig.gfx.live_buffers(), 1);
}

#[test]
fn buried_chunk_has_no_mesh() {
    let mut world = World::new(48, 48, 48);
    world.fill((0, 0, 0), (47, 47, 47), STONE);
    let mut rig = Rig::new(world);
    let (out, parts) = rig.build(1, 1, 1);
    assert_eq!(out, BuildOutcome::default());
    assert!(parts.iter().all(|p| p.is_empty()));
    assert_eq!(rig.gfx.created, 0);
    assert_eq!(rig.lighting.columns_scanned(), 0);
}

#[test]
fn all_air_chunk_yields_nothing() {
    let mut rig = Rig::new(open_world(32, 32, 32));
    let (out, parts) = rig.build(1, 1, 1);
    assert!(out.all_air && !out.has_mesh());
    assert!(parts.iter().all(|p| p.buffer.is_none() && p.is_empty()));
    assert_eq!(rig.gfx.created, 0);
}

#[test]
fn water_goes_to_translucent_partitions() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 4, 4, WATER);
    let mut rig = Rig::new(world);
    let (out, parts) = rig.build(0, 0, 0);
    assert!(out.has_translucent && !out.has_normal);
    let buckets = rig.atlas.bucket_count();
    let part = &parts[buckets + rig.slot(WATER, Face::PosY)];
    assert_eq!(part.vertex_count, 24);
    assert!(parts[..buckets].iter().all(|p| p.is_empty()));
}

#[test]
fn covered_liquid_hides_its_surface() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 4, 4, WATER);
    world.set_block(4, 5, 4, STONE);
    let mut rig = Rig::new(world.clone());
    let (_, parts) = rig.build(0, 0, 0);
    let buckets = rig.atlas.bucket_count();
    let lid_only = parts[buckets + rig.slot(WATER, Face::PosY)].face_counts[Face::PosY.index()];
    assert_eq!(lid_only, 4);

    for (x, z) in [(5, 4), (3, 4), (4, 5), (4, 3)] {
        world.set_block(x, 5, z, STONE);
    }
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let enclosed = parts[buckets + rig.slot(WATER, Face::PosY)].face_counts[Face::PosY.index()];
    assert_eq!(enclosed, 0);
}

#[test]
fn sprites_emit_a_cross() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 4, 4, FLOWER);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(FLOWER, Face::PosX)];
    assert_eq!(part.sprite_count, 16);
    assert_eq!(part.face_counts, [0; 6]);
    let all = rig.gfx.vertices(part.buffer.as_ref().unwrap()).unwrap();
    let (lo, hi) = extent(all);
    assert!(lo.x > 4.0 && hi.x < 5.0 && lo.z > 4.0 && hi.z < 5.0);
    assert_eq!((lo.y, hi.y), (4.0, 4.75));
}

#[test]
fn world_floor_and_sides_hide_faces() {
    let mut world = World::new(16, 48, 16);
    world.set_block(4, 0, 4, STONE);
    world.set_block(0, 10, 8, STONE);
    world.set_block(0, 40, 8, STONE);
    let mut rig = Rig::new(world);

    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(STONE, Face::NegY)];
    assert_eq!(part.face_counts[Face::NegY.index()], 4, "only the side block's bottom");
    assert_eq!(part.face_counts[Face::NegX.index()], 0, "below the sides wall");

    let (_, parts) = rig.build(0, 2, 0);
    let part = &parts[rig.slot(STONE, Face::NegX)];
    assert_eq!(part.face_counts[Face::NegX.index()], 4, "above the edge ring");
}

#[test]
fn world_floor_stays_hidden_without_sides() {
    let mut world = open_world(16, 16, 16);
    world.set_block(4, 0, 4, STONE);
    world.set_block(8, 1, 8, STONE);
    let mut rig = Rig::new(world);
    let (_, parts) = rig.build(0, 0, 0);
    let part = &parts[rig.slot(STONE, Face::NegY)];
    assert_eq!(part.face_counts[Face::NegY.index()], 4, "only the raised block's bottom");
    assert!(rig.face_vertices(part, Face::NegY).iter().all(|v| v.y == 1.0));
    assert_eq!(part.face_counts[Face::PosY.index()], 8);
}

#[test]
fn generated_terrain_meshes_consistently() {
    let mut world = World::new(32, 64, 32);
    let reg = load_registry();
    generate_terrain(&mut world, &reg, &TerrainParams::default());
    let (nx, ny, nz) = world.chunk_counts();
    let mut rig = Rig::new(world);

    let mut live_parts = 0;
    for cy in 0..ny as i32 {
        for cz in 0..nz as i32 {
            for cx in 0..nx as i32 {
                let (out, parts) = rig.build(cx, cy, cz);
                assert_eq!(out.has_mesh(), parts.iter().any(|p| !p.is_empty()));
                for part in &parts {
                    let sum: u32 = part.face_counts.iter().sum::<u32>() + part.sprite_count;
                    assert_eq!(sum, part.vertex_count);
                    assert_eq!(part.buffer.is_some(), part.vertex_count > 0);
                    if part.is_empty() {
                        continue;
                    }
                    live_parts += 1;
                    for face in Face::ALL {
                        let (x, y, z) = face.delta();
                        let dir = Vec3::new(x as f32, y as f32, z as f32);
                        for quad in rig.face_vertices(part, face).chunks(4) {
                            assert!(quad_normal(quad).dot(dir) > 0.0, "{face:?} quad winds inwards");
                        }
                    }
                }
            }
        }
    }
    assert!(live_parts > 0);
    assert_eq!(rig.gfx.live_buffers(), live_parts);
}
