use super::*;
use quarry_world::World;

fn make_test_registry() -> BlockRegistry {
    BlockRegistry::from_toml_str(
        r#"
        [[blocks]]
        name = "air"
        draw = "gas"
        [[blocks]]
        name = "stone"
        textures = { all = 1 }
        [[blocks]]
        name = "glass"
        draw = "transparent"
        "#,
    )
    .unwrap()
}

#[test]
fn unhinted_columns_read_as_sunlit() {
    let w = World::new(16, 16, 16);
    let l = HeightmapLighting::new(&w);
    assert_eq!(l.ambient_color(3, 0, 3, Face::PosY), PackedCol::WHITE);
    assert_eq!(l.height(3, 3), None);
}

#[test]
fn cells_under_stone_are_shadowed() {
    let reg = make_test_registry();
    let mut w = World::new(32, 16, 32);
    w.set_block(5, 10, 5, 1);
    let mut l = HeightmapLighting::new(&w);
    l.hint(&w, &reg, 0, 0);
    assert_eq!(l.height(5, 5), Some(10));
    assert_eq!(l.height(6, 6), Some(-1));
    assert_ne!(l.ambient_color(5, 9, 5, Face::PosY), l.ambient_color(5, 11, 5, Face::PosY));
    assert_eq!(l.ambient_color(5, 11, 5, Face::PosY), PackedCol::WHITE);
}

#[test]
fn hint_covers_the_halo_only() {
    let reg = make_test_registry();
    let w = World::new(48, 16, 48);
    let mut l = HeightmapLighting::new(&w);
    l.hint(&w, &reg, 1, 1);
    // Chunk column 1 covers 16..32, halo extends to 15 and 32.
    assert_eq!(l.columns_scanned(), 18 * 18);
    assert!(l.height(15, 15).is_some());
    assert!(l.height(32, 32).is_some());
    assert!(l.height(14, 20).is_none());
    // A second hint over the same area does no extra work.
    l.hint(&w, &reg, 1, 1);
    assert_eq!(l.columns_scanned(), 18 * 18);
}

#[test]
fn glass_lets_light_through() {
    let reg = make_test_registry();
    let mut w = World::new(16, 16, 16);
    w.set_block(2, 8, 2, 2);
    let mut l = HeightmapLighting::new(&w);
    l.hint(&w, &reg, 0, 0);
    assert_eq!(l.height(2, 2), Some(-1));
}

#[test]
fn block_change_rescans_known_column() {
    let reg = make_test_registry();
    let mut w = World::new(16, 16, 16);
    let mut l = HeightmapLighting::new(&w);
    l.hint(&w, &reg, 0, 0);
    w.set_block(4, 12, 4, 1);
    l.on_block_changed(&w, &reg, 4, 12, 4);
    assert_eq!(l.height(4, 4), Some(12));
}

#[test]
fn side_faces_are_shaded() {
    let w = World::new(16, 16, 16);
    let l = HeightmapLighting::new(&w);
    let top = l.ambient_color(0, 0, 0, Face::PosY);
    let x = l.ambient_color(0, 0, 0, Face::PosX);
    let z = l.ambient_color(0, 0, 0, Face::NegZ);
    let bottom = l.ambient_color(0, 0, 0, Face::NegY);
    assert!(top.r() > z.r() && z.r() > x.r() && x.r() > bottom.r());
}
