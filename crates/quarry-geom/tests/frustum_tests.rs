use quarry_geom::{Aabb, Frustum, FrustumTest, Plane, Vec3};

fn looking_down_neg_z() -> Frustum {
    Frustum::from_view(
        Vec3::ZERO,
        0.0,
        0.0,
        70f32.to_radians(),
        16.0 / 9.0,
        0.1,
        500.0,
    )
}

#[test]
fn plane_signed_distance_sides() {
    let p = Plane::through(Vec3::UP, Vec3::new(0.0, 2.0, 0.0));
    assert!(p.signed_distance(Vec3::new(5.0, 3.0, -1.0)) > 0.0);
    assert!(p.signed_distance(Vec3::new(5.0, 1.0, -1.0)) < 0.0);
    assert!(p.signed_distance(Vec3::new(0.0, 2.0, 0.0)).abs() < 1e-6);
}

#[test]
fn sphere_in_front_is_visible() {
    let f = looking_down_neg_z();
    assert!(f.sphere_visible(Vec3::new(0.0, 0.0, -50.0), 1.0));
}

#[test]
fn sphere_behind_is_culled() {
    let f = looking_down_neg_z();
    assert!(!f.sphere_visible(Vec3::new(0.0, 0.0, 50.0), 1.0));
}

#[test]
fn sphere_beyond_far_plane_is_culled() {
    let f = looking_down_neg_z();
    assert!(!f.sphere_visible(Vec3::new(0.0, 0.0, -600.0), 10.0));
}

#[test]
fn large_sphere_straddling_side_plane_is_visible() {
    let f = looking_down_neg_z();
    // Centre is well outside the left plane, but the radius reaches back in.
    assert!(!f.sphere_visible(Vec3::new(-200.0, 0.0, -10.0), 1.0));
    assert!(f.sphere_visible(Vec3::new(-200.0, 0.0, -10.0), 250.0));
}

#[test]
fn yaw_turns_the_view() {
    // Quarter turn: now looking down +X.
    let f = Frustum::from_view(
        Vec3::ZERO,
        std::f32::consts::FRAC_PI_2,
        0.0,
        1.2,
        1.0,
        0.1,
        100.0,
    );
    assert!(f.sphere_visible(Vec3::new(30.0, 0.0, 0.0), 1.0));
    assert!(!f.sphere_visible(Vec3::new(0.0, 0.0, -30.0), 1.0));
}

#[test]
fn everything_accepts_any_sphere() {
    let f = Frustum::everything();
    assert!(f.sphere_visible(Vec3::new(1e6, -1e6, 3.0), 0.0));
}

#[test]
fn aabb_centre_size_contains() {
    let b = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(16.0, 16.0, 16.0));
    assert_eq!(b.centre(), Vec3::splat(8.0));
    assert_eq!(b.size(), Vec3::splat(16.0));
    assert!(b.contains(Vec3::new(16.0, 0.0, 8.0)));
    assert!(!b.contains(Vec3::new(16.1, 0.0, 8.0)));
    let moved = b.offset(Vec3::new(16.0, 0.0, 0.0));
    assert_eq!(moved.min.x, 16.0);
    assert_eq!(moved.max.x, 32.0);
}
