use quarry_blocks::{Face, PackedCol, UvRect};
use quarry_geom::Vec3;
use quarry_gfx::Vertex;

use crate::constants::{SPRITE_MAX, SPRITE_MIN, SPRITE_VERTS};

/// Texture coordinates of a quad: `u` runs along the face's horizontal axis (and wraps
/// past 1.0 on merged runs), `v1` is the top edge and `v2` the bottom edge.
#[derive(Copy, Clone, Debug)]
pub(crate) struct QuadUv {
    pub u1: f32,
    pub u2: f32,
    pub v1: f32,
    pub v2: f32,
}

/// Four vertices of the `face` side of box `lo..hi`, counter-clockwise seen from outside.
pub(crate) fn face_quad(face: Face, lo: Vec3, hi: Vec3, uv: QuadUv, col: PackedCol) -> [Vertex; 4] {
    let QuadUv { u1, u2, v1, v2 } = uv;
    let (x1, y1, z1) = (lo.x, lo.y, lo.z);
    let (x2, y2, z2) = (hi.x, hi.y, hi.z);
    let v = |x, y, z, u, v| Vertex::new(x, y, z, col, u, v);
    match face {
        Face::NegX => [
            v(x1, y1, z1, u1, v2),
            v(x1, y1, z2, u2, v2),
            v(x1, y2, z2, u2, v1),
            v(x1, y2, z1, u1, v1),
        ],
        Face::PosX => [
            v(x2, y1, z2, u1, v2),
            v(x2, y1, z1, u2, v2),
            v(x2, y2, z1, u2, v1),
            v(x2, y2, z2, u1, v1),
        ],
        Face::NegZ => [
            v(x2, y1, z1, u1, v2),
            v(x1, y1, z1, u2, v2),
            v(x1, y2, z1, u2, v1),
            v(x2, y2, z1, u1, v1),
        ],
        Face::PosZ => [
            v(x1, y1, z2, u1, v2),
            v(x2, y1, z2, u2, v2),
            v(x2, y2, z2, u2, v1),
            v(x1, y2, z2, u1, v1),
        ],
        Face::PosY => [
            v(x1, y2, z2, u1, v2),
            v(x2, y2, z2, u2, v2),
            v(x2, y2, z1, u2, v1),
            v(x1, y2, z1, u1, v1),
        ],
        Face::NegY => [
            v(x1, y1, z1, u1, v1),
            v(x2, y1, z1, u2, v1),
            v(x2, y1, z2, u2, v2),
            v(x1, y1, z2, u1, v2),
        ],
    }
}

/// Two crossed diagonal planes through cell `cell`, each drawn from both sides.
pub(crate) fn sprite_cross(
    cell: Vec3,
    height: f32,
    rect: UvRect,
    col: PackedCol,
) -> [Vertex; SPRITE_VERTS as usize] {
    let (x1, z1) = (cell.x + SPRITE_MIN, cell.z + SPRITE_MIN);
    let (x2, z2) = (cell.x + SPRITE_MAX, cell.z + SPRITE_MAX);
    let (y1, y2) = (cell.y, cell.y + height);
    let (u1, u2) = (rect.u1, rect.u2);
    let v1 = rect.v1 + (1.0 - height) * (rect.v2 - rect.v1);
    let v2 = rect.v2;
    let v = |x, y, z, u, v| Vertex::new(x, y, z, col, u, v);
    [
        v(x1, y1, z1, u2, v2),
        v(x1, y2, z1, u2, v1),
        v(x2, y2, z2, u1, v1),
        v(x2, y1, z2, u1, v2),
        v(x2, y1, z2, u2, v2),
        v(x2, y2, z2, u2, v1),
        v(x1, y2, z1, u1, v1),
        v(x1, y1, z1, u1, v2),
        v(x1, y1, z2, u2, v2),
        v(x1, y2, z2, u2, v1),
        v(x2, y2, z1, u1, v1),
        v(x2, y1, z1, u1, v2),
        v(x2, y1, z1, u2, v2),
        v(x2, y2, z1, u2, v1),
        v(x1, y2, z2, u1, v1),
        v(x1, y1, z2, u1, v2),
    ]
}

/// Unnormalised normal of a quad from its first three vertices.
#[inline]
pub fn quad_normal(q: &[Vertex]) -> Vec3 {
    let p = |i: usize| Vec3::new(q[i].x, q[i].y, q[i].z);
    (p(1) - p(0)).cross(p(2) - p(0))
}
