//! Small geometry types shared by the engine crates (no renderer dependency).
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 { self / len } else { self }
    }

    /// Component-wise floor, used to find the voxel cell containing a point.
    #[inline]
    pub fn floor(self) -> Vec3 {
        Vec3::new(self.x.floor(), self.y.floor(), self.z.floor())
    }
}

macro_rules! impl_vec3_binop {
    ($tr:ident, $f:ident, $tra:ident, $fa:ident, $op:tt) => {
        impl $tr for Vec3 {
            type Output = Vec3;
            #[inline]
            fn $f(self, rhs: Vec3) -> Vec3 {
                Vec3::new(self.x $op rhs.x, self.y $op rhs.y, self.z $op rhs.z)
            }
        }

        impl $tra for Vec3 {
            #[inline]
            fn $fa(&mut self, rhs: Vec3) {
                *self = *self $op rhs;
            }
        }
    };
}

impl_vec3_binop!(Add, add, AddAssign, add_assign, +);
impl_vec3_binop!(Sub, sub, SubAssign, sub_assign, -);

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Axis-aligned box. Block render/collision bounds are expressed in block-local units (0..1).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const UNIT: Aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);

    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }

    #[inline]
    pub fn offset(&self, by: Vec3) -> Aabb {
        Aabb::new(self.min + by, self.max + by)
    }
}

/// Plane in Hessian normal form: points with `normal.dot(p) + d >= 0` are on the inner side.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    #[inline]
    pub fn through(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalized();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }
}

/// Sphere visibility against a view volume.
pub trait FrustumTest {
    fn sphere_visible(&self, centre: Vec3, radius: f32) -> bool;
}

/// Six inward-facing planes: near, far, left, right, bottom, top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Builds a perspective view volume. `yaw` rotates about +Y with `0` looking down -Z,
    /// `pitch` is positive looking up. Angles are in radians.
    pub fn from_view(
        eye: Vec3,
        yaw: f32,
        pitch: f32,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let forward = Vec3::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        )
        .normalized();
        let mut right = forward.cross(Vec3::UP);
        if right.length_sq() < 1e-8 {
            right = Vec3::new(1.0, 0.0, 0.0);
        }
        let right = right.normalized();
        let up = right.cross(forward);

        let half_v = fov_y * 0.5;
        let half_h = (half_v.tan() * aspect).atan();
        let (sh, ch) = half_h.sin_cos();
        let (sv, cv) = half_v.sin_cos();

        Self {
            planes: [
                Plane::through(forward, eye + forward * near),
                Plane::through(-forward, eye + forward * far),
                Plane::through(right * ch + forward * sh, eye),
                Plane::through(-right * ch + forward * sh, eye),
                Plane::through(up * cv + forward * sv, eye),
                Plane::through(-up * cv + forward * sv, eye),
            ],
        }
    }

    /// A volume that accepts everything; handy for headless runs.
    pub fn everything() -> Self {
        Self {
            planes: [Plane {
                normal: Vec3::ZERO,
                d: 0.0,
            }; 6],
        }
    }
}

impl FrustumTest for Frustum {
    #[inline]
    fn sphere_visible(&self, centre: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|p| p.signed_distance(centre) >= -radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn no_nan(v: Vec3) -> bool {
        !(v.x.is_nan() || v.y.is_nan() || v.z.is_nan())
    }

    proptest! {
        #[test]
        fn double_negation_is_identity(v in any::<Vec3>()) {
            prop_assume!(no_nan(v));
            prop_assert_eq!(-(-v), v);
        }

        #[test]
        fn zero_offset_keeps_box(b in any::<Aabb>()) {
            prop_assume!(no_nan(b.min) && no_nan(b.max));
            prop_assert_eq!(b.offset(Vec3::ZERO), b);
        }
    }
}
