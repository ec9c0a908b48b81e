use serde::Deserialize;

pub type BlockId = u16;

pub const AIR: BlockId = 0;

/// How a block's geometry is drawn and batched.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawType {
    #[default]
    Opaque,
    /// Alpha-tested, culls against itself (glass).
    Transparent,
    /// Alpha-tested, never culls against itself (leaves).
    TransparentThick,
    /// Alpha-blended, goes into the translucent partitions (water, ice).
    Translucent,
    Gas,
    /// Non-cube cross geometry (plants).
    Sprite,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollideType {
    Gas,
    Liquid,
    #[default]
    Solid,
    Ice,
}

/// RGBA8 colour, the per-vertex colour format.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct PackedCol(pub [u8; 4]);

impl PackedCol {
    pub const WHITE: PackedCol = PackedCol([255, 255, 255, 255]);
    pub const BLACK: PackedCol = PackedCol([0, 0, 0, 255]);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        PackedCol([r, g, b, 255])
    }

    #[inline]
    pub fn r(self) -> u8 {
        self.0[0]
    }
    #[inline]
    pub fn g(self) -> u8 {
        self.0[1]
    }
    #[inline]
    pub fn b(self) -> u8 {
        self.0[2]
    }

    /// Scales the RGB channels, leaving alpha untouched.
    #[inline]
    pub fn scale(self, t: f32) -> Self {
        let s = |c: u8| (c as f32 * t).clamp(0.0, 255.0) as u8;
        PackedCol([s(self.0[0]), s(self.0[1]), s(self.0[2]), self.0[3]])
    }

    /// Component-wise multiply of RGB by `tint`.
    #[inline]
    pub fn tint(self, tint: PackedCol) -> Self {
        let m = |a: u8, b: u8| ((a as u16 * b as u16) / 255) as u8;
        PackedCol([
            m(self.0[0], tint.0[0]),
            m(self.0[1], tint.0[1]),
            m(self.0[2], tint.0[2]),
            self.0[3],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_by_white_is_identity() {
        let c = PackedCol::rgb(10, 200, 77);
        assert_eq!(c.tint(PackedCol::WHITE), c);
        assert_eq!(c.tint(PackedCol::BLACK), PackedCol::rgb(0, 0, 0));
    }

    #[test]
    fn scale_keeps_alpha() {
        let c = PackedCol([200, 100, 50, 128]).scale(0.5);
        assert_eq!(c, PackedCol([100, 50, 25, 128]));
    }
}
