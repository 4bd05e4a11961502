//! Pixel-mask collision
//!
//! Sprites are not rectangles (rounded barrier lips, bird silhouette), so
//! collisions are decided per pixel: two opacity bitmaps are AND-ed under a
//! relative offset.

use glam::IVec2;

/// Per-pixel opacity bitmap, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    size: IVec2,
    bits: Vec<bool>,
}

impl Mask {
    /// Build a mask by evaluating `solid(x, y)` for every pixel
    pub fn from_fn(width: i32, height: i32, mut solid: impl FnMut(i32, i32) -> bool) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let mut bits = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(solid(x, y));
            }
        }
        Self {
            size: IVec2::new(width, height),
            bits,
        }
    }

    /// Build a mask from alpha values; pixels above `threshold` are solid.
    ///
    /// Returns `None` if `alpha` does not hold exactly `width * height` values.
    pub fn from_alpha(width: i32, height: i32, alpha: &[u8], threshold: u8) -> Option<Self> {
        if width < 0 || height < 0 || alpha.len() != (width * height) as usize {
            return None;
        }
        Some(Self::from_fn(width, height, |x, y| {
            alpha[(y * width + x) as usize] > threshold
        }))
    }

    /// Fully solid rectangle
    pub fn filled(width: i32, height: i32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.size.y
    }

    #[inline]
    pub fn size(&self) -> IVec2 {
        self.size
    }

    /// Whether the pixel at (x, y) is solid; out-of-range pixels are empty
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.size.x || y >= self.size.y {
            return false;
        }
        self.bits[(y * self.size.x + x) as usize]
    }

    /// Number of solid pixels
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Mirror top-to-bottom
    pub fn flip_vertical(&self) -> Self {
        let h = self.size.y;
        Self::from_fn(self.size.x, h, |x, y| self.get(x, h - 1 - y))
    }

    /// First overlapping pixel, in this mask's coordinates.
    ///
    /// `offset` is the position of `other`'s top-left corner relative to this
    /// mask's top-left corner.
    pub fn overlap_point(&self, other: &Mask, offset: IVec2) -> Option<IVec2> {
        // Intersection of the two rectangles in self-space
        let x0 = offset.x.max(0);
        let y0 = offset.y.max(0);
        let x1 = (offset.x + other.size.x).min(self.size.x);
        let y1 = (offset.y + other.size.y).min(self.size.y);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - offset.x, y - offset.y) {
                    return Some(IVec2::new(x, y));
                }
            }
        }
        None
    }

    /// Whether any solid pixel of `other`, placed at `offset`, covers a solid pixel here
    #[inline]
    pub fn overlap(&self, other: &Mask, offset: IVec2) -> bool {
        self.overlap_point(other, offset).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn disc(radius: i32) -> Mask {
        let d = radius * 2;
        Mask::from_fn(d, d, |x, y| {
            let dx = x - radius;
            let dy = y - radius;
            dx * dx + dy * dy < radius * radius
        })
    }

    #[test]
    fn test_filled_masks_overlap_when_rects_intersect() {
        let a = Mask::filled(10, 10);
        let b = Mask::filled(4, 4);
        assert!(a.overlap(&b, IVec2::new(8, 8)));
        assert_eq!(a.overlap_point(&b, IVec2::new(8, 8)), Some(IVec2::new(8, 8)));
        assert!(a.overlap(&b, IVec2::new(-3, -3)));
    }

    #[test]
    fn test_disjoint_rects_never_overlap() {
        let a = Mask::filled(10, 10);
        let b = Mask::filled(4, 4);
        assert!(!a.overlap(&b, IVec2::new(10, 0)));
        assert!(!a.overlap(&b, IVec2::new(0, -4)));
    }

    #[test]
    fn test_round_corners_do_not_collide() {
        // Bounding boxes overlap at the corner but the discs don't touch
        let a = disc(10);
        let b = disc(10);
        assert!(!a.overlap(&b, IVec2::new(17, 17)));
        assert!(a.overlap(&b, IVec2::new(10, 10)));
    }

    #[test]
    fn test_from_alpha_threshold() {
        let alpha = [0, 200, 0, 0, 127, 128];
        let mask = Mask::from_alpha(3, 2, &alpha, 127).unwrap();
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(!mask.get(1, 1));
        assert!(mask.get(2, 1));
        assert_eq!(mask.count(), 2);
        assert!(Mask::from_alpha(3, 3, &alpha, 0).is_none());
    }

    #[test]
    fn test_flip_vertical() {
        let mask = Mask::from_fn(2, 3, |_, y| y == 0);
        let flipped = mask.flip_vertical();
        assert!(flipped.get(0, 2));
        assert!(!flipped.get(0, 0));
        assert_eq!(flipped.count(), mask.count());
    }

    proptest! {
        #[test]
        fn proptest_overlap_is_symmetric(
            dx in -30i32..30,
            dy in -30i32..30,
        ) {
            let a = disc(9);
            let b = Mask::from_fn(12, 7, |x, y| (x + y) % 3 != 0);
            prop_assert_eq!(a.overlap(&b, IVec2::new(dx, dy)), b.overlap(&a, IVec2::new(-dx, -dy)));
        }
    }
}
