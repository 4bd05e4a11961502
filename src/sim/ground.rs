//! Two ground tiles leapfrogging each other for an endless scroll

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollingGround {
    pub y: f32,
    pub x1: f32,
    pub x2: f32,
    pub tile_width: f32,
    speed: f32,
}

impl ScrollingGround {
    pub fn new(y: f32, tile_width: f32, speed: f32) -> Self {
        Self {
            y,
            x1: 0.0,
            x2: tile_width,
            tile_width,
            speed,
        }
    }

    pub fn advance(&mut self) {
        self.x1 -= self.speed;
        self.x2 -= self.speed;

        if self.x1 + self.tile_width < 0.0 {
            self.x1 = self.x2 + self.tile_width;
        }
        if self.x2 + self.tile_width < 0.0 {
            self.x2 = self.x1 + self.tile_width;
        }
    }

    /// Whether the two tiles together span `[0, width]`
    pub fn covers(&self, width: f32) -> bool {
        let (left, right) = if self.x1 <= self.x2 {
            (self.x1, self.x2)
        } else {
            (self.x2, self.x1)
        };
        left <= 0.0 && left + self.tile_width >= right && right + self.tile_width >= width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tile_wraps_behind_partner() {
        let mut ground = ScrollingGround::new(730.0, 672.0, 5.0);
        // 135 ticks moves x1 to -675, just past its own width
        for _ in 0..135 {
            ground.advance();
        }
        assert_eq!(ground.x2, -3.0);
        assert_eq!(ground.x1, 669.0);
    }

    proptest! {
        #[test]
        fn proptest_no_gap_on_screen(ticks in 0usize..2000) {
            let mut ground = ScrollingGround::new(730.0, 672.0, 5.0);
            for _ in 0..ticks {
                ground.advance();
            }
            prop_assert!(ground.covers(500.0));
        }
    }
}
