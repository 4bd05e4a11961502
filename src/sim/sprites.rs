//! Sprite silhouettes used for collision geometry
//!
//! Image decoding is not part of the simulation, so the default set is
//! generated procedurally at the classic asset sizes. Callers with real art
//! can build masks with [`Mask::from_alpha`] and use [`SpriteSet::new`].

use super::collision::Mask;
use crate::consts::*;

/// Number of distinct character frames (level, wings up, wings down)
pub const CHARACTER_FRAMES: usize = 3;

/// Collision masks for every drawable entity
#[derive(Debug, Clone)]
pub struct SpriteSet {
    pub character: [Mask; CHARACTER_FRAMES],
    /// Upper barrier (the bottom barrier flipped vertically)
    pub obstacle_top: Mask,
    pub obstacle_bottom: Mask,
}

impl SpriteSet {
    /// Assemble a set from caller-provided masks; the top barrier is derived by flipping
    pub fn new(character: [Mask; CHARACTER_FRAMES], obstacle_bottom: Mask) -> Self {
        Self {
            character,
            obstacle_top: obstacle_bottom.flip_vertical(),
            obstacle_bottom,
        }
    }

    /// Procedural silhouettes at the classic sizes
    pub fn classic() -> Self {
        let character = [
            character_frame(0),
            character_frame(-8),
            character_frame(8),
        ];
        Self::new(character, obstacle_barrier())
    }

    #[inline]
    pub fn obstacle_width(&self) -> f32 {
        self.obstacle_bottom.width() as f32
    }

    #[inline]
    pub fn obstacle_height(&self) -> f32 {
        self.obstacle_top.height() as f32
    }

    #[inline]
    pub fn character_height(&self, frame: usize) -> f32 {
        self.character[frame].height() as f32
    }
}

impl Default for SpriteSet {
    fn default() -> Self {
        Self::classic()
    }
}

/// Oval body, beak and a wing whose vertical position encodes the flap phase
fn character_frame(wing_dy: i32) -> Mask {
    let (w, h) = (AGENT_SPRITE_WIDTH, AGENT_SPRITE_HEIGHT);
    let body = (30, 24, 26, 19);
    let wing = (16, 24 + wing_dy, 12, 6);
    Mask::from_fn(w, h, |x, y| {
        let in_ellipse = |(cx, cy, rx, ry): (i32, i32, i32, i32)| {
            let dx = (x - cx) as f32 / rx as f32;
            let dy = (y - cy) as f32 / ry as f32;
            dx * dx + dy * dy <= 1.0
        };
        // Beak: a wedge tapering to the right edge
        let beak = x >= 52 && (y - 28).abs() <= (w - 1 - x) / 2;
        in_ellipse(body) || in_ellipse(wing) || beak
    })
}

/// Tube with a wider lip at the open end; the lip corners are rounded
fn obstacle_barrier() -> Mask {
    const LIP_HEIGHT: i32 = 48;
    const TUBE_INSET: i32 = 4;
    const CORNER: i32 = 6;
    let (w, h) = (OBSTACLE_SPRITE_WIDTH, OBSTACLE_SPRITE_HEIGHT);
    Mask::from_fn(w, h, |x, y| {
        if y >= LIP_HEIGHT {
            return x >= TUBE_INSET && x < w - TUBE_INSET;
        }
        // Round the two outer corners of the lip
        let cx = if x < CORNER {
            CORNER - x
        } else if x >= w - CORNER {
            x - (w - 1 - CORNER)
        } else {
            0
        };
        let cy = if y < CORNER { CORNER - y } else { 0 };
        cx * cx + cy * cy <= CORNER * CORNER
    })
}
