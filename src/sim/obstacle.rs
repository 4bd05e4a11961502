//! Barrier pairs with a randomized gap

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::sprites::SpriteSet;
use crate::config::SimConfig;

/// A top/bottom barrier pair scrolling toward the agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    /// Left edge
    pub x: f32,
    /// Bottom edge of the top barrier (upper bound of the gap)
    pub height: f32,
    /// y of the top barrier sprite (`height` minus its height)
    pub top: f32,
    /// y of the bottom barrier sprite (lower bound of the gap)
    pub bottom: f32,
    pub passed: bool,
    width: f32,
    speed: f32,
}

impl Obstacle {
    /// Spawn at `x` with a freshly drawn gap
    pub fn new<R: Rng>(x: f32, config: &SimConfig, sprites: &SpriteSet, rng: &mut R) -> Self {
        let mut obstacle = Self {
            x,
            height: 0.0,
            top: 0.0,
            bottom: 0.0,
            passed: false,
            width: sprites.obstacle_width(),
            speed: config.scroll_speed,
        };
        obstacle.set_height(config, sprites, rng);
        obstacle
    }

    /// Spawn with a known gap height (replays, tests)
    pub fn with_height(x: f32, height: f32, config: &SimConfig, sprites: &SpriteSet) -> Self {
        Self {
            x,
            height,
            top: height - sprites.obstacle_height(),
            bottom: height + config.obstacle_gap,
            passed: false,
            width: sprites.obstacle_width(),
            speed: config.scroll_speed,
        }
    }

    fn set_height<R: Rng>(&mut self, config: &SimConfig, sprites: &SpriteSet, rng: &mut R) {
        self.height = rng.random_range(config.gap_height_min..config.gap_height_max) as f32;
        self.top = self.height - sprites.obstacle_height();
        self.bottom = self.height + config.obstacle_gap;
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Right edge
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn advance(&mut self) {
        self.x -= self.speed;
    }

    /// Latching pass detector: true only on the first call after the
    /// obstacle's left edge moves behind `agent_x`.
    pub fn has_passed(&mut self, agent_x: f32) -> bool {
        if !self.passed && self.x < agent_x {
            self.passed = true;
            return true;
        }
        false
    }

    /// Whether the right edge has scrolled past the left screen boundary
    #[inline]
    pub fn is_off_screen(&self) -> bool {
        self.right() < 0.0
    }

    /// Exact per-pixel test against the agent's current frame
    pub fn overlaps(&self, agent: &Agent, sprites: &SpriteSet) -> bool {
        let agent_mask = agent.mask(sprites);
        let dx = self.x.round() as i32 - agent.x().round() as i32;
        let agent_y = agent.y().round() as i32;
        let top_offset = IVec2::new(dx, self.top.round() as i32 - agent_y);
        let bottom_offset = IVec2::new(dx, self.bottom.round() as i32 - agent_y);

        agent_mask.overlap(&sprites.obstacle_top, top_offset)
            || agent_mask.overlap(&sprites.obstacle_bottom, bottom_offset)
    }
}
