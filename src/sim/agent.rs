//! The flapping agent: jump impulse, capped quadratic fall, tilt and wing animation

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Mask;
use super::sprites::SpriteSet;
use crate::config::SimConfig;

/// Frame shown at each animation phase
const FLAP_SEQUENCE: [usize; 4] = [0, 1, 2, 1];
/// Frame held while diving
pub const GLIDE_FRAME: usize = 1;

/// Physics and animation parameters, copied out of [`SimConfig`] once per episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    pub jump_velocity: f32,
    pub gravity: f32,
    pub max_fall_step: f32,
    pub rise_boost: f32,
    pub level_band: f32,
    pub max_tilt: f32,
    pub min_tilt: f32,
    pub rotation_velocity: f32,
    pub glide_tilt: f32,
    pub animation_ticks: u32,
}

impl From<&SimConfig> for AgentParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            jump_velocity: config.jump_velocity,
            gravity: config.gravity,
            max_fall_step: config.max_fall_step,
            rise_boost: config.rise_boost,
            level_band: config.level_band,
            max_tilt: config.max_tilt,
            min_tilt: config.min_tilt,
            rotation_velocity: config.rotation_velocity,
            glide_tilt: config.glide_tilt,
            animation_ticks: config.animation_ticks.max(1),
        }
    }
}

impl Default for AgentParams {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

/// One simulated player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Screen position; x stays fixed for the whole episode
    pub pos: Vec2,
    /// Velocity set by the last jump (pixels per tick)
    pub velocity: f32,
    /// Ticks since the last jump, drives the fall curve
    pub tick_count: u32,
    /// y at the last jump
    pub jump_height: f32,
    /// Degrees, nose-up positive
    pub tilt: f32,
    /// Animation counter, wraps every four phases
    pub anim_ticks: u32,
    /// Index into the character frames
    pub frame: usize,
    params: AgentParams,
}

impl Agent {
    pub fn new(pos: Vec2, params: AgentParams) -> Self {
        Self {
            pos,
            velocity: 0.0,
            tick_count: 0,
            jump_height: pos.y,
            tilt: 0.0,
            anim_ticks: 0,
            frame: 0,
            params,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos.y
    }

    pub fn jump(&mut self) {
        self.velocity = self.params.jump_velocity;
        self.tick_count = 0;
        self.jump_height = self.pos.y;
    }

    /// Vertical displacement for the current tick count
    fn displacement(&self) -> f32 {
        let t = self.tick_count as f32;
        let d = (self.velocity * t + self.params.gravity * t * t).min(self.params.max_fall_step);
        if d < 0.0 { d - self.params.rise_boost } else { d }
    }

    /// Advance one tick: integrate, rotate, animate
    pub fn advance(&mut self) {
        self.tick_count += 1;
        let d = self.displacement();
        self.pos.y += d;

        let p = &self.params;
        if d < 0.0 || self.pos.y < self.jump_height + p.level_band {
            self.tilt = self.tilt.max(p.max_tilt);
        } else {
            self.tilt = (self.tilt - p.rotation_velocity).max(p.min_tilt);
        }

        self.animate();
    }

    fn animate(&mut self) {
        let phase_ticks = self.params.animation_ticks;
        let cycle = phase_ticks * FLAP_SEQUENCE.len() as u32;
        self.anim_ticks = (self.anim_ticks + 1) % cycle;
        self.frame = FLAP_SEQUENCE[(self.anim_ticks / phase_ticks) as usize];

        // Diving: hold the wings level and resume the flap on the down-stroke
        if self.tilt <= self.params.glide_tilt {
            self.frame = GLIDE_FRAME;
            self.anim_ticks = phase_ticks * 2;
        }
    }

    /// Collision mask of the current frame
    #[inline]
    pub fn mask<'a>(&self, sprites: &'a SpriteSet) -> &'a Mask {
        &sprites.character[self.frame]
    }

    /// Height of the current frame
    #[inline]
    pub fn height(&self, sprites: &SpriteSet) -> f32 {
        sprites.character_height(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spawn() -> Agent {
        Agent::new(Vec2::new(230.0, 350.0), AgentParams::default())
    }

    #[test]
    fn test_jump_resets_curve() {
        let mut agent = spawn();
        agent.advance();
        agent.advance();
        agent.jump();
        assert_eq!(agent.velocity, -10.5);
        assert_eq!(agent.tick_count, 0);
        assert_eq!(agent.jump_height, agent.y());
    }

    #[test]
    fn test_rise_gets_boost() {
        let mut agent = spawn();
        agent.jump();
        agent.advance();
        // -10.5 + 1.5 = -9, boosted by -2
        assert!((agent.y() - (350.0 - 11.0)).abs() < 1e-4);
        assert_eq!(agent.tilt, 25.0);
    }

    #[test]
    fn test_fall_is_capped() {
        let mut agent = spawn();
        let mut steps = Vec::new();
        for _ in 0..10 {
            let before = agent.y();
            agent.advance();
            steps.push(agent.y() - before);
        }
        assert!((steps[0] - 1.5).abs() < 1e-4);
        // 1.5 * 4^2 = 24 is past the cap
        assert!(steps[3..].iter().all(|s| (s - 16.0).abs() < 1e-4));
    }

    #[test]
    fn test_free_fall_is_monotonic() {
        let mut agent = spawn();
        let mut last = agent.y();
        for _ in 0..40 {
            agent.advance();
            assert!(agent.y() > last);
            last = agent.y();
        }
    }

    #[test]
    fn test_tilt_dives_after_leveling_band() {
        let mut agent = spawn();
        // y = 351.5, 357.5, 371, 387 stays within 50px of the spawn height
        for _ in 0..4 {
            agent.advance();
            assert_eq!(agent.tilt, 25.0);
        }
        agent.advance(); // y = 403
        assert_eq!(agent.tilt, 5.0);
        for _ in 0..10 {
            agent.advance();
        }
        assert_eq!(agent.tilt, -90.0);
    }

    #[test]
    fn test_animation_cycle() {
        let mut agent = spawn();
        agent.jump();
        let mut frames = Vec::new();
        for _ in 0..20 {
            agent.advance();
            frames.push(agent.frame);
            if agent.tick_count > 3 {
                agent.jump();
            }
        }
        assert_eq!(&frames[0..4], &[0, 0, 0, 0]);
        assert_eq!(&frames[4..9], &[1, 1, 1, 1, 1]);
        assert_eq!(&frames[9..14], &[2, 2, 2, 2, 2]);
        assert_eq!(&frames[14..19], &[1, 1, 1, 1, 1]);
        assert_eq!(frames[19], 0);
    }

    #[test]
    fn test_dive_freezes_glide_frame() {
        let mut agent = spawn();
        while agent.tilt > -80.0 {
            agent.advance();
        }
        assert_eq!(agent.frame, GLIDE_FRAME);
        assert_eq!(agent.anim_ticks, 10);
        agent.advance();
        assert_eq!(agent.frame, GLIDE_FRAME);

        // Pulling out of the dive resumes on the down-stroke frame
        agent.jump();
        agent.advance();
        assert_eq!(agent.tilt, 25.0);
        assert_eq!(agent.frame, 2);
    }

    proptest! {
        #[test]
        fn proptest_tilt_stays_bounded(jumps in proptest::collection::vec(any::<bool>(), 1..400)) {
            let mut agent = spawn();
            for jump in jumps {
                agent.advance();
                if jump {
                    agent.jump();
                }
                prop_assert!(agent.tilt >= -90.0 && agent.tilt <= 25.0);
                prop_assert!(agent.frame < 3);
            }
        }
    }
}
