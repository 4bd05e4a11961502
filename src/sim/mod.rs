//! Deterministic simulation module
//!
//! All episode logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (one stream per generation)
//! - Stable iteration order (spawn order of the live set)
//! - No rendering or platform dependencies

pub mod agent;
pub mod collision;
pub mod decision;
pub mod ground;
pub mod obstacle;
pub mod sprites;
pub mod state;
pub mod tick;

pub use agent::{Agent, AgentParams};
pub use collision::Mask;
pub use decision::{DecisionFunction, FnDecision, Observation, from_fn, wants_jump};
pub use ground::ScrollingGround;
pub use obstacle::Obstacle;
pub use sprites::SpriteSet;
pub use state::{
    AgentView, Contestant, DeathCause, ObstacleView, PopulationRuntime, SimEvent, Snapshot,
    generation_seed,
};
pub use tick::TickOutcome;
