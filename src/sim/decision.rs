//! Controller interface between the simulation and whatever produced the controller

use serde::{Deserialize, Serialize};

/// What an agent sees each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Agent's vertical position
    pub y: f32,
    /// Distance to the upper edge of the indicator obstacle's gap
    pub gap_top_distance: f32,
    /// Distance to the lower edge of the indicator obstacle's gap
    pub gap_bottom_distance: f32,
}

impl Observation {
    pub fn new(y: f32, gap_top: f32, gap_bottom: f32) -> Self {
        Self {
            y,
            gap_top_distance: (y - gap_top).abs(),
            gap_bottom_distance: (y - gap_bottom).abs(),
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.y, self.gap_top_distance, self.gap_bottom_distance]
    }
}

/// Maps an observation to an activation; above the jump threshold means jump.
///
/// Each agent owns its own decision function and never sees other agents.
pub trait DecisionFunction {
    fn activate(&mut self, observation: Observation) -> f32;
}

/// Adapter turning a closure over the raw observation triple into a decision function
#[derive(Debug, Clone, Copy)]
pub struct FnDecision<F>(pub F);

/// Wrap a closure as a decision function
pub fn from_fn<F>(f: F) -> FnDecision<F>
where
    F: FnMut([f32; 3]) -> f32,
{
    FnDecision(f)
}

impl<F> DecisionFunction for FnDecision<F>
where
    F: FnMut([f32; 3]) -> f32,
{
    fn activate(&mut self, observation: Observation) -> f32 {
        (self.0)(observation.to_array())
    }
}

impl<D: DecisionFunction + ?Sized> DecisionFunction for Box<D> {
    fn activate(&mut self, observation: Observation) -> f32 {
        (**self).activate(observation)
    }
}

impl<D: DecisionFunction + ?Sized> DecisionFunction for &mut D {
    fn activate(&mut self, observation: Observation) -> f32 {
        (**self).activate(observation)
    }
}

/// Jump decision; non-finite activations count as "no jump"
#[inline]
pub fn wants_jump(activation: f32, threshold: f32) -> bool {
    activation.is_finite() && activation > threshold
}
