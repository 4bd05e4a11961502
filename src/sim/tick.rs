//! Fixed timestep population tick
//!
//! One call advances every live agent, every obstacle and the ground by one
//! frame, in a fixed order.

use super::decision::{DecisionFunction, Observation, wants_jump};
use super::state::{DeathCause, PopulationRuntime, SimEvent};

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Agents are still alive
    Running,
    /// The live set was empty at the start of the tick
    Extinct,
}

impl<D: DecisionFunction> PopulationRuntime<D> {
    /// Index of the obstacle agents currently react to.
    ///
    /// The head of the list, unless the lead agent is already past its right
    /// edge and a second obstacle exists.
    pub fn indicator_index(&self) -> usize {
        match (self.live.first(), self.obstacles.as_slice()) {
            (Some(lead), [first, _, ..]) if lead.agent.x() > first.right() => 1,
            _ => 0,
        }
    }

    /// Advance the episode by one fixed timestep
    pub fn tick(&mut self) -> TickOutcome {
        self.events.clear();

        // 1. Indicator selection
        let indicator = self.indicator_index();

        // 2. Early termination
        if self.live.is_empty() {
            self.events.push(SimEvent::Extinct);
            return TickOutcome::Extinct;
        }

        if self.obstacles.is_empty() {
            self.spawn_obstacle();
        }
        self.time_ticks += 1;

        // 3. Decision + physics
        let (gap_top, gap_bottom) = {
            let ob = &self.obstacles[indicator];
            (ob.height, ob.bottom)
        };
        let threshold = self.config.jump_threshold;
        for contestant in &mut self.live {
            self.fitness[contestant.id] += self.config.survival_reward;
            contestant.agent.advance();

            let observation = Observation::new(contestant.agent.y(), gap_top, gap_bottom);
            let activation = contestant.decider.activate(observation);
            if wants_jump(activation, threshold) {
                contestant.agent.jump();
            }
        }

        // 4. Collision + pass detection; removals are deferred until the scan ends
        let mut dead = vec![false; self.live.len()];
        let mut passed_any = false;
        let mut retire = vec![false; self.obstacles.len()];
        for (ob_idx, obstacle) in self.obstacles.iter_mut().enumerate() {
            for (agent_idx, contestant) in self.live.iter().enumerate() {
                if dead[agent_idx] {
                    continue;
                }
                if obstacle.overlaps(&contestant.agent, &self.sprites) {
                    self.fitness[contestant.id] -= self.config.collision_penalty;
                    dead[agent_idx] = true;
                    self.events.push(SimEvent::Died {
                        id: contestant.id,
                        cause: DeathCause::Collision,
                    });
                }
                if obstacle.has_passed(contestant.agent.x()) {
                    passed_any = true;
                }
            }

            if obstacle.is_off_screen() {
                retire[ob_idx] = true;
            }
            obstacle.advance();
        }
        compact(&mut self.live, &dead);

        // 5. Obstacle lifecycle
        if passed_any {
            self.score += 1;
            for contestant in &self.live {
                self.fitness[contestant.id] += self.config.pass_reward;
            }
            self.spawn_obstacle();
            self.events.push(SimEvent::ObstaclePassed { score: self.score });
            log::debug!(
                "gen {} tick {}: score {} ({} alive)",
                self.generation,
                self.time_ticks,
                self.score,
                self.live.len()
            );
        }
        // Newly spawned obstacles sit past the end of `retire` and are kept
        let mut ob_idx = 0;
        self.obstacles.retain(|_| {
            let keep = !retire.get(ob_idx).copied().unwrap_or(false);
            ob_idx += 1;
            keep
        });

        // 6. Bounds check
        let ground_y = self.config.ground_y;
        let sprites = &self.sprites;
        let out_of_bounds: Vec<bool> = self
            .live
            .iter()
            .map(|c| {
                let y = c.agent.y();
                y + c.agent.height(sprites) >= ground_y || y < 0.0
            })
            .collect();
        for (contestant, _) in self.live.iter().zip(&out_of_bounds).filter(|(_, out)| **out) {
            self.events.push(SimEvent::Died {
                id: contestant.id,
                cause: DeathCause::OutOfBounds,
            });
        }
        compact(&mut self.live, &out_of_bounds);

        // 7. Ground
        self.ground.advance();

        for event in &self.events {
            if let SimEvent::Died { id, cause } = event {
                log::debug!(
                    "gen {} tick {}: agent {} died ({:?}), fitness {:.1}",
                    self.generation,
                    self.time_ticks,
                    id,
                    cause,
                    self.fitness[*id]
                );
            }
        }

        TickOutcome::Running
    }
}

/// Drop every entry whose flag is set, preserving the order of the rest
fn compact<T>(items: &mut Vec<T>, remove: &[bool]) {
    let mut idx = 0;
    items.retain(|_| {
        let keep = !remove[idx];
        idx += 1;
        keep
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SimConfig;
    use crate::sim::collision::Mask;
    use crate::sim::decision::FnDecision;
    use crate::sim::obstacle::Obstacle;
    use crate::sim::sprites::SpriteSet;

    type Scripted = FnDecision<Box<dyn FnMut([f32; 3]) -> f32>>;

    fn scripted(f: impl FnMut([f32; 3]) -> f32 + 'static) -> Scripted {
        let boxed: Box<dyn FnMut([f32; 3]) -> f32> = Box::new(f);
        FnDecision(boxed)
    }

    fn never() -> Scripted {
        scripted(|_| 0.0)
    }

    /// Jumps whenever it has sunk below the middle of the gap
    fn gap_follower() -> Scripted {
        scripted(|[_, to_top, to_bottom]| if to_bottom < to_top { 1.0 } else { 0.0 })
    }

    fn runtime(deciders: Vec<Scripted>) -> PopulationRuntime<Scripted> {
        PopulationRuntime::new(SimConfig::default(), Arc::new(SpriteSet::classic()), deciders, 0)
            .unwrap()
    }

    /// Flaps whenever it sinks below the spawn height; stays within y 255..364
    fn hover() -> Scripted {
        scripted(|[y, _, _]| if y > 350.0 { 1.0 } else { 0.0 })
    }

    /// Rectangular silhouettes so overlaps reduce to box intersection
    fn box_sprites() -> SpriteSet {
        SpriteSet::new(std::array::from_fn(|_| Mask::filled(68, 48)), Mask::filled(104, 640))
    }

    fn obstacle_at(rt: &PopulationRuntime<Scripted>, x: f32, height: f32) -> Obstacle {
        Obstacle::with_height(x, height, rt.config(), rt.sprites())
    }

    #[test]
    fn test_empty_population_ends_immediately() {
        let mut rt = runtime(Vec::new());
        assert_eq!(rt.tick(), TickOutcome::Extinct);
        assert_eq!(rt.ticks(), 0);
        assert!(rt.into_fitness().is_empty());
    }

    #[test]
    fn test_free_fall_hits_ground() {
        let mut rt = runtime(vec![never()]);
        // Keep the course out of the way
        let far = obstacle_at(&rt, 10_000.0, 300.0);
        rt.set_obstacles(vec![far]);

        let mut last_y = rt.live()[0].agent.y();
        let mut ticks = 0;
        while rt.tick() == TickOutcome::Running {
            ticks += 1;
            if let Some(c) = rt.live().first() {
                assert!(c.agent.y() > last_y);
                last_y = c.agent.y();
            }
            assert!(ticks < 100);
        }
        // 350 -> 351.5, 357.5, 371, then 16/tick until y + 48 >= 730 (y = 691 on tick 23)
        assert_eq!(rt.ticks(), 23);
        let fitness = rt.into_fitness();
        assert_eq!(fitness.len(), 1);
        assert!((fitness[0] - 2.3).abs() < 1e-4);
    }

    #[test]
    fn test_out_of_bounds_event() {
        let mut rt = runtime(vec![never()]);
        rt.set_obstacles(vec![obstacle_at(&rt, 10_000.0, 300.0)]);
        let mut death = None;
        while rt.live_count() > 0 {
            rt.tick();
            death = rt.events().iter().find_map(|e| match e {
                SimEvent::Died { id, cause } => Some((*id, *cause)),
                _ => None,
            });
        }
        // The tick that removed the agent reported why
        assert_eq!(death, Some((0, DeathCause::OutOfBounds)));
        assert_eq!(rt.tick(), TickOutcome::Extinct);
        assert_eq!(rt.events(), &[SimEvent::Extinct]);
    }

    #[test]
    fn test_indicator_switches_after_lead_clears_first() {
        let mut rt = runtime(vec![never()]);
        let first = obstacle_at(&rt, 100.0, 300.0); // right edge 204
        let second = obstacle_at(&rt, 400.0, 200.0);
        rt.set_obstacles(vec![first, second]);
        assert_eq!(rt.indicator_index(), 1);

        let first = obstacle_at(&rt, 200.0, 300.0); // right edge 304
        let second = obstacle_at(&rt, 400.0, 200.0);
        rt.set_obstacles(vec![first, second]);
        assert_eq!(rt.indicator_index(), 0);

        rt.set_obstacles(vec![obstacle_at(&rt, 100.0, 300.0)]);
        assert_eq!(rt.indicator_index(), 0);
    }

    #[test]
    fn test_observation_uses_indicator_gap() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = seen.clone();
        let decider = scripted(move |obs| {
            log.borrow_mut().push(obs);
            0.0
        });
        let mut rt = runtime(vec![decider]);
        let first = obstacle_at(&rt, 0.0, 100.0); // right edge 104, behind the agent
        let second = obstacle_at(&rt, 450.0, 250.0);
        rt.set_obstacles(vec![first, second]);
        rt.tick();

        let obs = seen.borrow()[0];
        assert_eq!(obs[0], 351.5);
        assert_eq!(obs[1], 101.5); // |351.5 - 250|
        assert_eq!(obs[2], 98.5); // |351.5 - 450|
    }

    #[test]
    fn test_pass_bonus_once_per_obstacle() {
        let mut rt = runtime(vec![gap_follower(), gap_follower(), gap_follower()]);
        // Gap spans 300..500, agents hover around the middle; x 226 < 230 after one step
        let ob = obstacle_at(&rt, 231.0, 300.0);
        rt.set_obstacles(vec![ob]);

        rt.tick();
        // Passing is detected before the obstacle moves: 231 < 230 is false
        assert_eq!(rt.score(), 0);
        rt.tick();
        assert_eq!(rt.score(), 1);
        assert!(rt.events().contains(&SimEvent::ObstaclePassed { score: 1 }));
        assert_eq!(rt.obstacles().len(), 2);
        assert!(rt.obstacles()[0].passed);
        let after_pass = rt.fitness().to_vec();
        // Two survival rewards plus one pass bonus, no collision penalty
        for f in &after_pass {
            assert!((f - 5.2).abs() < 1e-4);
        }

        for _ in 0..5 {
            rt.tick();
        }
        assert_eq!(rt.score(), 1);
        for f in rt.fitness() {
            assert!((f - 5.7).abs() < 1e-4);
        }
    }

    #[test]
    fn test_simultaneous_collisions_keep_alignment() {
        let mut rt = runtime((0..5).map(|_| never()).collect());
        // Stagger the agents: 1 and 3 sit inside the top barrier, the rest in the gap
        for (i, c) in rt.live.iter_mut().enumerate() {
            c.agent.pos.y = if i % 2 == 1 { 150.0 } else { 380.0 };
            c.agent.jump_height = c.agent.pos.y;
        }
        // Overlaps the agents horizontally but is not yet passed
        let ob = obstacle_at(&rt, 235.0, 300.0);
        rt.set_obstacles(vec![ob]);
        rt.tick();

        assert_eq!(rt.live_count(), 3);
        let ids: Vec<usize> = rt.live().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 2, 4]);
        let fitness = rt.fitness();
        assert!((fitness[1] - (0.1 - 1.0)).abs() < 1e-4);
        assert!((fitness[3] - (0.1 - 1.0)).abs() < 1e-4);
        for id in [0, 2, 4] {
            assert!((fitness[id] - 0.1).abs() < 1e-4);
        }
        let deaths = rt
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::Died { cause: DeathCause::Collision, .. }))
            .count();
        assert_eq!(deaths, 2);
    }

    #[test]
    fn test_collision_penalty_applied_once_across_obstacles() {
        let mut rt = runtime(vec![never()]);
        rt.live[0].agent.pos.y = 150.0;
        rt.live[0].agent.jump_height = 150.0;
        // Two overlapping barriers at the same spot
        let a = obstacle_at(&rt, 200.0, 300.0);
        let b = obstacle_at(&rt, 210.0, 300.0);
        rt.set_obstacles(vec![a, b]);
        rt.tick();
        assert!(rt.is_extinct());
        assert!((rt.fitness()[0] - (0.1 - 1.0)).abs() < 1e-4);
    }

    #[test]
    fn test_off_screen_obstacles_are_retired() {
        let mut rt = runtime(vec![gap_follower()]);
        let mut gone = obstacle_at(&rt, -106.0, 300.0); // right edge -2
        gone.passed = true;
        let next = obstacle_at(&rt, 400.0, 300.0);
        rt.set_obstacles(vec![gone, next]);
        rt.tick();
        assert_eq!(rt.obstacles().len(), 1);
        assert_eq!(rt.obstacles()[0].x, 395.0);
    }

    #[test]
    fn test_non_finite_activation_is_ignored() {
        let nan = scripted(|_| f32::NAN);
        let inf = scripted(|_| f32::INFINITY);
        let mut rt = runtime(vec![nan, inf]);
        rt.tick();
        rt.tick();
        // Neither agent jumped, both are falling
        for c in rt.live() {
            assert_eq!(c.agent.velocity, 0.0);
            assert!(c.agent.y() > 350.0);
        }
    }

    #[test]
    fn test_ground_scrolls_each_tick() {
        let mut rt = runtime(vec![gap_follower()]);
        rt.tick();
        rt.tick();
        assert_eq!(rt.ground().x1, -10.0);
    }

    #[test]
    fn test_collided_agent_keeps_only_its_lifetime_reward() {
        // Wide gap 120..520: the hover agent never reaches either barrier,
        // the falling agent's bottom edge crosses 520 on tick 10 (y 483)
        let config = SimConfig {
            obstacle_gap: 400.0,
            ..SimConfig::default()
        };
        let sprites = box_sprites();
        let ob = Obstacle::with_height(280.0, 120.0, &config, &sprites);
        let mut rt =
            PopulationRuntime::new(config, Arc::new(sprites), vec![never(), hover()], 0).unwrap();
        rt.set_obstacles(vec![ob]);

        let mut collision_tick = None;
        for _ in 0..50 {
            assert_eq!(rt.tick(), TickOutcome::Running);
            if rt.events().contains(&SimEvent::Died {
                id: 0,
                cause: DeathCause::Collision,
            }) {
                collision_tick = Some(rt.ticks());
            }
        }

        assert_eq!(collision_tick, Some(10));
        assert_eq!(rt.live().iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(rt.ticks(), 50);
        // The obstacle's left edge drops behind x 230 on tick 12, after the collision
        assert_eq!(rt.score(), 1);
        let fitness = rt.into_fitness();
        assert_eq!(fitness.len(), 2);
        assert!((fitness[0] - (10.0 * 0.1 - 1.0)).abs() < 1e-4);
        assert!((fitness[1] - (50.0 * 0.1 + 5.0)).abs() < 1e-4);
    }

    #[test]
    fn test_spawned_course_pays_one_bonus_per_obstacle() {
        let mut rt = runtime(vec![gap_follower(), gap_follower()]);
        let mut passes = 0;
        for _ in 0..3000 {
            if rt.tick() == TickOutcome::Extinct {
                break;
            }
            for event in rt.events() {
                if let SimEvent::ObstaclePassed { score } = event {
                    passes += 1;
                    assert_eq!(*score, passes);
                }
            }
        }

        assert!(rt.score() > 10);
        assert_eq!(rt.score(), passes);
        assert!(!rt.is_extinct());
        // Survivors earned exactly the per-tick reward plus one bonus per obstacle
        let expected = rt.ticks() as f32 * 0.1 + rt.score() as f32 * 5.0;
        let survivors: Vec<usize> = rt.live().iter().map(|c| c.id).collect();
        for id in survivors {
            assert!((rt.fitness()[id] - expected).abs() < 0.25);
        }
    }
}
