//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Within a tick
//! the order is fixed: input, obstacle integration, recycling, collision
//! classification, then failure / rescue bookkeeping.

use serde::{Deserialize, Serialize};

use super::collision::{CollisionClassifier, FailureCause};
use super::entity::ObstacleEntity;
use super::recycler::StreamRecycler;
use super::state::{GameEvent, GamePhase, GameState, Outcome, TransitionKind};
use super::zone::Zone;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    Tongue,
    Croak,
}

/// A discrete request from any input device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputRequest {
    /// One hop; only the sign of each component matters. `dy` is cosmetic.
    Move { dx: f32, dy: f32, dz: f32 },
    /// Several hops at once in the given direction
    Dash { dx: f32, dz: f32 },
    Ability(Ability),
}

impl InputRequest {
    pub fn forward() -> Self {
        InputRequest::Move {
            dx: 0.0,
            dy: 1.0,
            dz: 1.0,
        }
    }

    pub fn back() -> Self {
        InputRequest::Move {
            dx: 0.0,
            dy: 1.0,
            dz: -1.0,
        }
    }

    pub fn left() -> Self {
        InputRequest::Move {
            dx: -1.0,
            dy: 1.0,
            dz: 0.0,
        }
    }

    pub fn right() -> Self {
        InputRequest::Move {
            dx: 1.0,
            dy: 1.0,
            dz: 0.0,
        }
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Requests queued since the last tick, oldest first
    pub requests: Vec<InputRequest>,
}

impl TickInput {
    pub fn with(request: InputRequest) -> Self {
        Self {
            requests: vec![request],
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, tuning: &Tuning, dt: f32) {
    state.input_cooldown = (state.input_cooldown - dt).max(0.0);

    match state.phase {
        GamePhase::Idle | GamePhase::Loading { .. } | GamePhase::Ended { .. } => return,
        GamePhase::Transitioning {
            kind,
            ticks_remaining,
        } => {
            // Lanes keep flowing behind the banner; nothing else happens
            if let Some(world) = state.world.as_mut() {
                advance_obstacles(&mut world.obstacles, &StreamRecycler::from_tuning(tuning), dt);
            }
            count_down_transition(state, kind, ticks_remaining);
            return;
        }
        GamePhase::Playing => {}
    }

    if state.world.is_none() {
        log::warn!("Playing without a constructed level; skipping tick");
        return;
    }

    state.time_ticks += 1;

    apply_input(state, input, tuning);

    let Some(world) = state.world.as_mut() else {
        return;
    };

    advance_obstacles(&mut world.obstacles, &StreamRecycler::from_tuning(tuning), dt);

    let classifier = CollisionClassifier::from_tuning(tuning);
    let outcome = classifier.classify(
        &mut state.player.position,
        &mut state.player.ride,
        &world.obstacles,
        &world.zones,
        &world.dangerous,
    );

    state.zone = outcome.zone;
    state.danger = outcome.danger;

    if let Some(obstacle) = outcome.attached {
        state.emit(GameEvent::Landed { obstacle });
    }

    if let Some(cause) = outcome.failure {
        fail_attempt(state, cause);
        return;
    }

    if outcome.zone == Zone::Goal {
        rescue_frog(state, tuning, dt);
    }
}

/// Integrate every obstacle, then recycle. Malformed obstacles are left
/// untouched for this tick.
fn advance_obstacles(obstacles: &mut [ObstacleEntity], recycler: &StreamRecycler, dt: f32) {
    let mut skipped = 0;
    for obstacle in obstacles.iter_mut() {
        if obstacle.is_well_formed() {
            obstacle.integrate(dt);
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        log::warn!("Skipped {} malformed obstacles this tick", skipped);
    }
    recycler.recycle_all(obstacles);
}

fn count_down_transition(state: &mut GameState, kind: TransitionKind, ticks_remaining: u32) {
    let remaining = ticks_remaining.saturating_sub(1);
    if remaining == 0 && kind == TransitionKind::Victory {
        state.phase = GamePhase::Ended {
            outcome: Outcome::Victory,
        };
        state.emit(GameEvent::Victory);
        log::info!("All levels cleared - victory!");
        return;
    }
    // LevelComplete at zero waits for the controller to load the next level
    state.phase = GamePhase::Transitioning {
        kind,
        ticks_remaining: remaining,
    };
}

/// Apply at most one request per cooldown window
fn apply_input(state: &mut GameState, input: &TickInput, tuning: &Tuning) {
    if state.input_cooldown > 0.0 {
        return;
    }
    let Some(request) = input.requests.first().copied() else {
        return;
    };
    state.input_cooldown = tuning.input_cooldown_secs();

    match request {
        InputRequest::Move { dx, dz, .. } => {
            hop(state, tuning, step(dx, tuning.hop_distance), step(dz, tuning.hop_distance));
            state.emit(GameEvent::Hop);
        }
        InputRequest::Dash { dx, dz } => {
            let distance = tuning.hop_distance * tuning.dash_hops.max(1) as f32;
            hop(state, tuning, step(dx, distance), step(dz, distance));
            state.emit(GameEvent::Dash);
        }
        InputRequest::Ability(Ability::Tongue) => state.emit(GameEvent::Tongue),
        InputRequest::Ability(Ability::Croak) => state.emit(GameEvent::Croak),
    }
}

#[inline]
fn step(component: f32, distance: f32) -> f32 {
    if component > 0.0 {
        distance
    } else if component < 0.0 {
        -distance
    } else {
        0.0
    }
}

fn hop(state: &mut GameState, tuning: &Tuning, dx: f32, dz: f32) {
    let Some(world) = state.world.as_ref() else {
        return;
    };
    let (_, depth_max) = world.zones.depth_range();
    let min_z = world.start.z;
    let half = tuning.visible_half_width();
    let player = &mut state.player;

    if dx != 0.0 {
        if player.ride.is_riding() {
            // Hopping along a platform moves relative to it
            player.ride.shift(dx);
            player.position.x += dx;
        } else {
            player.position.x = (player.position.x + dx).clamp(-half, half);
        }
    }

    if dz != 0.0 {
        let top = depth_max - tuning.hop_distance / 2.0;
        player.position.z = (player.position.z + dz).clamp(min_z, top.max(min_z));
    }

    // Forward progress pays once per row
    if player.position.z > player.furthest_z + 1e-3 {
        let rows = ((player.position.z - player.furthest_z) / tuning.hop_distance).round() as u64;
        player.furthest_z = player.position.z;
        state.progress.score += rows.max(1) * tuning.hop_score;
    }
}

/// Failure path: lose a life, then respawn or end the run
fn fail_attempt(state: &mut GameState, cause: FailureCause) {
    state.player.ride.detach();
    state.progress.lives = state.progress.lives.saturating_sub(1);
    let lives_left = state.progress.lives;
    state.emit(GameEvent::Failed { cause, lives_left });
    log::info!("Attempt failed ({:?}), {} lives left", cause, lives_left);

    if lives_left == 0 {
        state.phase = GamePhase::Ended {
            outcome: Outcome::GameOver,
        };
        state.emit(GameEvent::GameOver);
        log::info!("Game over at level {}", state.progress.current_level);
    } else {
        state.respawn_player();
    }
}

fn rescue_frog(state: &mut GameState, tuning: &Tuning, dt: f32) {
    state.progress.frogs_rescued += 1;
    state.progress.frogs_saved += 1;
    state.progress.score += tuning.rescue_score;
    state.emit(GameEvent::Rescued {
        rescued: state.progress.frogs_rescued,
        needed: state.progress.frogs_needed,
    });

    if state.progress.rescue_target_met() {
        let level = state.progress.current_level;
        state.progress.score += tuning.level_bonus * level as u64;
        let is_final = state.world.as_ref().is_some_and(|w| w.is_final);
        let kind = if is_final {
            TransitionKind::Victory
        } else {
            TransitionKind::LevelComplete
        };
        state.phase = GamePhase::Transitioning {
            kind,
            ticks_remaining: tuning.transition_ticks(dt),
        };
        state.emit(GameEvent::LevelComplete { level });
        log::info!("Level {} complete ({:?})", level, kind);
    }

    state.respawn_player();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::level::LevelTable;
    use crate::sim::collision::DangerLevel;
    use crate::sim::entity::{ObstacleEntity, ObstacleKind};
    use crate::sim::transition::LevelTransitionController;
    use crate::sim::state::LoadReason;
    use glam::Vec3;

    /// A loaded level-1 game with every obstacle removed
    fn empty_level() -> (GameState, Tuning) {
        let tuning = Tuning::default();
        let controller = LevelTransitionController::new(LevelTable::builtin(), tuning.clone());
        let mut state = GameState::new(12345, tuning.starting_lives);
        controller.load_now(&mut state, 1, LoadReason::Start).unwrap();
        state.world.as_mut().unwrap().obstacles.clear();
        (state, tuning)
    }

    fn push(state: &mut GameState, obstacle: ObstacleEntity) {
        state.world.as_mut().unwrap().obstacles.push(obstacle);
    }

    fn idle_ticks(state: &mut GameState, tuning: &Tuning, n: usize) {
        for _ in 0..n {
            tick(state, &TickInput::default(), tuning, SIM_DT);
        }
    }

    #[test]
    fn test_idle_and_loading_do_not_tick() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1, 3);
        tick(&mut state, &TickInput::with(InputRequest::forward()), &tuning, SIM_DT);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.player.position, Vec3::ZERO);
    }

    #[test]
    fn test_forward_hop_scores_once_per_row() {
        let (mut state, tuning) = empty_level();
        tick(&mut state, &TickInput::with(InputRequest::forward()), &tuning, SIM_DT);
        assert_eq!(state.player.position.z, 2.0);
        assert_eq!(state.progress.score, tuning.hop_score);

        idle_ticks(&mut state, &tuning, 10);
        tick(&mut state, &TickInput::with(InputRequest::back()), &tuning, SIM_DT);
        idle_ticks(&mut state, &tuning, 10);
        tick(&mut state, &TickInput::with(InputRequest::forward()), &tuning, SIM_DT);
        // Re-covering the same row is free
        assert_eq!(state.progress.score, tuning.hop_score);
    }

    #[test]
    fn test_input_cooldown_drops_rapid_requests() {
        let (mut state, tuning) = empty_level();
        tick(&mut state, &TickInput::with(InputRequest::forward()), &tuning, SIM_DT);
        // Second gesture within 150ms (same gesture from another device)
        tick(&mut state, &TickInput::with(InputRequest::forward()), &tuning, SIM_DT);
        assert_eq!(state.player.position.z, 2.0);

        idle_ticks(&mut state, &tuning, 9);
        tick(&mut state, &TickInput::with(InputRequest::forward()), &tuning, SIM_DT);
        assert_eq!(state.player.position.z, 4.0);
    }

    #[test]
    fn test_cannot_hop_behind_start_or_off_screen() {
        let (mut state, tuning) = empty_level();
        tick(&mut state, &TickInput::with(InputRequest::back()), &tuning, SIM_DT);
        assert_eq!(state.player.position.z, 0.0);

        for _ in 0..12 {
            idle_ticks(&mut state, &tuning, 10);
            tick(&mut state, &TickInput::with(InputRequest::left()), &tuning, SIM_DT);
        }
        assert_eq!(state.player.position.x, -tuning.visible_half_width());
    }

    #[test]
    fn test_abilities_emit_events() {
        let (mut state, tuning) = empty_level();
        state.drain_events();
        tick(&mut state, &TickInput::with(InputRequest::Ability(Ability::Croak)), &tuning, SIM_DT);
        assert_eq!(state.drain_events(), vec![GameEvent::Croak]);
    }

    #[test]
    fn test_road_hit_costs_a_life_and_respawns() {
        let (mut state, tuning) = empty_level();
        state.player.position = Vec3::new(0.0, 0.0, 4.0);
        push(
            &mut state,
            ObstacleEntity::new(
                900,
                1,
                ObstacleKind::Truck,
                false,
                Vec3::new(0.5, 0.9, 4.0),
                Vec3::new(3.0, 0.0, 0.0),
            ),
        );

        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);

        assert_eq!(state.progress.lives, tuning.starting_lives - 1);
        assert_eq!(state.player.position, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::Failed {
                cause: FailureCause::Hit { obstacle: 900, .. },
                ..
            }
        )));
    }

    #[test]
    fn test_water_ride_then_swept_away() {
        let (mut state, tuning) = empty_level();
        state.player.position = Vec3::new(0.0, 0.0, 14.0);
        // Rideable platform 2.5 away, drifting away slowly
        push(
            &mut state,
            ObstacleEntity::new(
                500,
                5,
                ObstacleKind::Log,
                true,
                Vec3::new(2.5, 0.1, 14.0),
                Vec3::new(1.0, 0.0, 0.0),
            ),
        );

        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);
        assert_eq!(state.player.ride.riding(), Some(500));
        assert_eq!(state.danger, DangerLevel::Safe);

        // Carried along at a fixed offset
        idle_ticks(&mut state, &tuning, 30);
        let log_x = state.obstacles()[0].position.x;
        let offset = state.player.ride.offset().unwrap();
        assert!((state.player.position.x - log_x - offset).abs() < 1e-4);

        // The platform sinks away out of reach
        state.world.as_mut().unwrap().obstacles[0].position.x += 20.0;
        let lives = state.progress.lives;
        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);
        // Riding carries the frog beyond the screen edge
        assert_eq!(state.progress.lives, lives - 1);
        assert!(!state.player.ride.is_riding());
    }

    #[test]
    fn test_hopping_off_a_platform_drowns() {
        let (mut state, tuning) = empty_level();
        state.player.position = Vec3::new(0.0, 0.0, 14.0);
        push(
            &mut state,
            ObstacleEntity::new(
                500,
                5,
                ObstacleKind::Log,
                true,
                Vec3::new(2.5, 0.1, 14.0),
                Vec3::new(1.0, 0.0, 0.0),
            ),
        );

        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);
        assert_eq!(state.player.ride.riding(), Some(500));
        assert_eq!(state.danger, DangerLevel::Safe);

        // A hop away from the log puts it out of contact with nothing to replace it
        let lives = state.progress.lives;
        state.drain_events();
        tick(&mut state, &TickInput::with(InputRequest::left()), &tuning, SIM_DT);

        assert_eq!(state.progress.lives, lives - 1);
        assert!(!state.player.ride.is_riding());
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::Failed {
                cause: FailureCause::Drowned,
                ..
            }
        )));
    }

    #[test]
    fn test_platform_nearby_does_not_keep_frog_afloat() {
        let (mut state, tuning) = empty_level();
        state.player.position = Vec3::new(0.0, 0.0, 14.0);
        push(
            &mut state,
            ObstacleEntity::new(
                501,
                5,
                ObstacleKind::Log,
                true,
                Vec3::new(4.0, 0.1, 14.0),
                Vec3::ZERO,
            ),
        );

        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);

        assert_eq!(state.progress.lives, tuning.starting_lives - 1);
        assert_eq!(state.danger, DangerLevel::Caution);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::Failed {
                cause: FailureCause::Drowned,
                ..
            }
        )));
    }

    #[test]
    fn test_open_water_drowns() {
        let (mut state, tuning) = empty_level();
        state.player.position = Vec3::new(0.0, 0.0, 14.0);
        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);
        assert_eq!(state.progress.lives, tuning.starting_lives - 1);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::Failed {
                cause: FailureCause::Drowned,
                ..
            }
        )));
    }

    #[test]
    fn test_last_life_ends_the_run_and_freezes_counters() {
        let (mut state, tuning) = empty_level();
        state.progress.lives = 1;
        state.player.position = Vec3::new(0.0, 0.0, 14.0);
        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);

        assert_eq!(
            state.phase,
            GamePhase::Ended {
                outcome: Outcome::GameOver
            }
        );
        assert_eq!(state.progress.lives, 0);

        let score = state.progress.score;
        let ticks = state.time_ticks;
        for _ in 0..120 {
            tick(&mut state, &TickInput::with(InputRequest::forward()), &tuning, SIM_DT);
        }
        assert_eq!(state.progress.lives, 0);
        assert_eq!(state.progress.score, score);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_goal_rescues_and_completes_level() {
        let (mut state, tuning) = empty_level();
        let needed = state.progress.frogs_needed;

        for i in 1..=needed {
            state.player.position = Vec3::new(0.0, 0.0, 22.0);
            state.player.furthest_z = 22.0;
            state.input_cooldown = 0.0;
            state.world.as_mut().unwrap().obstacles.clear();
            // Platform under the frog in the last water lane
            push(
                &mut state,
                ObstacleEntity::new(
                    1,
                    9,
                    ObstacleKind::Log,
                    true,
                    Vec3::new(0.0, 0.1, 22.0),
                    Vec3::ZERO,
                ),
            );
            tick(&mut state, &TickInput::with(InputRequest::forward()), &tuning, SIM_DT);
            assert_eq!(state.progress.frogs_rescued, i);
            assert_eq!(state.progress.frogs_saved, i);
            assert_eq!(state.player.position.z, 0.0, "respawned at start");
        }

        assert!(matches!(
            state.phase,
            GamePhase::Transitioning {
                kind: TransitionKind::LevelComplete,
                ..
            }
        ));

        // Banner counts down to zero and then waits for the controller
        idle_ticks(&mut state, &tuning, tuning.transition_ticks(SIM_DT) as usize + 5);
        assert_eq!(
            state.phase,
            GamePhase::Transitioning {
                kind: TransitionKind::LevelComplete,
                ticks_remaining: 0
            }
        );
    }

    #[test]
    fn test_final_level_transition_ends_in_victory() {
        let (mut state, tuning) = empty_level();
        state.world.as_mut().unwrap().is_final = true;
        state.progress.frogs_rescued = state.progress.frogs_needed - 1;
        state.player.position = Vec3::new(0.0, 0.0, 24.0);

        tick(&mut state, &TickInput::default(), &tuning, SIM_DT);
        assert!(matches!(
            state.phase,
            GamePhase::Transitioning {
                kind: TransitionKind::Victory,
                ..
            }
        ));

        idle_ticks(&mut state, &tuning, tuning.transition_ticks(SIM_DT) as usize);
        assert_eq!(
            state.phase,
            GamePhase::Ended {
                outcome: Outcome::Victory
            }
        );
        assert!(state.events.contains(&GameEvent::Victory));
    }

    #[test]
    fn test_malformed_obstacle_is_skipped_not_fatal() {
        let (mut state, tuning) = empty_level();
        push(
            &mut state,
            ObstacleEntity::new(
                7,
                0,
                ObstacleKind::Sedan,
                false,
                Vec3::new(f32::NAN, 0.0, 2.0),
                Vec3::new(1.0, 0.0, 0.0),
            ),
        );
        idle_ticks(&mut state, &tuning, 3);
        assert_eq!(state.time_ticks, 3);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_determinism() {
        let tuning = Tuning::default();
        let controller = LevelTransitionController::new(LevelTable::builtin(), tuning.clone());
        let mut state1 = GameState::new(99999, 3);
        let mut state2 = GameState::new(99999, 3);
        controller.load_now(&mut state1, 2, LoadReason::Start).unwrap();
        controller.load_now(&mut state2, 2, LoadReason::Start).unwrap();

        let inputs = [
            TickInput::with(InputRequest::forward()),
            TickInput::default(),
            TickInput::with(InputRequest::right()),
            TickInput::default(),
        ];

        for _ in 0..50 {
            for input in &inputs {
                tick(&mut state1, input, &tuning, SIM_DT);
                tick(&mut state2, input, &tuning, SIM_DT);
            }
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.progress, state2.progress);
        assert_eq!(state1.player.position, state2.player.position);
        for (a, b) in state1.obstacles().iter().zip(state2.obstacles()) {
            assert_eq!(a.position, b.position);
        }
    }
}
