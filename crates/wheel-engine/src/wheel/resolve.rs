//! Per-step settle and resolve logic.
//!
//! The decision itself is the pure [`evaluate`]; [`TickEvaluator`] feeds it
//! observations read from the world and applies the side effects it asks for.

use std::f64::consts::TAU;

use log::{debug, info};

use crate::api::types::TickOutcome;
use crate::core::physics::PhysicsWorld;
use crate::wheel::scene::WheelScene;

/// Where a round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionState {
    /// Built, spin not triggered yet.
    #[default]
    Idle,
    Spinning,
    /// The wheel has slept at least once; waiting for the needle to drop.
    Settling,
    /// Terminal.
    Resolved(u32),
}

impl ResolutionState {
    pub fn outcome(self) -> TickOutcome {
        match self {
            ResolutionState::Resolved(index) => TickOutcome::Winner(index),
            _ => TickOutcome::Pending,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, ResolutionState::Resolved(_))
    }
}

/// Restoring impulse pulling the needle back toward vertical.
/// Magnitudes at or below `deadband` are flushed to zero.
pub fn needle_restoring_impulse(needle_rotation: f32, stiffness: f32, deadband: f32) -> f32 {
    let impulse = -needle_rotation * stiffness;
    if impulse.abs() <= deadband {
        0.0
    } else {
        impulse
    }
}

/// Map any rotation into `[0, 2π)`.
pub fn normalize_rotation(rotation: f64) -> f64 {
    let r = rotation.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly 2π
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Index of the peg slot under the needle for a wheel rotation.
pub fn winning_peg(wheel_rotation: f64, peg_count: u32) -> u32 {
    let count = peg_count.max(1);
    let spacing = TAU / count as f64;
    let slot = (normalize_rotation(wheel_rotation) / spacing).floor();
    // `as` saturates, and a non-finite rotation lands on slot 0
    (slot as u32).min(count - 1)
}

/// Everything [`evaluate`] looks at for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelObservation {
    pub spun: bool,
    /// Every spin phase has been applied.
    pub spin_finished: bool,
    pub wheel_sleeping: bool,
    pub wheel_angvel: f32,
    pub wheel_rotation: f32,
    /// `None` when the needle body is gone.
    pub needle_rotation: Option<f32>,
}

/// Result of [`evaluate`]: the next state and whether to nudge the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: ResolutionState,
    pub nudge: bool,
}

impl Decision {
    fn hold(state: ResolutionState) -> Self {
        Self { state, nudge: false }
    }
}

/// Advance the resolution state machine by one observation.
pub fn evaluate(state: ResolutionState, obs: &WheelObservation, peg_count: u32) -> Decision {
    match state {
        ResolutionState::Resolved(_) => Decision::hold(state),
        _ if !obs.spun => Decision::hold(ResolutionState::Idle),
        ResolutionState::Idle | ResolutionState::Spinning if !obs.wheel_sleeping => {
            Decision::hold(ResolutionState::Spinning)
        }
        _ => settle(obs, peg_count),
    }
}

fn settle(obs: &WheelObservation, peg_count: u32) -> Decision {
    let Some(needle) = obs.needle_rotation else {
        return Decision::hold(ResolutionState::Settling);
    };
    if needle <= 0.0 && (obs.wheel_sleeping || obs.wheel_angvel > 0.0) {
        let winner = winning_peg(obs.wheel_rotation as f64, peg_count);
        return Decision::hold(ResolutionState::Resolved(winner));
    }
    Decision {
        state: ResolutionState::Settling,
        nudge: obs.wheel_sleeping && needle > 0.0 && obs.spin_finished,
    }
}

/// Tunables the evaluator needs from the round's configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluatorParams {
    pub needle_stiffness: f32,
    pub needle_deadband: f32,
    pub nudge_ratio: f32,
}

/// Spin progress as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpinProgress {
    pub spun: bool,
    pub finished: bool,
}

/// Runs once after every physics step.
#[derive(Debug, Clone)]
pub struct TickEvaluator {
    params: EvaluatorParams,
    state: ResolutionState,
    nudge_active: bool,
    nudges: u32,
}

impl TickEvaluator {
    pub fn new(params: EvaluatorParams) -> Self {
        Self {
            params,
            state: ResolutionState::Idle,
            nudge_active: false,
            nudges: 0,
        }
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    pub fn outcome(&self) -> TickOutcome {
        self.state.outcome()
    }

    /// Nudges applied so far this round.
    pub fn nudges(&self) -> u32 {
        self.nudges
    }

    pub fn tick(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &WheelScene,
        progress: SpinProgress,
    ) -> TickOutcome {
        let needle_rotation = world.body_transform(&scene.needle).map(|(_, rot)| rot);
        if let Some(rotation) = needle_rotation {
            let impulse = needle_restoring_impulse(
                rotation,
                self.params.needle_stiffness,
                self.params.needle_deadband,
            );
            if impulse != 0.0 {
                world.apply_torque_impulse(&scene.needle, impulse);
            }
        }

        // A nudge lasts a single step.
        if self.nudge_active {
            world.reset_torques(&scene.wheel);
            self.nudge_active = false;
        }

        let obs = WheelObservation {
            spun: progress.spun,
            spin_finished: progress.finished,
            wheel_sleeping: world.is_sleeping(&scene.wheel),
            wheel_angvel: world.angular_velocity(&scene.wheel),
            wheel_rotation: world.rotation(&scene.wheel),
            needle_rotation,
        };
        let decision = evaluate(self.state, &obs, scene.peg_count());

        if decision.nudge {
            let torque = -scene.arm_strength() * self.params.nudge_ratio;
            world.reset_torques(&scene.wheel);
            world.add_torque(&scene.wheel, torque);
            self.nudge_active = true;
            self.nudges += 1;
            debug!("wheel stuck with needle at {:?}, nudging by {:.4}", obs.needle_rotation, torque);
        }

        if decision.state != self.state {
            match decision.state {
                ResolutionState::Resolved(index) => {
                    info!("round resolved: peg {} (rotation {:.4})", index, obs.wheel_rotation)
                }
                next => debug!("resolution {:?} -> {:?}", self.state, next),
            }
            self.state = decision.state;
        }
        self.state.outcome()
    }
}
