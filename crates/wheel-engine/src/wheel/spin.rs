//! Lever-pull torque schedule, consumed one physics step at a time.

use log::{debug, info};

use crate::core::physics::{PhysicsBody, PhysicsWorld};
use crate::core::time::SimClock;

/// The lever turns the wheel clockwise.
const LEVER_DIRECTION: f32 = -1.0;

/// Phase start times of a lever pull, in seconds after the spin.
const LEVER_PHASE_TIMES: [f32; 4] = [0.0, 0.4, 0.8, 1.2];

/// Tolerance on phase times, absorbing f32 step accumulation.
const PHASE_EPSILON: f64 = 1e-6;

/// One torque change at a point in simulated time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinPhase {
    /// Seconds after the spin was triggered.
    pub at: f32,
    /// Torque held from this phase until the next. Zero releases the wheel.
    pub torque: f32,
}

/// Ordered torque phases; the last one always releases the wheel.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinSchedule {
    phases: Vec<SpinPhase>,
}

impl SpinSchedule {
    /// A hand pull: weak, full, weak, release.
    pub fn lever_pull(arm_strength: f32, weak_ratio: f32) -> Self {
        let full = LEVER_DIRECTION * arm_strength;
        let weak = full * weak_ratio;
        let torques = [weak, full, weak, 0.0];
        let phases = LEVER_PHASE_TIMES
            .iter()
            .zip(torques)
            .map(|(&at, torque)| SpinPhase { at, torque })
            .collect();
        Self { phases }
    }

    pub fn phases(&self) -> &[SpinPhase] {
        &self.phases
    }

    /// Time of the final phase.
    pub fn duration(&self) -> f32 {
        self.phases.last().map(|p| p.at).unwrap_or(0.0)
    }
}

/// Feeds a [`SpinSchedule`] into the wheel body as simulated time passes.
///
/// A driver fires at most once; later `spin` calls are ignored.
#[derive(Debug, Clone)]
pub struct SpinDriver {
    schedule: SpinSchedule,
    clock: SimClock,
    next: usize,
    spun: bool,
}

impl SpinDriver {
    pub fn new(schedule: SpinSchedule) -> Self {
        Self {
            schedule,
            clock: SimClock::new(),
            next: 0,
            spun: false,
        }
    }

    /// Arm the schedule. Returns `false` if the wheel was already spun.
    pub fn spin(&mut self) -> bool {
        if self.spun {
            return false;
        }
        self.spun = true;
        self.clock.reset();
        info!(
            "spin triggered: {} phases over {:.1}s",
            self.schedule.phases().len(),
            self.schedule.duration()
        );
        true
    }

    /// Apply every phase whose time has come. Call before stepping the world.
    /// Returns how many phases fired.
    pub fn apply_due(&mut self, world: &mut PhysicsWorld, wheel: &PhysicsBody) -> usize {
        if !self.spun {
            return 0;
        }
        let now = self.clock.elapsed();
        let mut fired = 0;
        while let Some(phase) = self.schedule.phases.get(self.next) {
            if phase.at as f64 > now + PHASE_EPSILON {
                break;
            }
            world.reset_torques(wheel);
            if phase.torque != 0.0 {
                world.add_torque(wheel, phase.torque);
            }
            debug!("spin phase {} at {:.3}s: torque {:.3}", self.next, now, phase.torque);
            self.next += 1;
            fired += 1;
        }
        fired
    }

    /// Advance the schedule clock by one completed step.
    pub fn advance(&mut self, dt: f32) {
        if self.spun {
            self.clock.advance(dt);
        }
    }

    /// Drop any phases not yet applied and release the wheel.
    pub fn cancel(&mut self, world: &mut PhysicsWorld, wheel: &PhysicsBody) {
        if self.spun && !self.is_finished() {
            debug!(
                "spin cancelled with {} phases pending",
                self.schedule.phases.len() - self.next
            );
        }
        self.next = self.schedule.phases.len();
        world.reset_torques(wheel);
    }

    pub fn has_spun(&self) -> bool {
        self.spun
    }

    /// The wheel was spun and every phase has been applied (or cancelled).
    pub fn is_finished(&self) -> bool {
        self.spun && self.next >= self.schedule.phases.len()
    }

    pub fn applied_phases(&self) -> usize {
        self.next
    }

    /// Seconds since the spin was triggered.
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    pub fn schedule(&self) -> &SpinSchedule {
        &self.schedule
    }
}
