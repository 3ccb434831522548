use log::{debug, info};

use crate::api::config::{StrengthRange, WheelConfig};
use crate::api::types::TickOutcome;
use crate::core::physics::{CollisionPair, PhysicsWorld};
use crate::core::rng::RoundRng;
use crate::core::time::{FixedTimestep, SimClock};
use crate::error::WheelError;
use crate::renderer::snapshot::WheelSnapshot;
use crate::wheel::resolve::{EvaluatorParams, ResolutionState, SpinProgress, TickEvaluator};
use crate::wheel::scene::WheelScene;
use crate::wheel::spin::{SpinDriver, SpinSchedule};

/// One round of the prize wheel: world, scene, lever and resolver.
///
/// Hosts call [`advance`](Self::advance) once per frame with the frame time;
/// the session turns that into fixed physics steps.
pub struct WheelSession {
    config: WheelConfig,
    seed: u64,
    world: PhysicsWorld,
    scene: WheelScene,
    driver: SpinDriver,
    evaluator: TickEvaluator,
    timestep: FixedTimestep,
    clock: SimClock,
    steps: u64,
    running: bool,
    events: Vec<CollisionPair>,
    strikes: Vec<u32>,
}

impl WheelSession {
    /// Validate `config`, draw the arm strength from `seed`, and build the scene.
    pub fn build(config: WheelConfig, seed: u64) -> Result<Self, WheelError> {
        config.validate()?;

        let arm_strength = RoundRng::new(seed).arm_strength(config.arm_strength);
        let mut world = PhysicsWorld::new(config.gravity(), config.fixed_dt)?;
        let scene = WheelScene::build(&mut world, &config, arm_strength)?;
        let driver = SpinDriver::new(SpinSchedule::lever_pull(arm_strength, config.weak_pull_ratio));
        let evaluator = TickEvaluator::new(EvaluatorParams {
            needle_stiffness: config.needle_stiffness,
            needle_deadband: config.needle_deadband,
            nudge_ratio: config.nudge_ratio,
        });
        let timestep = FixedTimestep::new(config.fixed_dt, config.max_steps_per_frame);

        info!(
            "wheel session ready: {} pegs, seed {}, arm strength {:.2}",
            config.peg_count, seed, arm_strength
        );
        Ok(Self {
            config,
            seed,
            world,
            scene,
            driver,
            evaluator,
            timestep,
            clock: SimClock::new(),
            steps: 0,
            running: true,
            events: Vec::new(),
            strikes: Vec::new(),
        })
    }

    /// Default configuration with the given peg count and strength range.
    pub fn with_pegs(peg_count: u32, arm_strength: StrengthRange, seed: u64) -> Result<Self, WheelError> {
        Self::build(
            WheelConfig {
                peg_count,
                arm_strength,
                ..WheelConfig::default()
            },
            seed,
        )
    }

    /// Pull the lever. Returns `false` if already spun or shut down.
    pub fn spin(&mut self) -> bool {
        self.running && self.driver.spin()
    }

    /// Run exactly one physics step.
    pub fn step(&mut self) -> TickOutcome {
        self.strikes.clear();
        self.step_once()
    }

    /// Run as many fixed steps as `frame_dt` covers. Strikes reported by
    /// [`strikes`](Self::strikes) afterwards cover all of them.
    pub fn advance(&mut self, frame_dt: f32) -> TickOutcome {
        self.strikes.clear();
        if !self.running {
            return self.evaluator.outcome();
        }
        let steps = self.timestep.accumulate(frame_dt);
        for _ in 0..steps {
            self.step_once();
        }
        self.evaluator.outcome()
    }

    fn step_once(&mut self) -> TickOutcome {
        if !self.running {
            return self.evaluator.outcome();
        }

        self.driver.apply_due(&mut self.world, &self.scene.wheel);
        self.events.clear();
        self.world.step_into(&mut self.events);
        let dt = self.world.dt();
        self.driver.advance(dt);
        self.clock.advance(dt);
        self.steps += 1;

        let progress = SpinProgress {
            spun: self.driver.has_spun(),
            finished: self.driver.is_finished(),
        };
        let outcome = self.evaluator.tick(&mut self.world, &self.scene, progress);

        for pair in self.events.iter().filter(|pair| pair.started) {
            if let Some(peg) = self.scene.struck_peg(pair) {
                debug!("needle struck peg {}", peg);
                self.strikes.push(peg);
            }
        }
        outcome
    }

    /// Stop the round: pending lever phases are dropped, the wheel torque
    /// cleared, and further steps do nothing.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        self.driver.cancel(&mut self.world, &self.scene.wheel);
        self.running = false;
        info!(
            "wheel session shut down after {} steps ({:?})",
            self.steps,
            self.evaluator.state()
        );
    }

    pub fn outcome(&self) -> TickOutcome {
        self.evaluator.outcome()
    }

    pub fn state(&self) -> ResolutionState {
        self.evaluator.state()
    }

    /// Settling nudges applied so far.
    pub fn nudges(&self) -> u32 {
        self.evaluator.nudges()
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        WheelSnapshot::capture(&self.world, &self.scene)
    }

    /// Pegs the needle started touching during the last `step` or `advance`.
    pub fn strikes(&self) -> &[u32] {
        &self.strikes
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Physics steps run so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated seconds since the session was built.
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn arm_strength(&self) -> f32 {
        self.scene.arm_strength()
    }

    pub fn peg_count(&self) -> u32 {
        self.scene.peg_count()
    }

    /// Interpolation alpha between the last two steps, for smooth drawing.
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn scene(&self) -> &WheelScene {
        &self.scene
    }
}
