use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::error::WheelError;

/// Inclusive range the lever's arm strength is drawn from, in N·m.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthRange {
    pub min: f32,
    pub max: f32,
}

impl StrengthRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// A range that always yields `value`.
    pub fn exactly(value: f32) -> Self {
        Self { min: value, max: value }
    }
}

/// Everything needed to build and run one wheel round.
///
/// Lengths are in metres, angles in radians, times in seconds. Every field
/// has a default, so a JSON document only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// Number of pegs on the rim (and therefore possible outcomes).
    pub peg_count: u32,
    pub peg_radius: f32,
    pub wheel_radius: f32,
    pub wheel_density: f32,
    /// Radius of the inert hub the wheel pivots on.
    pub base_radius: f32,
    /// Height of the needle pivot above the rim.
    pub needle_offset: f32,
    /// Needle deflection at build time; positive leans it to one side.
    pub needle_initial_rotation: f32,
    /// Needle outline relative to its pivot. Must enclose some area.
    pub needle_outline: Vec<[f32; 2]>,
    pub needle_density: f32,
    pub needle_friction: f32,
    /// Horizontal distance of each stop from the needle pivot.
    pub stop_offset_x: f32,
    pub stop_half_extent: f32,
    /// How far the stops sit above the needle pivot.
    pub stop_lift: f32,
    pub arm_strength: StrengthRange,
    /// Fraction of the arm strength used for the weak lever phases.
    pub weak_pull_ratio: f32,
    /// Restoring impulse per radian of needle deflection.
    pub needle_stiffness: f32,
    /// Restoring impulses at or below this magnitude are dropped.
    pub needle_deadband: f32,
    /// Fraction of the arm strength used to nudge a wheel stuck between pegs.
    pub nudge_ratio: f32,
    pub gravity: [f32; 2],
    /// Physics step in seconds.
    pub fixed_dt: f32,
    /// Cap on physics steps per host frame.
    pub max_steps_per_frame: u32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            peg_count: 45,
            peg_radius: 0.03,
            wheel_radius: 1.5,
            wheel_density: 1.0,
            base_radius: 0.2,
            needle_offset: 0.19,
            needle_initial_rotation: 0.3,
            needle_outline: vec![
                [0.0, 0.15],
                [0.06, 0.0],
                [0.001, -0.4],
                [-0.001, -0.4],
                [-0.06, 0.0],
            ],
            needle_density: 5.0,
            needle_friction: 0.1,
            stop_offset_x: 0.35,
            stop_half_extent: 0.1,
            stop_lift: 0.01,
            arm_strength: StrengthRange::new(7.0, 17.0),
            weak_pull_ratio: 0.6,
            needle_stiffness: 0.001,
            needle_deadband: 1e-4,
            nudge_ratio: 0.01,
            gravity: [0.0, -9.81],
            fixed_dt: 1.0 / 120.0,
            max_steps_per_frame: 10,
        }
    }
}

impl WheelConfig {
    /// Default configuration with a different peg count.
    pub fn with_pegs(peg_count: u32) -> Self {
        Self {
            peg_count,
            ..Self::default()
        }
    }

    /// Parse a configuration from a JSON string and validate it.
    pub fn from_json(json: &str) -> Result<Self, WheelError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String, WheelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check every field. Called before any physics resource is allocated.
    pub fn validate(&self) -> Result<(), WheelError> {
        if self.peg_count < 1 {
            return Err(WheelError::invalid("peg_count must be at least 1"));
        }

        positive("peg_radius", self.peg_radius)?;
        positive("wheel_radius", self.wheel_radius)?;
        positive("wheel_density", self.wheel_density)?;
        positive("base_radius", self.base_radius)?;
        positive("needle_density", self.needle_density)?;
        positive("stop_half_extent", self.stop_half_extent)?;
        positive("fixed_dt", self.fixed_dt)?;
        if self.peg_radius >= self.wheel_radius {
            return Err(WheelError::invalid(format!(
                "peg_radius {} must be smaller than wheel_radius {}",
                self.peg_radius, self.wheel_radius
            )));
        }

        non_negative("needle_friction", self.needle_friction)?;
        non_negative("weak_pull_ratio", self.weak_pull_ratio)?;
        non_negative("needle_stiffness", self.needle_stiffness)?;
        non_negative("needle_deadband", self.needle_deadband)?;
        non_negative("nudge_ratio", self.nudge_ratio)?;
        non_negative("arm_strength.min", self.arm_strength.min)?;
        non_negative("arm_strength.max", self.arm_strength.max)?;
        if self.arm_strength.min > self.arm_strength.max {
            return Err(WheelError::invalid(format!(
                "arm_strength.min {} exceeds arm_strength.max {}",
                self.arm_strength.min, self.arm_strength.max
            )));
        }

        finite("needle_offset", self.needle_offset)?;
        finite("needle_initial_rotation", self.needle_initial_rotation)?;
        finite("stop_offset_x", self.stop_offset_x)?;
        finite("stop_lift", self.stop_lift)?;
        finite("gravity.x", self.gravity[0])?;
        finite("gravity.y", self.gravity[1])?;

        if self.needle_outline.len() < 3 {
            return Err(WheelError::invalid(format!(
                "needle_outline needs at least 3 points, got {}",
                self.needle_outline.len()
            )));
        }
        if self.needle_outline.iter().flatten().any(|c| !c.is_finite()) {
            return Err(WheelError::invalid("needle_outline contains a non-finite coordinate"));
        }

        if self.max_steps_per_frame < 1 {
            return Err(WheelError::invalid("max_steps_per_frame must be at least 1"));
        }
        Ok(())
    }

    /// Angle between neighbouring pegs.
    pub fn peg_spacing(&self) -> f32 {
        TAU / self.peg_count as f32
    }

    /// Distance from the hub to each peg centre.
    pub fn peg_offset(&self) -> f32 {
        self.wheel_radius - self.peg_radius
    }

    /// World position of the needle pivot.
    pub fn needle_anchor(&self) -> Vec2 {
        Vec2::new(0.0, self.wheel_radius + self.needle_offset)
    }

    pub fn needle_vertices(&self) -> Vec<Vec2> {
        self.needle_outline.iter().map(|&[x, y]| Vec2::new(x, y)).collect()
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::from(self.gravity)
    }
}

fn finite(name: &str, value: f32) -> Result<(), WheelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(WheelError::invalid(format!("{} must be finite, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f32) -> Result<(), WheelError> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(WheelError::invalid(format!("{} must not be negative, got {}", name, value)));
    }
    Ok(())
}

fn positive(name: &str, value: f32) -> Result<(), WheelError> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(WheelError::invalid(format!("{} must be positive, got {}", name, value)));
    }
    Ok(())
}
