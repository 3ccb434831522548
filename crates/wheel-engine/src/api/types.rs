use bytemuck::{Pod, Zeroable};

/// Unique identifier for a body in the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u32);

/// First id handed to pegs; peg `i` gets `PEG_ID_BASE + i`.
const PEG_ID_BASE: u32 = 1000;

/// What a body is for within the wheel assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyRole {
    Base,
    Wheel,
    Needle,
    NeedleAnchor,
    LeftStop,
    RightStop,
    Peg(u32),
}

impl BodyRole {
    pub fn id(self) -> EntityId {
        EntityId(match self {
            BodyRole::Base => 1,
            BodyRole::Wheel => 2,
            BodyRole::Needle => 3,
            BodyRole::NeedleAnchor => 4,
            BodyRole::LeftStop => 5,
            BodyRole::RightStop => 6,
            BodyRole::Peg(index) => PEG_ID_BASE + index,
        })
    }

    pub fn from_id(id: EntityId) -> Option<Self> {
        match id.0 {
            1 => Some(BodyRole::Base),
            2 => Some(BodyRole::Wheel),
            3 => Some(BodyRole::Needle),
            4 => Some(BodyRole::NeedleAnchor),
            5 => Some(BodyRole::LeftStop),
            6 => Some(BodyRole::RightStop),
            n if n >= PEG_ID_BASE => Some(BodyRole::Peg(n - PEG_ID_BASE)),
            _ => None,
        }
    }
}

/// Result of one tick of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickOutcome {
    #[default]
    Pending,
    /// Index of the peg under the needle, in `[0, peg_count)`.
    Winner(u32),
}

impl TickOutcome {
    pub fn winner(self) -> Option<u32> {
        match self {
            TickOutcome::Pending => None,
            TickOutcome::Winner(index) => Some(index),
        }
    }

    /// Wire encoding for the web bridge: the peg index, or -1 while pending.
    pub fn to_code(self) -> i32 {
        match self {
            TickOutcome::Pending => -1,
            TickOutcome::Winner(index) => index as i32,
        }
    }
}

/// Pose of one body, laid out for flat f32 buffers read by a renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BodyTransform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

impl BodyTransform {
    pub const FLOATS: usize = 3;
}
