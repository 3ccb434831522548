pub mod api;
pub mod core;
pub mod error;
pub mod renderer;
pub mod wheel;

// Re-export key types at crate root for convenience
pub use api::config::{StrengthRange, WheelConfig};
pub use api::session::WheelSession;
pub use api::types::{BodyRole, BodyTransform, EntityId, TickOutcome};
pub use core::physics::{
    BodyDesc, BodyType, ColliderDesc, ColliderMaterial, CollisionGroups, CollisionPair,
    JointDesc, JointMotor, PhysicsBody, PhysicsError, PhysicsWorld,
};
pub use core::rng::RoundRng;
pub use core::time::{FixedTimestep, SimClock};
pub use error::WheelError;
pub use renderer::debug::DebugRenderer;
pub use renderer::snapshot::WheelSnapshot;
pub use wheel::resolve::{
    evaluate, needle_restoring_impulse, normalize_rotation, winning_peg, Decision,
    ResolutionState, TickEvaluator, WheelObservation,
};
pub use wheel::scene::WheelScene;
pub use wheel::spin::{SpinDriver, SpinPhase, SpinSchedule};
