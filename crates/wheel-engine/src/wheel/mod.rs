pub mod resolve;
pub mod scene;
pub mod spin;

pub use resolve::{ResolutionState, TickEvaluator};
pub use scene::WheelScene;
pub use spin::{SpinDriver, SpinSchedule};
