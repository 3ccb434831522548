pub mod debug;
pub mod snapshot;
