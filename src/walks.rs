mod ctrw;
mod simulator;

pub use ctrw::{classify_crossing, subordinate, waiting_times, BoundaryCrossing};
pub use simulator::{WalkConfig, WalkError, WalkMode, WalkSimulator};
