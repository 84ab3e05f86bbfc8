mod engine;

pub use engine::{TimerEngine, TimerState, INITIAL_DURATION_SECS};
