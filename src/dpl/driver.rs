//! Example viewer loop: poll frames, colour-map disparity, hand planes to a sink

pub mod run;
pub mod timing;

#[cfg(test)]
mod tests;

pub use run::{run_loop, CtrlCSignal, LoopOptions, LoopReport, StopSignal};
pub use timing::{LoopTimings, StepTiming, Timer};
