#![warn(clippy::pedantic)]
#![warn(clippy::style)]
#![warn(clippy::nursery)]

pub mod engine;
pub mod grid;
pub mod iteration;
pub mod render;

// Reward for standing on the goal cell.
pub const GOAL_REWARD: f64 = 1.0;
// Reward for every other cell.
pub const STEP_REWARD: f64 = -1.0;
// Discount, also known as lambda.
pub const DEFAULT_DISCOUNT: f64 = 0.9;
// Evaluation stops early once a sweep changes no value by more than this.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
// One sweep per call, the outer loop does the rest.
pub const DEFAULT_SWEEPS: usize = 1;
