pub mod distance;
pub mod evaluator;
pub mod lifecycle;
pub mod monitor;
