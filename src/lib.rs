//! Core library for the curriculum-based course timetabling solver: the
//! Faculty problem instance, the Timetable candidate solution and its
//! caches, the Evaluator, the single-shot Solver, and the multi-shot
//! funnel. The CLI front-ends (`main.rs`, `bin/validator.rs`) are thin
//! wrappers around this crate.

pub mod diagnostics;
pub mod evaluator;
pub mod faculty;
pub mod funnel;
pub mod mutation;
pub mod solver;
pub mod timetable;
pub mod utils;
