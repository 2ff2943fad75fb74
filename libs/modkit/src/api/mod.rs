//! HTTP-facing helpers shared by every module.

pub mod problem;

pub use problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
