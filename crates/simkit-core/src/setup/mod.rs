//! World Setup
//!
//! Built-in scenarios for the runner and tests.

pub mod world;

pub use world::*;
