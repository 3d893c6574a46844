//! Stormhaven engine library.
//!
//! Exposes the world model, order parsing, phase engine, and turn pipeline
//! for use by integration tests and the binary entry point.

pub mod engine;
pub mod game;
pub mod orders;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod store;
