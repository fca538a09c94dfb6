//! # naturf Parallel
//!
//! Fan-out strategies for the per-building stages of the pipeline.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential, parallel, or parallel with a fixed pool
//! - `CancellationToken`: a cooperative flag checked between buildings

mod cancel;
pub mod strategy;

pub use cancel::CancellationToken;
pub use strategy::{ParallelStrategy, ProcessingMode};
