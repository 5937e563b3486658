//! # Pipeline
//!
//! Builder that validates capabilities and materializes the stage list, and
//! the composed handler that runs it.

pub mod builder;
pub mod handler;

pub use builder::PipelineOptions;
pub use handler::AnteHandler;
