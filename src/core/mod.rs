//! Core types for the rerun pipeline: builder, context, and error handling.

pub mod builder;
pub mod context;
pub mod error;

pub use builder::{RerunBuilder, RerunPipeline};
pub use context::Context;
pub use error::{Error, Result};
