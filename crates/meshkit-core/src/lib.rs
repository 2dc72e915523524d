//! meshkit core
//!
//! Shared plumbing for the meshkit crates: logging, profiling, pipeline
//! configuration, colors and the common error type.

pub mod alloc;
pub mod color;
pub mod config;
pub mod error;
pub mod logging;
pub mod profiling;

pub use color::Color;
pub use config::PipelineConfig;
pub use error::{MeshError, Result};
