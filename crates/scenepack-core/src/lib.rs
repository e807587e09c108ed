//! scenepack Core Library
//!
//! This crate provides the math types, error handling and small utilities
//! shared by the scene model and the export pipeline.

pub mod error;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;
