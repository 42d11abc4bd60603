//! Core domain models for the calibration chain
//!
//! This module defines the data structures that represent a chain run, the
//! steps it is made of, and the filesystem context they execute in.

pub mod chain;
pub mod config;
pub mod error;
pub mod paths;
pub mod state;
pub mod step;
pub mod workspace;

pub use chain::*;
pub use error::*;
pub use paths::*;
pub use state::*;
pub use step::*;
