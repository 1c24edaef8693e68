//! Batch driver for the polish rewriting engine.
//!
//! Loads engine configuration ([`config`]), rewrites source units one at a
//! time or in parallel batches ([`pipeline`]), and renders listings for the
//! command line ([`report`]).

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{ConfigError, EngineConfig};
pub use pipeline::{Engine, PipelineError, Plan, UnitReport, output_paths, write_unit};
