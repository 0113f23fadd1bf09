//! CoE Engine Runner Library
//!
//! Configuration, logging, input loading and the commit-after-success
//! pipeline behind the `coe-engine` binary.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod logging;
pub mod pipeline;


pub use cli::{Cli, Command, PlayoffArgs};
pub use config::{load_config, LoggingConfig, ServiceConfig};
pub use logging::initialize_logging;
pub use pipeline::{validate_inputs, Pipeline, PlayoffRequest, ValidationReport};
