pub mod boundary;
pub mod build;
pub mod changelog;
pub mod classifier;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod git;
pub mod manifest;
pub mod pipeline;
pub mod publish;
pub mod resolver;
pub mod telemetry;
pub mod ui;

pub use error::{ReleaseError, Result};
