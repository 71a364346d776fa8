//! Vigil - periodic endpoint checks with structured logs and email reports.

pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod monitoring;
pub mod pool;
pub mod use_cases;

pub use config::Config;
pub use error::{ConfigError, EmailError, LogDecodeError, ProbeError, RepositoryError};
