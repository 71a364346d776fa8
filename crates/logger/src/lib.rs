//! Shared tracing setup for the vigil binaries.

mod tracing;

pub use self::tracing::{LogFormat, init_tracing};
