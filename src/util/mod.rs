//! Utility modules: logging setup and the identifier-enum macro

pub mod id_enum;
pub mod logging;

pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};
