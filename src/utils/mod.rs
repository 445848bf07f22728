//! Utility functions and types for the risk engine.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use logging::init_logging;
pub use types::*;

/// Re-export of commonly used types
pub mod prelude {
    pub use super::{
        config::Config,
        error::{Error, Result},
        logging::init_logging,
        types::*,
    };
}

/// Common result type for utility functions
pub type Result<T> = std::result::Result<T, Error>;
