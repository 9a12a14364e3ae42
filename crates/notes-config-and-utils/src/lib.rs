//! Configuration, filesystem paths and logging bootstrap for the notes tools.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_LOG_LEVEL, DEFAULT_SORT_ORDER};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
