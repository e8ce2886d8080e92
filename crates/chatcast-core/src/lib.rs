pub mod config;
pub mod error;

pub use config::ChatcastConfig;
pub use error::{ChatcastError, Result};
