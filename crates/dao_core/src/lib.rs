pub mod config;
pub mod error_handler;
pub mod logging;

pub use config::{
    ConfigError, DeployConfig, DotenvStatus, MIN_POLL_INTERVAL_MS, Secret, load_dotenv,
    load_dotenv_from, validate_url,
};
pub use error_handler::{ClassifiedError, FailureCategory, classify_error};
