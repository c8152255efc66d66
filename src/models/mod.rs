pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel, LogOutput, SessionConfig};
