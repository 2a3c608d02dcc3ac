//! Service configuration and dependency wiring.

pub mod dependencies;
pub mod settings;

pub use dependencies::Dependencies;
pub use settings::{LogFormat, Settings};
