pub mod config;
pub mod error;
pub mod validator;

pub use config::{
    Config, HoldAction, KeyAction, Layer, LayerConfig, LayerId, ModifierSet, TapSequence,
};
pub use error::{ConfigError, ValidationError};
pub use validator::{report_validation, validate_config};
