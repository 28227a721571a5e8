use crate::config::Layer;
use crate::keycode::KeyCode;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load or compile a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),

    #[error("failed to get config dir")]
    NoConfigDir,

    #[error("config validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ValidationError>),
}

/// A single problem found by [`validate_config`](crate::config::validate_config)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no layers defined")]
    NoLayers,

    #[error("matrix must have at least one row and column, got {rows}x{cols}")]
    EmptyMatrix { rows: u8, cols: u8 },

    #[error("{0} layers defined, at most 256 are supported")]
    TooManyLayers(usize),

    #[error("layer \"{0}\" defined more than once")]
    DuplicateLayer(Layer),

    #[error("layer \"{layer}\" has {found} rows, expected {expected}")]
    RowCount {
        layer: Layer,
        expected: usize,
        found: usize,
    },

    #[error("layer \"{layer}\" row {row} has {found} keys, expected {expected}")]
    ColumnCount {
        layer: Layer,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("referenced layer not defined: \"{layer}\" (from {referenced_from})")]
    UnknownLayer {
        layer: Layer,
        referenced_from: String,
    },

    #[error("layer \"{layer}\" ({row}, {col}): {code} is not a modifier")]
    NotAModifier {
        layer: Layer,
        row: usize,
        col: usize,
        code: KeyCode,
    },

    #[error("layer \"{layer}\" ({row}, {col}): dual-action key has an empty tap sequence")]
    EmptyTapSequence { layer: Layer, row: usize, col: usize },

    #[error("tapping_term_ms out of reasonable range (1-1000): {0}")]
    TappingTermOutOfRange(u32),
}
