use crate::config::error::ConfigError;
use crate::keycode::KeyCode;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::path::{Path, PathBuf};

/// Layer name as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer(pub String);

impl Layer {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of a layer in the compiled keymap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u8);

impl LayerId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Codes typed as press+release pairs, in order
pub type TapSequence = SmallVec<[KeyCode; 4]>;

/// Modifiers held around a chord's key, outermost first
pub type ModifierSet = SmallVec<[KeyCode; 2]>;

/// Side effect a dual-action key asserts while held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldAction<L = LayerId> {
    /// Hold a modifier key down
    Modifier(KeyCode),
    /// Activate a layer while held
    Layer(L),
}

/// What a key position is bound to on one layer
///
/// `L` is the layer reference: a [`Layer`] name in config files, a
/// [`LayerId`] once the keymap is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction<L = LayerId> {
    /// Regular key
    Plain(KeyCode),
    /// Modifier key (must be a modifier code)
    Modifier(KeyCode),
    /// Key sent with modifiers held, e.g. Ctrl+Tab
    Chord { mods: ModifierSet, code: KeyCode },
    /// Layer active only while held
    LayerMomentary(L),
    /// Flip layer membership on press
    LayerToggle(L),
    /// Replace every overlay layer with this one
    LayerMove(L),
    /// Persist a new default layer
    DefaultLayerSet(L),
    /// Tap types `tap`, hold asserts `hold`
    DualTapHold { tap: TapSequence, hold: HoldAction<L> },
    /// Fall through to the next active layer
    Transparent,
    /// Does nothing
    NoOp,
}

impl<L> KeyAction<L> {
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }

    /// Layer referenced by this action, if any
    pub fn layer_ref(&self) -> Option<&L> {
        match self {
            Self::LayerMomentary(layer)
            | Self::LayerToggle(layer)
            | Self::LayerMove(layer)
            | Self::DefaultLayerSet(layer)
            | Self::DualTapHold {
                hold: HoldAction::Layer(layer),
                ..
            } => Some(layer),
            _ => None,
        }
    }

    /// Rewrite the layer reference, failing on the first unresolvable one
    pub fn try_map_layers<M, E>(
        &self,
        mut f: impl FnMut(&L) -> Result<M, E>,
    ) -> Result<KeyAction<M>, E> {
        Ok(match self {
            Self::Plain(code) => KeyAction::Plain(*code),
            Self::Modifier(code) => KeyAction::Modifier(*code),
            Self::Chord { mods, code } => KeyAction::Chord {
                mods: mods.clone(),
                code: *code,
            },
            Self::LayerMomentary(layer) => KeyAction::LayerMomentary(f(layer)?),
            Self::LayerToggle(layer) => KeyAction::LayerToggle(f(layer)?),
            Self::LayerMove(layer) => KeyAction::LayerMove(f(layer)?),
            Self::DefaultLayerSet(layer) => KeyAction::DefaultLayerSet(f(layer)?),
            Self::DualTapHold { tap, hold } => KeyAction::DualTapHold {
                tap: tap.clone(),
                hold: match hold {
                    HoldAction::Modifier(code) => HoldAction::Modifier(*code),
                    HoldAction::Layer(layer) => HoldAction::Layer(f(layer)?),
                },
            },
            Self::Transparent => KeyAction::Transparent,
            Self::NoOp => KeyAction::NoOp,
        })
    }
}

/// One layer's bindings, a `rows` x `cols` grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: Layer,
    pub keys: Vec<Vec<KeyAction<Layer>>>,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Hold time (ms) at which a dual-action key stops counting as a tap
    pub tapping_term_ms: u32,
    pub rows: u8,
    pub cols: u8,
    /// Bottom layer used until a `DefaultLayerSet` key persists another one
    pub default_layer: Layer,
    /// Overlay layer moved to at startup
    #[serde(default)]
    pub startup_layer: Option<Layer>,
    pub layers: Vec<LayerConfig>,
}

impl Config {
    /// Load config from RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    /// Parse config from RON text
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    /// Save config to RON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default();
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get default config path
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("ergomux").join("config.ron"))
    }

    /// Look up a layer's bindings by name
    #[must_use]
    pub fn layer(&self, name: &Layer) -> Option<&LayerConfig> {
        self.layers.iter().find(|layer| &layer.name == name)
    }
}
