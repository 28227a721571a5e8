//! Compiled keymap and layer-precedence lookup

use crate::config::{validate_config, Config, ConfigError, KeyAction, Layer, LayerId};
use crate::event_processor::layer_stack::LayerStack;
use crate::event_processor::KeyPos;
use std::collections::HashMap;

/// Immutable, validated keymap with layer names compiled to ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    rows: u8,
    cols: u8,
    tapping_term_ms: u32,
    names: Vec<Layer>,
    /// One row-major table per layer
    tables: Vec<Box<[KeyAction]>>,
    default_layer: LayerId,
    startup_layer: Option<LayerId>,
}

impl Keymap {
    /// Validate and compile a config; any validation error rejects it
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let errors = validate_config(config);
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        let ids: HashMap<&Layer, LayerId> = config
            .layers
            .iter()
            .enumerate()
            .filter_map(|(i, layer)| u8::try_from(i).ok().map(|id| (&layer.name, LayerId(id))))
            .collect();

        // Validation guarantees every name resolves
        let lookup = |layer: &Layer| ids.get(layer).copied().ok_or(());
        let invalid = || ConfigError::Invalid(Vec::new());

        let mut tables = Vec::with_capacity(config.layers.len());
        for layer_config in &config.layers {
            let table = layer_config
                .keys
                .iter()
                .flatten()
                .map(|action| action.try_map_layers(lookup))
                .collect::<Result<Vec<_>, ()>>()
                .map_err(|()| invalid())?;
            tables.push(table.into_boxed_slice());
        }

        let default_layer = lookup(&config.default_layer).map_err(|()| invalid())?;
        let startup_layer = match &config.startup_layer {
            Some(layer) => Some(lookup(layer).map_err(|()| invalid())?),
            None => None,
        };

        Ok(Self {
            rows: config.rows,
            cols: config.cols,
            tapping_term_ms: config.tapping_term_ms,
            names: config.layers.iter().map(|l| l.name.clone()).collect(),
            tables,
            default_layer,
            startup_layer,
        })
    }

    #[must_use]
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> u8 {
        self.cols
    }

    #[must_use]
    pub const fn tapping_term_ms(&self) -> u32 {
        self.tapping_term_ms
    }

    /// Default layer named in the config (before any persisted override)
    #[must_use]
    pub const fn default_layer(&self) -> LayerId {
        self.default_layer
    }

    #[must_use]
    pub const fn startup_layer(&self) -> Option<LayerId> {
        self.startup_layer
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.names
            .iter()
            .position(|layer| layer.as_str() == name)
            .and_then(|i| u8::try_from(i).ok())
            .map(LayerId)
    }

    #[must_use]
    pub fn layer_name(&self, layer: LayerId) -> Option<&Layer> {
        self.names.get(layer.index())
    }

    #[must_use]
    pub fn contains(&self, pos: KeyPos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index(&self, pos: KeyPos) -> Option<usize> {
        self.contains(pos)
            .then(|| usize::from(pos.row) * usize::from(self.cols) + usize::from(pos.col))
    }

    /// Binding of `pos` on one layer, ignoring the stack
    #[must_use]
    pub fn action_at(&self, layer: LayerId, pos: KeyPos) -> Option<&KeyAction> {
        let index = self.index(pos)?;
        self.tables.get(layer.index()).map(|table| &table[index])
    }

    /// First non-transparent binding of `pos` in stack precedence order
    ///
    /// Returns [`KeyAction::NoOp`] if every active layer is transparent at
    /// `pos` or `pos` is outside the matrix.
    #[must_use]
    pub fn resolve(&self, pos: KeyPos, stack: &LayerStack) -> KeyAction {
        let Some(index) = self.index(pos) else {
            return KeyAction::NoOp;
        };

        stack
            .precedence()
            .filter_map(|layer| self.tables.get(layer.index()))
            .map(|table| &table[index])
            .find(|action| !action.is_transparent())
            .cloned()
            .unwrap_or(KeyAction::NoOp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HoldAction, LayerConfig};
    use crate::keycode::KeyCode;
    use smallvec::smallvec;

    fn keymap() -> Keymap {
        let config = Config {
            tapping_term_ms: 200,
            rows: 1,
            cols: 3,
            default_layer: Layer::new("base"),
            startup_layer: None,
            layers: vec![
                LayerConfig {
                    name: Layer::new("base"),
                    keys: vec![vec![
                        KeyAction::Plain(KeyCode::KC_A),
                        KeyAction::Plain(KeyCode::KC_B),
                        KeyAction::Transparent,
                    ]],
                },
                LayerConfig {
                    name: Layer::new("symb"),
                    keys: vec![vec![
                        KeyAction::Plain(KeyCode::KC_1),
                        KeyAction::Transparent,
                        KeyAction::Transparent,
                    ]],
                },
                LayerConfig {
                    name: Layer::new("nav"),
                    keys: vec![vec![
                        KeyAction::Plain(KeyCode::KC_LEFT),
                        KeyAction::Transparent,
                        KeyAction::DualTapHold {
                            tap: smallvec![KeyCode::KC_ENT],
                            hold: HoldAction::Layer(Layer::new("symb")),
                        },
                    ]],
                },
            ],
        };
        Keymap::from_config(&config).unwrap()
    }

    #[test]
    fn test_compiles_layer_names() {
        let keymap = keymap();
        assert_eq!(keymap.layer_count(), 3);
        assert_eq!(keymap.layer_id("nav"), Some(LayerId(2)));
        assert_eq!(keymap.layer_name(LayerId(1)), Some(&Layer::new("symb")));
        assert_eq!(
            keymap.action_at(LayerId(2), KeyPos::new(0, 2)),
            Some(&KeyAction::DualTapHold {
                tap: smallvec![KeyCode::KC_ENT],
                hold: HoldAction::Layer(LayerId(1)),
            })
        );
    }

    #[test]
    fn test_higher_layer_wins() {
        let keymap = keymap();
        let mut stack = LayerStack::new(LayerId(0));
        stack.momentary_on(LayerId(1));
        stack.momentary_on(LayerId(2));
        assert_eq!(
            keymap.resolve(KeyPos::new(0, 0), &stack),
            KeyAction::Plain(KeyCode::KC_LEFT)
        );

        // Most recently activated wins, not the highest id
        stack.momentary_on(LayerId(1));
        assert_eq!(
            keymap.resolve(KeyPos::new(0, 0), &stack),
            KeyAction::Plain(KeyCode::KC_1)
        );
    }

    #[test]
    fn test_transparent_falls_through() {
        let keymap = keymap();
        let mut stack = LayerStack::new(LayerId(0));
        stack.momentary_on(LayerId(1));
        assert_eq!(
            keymap.resolve(KeyPos::new(0, 1), &stack),
            KeyAction::Plain(KeyCode::KC_B)
        );
        assert_eq!(keymap.resolve(KeyPos::new(0, 2), &stack), KeyAction::NoOp);
    }

    #[test]
    fn test_resolve_is_pure() {
        let keymap = keymap();
        let mut stack = LayerStack::new(LayerId(0));
        stack.toggle(LayerId(2));
        let first = keymap.resolve(KeyPos::new(0, 2), &stack);
        let second = keymap.resolve(KeyPos::new(0, 2), &stack.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_matrix_is_noop() {
        let keymap = keymap();
        let stack = LayerStack::new(LayerId(0));
        assert_eq!(keymap.resolve(KeyPos::new(0, 3), &stack), KeyAction::NoOp);
        assert_eq!(keymap.resolve(KeyPos::new(1, 0), &stack), KeyAction::NoOp);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            tapping_term_ms: 200,
            rows: 1,
            cols: 1,
            default_layer: Layer::new("base"),
            startup_layer: Some(Layer::new("qwerty")),
            layers: vec![LayerConfig {
                name: Layer::new("base"),
                keys: vec![vec![KeyAction::LayerMove(Layer::new("game"))]],
            }],
        };
        match Keymap::from_config(&config) {
            Err(ConfigError::Invalid(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }
}
