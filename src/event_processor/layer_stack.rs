use crate::config::LayerId;
use smallvec::SmallVec;

/// Active layers: an ordered overlay above a single default layer
///
/// The default layer is never part of the overlay and can only be changed
/// with [`LayerStack::set_default`], so it is always consulted last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerStack {
    /// Overlay, most recently activated at the end
    layers: Vec<LayerId>,
    default_layer: LayerId,
}

/// Point-in-time view of a [`LayerStack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSnapshot {
    pub default_layer: LayerId,
    /// Overlay, bottom to top
    pub active: SmallVec<[LayerId; 8]>,
}

impl std::fmt::Display for LayerSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "default={} active=[", self.default_layer)?;
        for (i, layer) in self.active.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{layer}")?;
        }
        f.write_str("]")
    }
}

impl LayerStack {
    #[must_use]
    pub const fn new(default_layer: LayerId) -> Self {
        Self {
            layers: Vec::new(),
            default_layer,
        }
    }

    #[must_use]
    pub const fn default_layer(&self) -> LayerId {
        self.default_layer
    }

    /// Overlay layers, bottom to top
    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    /// Highest-precedence layer
    #[must_use]
    pub fn current_layer(&self) -> LayerId {
        self.layers.last().copied().unwrap_or(self.default_layer)
    }

    #[must_use]
    pub fn is_active(&self, layer: LayerId) -> bool {
        layer == self.default_layer || self.layers.contains(&layer)
    }

    /// Activate `layer` on top; an already active layer moves to the top
    pub fn momentary_on(&mut self, layer: LayerId) {
        self.layers.retain(|l| *l != layer);
        self.layers.push(layer);
    }

    pub fn momentary_off(&mut self, layer: LayerId) {
        self.layers.retain(|l| *l != layer);
    }

    pub fn toggle(&mut self, layer: LayerId) {
        if self.layers.contains(&layer) {
            self.momentary_off(layer);
        } else {
            self.layers.push(layer);
        }
    }

    /// Replace the whole overlay with `layer`
    pub fn move_to(&mut self, layer: LayerId) {
        self.layers.clear();
        self.layers.push(layer);
    }

    /// Change the bottom layer; the overlay is left alone
    pub fn set_default(&mut self, layer: LayerId) {
        self.default_layer = layer;
    }

    pub fn reset_overlay(&mut self) {
        self.layers.clear();
    }

    /// Layers in lookup order: newest overlay layer first, default last
    pub fn precedence(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers
            .iter()
            .rev()
            .copied()
            .chain(std::iter::once(self.default_layer))
    }

    #[must_use]
    pub fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            default_layer: self.default_layer,
            active: self.layers.iter().copied().collect(),
        }
    }
}
