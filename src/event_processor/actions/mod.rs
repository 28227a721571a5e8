//! Action processors for key events
//!
//! - Layer: layer switching (momentary, toggle, move, default)
//! - Dual: tap/hold dual-action keys

pub mod dual;
pub mod layer;

use crate::config::{HoldAction, KeyAction, LayerId, ModifierSet, TapSequence};
use crate::event_processor::layer_stack::{LayerSnapshot, LayerStack};
use crate::keycode::KeyCode;
use crate::persist::DefaultLayerStore;
use smallvec::{smallvec, SmallVec};

pub use dual::{emit_dual, unemit_dual, DualKey, DualPhase};
pub use layer::{emit_layer, unemit_layer};

/// Logical output sent to the action emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emit {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Press+release of each code in order, with no gap
    TypeSequence(TapSequence),
    /// Informational, e.g. for indicator LEDs
    LayerChanged(LayerSnapshot),
}

impl std::fmt::Display for Emit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyDown(code) => write!(f, "down {code}"),
            Self::KeyUp(code) => write!(f, "up   {code}"),
            Self::TypeSequence(codes) => {
                f.write_str("type")?;
                for code in codes {
                    write!(f, " {code}")?;
                }
                Ok(())
            }
            Self::LayerChanged(snapshot) => write!(f, "layers {snapshot}"),
        }
    }
}

/// Events produced by a single transition
pub type Emits = SmallVec<[Emit; 4]>;

/// What a key press is doing (recorded on press, replayed on release)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeldAction {
    /// Emitted a regular key
    RegularKey(KeyCode),
    /// Holding a modifier
    Modifier(KeyCode),
    /// Holding a key with its modifiers
    Chord { mods: ModifierSet, code: KeyCode },
    /// Momentary layer activation
    Layer(LayerId),
    /// Dual-action key awaiting or past its tap/hold decision
    Dual(DualKey),
    /// Nothing to undo on release
    Inert,
}

pub struct HandleContext<'a> {
    pub layer_stack: &'a mut LayerStack,
    pub store: &'a mut dyn DefaultLayerStore,
}

impl KeyAction {
    /// Apply the press side of this action
    pub fn emit(&self, ctx: &mut HandleContext<'_>) -> (Emits, HeldAction) {
        match self {
            Self::Plain(code) => (smallvec![Emit::KeyDown(*code)], HeldAction::RegularKey(*code)),
            Self::Modifier(code) => (smallvec![Emit::KeyDown(*code)], HeldAction::Modifier(*code)),
            Self::Chord { mods, code } => {
                let emits = mods
                    .iter()
                    .chain(std::iter::once(code))
                    .map(|code| Emit::KeyDown(*code))
                    .collect();
                (
                    emits,
                    HeldAction::Chord {
                        mods: mods.clone(),
                        code: *code,
                    },
                )
            }
            Self::LayerMomentary(..)
            | Self::LayerToggle(..)
            | Self::LayerMove(..)
            | Self::DefaultLayerSet(..) => emit_layer(self, ctx),
            Self::DualTapHold { tap, hold } => emit_dual(tap, *hold, ctx),
            Self::Transparent | Self::NoOp => (Emits::new(), HeldAction::Inert),
        }
    }
}

impl HeldAction {
    /// Closing events for a released key
    ///
    /// `elapsed_ms` is the hold time read from the key state store.
    pub fn unemit(self, elapsed_ms: u32, tapping_term_ms: u32, ctx: &mut HandleContext<'_>) -> Emits {
        match self {
            Self::RegularKey(code) | Self::Modifier(code) => smallvec![Emit::KeyUp(code)],
            // Key first, then modifiers innermost first
            Self::Chord { mods, code } => std::iter::once(code)
                .chain(mods.into_iter().rev())
                .map(Emit::KeyUp)
                .collect(),
            Self::Layer(layer) => unemit_layer(layer, ctx),
            Self::Dual(dual) => unemit_dual(dual, elapsed_ms, tapping_term_ms, ctx),
            Self::Inert => Emits::new(),
        }
    }

    /// Codes this action keeps pressed on the host
    #[must_use]
    pub fn held_codes(&self) -> SmallVec<[KeyCode; 3]> {
        match self {
            Self::RegularKey(code) | Self::Modifier(code) => smallvec![*code],
            Self::Chord { mods, code } => mods.iter().chain(std::iter::once(code)).copied().collect(),
            Self::Dual(DualKey {
                hold: HoldAction::Modifier(code),
                ..
            }) => smallvec![*code],
            _ => SmallVec::new(),
        }
    }
}
