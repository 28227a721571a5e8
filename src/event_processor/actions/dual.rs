//! Dual-action (tap/hold) keys
//!
//! The hold side effect is asserted eagerly at press time. The tap decision
//! is only ever made at release, from the release's own timestamp: if the key
//! is released before the tapping term, the hold is reverted and the tap
//! sequence is typed as well. Other
//! keys keep working normally while a dual key is undecided, and several
//! dual keys can be undecided at once since state is kept per position.

use crate::config::{HoldAction, LayerId, TapSequence};
use crate::event_processor::actions::layer::{layer_changed, unemit_layer};
use crate::event_processor::actions::{Emit, Emits, HandleContext, HeldAction};
use smallvec::smallvec;
use tracing::debug;

/// Tap/hold decision state of a pressed dual key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualPhase {
    /// Pressed, tapping term still running
    Undetermined,
    /// A tick saw the tapping term pass; reporting only
    HoldResolved,
}

/// A pressed dual-action key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualKey {
    pub tap: TapSequence,
    pub hold: HoldAction,
    pub phase: DualPhase,
}

impl DualKey {
    /// Resolve to hold once the key has been down for the tapping term
    ///
    /// Returns true on the transition.
    pub fn poll(&mut self, elapsed_ms: u32, tapping_term_ms: u32) -> bool {
        if self.phase == DualPhase::Undetermined && elapsed_ms >= tapping_term_ms {
            self.phase = DualPhase::HoldResolved;
            true
        } else {
            false
        }
    }
}

pub fn emit_dual(
    tap: &TapSequence,
    hold: HoldAction,
    ctx: &mut HandleContext<'_>,
) -> (Emits, HeldAction) {
    let emits = match hold {
        HoldAction::Modifier(code) => smallvec![Emit::KeyDown(code)],
        HoldAction::Layer(layer) => hold_layer(layer, ctx),
    };
    (
        emits,
        HeldAction::Dual(DualKey {
            tap: tap.clone(),
            hold,
            phase: DualPhase::Undetermined,
        }),
    )
}

fn hold_layer(layer: LayerId, ctx: &mut HandleContext<'_>) -> Emits {
    let before = ctx.layer_stack.snapshot();
    ctx.layer_stack.momentary_on(layer);
    layer_changed(ctx.layer_stack, &before)
}

pub fn unemit_dual(
    dual: DualKey,
    elapsed_ms: u32,
    tapping_term_ms: u32,
    ctx: &mut HandleContext<'_>,
) -> Emits {
    let mut emits = match dual.hold {
        HoldAction::Modifier(code) => smallvec![Emit::KeyUp(code)],
        HoldAction::Layer(layer) => unemit_layer(layer, ctx),
    };

    if elapsed_ms < tapping_term_ms {
        if dual.phase == DualPhase::HoldResolved {
            debug!("Release stamped inside the tapping term after a hold tick");
        }
        debug!("Dual key tapped after {}ms", elapsed_ms);
        emits.push(Emit::TypeSequence(dual.tap));
    } else {
        debug!("Dual key held for {}ms", elapsed_ms);
    }

    emits
}
