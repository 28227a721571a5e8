use crate::config::{KeyAction, LayerId};
use crate::event_processor::actions::{Emit, Emits, HandleContext, HeldAction};
use crate::event_processor::layer_stack::{LayerSnapshot, LayerStack};
use crate::persist::DefaultLayerStore;
use smallvec::smallvec;
use tracing::{info, warn};

pub fn emit_layer(action: &KeyAction, ctx: &mut HandleContext<'_>) -> (Emits, HeldAction) {
    let before = ctx.layer_stack.snapshot();
    let held = match action {
        KeyAction::LayerMomentary(layer) => {
            ctx.layer_stack.momentary_on(*layer);
            HeldAction::Layer(*layer)
        }
        KeyAction::LayerToggle(layer) => {
            ctx.layer_stack.toggle(*layer);
            HeldAction::Inert
        }
        KeyAction::LayerMove(layer) => {
            ctx.layer_stack.move_to(*layer);
            HeldAction::Inert
        }
        KeyAction::DefaultLayerSet(layer) => {
            ctx.layer_stack.set_default(*layer);
            persist_default(*layer, ctx.store);
            HeldAction::Inert
        }
        _ => return (Emits::new(), HeldAction::Inert),
    };
    (layer_changed(ctx.layer_stack, &before), held)
}

/// Release side of a momentary layer
pub fn unemit_layer(layer: LayerId, ctx: &mut HandleContext<'_>) -> Emits {
    let before = ctx.layer_stack.snapshot();
    ctx.layer_stack.momentary_off(layer);
    layer_changed(ctx.layer_stack, &before)
}

/// `LayerChanged` if the stack differs from `before`
pub(crate) fn layer_changed(stack: &LayerStack, before: &LayerSnapshot) -> Emits {
    let after = stack.snapshot();
    if after == *before {
        Emits::new()
    } else {
        info!("Layers: {} -> {}", before, after);
        smallvec![Emit::LayerChanged(after)]
    }
}

fn persist_default(layer: LayerId, store: &mut dyn DefaultLayerStore) {
    match store.save(layer) {
        Ok(()) => info!("Default layer set to {}", layer),
        Err(e) => warn!("Default layer {} is active but was not persisted: {}", layer, e),
    }
}
