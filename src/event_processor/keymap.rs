use crate::config::LayerId;
use crate::event_processor::actions::{DualPhase, Emits, HandleContext, HeldAction};
use crate::event_processor::key_state::{KeyStateStore, NEVER_PRESSED};
use crate::event_processor::layer_stack::LayerStack;
use crate::event_processor::resolver::Keymap;
use crate::event_processor::{KeyPos, KeyTransition};
use crate::keycode::KeyCode;
use crate::persist::DefaultLayerStore;
use crate::timer::Timestamp;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Per-key dispatcher: turns physical transitions into logical events
///
/// Owns every piece of mutable state (layer stack, press timestamps, held
/// keys). It is meant to have a single owner; see
/// [`start_event_processor`](crate::event_processor::start_event_processor).
pub struct KeymapProcessor {
    keymap: Keymap,
    layer_stack: LayerStack,
    key_state: KeyStateStore,
    /// What each physical key is currently doing
    held_keys: HashMap<KeyPos, HeldAction>,
    store: Box<dyn DefaultLayerStore>,
}

impl KeymapProcessor {
    /// Create a processor in its power-on state
    ///
    /// The default layer comes from `store` when it holds a valid layer,
    /// otherwise from the keymap. The startup layer, if any, is moved to.
    pub fn new(keymap: Keymap, store: Box<dyn DefaultLayerStore>) -> Self {
        let default_layer = restore_default(&keymap, store.as_ref());
        let key_state = KeyStateStore::new(keymap.rows(), keymap.cols());
        let mut processor = Self {
            layer_stack: LayerStack::new(default_layer),
            key_state,
            held_keys: HashMap::new(),
            keymap,
            store,
        };
        processor.apply_startup_layer();
        processor
    }

    /// Return to the power-on state, keeping only the persisted default layer
    pub fn reset(&mut self) {
        self.held_keys.clear();
        self.key_state.reset();
        self.layer_stack = LayerStack::new(restore_default(&self.keymap, self.store.as_ref()));
        self.apply_startup_layer();
    }

    fn apply_startup_layer(&mut self) {
        if let Some(layer) = self.keymap.startup_layer() {
            self.layer_stack.move_to(layer);
            debug!("Moved to startup layer {}", layer);
        }
    }

    #[must_use]
    pub const fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    #[must_use]
    pub const fn layer_stack(&self) -> &LayerStack {
        &self.layer_stack
    }

    #[must_use]
    pub const fn key_state(&self) -> &KeyStateStore {
        &self.key_state
    }

    /// Decision state of the dual key held at `pos`, if any
    #[must_use]
    pub fn dual_phase(&self, pos: KeyPos) -> Option<DualPhase> {
        match self.held_keys.get(&pos) {
            Some(HeldAction::Dual(dual)) => Some(dual.phase),
            _ => None,
        }
    }

    /// Get all codes currently held down on the host (for graceful shutdown)
    pub fn get_held_keys(&self) -> Vec<KeyCode> {
        self.held_keys
            .values()
            .flat_map(HeldAction::held_codes)
            .collect()
    }

    /// Process one key transition
    pub fn process_key(&mut self, transition: KeyTransition) -> Emits {
        let pos = transition.pos();
        if !self.keymap.contains(pos) {
            warn!(
                "Ignoring {} outside the {}x{} matrix",
                transition,
                self.keymap.rows(),
                self.keymap.cols()
            );
            return Emits::new();
        }

        if transition.pressed {
            self.process_key_press(pos, transition.timestamp)
        } else {
            self.process_key_release(pos, transition.timestamp)
        }
    }

    fn process_key_press(&mut self, pos: KeyPos, now: Timestamp) -> Emits {
        let mut emits = Emits::new();

        // A second press without a release: close the first one quietly
        if let Some(stale) = self.held_keys.remove(&pos) {
            warn!("{} pressed twice without a release", pos);
            emits.extend(self.close(stale, NEVER_PRESSED));
        }

        self.key_state.on_press(pos, now);
        let action = self.keymap.resolve(pos, &self.layer_stack);
        debug!("{} pressed at {}: {:?}", pos, now, action);

        let mut ctx = HandleContext {
            layer_stack: &mut self.layer_stack,
            store: self.store.as_mut(),
        };
        let (press_emits, held) = action.emit(&mut ctx);
        emits.extend(press_emits);
        self.held_keys.insert(pos, held);
        emits
    }

    fn process_key_release(&mut self, pos: KeyPos, now: Timestamp) -> Emits {
        self.key_state.on_release(pos);

        let Some(held) = self.held_keys.remove(&pos) else {
            debug!("{} released without a recorded press", pos);
            return Emits::new();
        };

        let elapsed = self.key_state.elapsed_hold_time(pos, now);
        debug!("{} released after {}ms", pos, elapsed);
        self.close(held, elapsed)
    }

    fn close(&mut self, held: HeldAction, elapsed_ms: u32) -> Emits {
        let tapping_term_ms = self.keymap.tapping_term_ms();
        let mut ctx = HandleContext {
            layer_stack: &mut self.layer_stack,
            store: self.store.as_mut(),
        };
        held.unemit(elapsed_ms, tapping_term_ms, &mut ctx)
    }

    /// Poll undecided dual keys; call on every scan tick
    ///
    /// Keys held for at least the tapping term become hold-resolved. Nothing
    /// is emitted since the hold side effect was applied at press time, and
    /// the tap decision is still made from the release timestamp.
    pub fn tick(&mut self, now: Timestamp) {
        let tapping_term_ms = self.keymap.tapping_term_ms();
        for (pos, held) in &mut self.held_keys {
            let HeldAction::Dual(dual) = held else {
                continue;
            };
            let Some(pressed_at) = self.key_state.last_pressed(*pos) else {
                continue;
            };
            // Events stamped ahead of the polling clock are not elapsed yet
            if !pressed_at.is_before(now) {
                continue;
            }
            if dual.poll(now.elapsed_since(pressed_at), tapping_term_ms) {
                debug!("{} resolved to hold at {}", pos, now);
            }
        }
    }

    /// Release everything still held, without typing any taps
    pub fn release_all(&mut self) -> Emits {
        let held: Vec<HeldAction> = self.held_keys.drain().map(|(_, held)| held).collect();
        if !held.is_empty() {
            info!("Releasing {} held key(s)", held.len());
        }

        let mut emits = Emits::new();
        for held in held {
            emits.extend(self.close(held, NEVER_PRESSED));
        }
        emits
    }
}

fn restore_default(keymap: &Keymap, store: &dyn DefaultLayerStore) -> LayerId {
    match store.load() {
        Ok(Some(layer)) if layer.index() < keymap.layer_count() => {
            info!("Restored default layer {}", layer);
            layer
        }
        Ok(Some(layer)) => {
            warn!(
                "Persisted default layer {} does not exist in this keymap, using {}",
                layer,
                keymap.default_layer()
            );
            keymap.default_layer()
        }
        Ok(None) => keymap.default_layer(),
        Err(e) => {
            warn!("Failed to load persisted default layer: {}", e);
            keymap.default_layer()
        }
    }
}
