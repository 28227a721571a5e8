use crate::timer::{Clock, Timestamp};
pub use actions::{Emit, Emits};
use crossbeam_channel::{select, Receiver, Sender};
pub use keymap::KeymapProcessor;
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod actions;
pub mod key_state;
pub mod keymap;
pub mod layer_stack;
pub mod resolver;

/// Physical key position in the switch matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

impl KeyPos {
    #[must_use]
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for KeyPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Debounced press or release delivered by the event source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTransition {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
    pub timestamp: Timestamp,
}

impl KeyTransition {
    #[must_use]
    pub const fn press(row: u8, col: u8, timestamp: Timestamp) -> Self {
        Self {
            row,
            col,
            pressed: true,
            timestamp,
        }
    }

    #[must_use]
    pub const fn release(row: u8, col: u8, timestamp: Timestamp) -> Self {
        Self {
            row,
            col,
            pressed: false,
            timestamp,
        }
    }

    #[must_use]
    pub const fn pos(&self) -> KeyPos {
        KeyPos::new(self.row, self.col)
    }
}

impl std::fmt::Display for KeyTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} at {}",
            if self.pressed { "press" } else { "release" },
            self.pos(),
            self.timestamp
        )
    }
}

/// Sink for resolved key actions (e.g. a USB HID report writer)
pub trait ActionEmitter {
    fn emit(&mut self, emit: Emit);
}

impl ActionEmitter for Vec<Emit> {
    fn emit(&mut self, emit: Emit) {
        self.push(emit);
    }
}

impl ActionEmitter for Sender<Emit> {
    fn emit(&mut self, emit: Emit) {
        if self.send(emit).is_err() {
            debug!("Action receiver disconnected, dropping event");
        }
    }
}

/// How often undecided dual keys are polled when no events arrive
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Run the processor on its own thread
///
/// The thread is the only owner of the processor's state. It exits when
/// `shutdown_rx` fires or either channel disconnects, releasing every held
/// key first, and hands the processor back through the join handle.
///
/// Callers must keep the shutdown sender alive for as long as the loop
/// should run; dropping it stops the loop like a shutdown signal.
pub fn start_event_processor<C, E>(
    processor: KeymapProcessor,
    events_rx: Receiver<KeyTransition>,
    shutdown_rx: Receiver<()>,
    emitter: E,
    clock: C,
    tick_interval: Duration,
) -> JoinHandle<KeymapProcessor>
where
    C: Clock + Send + 'static,
    E: ActionEmitter + Send + 'static,
{
    thread::spawn(move || {
        let mut processor = processor;
        let mut emitter = emitter;
        run_event_processor(
            &mut processor,
            &events_rx,
            &shutdown_rx,
            &mut emitter,
            &clock,
            tick_interval,
        );
        info!("Event processor thread exiting");
        processor
    })
}

/// Event loop; returns after shutdown or disconnect
pub fn run_event_processor<C: Clock, E: ActionEmitter>(
    processor: &mut KeymapProcessor,
    events_rx: &Receiver<KeyTransition>,
    shutdown_rx: &Receiver<()>,
    emitter: &mut E,
    clock: &C,
    tick_interval: Duration,
) {
    info!("Starting event processor");

    loop {
        select! {
            recv(shutdown_rx) -> msg => {
                match msg {
                    Ok(()) => warn!("Shutdown signal received"),
                    Err(_) => warn!("Shutdown channel disconnected"),
                }
                // Transitions already queued still count
                for transition in events_rx.try_iter() {
                    dispatch(processor, transition, emitter);
                }
                break;
            }
            recv(events_rx) -> msg => {
                let Ok(transition) = msg else {
                    info!("Event source disconnected");
                    break;
                };
                dispatch(processor, transition, emitter);
            }
            default(tick_interval) => processor.tick(clock.now()),
        }
    }

    // Release all held keys before exiting (graceful shutdown)
    for emit in processor.release_all() {
        emitter.emit(emit);
    }
}

fn dispatch<E: ActionEmitter>(
    processor: &mut KeymapProcessor,
    transition: KeyTransition,
    emitter: &mut E,
) {
    processor.tick(transition.timestamp);
    for emit in processor.process_key(transition) {
        emitter.emit(emit);
    }
}
