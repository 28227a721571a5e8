use crate::event_processor::KeyPos;
use crate::timer::Timestamp;

/// Hold time reported for a key that was never pressed
pub const NEVER_PRESSED: u32 = u32::MAX;

/// Last press time of every physical key, indexed by position
#[derive(Debug, Clone)]
pub struct KeyStateStore {
    cols: usize,
    last_pressed: Vec<Option<Timestamp>>,
}

impl KeyStateStore {
    #[must_use]
    pub fn new(rows: u8, cols: u8) -> Self {
        Self {
            cols: usize::from(cols),
            last_pressed: vec![None; usize::from(rows) * usize::from(cols)],
        }
    }

    fn index(&self, pos: KeyPos) -> Option<usize> {
        let col = usize::from(pos.col);
        if col >= self.cols {
            return None;
        }
        let index = usize::from(pos.row) * self.cols + col;
        (index < self.last_pressed.len()).then_some(index)
    }

    pub fn on_press(&mut self, pos: KeyPos, now: Timestamp) {
        if let Some(index) = self.index(pos) {
            self.last_pressed[index] = Some(now);
        }
    }

    /// Releases keep the timestamp so the hold time can still be read
    pub fn on_release(&mut self, _pos: KeyPos) {}

    #[must_use]
    pub fn last_pressed(&self, pos: KeyPos) -> Option<Timestamp> {
        self.index(pos).and_then(|index| self.last_pressed[index])
    }

    /// Milliseconds since the last press of `pos`, or [`NEVER_PRESSED`]
    #[must_use]
    pub fn elapsed_hold_time(&self, pos: KeyPos, now: Timestamp) -> u32 {
        self.last_pressed(pos)
            .map_or(NEVER_PRESSED, |pressed_at| now.elapsed_since(pressed_at))
    }

    pub fn reset(&mut self) {
        self.last_pressed.fill(None);
    }
}
