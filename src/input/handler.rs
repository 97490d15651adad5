//! Keyboard input handling for terminal environments.
//!
//! Maps key events to pad actions. Held arrow keys repeat the placement
//! cursor movement (DAS/ARR style); terminals that do not emit key release
//! events are handled with an auto-release timeout.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use arrayvec::ArrayVec;

use crate::types::{CURSOR_ARR_MS, CURSOR_DAS_MS};

/// Direction for placement cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDir {
    Up,
    Down,
    Left,
    Right,
}

/// One user-facing action on the focused pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadAction {
    Move(CursorDir),
    Place,
    RotateCw,
    RotateCcw,
    Undo,
    Redo,
    Reset,
    SwitchPad,
}

/// Check for the quit chord (q, Esc, or Ctrl-C).
pub fn should_quit(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn direction_for(code: KeyCode) -> Option<CursorDir> {
    match code {
        KeyCode::Up => Some(CursorDir::Up),
        KeyCode::Down => Some(CursorDir::Down),
        KeyCode::Left => Some(CursorDir::Left),
        KeyCode::Right => Some(CursorDir::Right),
        _ => None,
    }
}

// In terminals without key-release events, a short timeout prevents a single
// tap from turning into a sustained "held" state that triggers repeats.
const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

/// Tracks held movement keys for DAS/ARR-style cursor repeats.
#[derive(Debug, Clone)]
pub struct InputHandler {
    held: Option<CursorDir>,
    last_key_time: std::time::Instant,
    das_timer: u32,
    arr_accumulator: u32,
    das_delay: u32,
    arr_rate: u32,
    key_release_timeout_ms: u32,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::with_config(CURSOR_DAS_MS, CURSOR_ARR_MS)
    }

    pub fn with_config(das_delay: u32, arr_rate: u32) -> Self {
        Self {
            held: None,
            last_key_time: std::time::Instant::now(),
            das_timer: 0,
            arr_accumulator: 0,
            das_delay,
            arr_rate: arr_rate.max(1),
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
        }
    }

    pub fn with_key_release_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.key_release_timeout_ms = timeout_ms;
        self
    }

    /// Map a key press to an action.
    ///
    /// Movement keys additionally arm the repeat machinery; pressing the
    /// direction that is already held yields nothing (repeats come from
    /// `update`).
    pub fn handle_key_press(&mut self, code: KeyCode) -> Option<PadAction> {
        if let Some(dir) = direction_for(code) {
            self.last_key_time = std::time::Instant::now();
            if self.held == Some(dir) {
                return None;
            }
            self.held = Some(dir);
            self.das_timer = 0;
            self.arr_accumulator = 0;
            return Some(PadAction::Move(dir));
        }

        match code {
            KeyCode::Enter | KeyCode::Char(' ') => Some(PadAction::Place),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(PadAction::RotateCw),
            KeyCode::Char('z') | KeyCode::Char('Z') => Some(PadAction::RotateCcw),
            KeyCode::Char('u') | KeyCode::Char('U') => Some(PadAction::Undo),
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(PadAction::Redo),
            KeyCode::Char('c') | KeyCode::Char('C') => Some(PadAction::Reset),
            KeyCode::Tab => Some(PadAction::SwitchPad),
            _ => None,
        }
    }

    pub fn handle_key_release(&mut self, code: KeyCode) {
        if let Some(dir) = direction_for(code) {
            if self.held == Some(dir) {
                self.held = None;
                self.das_timer = 0;
                self.arr_accumulator = 0;
            }
        }
    }

    /// Advance timers; returns repeat actions for a held direction.
    pub fn update(&mut self, elapsed_ms: u32) -> ArrayVec<PadAction, 16> {
        let mut actions = ArrayVec::<PadAction, 16>::new();

        // Auto-release when the terminal does not emit release events.
        let time_since_last_key = self.last_key_time.elapsed().as_millis() as u32;
        if time_since_last_key > self.key_release_timeout_ms && self.held.is_some() {
            self.held = None;
            self.das_timer = 0;
            self.arr_accumulator = 0;
        }

        let Some(dir) = self.held else {
            self.das_timer = 0;
            self.arr_accumulator = 0;
            return actions;
        };

        let prev_das = self.das_timer;
        self.das_timer += elapsed_ms;

        if self.das_timer >= self.das_delay {
            let excess = if prev_das < self.das_delay {
                self.das_timer - self.das_delay
            } else {
                elapsed_ms
            };
            self.arr_accumulator += excess;

            while self.arr_accumulator >= self.arr_rate {
                let _ = actions.try_push(PadAction::Move(dir));
                self.arr_accumulator -= self.arr_rate;
            }
        }

        actions
    }

    pub fn reset(&mut self) {
        self.held = None;
        self.last_key_time = std::time::Instant::now();
        self.das_timer = 0;
        self.arr_accumulator = 0;
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_keys() {
        let mut ih = InputHandler::new();
        assert_eq!(ih.handle_key_press(KeyCode::Enter), Some(PadAction::Place));
        assert_eq!(
            ih.handle_key_press(KeyCode::Char(' ')),
            Some(PadAction::Place)
        );
        assert_eq!(
            ih.handle_key_press(KeyCode::Char('x')),
            Some(PadAction::RotateCw)
        );
        assert_eq!(
            ih.handle_key_press(KeyCode::Char('z')),
            Some(PadAction::RotateCcw)
        );
        assert_eq!(
            ih.handle_key_press(KeyCode::Char('u')),
            Some(PadAction::Undo)
        );
        assert_eq!(
            ih.handle_key_press(KeyCode::Char('y')),
            Some(PadAction::Redo)
        );
        assert_eq!(
            ih.handle_key_press(KeyCode::Char('c')),
            Some(PadAction::Reset)
        );
        assert_eq!(ih.handle_key_press(KeyCode::Tab), Some(PadAction::SwitchPad));
        assert_eq!(ih.handle_key_press(KeyCode::Char('?')), None);
    }

    #[test]
    fn test_quit_keys() {
        use crossterm::event::KeyEvent;

        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::NONE
        )));
        assert!(should_quit(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::NONE
        )));
    }

    #[test]
    fn test_cursor_das_arr_repeats_after_delay() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(10_000);

        assert_eq!(
            ih.handle_key_press(KeyCode::Left),
            Some(PadAction::Move(CursorDir::Left))
        );

        // Before DAS expires: no repeats.
        assert!(ih.update(99).is_empty());

        // Exactly at DAS: still no repeats (needs excess over DAS).
        assert!(ih.update(1).is_empty());

        // First ARR interval after DAS: one repeat.
        assert_eq!(
            ih.update(25).as_slice(),
            &[PadAction::Move(CursorDir::Left)]
        );

        // Another interval: one more.
        assert_eq!(
            ih.update(25).as_slice(),
            &[PadAction::Move(CursorDir::Left)]
        );
    }

    #[test]
    fn test_repeated_press_of_held_direction_is_silent() {
        let mut ih = InputHandler::new();
        assert!(ih.handle_key_press(KeyCode::Down).is_some());
        assert!(ih.handle_key_press(KeyCode::Down).is_none());
    }

    #[test]
    fn test_direction_change_restarts_das() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(10_000);

        assert!(ih.handle_key_press(KeyCode::Left).is_some());
        ih.update(150);

        // Switching direction emits the new move and restarts the delay.
        assert_eq!(
            ih.handle_key_press(KeyCode::Right),
            Some(PadAction::Move(CursorDir::Right))
        );
        assert!(ih.update(99).is_empty());
    }

    #[test]
    fn test_release_stops_repeats() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(10_000);

        assert!(ih.handle_key_press(KeyCode::Up).is_some());
        ih.handle_key_release(KeyCode::Up);
        assert!(ih.update(500).is_empty());
    }

    #[test]
    fn test_auto_release_after_timeout_without_release_events() {
        let mut ih = InputHandler::with_config(100, 25);
        ih.key_release_timeout_ms = 50;

        assert!(ih.handle_key_press(KeyCode::Left).is_some());

        // Simulate no key-release events by moving the last key time back.
        ih.last_key_time = std::time::Instant::now() - std::time::Duration::from_millis(51);

        assert!(ih.update(0).is_empty());
        assert!(ih.held.is_none());
    }

    #[test]
    fn test_reset_clears_held_state() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(10_000);

        assert!(ih.handle_key_press(KeyCode::Left).is_some());
        assert!(!ih.update(200).is_empty(), "expected repeats before reset");

        ih.reset();
        assert!(ih.update(200).is_empty(), "reset should stop repeats");
    }
}
