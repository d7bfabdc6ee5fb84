/// Input state tracker.
///
/// Tracks which keys are currently held down and turns them into the
/// simulation's intents once per tick:
///   - Movement and jump are level-triggered (held keys)
///   - Meta commands (reset, menu, quit, confirm) are edge-triggered
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{FrameInput, MoveDir};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_PAN_LEFT: &[KeyCode] = &[KeyCode::Char('j'), KeyCode::Char('J')];
const KEYS_PAN_RIGHT: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
const KEYS_ZOOM_IN: &[KeyCode] = &[KeyCode::Char('+'), KeyCode::Char('=')];
const KEYS_ZOOM_OUT: &[KeyCode] = &[KeyCode::Char('-')];
const KEYS_CAMERA_RESET: &[KeyCode] = &[KeyCode::Char('0')];

/// One-shot commands outside the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    /// Debug world reset: new session, fresh level.
    Reset,
    ReturnToMenu,
    Confirm,
    Quit,
    // Debug camera
    PanLeft,
    PanRight,
    ZoomIn,
    ZoomOut,
    CameraReset,
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// drain_events() call.
    fresh_presses: Vec<KeyCode>,

    ctrl_c: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply_key(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
        }

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Without enhancement, rely on timeout-based expiry
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn is_held(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .is_some_and(|t| now.duration_since(*t) < HOLD_TIMEOUT)
    }

    fn any_held(&self, codes: &[KeyCode], now: Instant) -> bool {
        codes.iter().any(|c| self.is_held(*c, now))
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    /// Intents for this tick. Left wins when both directions are held.
    pub fn frame_input(&self) -> FrameInput {
        self.frame_input_at(Instant::now())
    }

    fn frame_input_at(&self, now: Instant) -> FrameInput {
        let movement = if self.any_held(KEYS_LEFT, now) {
            Some(MoveDir::Left)
        } else if self.any_held(KEYS_RIGHT, now) {
            Some(MoveDir::Right)
        } else {
            None
        };
        FrameInput { movement, jump: self.any_held(KEYS_JUMP, now) }
    }

    /// Meta command pressed this frame, if any.
    pub fn command(&self) -> Option<Command> {
        if self.ctrl_c || self.any_pressed(KEYS_QUIT) {
            Some(Command::Quit)
        } else if self.any_pressed(&[KeyCode::Esc]) {
            Some(Command::ReturnToMenu)
        } else if self.any_pressed(KEYS_RESET) {
            Some(Command::Reset)
        } else if self.any_pressed(KEYS_CONFIRM) {
            Some(Command::Confirm)
        } else if self.any_pressed(KEYS_PAN_LEFT) {
            Some(Command::PanLeft)
        } else if self.any_pressed(KEYS_PAN_RIGHT) {
            Some(Command::PanRight)
        } else if self.any_pressed(KEYS_ZOOM_IN) {
            Some(Command::ZoomIn)
        } else if self.any_pressed(KEYS_ZOOM_OUT) {
            Some(Command::ZoomOut)
        } else if self.any_pressed(KEYS_CAMERA_RESET) {
            Some(Command::CameraReset)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn held_keys_become_intents() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.apply_key(press(KeyCode::Right), now);
        input.apply_key(press(KeyCode::Char(' ')), now);
        let fi = input.frame_input_at(now);
        assert_eq!(fi.movement, Some(MoveDir::Right));
        assert!(fi.jump);
    }

    #[test]
    fn keys_expire_without_release_events() {
        let mut input = InputState::new();
        let then = Instant::now();
        input.apply_key(press(KeyCode::Left), then);
        let later = then + HOLD_TIMEOUT + Duration::from_millis(1);
        assert_eq!(input.frame_input_at(later), FrameInput::default());
    }

    #[test]
    fn release_honored_only_with_enhancement() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.apply_key(press(KeyCode::Left), now);
        input.apply_key(release(KeyCode::Left), now);
        assert_eq!(input.frame_input_at(now).movement, Some(MoveDir::Left));

        input.honor_release = true;
        input.apply_key(release(KeyCode::Left), now);
        assert_eq!(input.frame_input_at(now).movement, None);
    }

    #[test]
    fn repeat_press_is_not_fresh() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.apply_key(press(KeyCode::Char('r')), now);
        assert_eq!(input.command(), Some(Command::Reset));
        input.fresh_presses.clear();
        input.apply_key(press(KeyCode::Char('r')), now);
        assert_eq!(input.command(), None);
    }

    #[test]
    fn camera_keys_map_to_commands() {
        let mut input = InputState::new();
        input.apply_key(press(KeyCode::Char('-')), Instant::now());
        assert_eq!(input.command(), Some(Command::ZoomOut));
        input.fresh_presses.clear();
        input.apply_key(press(KeyCode::Char('J')), Instant::now());
        assert_eq!(input.command(), Some(Command::PanLeft));
    }

    #[test]
    fn ctrl_c_quits() {
        let mut input = InputState::new();
        input.apply_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert_eq!(input.command(), Some(Command::Quit));
    }
}
