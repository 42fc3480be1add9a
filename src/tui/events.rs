//! Terminal event polling
//!
//! The application is driven by a single blocking poll with a fixed tick:
//! key presses and resizes are forwarded, everything else (focus, paste,
//! mouse) is ignored, and a quiet interval yields a tick so the UI stays
//! responsive while the user reads results.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

/// Events the application reacts to
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press
    Key(KeyEvent),
    /// Window resize
    Resize(u16, u16),
    /// Nothing happened within the tick interval
    Tick,
    /// Ctrl+C / Ctrl+Q pressed anywhere
    Quit,
}

/// Blocking event source with a fixed tick interval
pub struct EventLoop {
    tick: Duration,
}

impl EventLoop {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    /// Wait up to one tick for the next event
    pub fn poll_event(&self) -> Result<Option<TuiEvent>> {
        if !event::poll(self.tick)? {
            return Ok(Some(TuiEvent::Tick));
        }

        let event = match event::read()? {
            Event::Key(key) if is_quit_chord(&key) => TuiEvent::Quit,
            Event::Key(key) => TuiEvent::Key(key),
            Event::Resize(w, h) => TuiEvent::Resize(w, h),
            _ => TuiEvent::Tick,
        };

        Ok(Some(event))
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

/// Ctrl+C or Ctrl+Q quits from any page
fn is_quit_chord(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn test_quit_chords() {
        assert!(is_quit_chord(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(is_quit_chord(&key(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert!(!is_quit_chord(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_chord(&key(KeyCode::Char('x'), KeyModifiers::CONTROL)));
        assert!(!is_quit_chord(&key(KeyCode::Esc, KeyModifiers::NONE)));
    }
}
