/// Keyboard reader.
///
/// Drains pending crossterm events without blocking and turns key presses
/// into `KeyStroke`s, preserving arrival order. Release and Repeat events
/// are dropped so a held key is not typed twice into the sequence.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyStroke {
    /// Printable character: goes to both the sequence detector and the shell.
    Char(char),
    Cancel,
    Backspace,
    Submit,
    Quit,
}

pub struct InputState {
    /// Strokes collected by the most recent `drain_events()`, in order.
    strokes: Vec<KeyStroke>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { strokes: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.strokes.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(stroke) = translate(key) {
                    self.strokes.push(stroke);
                }
            }
        }
    }

    pub fn strokes(&self) -> &[KeyStroke] {
        &self.strokes
    }
}

/// Map one terminal key event to a stroke. Non-press events and keys with
/// no meaning here yield None.
pub fn translate(key: KeyEvent) -> Option<KeyStroke> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(KeyStroke::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Esc => Some(KeyStroke::Cancel),
        KeyCode::Enter => Some(KeyStroke::Submit),
        KeyCode::Backspace => Some(KeyStroke::Backspace),
        KeyCode::Char(c) if !c.is_control() => Some(KeyStroke::Char(c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent { code, modifiers, kind, state: KeyEventState::NONE }
    }

    fn press(code: KeyCode) -> KeyEvent {
        key(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    #[test]
    fn printable_chars_pass_through() {
        assert_eq!(translate(press(KeyCode::Char('z'))), Some(KeyStroke::Char('z')));
        assert_eq!(
            translate(key(KeyCode::Char('Z'), KeyModifiers::SHIFT, KeyEventKind::Press)),
            Some(KeyStroke::Char('Z'))
        );
        assert_eq!(translate(press(KeyCode::Char(' '))), Some(KeyStroke::Char(' ')));
    }

    #[test]
    fn escape_cancels() {
        assert_eq!(translate(press(KeyCode::Esc)), Some(KeyStroke::Cancel));
    }

    #[test]
    fn ctrl_c_quits_and_other_chords_are_dropped() {
        assert_eq!(
            translate(key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press)),
            Some(KeyStroke::Quit)
        );
        assert_eq!(
            translate(key(KeyCode::Char('z'), KeyModifiers::CONTROL, KeyEventKind::Press)),
            None
        );
    }

    #[test]
    fn releases_and_repeats_are_ignored() {
        assert_eq!(
            translate(key(KeyCode::Char('z'), KeyModifiers::NONE, KeyEventKind::Release)),
            None
        );
        assert_eq!(
            translate(key(KeyCode::Char('z'), KeyModifiers::NONE, KeyEventKind::Repeat)),
            None
        );
    }

    #[test]
    fn navigation_keys_are_ignored() {
        assert_eq!(translate(press(KeyCode::Left)), None);
        assert_eq!(translate(press(KeyCode::F(1))), None);
    }
}
