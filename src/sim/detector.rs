/// Sequence detector: matches key input against `TARGET_SEQUENCE`.
///
/// Pure function over `(input, state)`. Side effects are returned as
/// `Action`s for the session to apply.

use crate::domain::effect::{Action, Effect};
use crate::domain::symbol::{is_ignored, KeyInput, Symbol, TARGET_SEQUENCE};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SequenceState {
    progress: usize,
}

impl SequenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of symbols matched contiguously from the start.
    pub fn progress(&self) -> usize {
        self.progress
    }

    /// The symbol that would advance progress next.
    pub fn expected(&self) -> Option<Symbol> {
        TARGET_SEQUENCE.get(self.progress).copied()
    }
}

pub fn handle_input(input: KeyInput, state: SequenceState) -> (SequenceState, Vec<Action>) {
    let c = match input {
        KeyInput::Cancel => return (SequenceState::new(), vec![Action::Cancel]),
        KeyInput::Char(c) => c,
    };

    match (Symbol::from_char(c), state.expected()) {
        (Some(sym), Some(expected)) if sym == expected => {
            let next = SequenceState { progress: state.progress + 1 };
            let mut actions = vec![Action::Effect(Effect::for_symbol(sym))];
            if next.progress == TARGET_SEQUENCE.len() {
                actions.push(Action::ActivateMode);
            }
            (next, actions)
        }
        _ if is_ignored(c) => (state, vec![]),
        _ if state.progress > 0 => (SequenceState::new(), vec![Action::ClearEffects]),
        _ => (state, vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::effect::EffectKind;

    fn feed(state: SequenceState, text: &str) -> (SequenceState, Vec<Action>) {
        let mut state = state;
        let mut all = vec![];
        for c in text.chars() {
            let (next, actions) = handle_input(KeyInput::Char(c), state);
            state = next;
            all.extend(actions);
        }
        (state, all)
    }

    #[test]
    fn match_advances_and_emits_effect() {
        let (s, actions) = handle_input(KeyInput::Char('Z'), SequenceState::new());
        assert_eq!(s.progress(), 1);
        assert_eq!(actions, vec![Action::Effect(Effect::Transient(EffectKind::GlitchLine))]);
    }

    #[test]
    fn full_sequence_requests_activation() {
        let (s, actions) = feed(SequenceState::new(), "ZENITH1");
        assert_eq!(s.progress(), TARGET_SEQUENCE.len());
        assert_eq!(actions.last(), Some(&Action::ActivateMode));
        assert_eq!(actions.iter().filter(|a| **a == Action::ActivateMode).count(), 1);
    }

    #[test]
    fn lowercase_matches_uppercase() {
        let (upper, upper_actions) = feed(SequenceState::new(), "ZENITH1");
        let (lower, lower_actions) = feed(SequenceState::new(), "zenith1");
        assert_eq!(upper, lower);
        assert_eq!(upper_actions, lower_actions);
    }

    #[test]
    fn ignored_inputs_leave_progress_alone() {
        let (s, _) = feed(SequenceState::new(), "ZEN");
        let (after, actions) = feed(s, "  --__ -_ ");
        assert_eq!(after.progress(), 3);
        assert!(actions.is_empty());
    }

    #[test]
    fn mismatch_with_progress_resets_and_clears() {
        let (s, _) = feed(SequenceState::new(), "ZENITH");
        let (after, actions) = handle_input(KeyInput::Char('x'), s);
        assert_eq!(after.progress(), 0);
        assert_eq!(actions, vec![Action::ClearEffects]);
    }

    #[test]
    fn mismatch_at_zero_is_silent() {
        let (after, actions) = handle_input(KeyInput::Char('E'), SequenceState::new());
        assert_eq!(after.progress(), 0);
        assert!(actions.is_empty());
    }

    #[test]
    fn out_of_order_symbol_resets_without_resync() {
        let (s, _) = feed(SequenceState::new(), "ZE");
        let (after, actions) = handle_input(KeyInput::Char('Z'), s);
        assert_eq!(after.progress(), 0);
        assert_eq!(actions, vec![Action::ClearEffects]);
    }

    #[test]
    fn wrong_last_symbol_never_activates() {
        let (_, actions) = feed(SequenceState::new(), "ZENITH2");
        assert!(!actions.contains(&Action::ActivateMode));
        assert_eq!(actions.last(), Some(&Action::ClearEffects));
    }

    #[test]
    fn cancel_resets_from_any_progress() {
        let (s, _) = feed(SequenceState::new(), "ZENI");
        let (after, actions) = handle_input(KeyInput::Cancel, s);
        assert_eq!(after.progress(), 0);
        assert_eq!(actions, vec![Action::Cancel]);

        let (idle, actions) = handle_input(KeyInput::Cancel, SequenceState::new());
        assert_eq!(idle.progress(), 0);
        assert_eq!(actions, vec![Action::Cancel]);
    }
}
