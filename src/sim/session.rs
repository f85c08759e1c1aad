/// Session: the single owner of sequence progress, mode and effect flags.
///
/// Everything else (renderer, shell, sound) reads through `&Session` and
/// reacts to the returned `SessionEvent`s. All mutation happens through
/// `handle_key`, `activate`, `cancel` and `tick`, each of which fully
/// applies its transition before returning.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::debug;

use crate::config::TimingConfig;
use crate::domain::effect::{effect_duration, Action, Effect, EffectKind};
use crate::domain::symbol::KeyInput;
use crate::sim::detector::{handle_input, SequenceState};
use crate::sim::event::SessionEvent;
use crate::sim::mode::{Accent, Backdrop, Mode, ModeController};
use crate::sim::timers::{TimerKey, TimerRegistry};

pub struct Session {
    sequence: SequenceState,
    mode: ModeController,
    timers: TimerRegistry,
    effects: BTreeSet<EffectKind>,
    timing: TimingConfig,
}

// ── Read-only view ──

impl Session {
    pub fn mode(&self) -> Mode { self.mode.mode() }
    pub fn accent(&self) -> Accent { self.mode.accent() }
    pub fn backdrop(&self) -> Backdrop { self.mode.backdrop() }
    pub fn progress(&self) -> usize { self.sequence.progress() }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.contains(&kind)
    }

    pub fn active_effects(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.effects.iter().copied()
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

// ── Transitions ──

impl Session {
    pub fn new(timing: TimingConfig) -> Self {
        Session {
            sequence: SequenceState::new(),
            mode: ModeController::new(Duration::from_millis(timing.activation_delay_ms)),
            timers: TimerRegistry::new(),
            effects: BTreeSet::new(),
            timing,
        }
    }

    /// Feed one key through the sequence detector and apply its actions.
    pub fn handle_key(&mut self, input: KeyInput, now: Duration) -> Vec<SessionEvent> {
        let mut events = vec![];
        let (next, actions) = handle_input(input, self.sequence);
        if next.progress() == 0 {
            self.reset_progress(&mut events);
        } else if next != self.sequence {
            self.sequence = next;
            debug!(progress = next.progress(), "sequence advanced");
        }
        for action in actions {
            self.apply(action, now, &mut events);
        }
        events
    }

    /// Start the two-phase transition into zero-gravity. Also the entry
    /// point for the shell's `zenith 1` command.
    pub fn activate(&mut self, now: Duration) -> Vec<SessionEvent> {
        let mut events = vec![];
        self.enter_activating(now, &mut events);
        events
    }

    /// Drop every timer and effect and return to Normal.
    pub fn cancel(&mut self) -> Vec<SessionEvent> {
        let mut events = vec![];
        self.cancel_into(&mut events);
        events
    }

    /// Fire every timer due at `now`.
    pub fn tick(&mut self, now: Duration) -> Vec<SessionEvent> {
        let mut events = vec![];
        for key in self.timers.expire(now) {
            match key {
                TimerKey::ModeActivation => {
                    if self.mode.complete() {
                        events.push(SessionEvent::ModeChanged {
                            from: Mode::Activating,
                            to: Mode::ZeroGravity,
                        });
                    }
                }
                TimerKey::Effect(kind) => {
                    if self.effects.remove(&kind) {
                        events.push(SessionEvent::EffectCleared(kind));
                    }
                }
            }
        }
        events
    }

    fn apply(&mut self, action: Action, now: Duration, events: &mut Vec<SessionEvent>) {
        match action {
            Action::Effect(Effect::Transient(kind)) => {
                self.start_effect(kind, events);
                if let Some(delay) = effect_duration(kind, &self.timing) {
                    self.timers.schedule(TimerKey::Effect(kind), now, delay);
                }
            }
            Action::Effect(Effect::Persistent(kind)) => self.start_effect(kind, events),
            Action::Effect(Effect::AudioCue) => events.push(SessionEvent::AudioCue),
            Action::Effect(Effect::Inert) => {}
            Action::ClearEffects => self.clear_effects(events),
            Action::ActivateMode => self.enter_activating(now, events),
            Action::Cancel => self.cancel_into(events),
        }
    }

    fn enter_activating(&mut self, now: Duration, events: &mut Vec<SessionEvent>) {
        self.clear_effects(events);
        self.reset_progress(events);
        let from = self.mode.activate(now, &mut self.timers);
        if from != Mode::Activating {
            events.push(SessionEvent::ModeChanged { from, to: Mode::Activating });
        }
    }

    fn cancel_into(&mut self, events: &mut Vec<SessionEvent>) {
        self.clear_effects(events);
        self.timers.cancel_all();
        self.reset_progress(events);
        if let Some(from) = self.mode.cancel(&mut self.timers) {
            events.push(SessionEvent::ModeChanged { from, to: Mode::Normal });
        }
    }

    fn start_effect(&mut self, kind: EffectKind, events: &mut Vec<SessionEvent>) {
        self.effects.insert(kind);
        events.push(SessionEvent::EffectStarted(kind));
    }

    fn clear_effects(&mut self, events: &mut Vec<SessionEvent>) {
        self.timers.cancel_effects();
        for kind in std::mem::take(&mut self.effects) {
            events.push(SessionEvent::EffectCleared(kind));
        }
    }

    fn reset_progress(&mut self, events: &mut Vec<SessionEvent>) {
        if self.sequence.progress() > 0 {
            self.sequence = SequenceState::new();
            events.push(SessionEvent::ProgressReset);
            debug!("sequence reset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn session() -> Session {
        Session::new(TimingConfig::default())
    }

    fn type_str(s: &mut Session, text: &str, now: Duration) -> Vec<SessionEvent> {
        let mut events = vec![];
        for c in text.chars() {
            events.extend(s.handle_key(KeyInput::Char(c), now));
        }
        events
    }

    fn reach_zero_gravity(s: &mut Session, start: Duration) {
        type_str(s, "ZENITH1", start);
        s.tick(start + ms(800));
        assert_eq!(s.mode(), Mode::ZeroGravity);
    }

    #[test]
    fn full_sequence_activates_then_settles() {
        let mut s = session();
        let events = type_str(&mut s, "ZENITH1", ms(0));
        assert_eq!(s.mode(), Mode::Activating);
        assert_eq!(s.progress(), 0);
        assert!(events.contains(&SessionEvent::ModeChanged {
            from: Mode::Normal,
            to: Mode::Activating
        }));

        assert!(s.tick(ms(799)).iter().all(|e| !matches!(e, SessionEvent::ModeChanged { .. })));
        assert_eq!(s.accent(), Accent::Normal);

        let events = s.tick(ms(800));
        assert_eq!(
            events,
            vec![SessionEvent::ModeChanged { from: Mode::Activating, to: Mode::ZeroGravity }]
        );
        assert_eq!(s.accent(), Accent::ZeroGravity);
        assert_eq!(s.backdrop(), Backdrop::Scanline);
    }

    #[test]
    fn lowercase_sequence_behaves_identically() {
        let mut upper = session();
        let mut lower = session();
        let a = type_str(&mut upper, "ZENITH1", ms(0));
        let b = type_str(&mut lower, "zenith1", ms(0));
        assert_eq!(a, b);
        assert_eq!(upper.tick(ms(800)), lower.tick(ms(800)));
        assert_eq!(upper.mode(), lower.mode());
    }

    #[test]
    fn wrong_final_symbol_resets_without_activation() {
        let mut s = session();
        type_str(&mut s, "ZENITH", ms(0));
        assert_eq!(s.progress(), 6);
        assert!(s.has_effect(EffectKind::Trail));

        let events = s.handle_key(KeyInput::Char('x'), ms(10));
        assert_eq!(s.progress(), 0);
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(s.active_effects().count(), 0);
        assert!(events.contains(&SessionEvent::ProgressReset));
        assert_eq!(s.pending_timers(), 0);
    }

    #[test]
    fn ignored_inputs_never_move_progress() {
        let mut s = session();
        type_str(&mut s, "ZEN", ms(0));
        for _ in 0..50 {
            type_str(&mut s, " -_", ms(1));
        }
        assert_eq!(s.progress(), 3);
    }

    #[test]
    fn spaced_sequence_still_activates() {
        let mut s = session();
        type_str(&mut s, "zenith 1", ms(0));
        assert_eq!(s.mode(), Mode::Activating);
    }

    #[test]
    fn transient_effects_expire_on_their_own() {
        let mut s = session();
        type_str(&mut s, "ZE", ms(0));
        assert!(s.has_effect(EffectKind::GlitchLine));
        assert!(s.has_effect(EffectKind::Flash));

        assert_eq!(s.tick(ms(500)), vec![SessionEvent::EffectCleared(EffectKind::Flash)]);
        assert!(s.has_effect(EffectKind::GlitchLine));
        assert_eq!(s.tick(ms(800)), vec![SessionEvent::EffectCleared(EffectKind::GlitchLine)]);
        assert_eq!(s.progress(), 2);
    }

    #[test]
    fn n_requests_audio_cue() {
        let mut s = session();
        let events = type_str(&mut s, "ZEN", ms(0));
        assert_eq!(events.iter().filter(|e| **e == SessionEvent::AudioCue).count(), 1);
    }

    #[test]
    fn activation_clears_lingering_effects() {
        let mut s = session();
        type_str(&mut s, "ZENIT", ms(0));
        assert!(s.has_effect(EffectKind::Matrix));
        type_str(&mut s, "H1", ms(100));
        assert_eq!(s.active_effects().count(), 0);
        assert_eq!(s.pending_timers(), 1); // only the mode timer
        // Effect timers were dropped, so nothing but the mode flip fires later.
        assert_eq!(
            s.tick(ms(2000)),
            vec![SessionEvent::ModeChanged { from: Mode::Activating, to: Mode::ZeroGravity }]
        );
    }

    #[test]
    fn cancel_during_activation_prevents_late_transition() {
        let mut s = session();
        type_str(&mut s, "ZENITH1", ms(0));
        let events = s.handle_key(KeyInput::Cancel, ms(400));
        assert_eq!(
            events,
            vec![SessionEvent::ModeChanged { from: Mode::Activating, to: Mode::Normal }]
        );
        assert!(s.tick(ms(800)).is_empty());
        assert!(s.tick(ms(10_000)).is_empty());
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(s.accent(), Accent::Normal);
    }

    #[test]
    fn cancel_in_same_frame_as_due_activation_wins() {
        let mut s = session();
        s.activate(ms(0));
        // Frame order: keys first, then timers, both at the same instant.
        let events = s.handle_key(KeyInput::Cancel, ms(900));
        assert_eq!(
            events,
            vec![SessionEvent::ModeChanged { from: Mode::Activating, to: Mode::Normal }]
        );
        assert!(s.tick(ms(900)).is_empty());
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(s.accent(), Accent::Normal);
    }

    #[test]
    fn second_activation_does_not_postpone_arrival() {
        let mut s = session();
        type_str(&mut s, "zenith 1", ms(0));
        assert!(s.activate(ms(500)).is_empty());
        assert_eq!(
            s.tick(ms(800)),
            vec![SessionEvent::ModeChanged { from: Mode::Activating, to: Mode::ZeroGravity }]
        );
        assert!(s.tick(ms(1300)).is_empty());
    }

    #[test]
    fn cancel_mid_sequence_clears_everything() {
        let mut s = session();
        type_str(&mut s, "ZENIT", ms(0));
        s.handle_key(KeyInput::Cancel, ms(10));
        assert_eq!(s.progress(), 0);
        assert_eq!(s.active_effects().count(), 0);
        assert_eq!(s.pending_timers(), 0);
    }

    #[test]
    fn cancel_in_normal_is_noop() {
        let mut s = session();
        assert!(s.cancel().is_empty());
        assert_eq!(s.mode(), Mode::Normal);
    }

    #[test]
    fn reactivation_from_zero_gravity_uses_plain_backdrop() {
        let mut s = session();
        reach_zero_gravity(&mut s, ms(0));
        assert_eq!(s.backdrop(), Backdrop::Scanline);

        let events = s.activate(ms(1000));
        assert_eq!(
            events,
            vec![SessionEvent::ModeChanged { from: Mode::ZeroGravity, to: Mode::Activating }]
        );
        s.tick(ms(1800));
        assert_eq!(s.mode(), Mode::ZeroGravity);
        assert_eq!(s.backdrop(), Backdrop::Plain);
    }

    #[test]
    fn activate_cancel_activate_round_trip() {
        let mut s = session();
        s.activate(ms(0));
        s.cancel();
        s.activate(ms(100));
        s.tick(ms(899));
        assert_eq!(s.mode(), Mode::Activating);
        s.tick(ms(900));
        assert_eq!(s.mode(), Mode::ZeroGravity);
        assert_eq!(s.backdrop(), Backdrop::Scanline);
    }

    #[test]
    fn activate_resets_partial_progress() {
        let mut s = session();
        type_str(&mut s, "ZEN", ms(0));
        let events = s.activate(ms(10));
        assert!(events.contains(&SessionEvent::ProgressReset));
        assert_eq!(s.progress(), 0);
    }
}
