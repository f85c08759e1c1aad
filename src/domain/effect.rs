/// Per-symbol effects and the actions the sequence detector emits.
///
/// Every symbol maps to exactly one `Effect` through an exhaustive match,
/// so adding a symbol without deciding its effect fails to compile.

use std::time::Duration;

use crate::config::TimingConfig;
use crate::domain::symbol::Symbol;

/// Visual flags the renderer reacts to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum EffectKind {
    GlitchLine,
    Flash,
    Trail,
    Matrix,
}

impl EffectKind {
    pub fn label(self) -> &'static str {
        match self {
            EffectKind::GlitchLine => "glitch",
            EffectKind::Flash => "flash",
            EffectKind::Trail => "trail",
            EffectKind::Matrix => "matrix",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    /// Flag that clears itself after its configured duration.
    Transient(EffectKind),
    /// Flag that stays on until a reset, cancel or activation.
    Persistent(EffectKind),
    /// Fire-and-forget activation tone.
    AudioCue,
    Inert,
}

impl Effect {
    pub fn for_symbol(symbol: Symbol) -> Effect {
        match symbol {
            Symbol::Z => Effect::Transient(EffectKind::GlitchLine),
            Symbol::E => Effect::Transient(EffectKind::Flash),
            Symbol::N => Effect::AudioCue,
            Symbol::I => Effect::Persistent(EffectKind::Trail),
            Symbol::T => Effect::Transient(EffectKind::Matrix),
            Symbol::H => Effect::Inert,
            // Completion is carried by Action::ActivateMode.
            Symbol::One => Effect::Inert,
        }
    }
}

/// How long a transient flag stays up. None for flags without a timer.
pub fn effect_duration(kind: EffectKind, timing: &TimingConfig) -> Option<Duration> {
    match kind {
        EffectKind::GlitchLine => Some(Duration::from_millis(timing.glitch_line_ms)),
        EffectKind::Flash => Some(Duration::from_millis(timing.flash_ms)),
        EffectKind::Matrix => Some(Duration::from_millis(timing.matrix_ms)),
        EffectKind::Trail => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Effect(Effect),
    /// Drop every active effect flag and its timer.
    ClearEffects,
    ActivateMode,
    /// Clear effects, drop all timers and force Normal mode.
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::TARGET_SEQUENCE;

    #[test]
    fn only_n_plays_audio() {
        let cues: Vec<Symbol> = TARGET_SEQUENCE
            .iter()
            .copied()
            .filter(|s| Effect::for_symbol(*s) == Effect::AudioCue)
            .collect();
        assert_eq!(cues, vec![Symbol::N]);
    }

    #[test]
    fn transient_kinds_have_durations() {
        let timing = TimingConfig::default();
        for sym in TARGET_SEQUENCE {
            if let Effect::Transient(kind) = Effect::for_symbol(sym) {
                assert!(effect_duration(kind, &timing).is_some(), "{kind:?}");
            }
        }
        assert_eq!(effect_duration(EffectKind::Trail, &timing), None);
    }

    #[test]
    fn default_durations() {
        let timing = TimingConfig::default();
        assert_eq!(effect_duration(EffectKind::GlitchLine, &timing), Some(Duration::from_millis(800)));
        assert_eq!(effect_duration(EffectKind::Flash, &timing), Some(Duration::from_millis(500)));
        assert_eq!(effect_duration(EffectKind::Matrix, &timing), Some(Duration::from_millis(1500)));
    }
}
