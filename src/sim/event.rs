/// Events emitted while the session processes input or timers.
/// The presentation layer consumes these for sound and shell output.

use crate::domain::effect::EffectKind;
use crate::sim::mode::Mode;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(dead_code)]
pub enum SessionEvent {
    EffectStarted(EffectKind),
    EffectCleared(EffectKind),
    /// Play the activation tone.
    AudioCue,
    ModeChanged { from: Mode, to: Mode },
    ProgressReset,
}
