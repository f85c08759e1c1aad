/// Mode controller: Normal -> Activating -> ZeroGravity, with cancel back to Normal.
///
/// The activation delay lives in the shared `TimerRegistry` under
/// `TimerKey::ModeActivation`. Cancelling removes it in the same call, so a
/// late completion is impossible rather than merely ignored.

use std::time::Duration;

use tracing::info;

use crate::sim::timers::{TimerKey, TimerRegistry};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Normal,
    Activating,
    ZeroGravity,
}

/// Full-screen treatment behind the page.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Backdrop {
    Plain,
    /// Shown for the length of the activation delay.
    Blast,
    /// Stable zero-gravity backdrop on a first entry.
    Scanline,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Accent {
    Normal,
    ZeroGravity,
}

#[derive(Debug)]
pub struct ModeController {
    mode: Mode,
    backdrop: Backdrop,
    accent: Accent,
    /// Whether the pending activation started from ZeroGravity.
    reentry: bool,
    delay: Duration,
}

impl ModeController {
    pub fn new(delay: Duration) -> Self {
        ModeController {
            mode: Mode::Normal,
            backdrop: Backdrop::Plain,
            accent: Accent::Normal,
            reentry: false,
            delay,
        }
    }

    pub fn mode(&self) -> Mode { self.mode }
    pub fn backdrop(&self) -> Backdrop { self.backdrop }
    pub fn accent(&self) -> Accent { self.accent }
    #[cfg(test)]
    pub fn is_reentry(&self) -> bool { self.reentry }

    /// Enter Activating and arm the completion timer. Valid from any mode.
    /// While already Activating the first deadline stands. Returns the mode
    /// that was left.
    pub fn activate(&mut self, now: Duration, timers: &mut TimerRegistry) -> Mode {
        let from = self.mode;
        self.reentry = match from {
            Mode::ZeroGravity => true,
            Mode::Activating => self.reentry,
            Mode::Normal => false,
        };
        self.mode = Mode::Activating;
        self.backdrop = Backdrop::Blast;
        if from != Mode::Activating {
            timers.schedule(TimerKey::ModeActivation, now, self.delay);
        }
        info!(?from, reentry = self.reentry, "activating zero-gravity");
        from
    }

    /// Completion of the activation delay. Mode, backdrop and accent flip
    /// together. Returns false if there was nothing to complete.
    pub fn complete(&mut self) -> bool {
        if self.mode != Mode::Activating {
            return false;
        }
        self.mode = Mode::ZeroGravity;
        self.backdrop = if self.reentry { Backdrop::Plain } else { Backdrop::Scanline };
        self.accent = Accent::ZeroGravity;
        info!(backdrop = ?self.backdrop, "zero-gravity engaged");
        true
    }

    /// Return to Normal immediately. Idempotent. Returns the mode that was
    /// left, or None if already Normal.
    pub fn cancel(&mut self, timers: &mut TimerRegistry) -> Option<Mode> {
        timers.cancel(TimerKey::ModeActivation);
        if self.mode == Mode::Normal {
            return None;
        }
        let from = self.mode;
        self.mode = Mode::Normal;
        self.backdrop = Backdrop::Plain;
        self.accent = Accent::Normal;
        self.reentry = false;
        info!(?from, "zero-gravity cancelled");
        Some(from)
    }
}
