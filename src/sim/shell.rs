/// Footer shell widget: a tiny command prompt with scrollback.
///
/// Commands are parsed into a closed `Command` enum. `zenith 1` calls
/// `Session::activate`, the same entry point the key sequence uses.
/// Input is refused while the zero-gravity accent is showing, which covers
/// the activation window of a re-entry too.

use std::collections::VecDeque;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::config::{ProfileConfig, ShellConfig};
use crate::domain::symbol::TARGET_SEQUENCE;
use crate::sim::event::SessionEvent;
use crate::sim::mode::{Accent, Mode};
use crate::sim::session::Session;

const BOOT_BANNER: [&str; 4] = [
    "System initialization complete.",
    "Atmospheric shaders: ONLINE",
    "Physics engine: STABLE",
    "Type \"--help\" or \"zenith 1\" to begin.",
];

const LOCKDOWN: [&str; 3] = [
    ">> WARNING: GRAVITY_ENGINE_FAILURE",
    ">> SYSTEM_OVERRIDE_ACTIVE",
    ">> INPUT_LOCKED",
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Help,
    Contact,
    About,
    Clear,
    Status,
    Stack,
    Zenith,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("'{0}' is not recognized. Try '--help'")]
    Unrecognized(String),
}

impl Command {
    /// Parse a trimmed, lowercased line. Empty input parses to None.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let normalized = line.trim().to_lowercase();
        let cmd = match normalized.as_str() {
            "" => return Ok(None),
            "--help" => Command::Help,
            "--contact" => Command::Contact,
            "--about" => Command::About,
            "--clear" => Command::Clear,
            "--status" => Command::Status,
            "--stack" => Command::Stack,
            "zenith 1" => Command::Zenith,
            _ => return Err(CommandError::Unrecognized(line.to_string())),
        };
        Ok(Some(cmd))
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Help => "--help",
            Command::Contact => "--contact",
            Command::About => "--about",
            Command::Clear => "--clear",
            Command::Status => "--status",
            Command::Stack => "--stack",
            Command::Zenith => "zenith 1",
        }
    }
}

pub struct Shell {
    history: VecDeque<String>,
    input: String,
    limit: usize,
    profile: ProfileConfig,
    /// Lockdown banner already printed for the current zero-gravity stint.
    lockdown_shown: bool,
}

impl Shell {
    pub fn new(config: &ShellConfig, profile: ProfileConfig) -> Self {
        let mut shell = Shell {
            history: VecDeque::new(),
            input: String::new(),
            limit: config.history_limit.max(1),
            profile,
            lockdown_shown: false,
        };
        for line in BOOT_BANNER {
            shell.push(line);
        }
        shell
    }

    pub fn history(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.history.iter().map(String::as_str)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn type_char(&mut self, c: char, session: &Session) {
        if is_locked(session) || c.is_control() {
            return;
        }
        self.input.push(c);
    }

    pub fn backspace(&mut self, session: &Session) {
        if !is_locked(session) {
            self.input.pop();
        }
    }

    /// Run the current input line. Returns session events if the command
    /// touched the session.
    pub fn submit(&mut self, session: &mut Session, now: Duration) -> Vec<SessionEvent> {
        if is_locked(session) {
            return vec![];
        }
        let raw = std::mem::take(&mut self.input);
        match Command::parse(&raw) {
            Ok(None) => vec![],
            Ok(Some(cmd)) => {
                info!(command = cmd.name(), "shell command");
                self.run(cmd, session, now)
            }
            Err(e) => {
                self.push(format!("> {raw}"));
                self.push(format!("Error: {e}"));
                vec![]
            }
        }
    }

    /// Shell reaction to session events.
    pub fn observe(&mut self, events: &[SessionEvent]) {
        for event in events {
            match event {
                SessionEvent::ModeChanged { to: Mode::ZeroGravity, .. } if !self.lockdown_shown => {
                    for line in LOCKDOWN {
                        self.push(line);
                    }
                    self.lockdown_shown = true;
                }
                SessionEvent::ModeChanged { to: Mode::Normal, .. } => self.lockdown_shown = false,
                _ => {}
            }
        }
    }

    fn run(&mut self, cmd: Command, session: &mut Session, now: Duration) -> Vec<SessionEvent> {
        if cmd != Command::Clear {
            self.push(format!("> {}", cmd.name()));
        }
        match cmd {
            Command::Clear => self.history.clear(),
            Command::Help => {
                self.push("Available: --contact, --about, --clear, --status, --stack, zenith 1");
            }
            Command::Contact => {
                for line in self.profile.contact.clone() {
                    self.push(line);
                }
            }
            Command::About => {
                let about = self.profile.about.clone();
                self.push(about);
            }
            Command::Status => {
                self.push("CORE: Operational");
                self.push(format!("MODE: {:?}", session.mode()));
                self.push(format!("SEQUENCE: {}/{}", session.progress(), TARGET_SEQUENCE.len()));
                let effects: Vec<&str> = session.active_effects().map(|k| k.label()).collect();
                if !effects.is_empty() {
                    self.push(format!("EFFECTS: {}", effects.join(", ")));
                }
            }
            Command::Stack => {
                let stack = self.profile.stack.clone();
                self.push(stack);
            }
            Command::Zenith => {
                self.push("INITIALIZING_QUANTUM_OVERRIDE...");
                self.push("BYPASSING_GRAVITY_LOCKS...");
                return session.activate(now);
            }
        }
        vec![]
    }

    fn push(&mut self, line: impl Into<String>) {
        self.history.push_back(line.into());
        while self.history.len() > self.limit {
            self.history.pop_front();
        }
    }
}

fn is_locked(session: &Session) -> bool {
    session.accent() == Accent::ZeroGravity
}
