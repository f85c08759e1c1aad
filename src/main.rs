/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use domain::symbol::KeyInput;
use sim::event::SessionEvent;
use sim::session::Session;
use sim::shell::Shell;
use ui::input::{InputState, KeyStroke};
use ui::renderer::{FpsCounter, Renderer, View};
use ui::sound::SoundEngine;

#[derive(Parser, Debug)]
#[command(name = "zenith", version, about = "Terminal portfolio with a zero-gravity easter egg")]
struct Cli {
    /// Path to config.toml (default: search exe dir, then CWD)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable audio
    #[arg(long)]
    mute: bool,

    /// Log file (the terminal itself is in raw mode)
    #[arg(long, default_value = "zenith.log")]
    log_file: PathBuf,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_file, &cli.log_level) {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    let config = AppConfig::load(cli.config.as_deref());

    let mut session = Session::new(config.timing.clone());
    let mut shell = Shell::new(&config.shell, config.profile.clone());

    let sound = if config.general.sound && !cli.mute {
        let engine = SoundEngine::new();
        if engine.is_none() {
            warn!("no audio output device; continuing without sound");
        }
        engine
    } else {
        None
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    info!("session started");
    let result = frame_loop(&mut session, &mut shell, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
    }
    info!("session ended");
}

fn init_logging(path: &Path, level: &str) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
}

fn frame_loop(
    session: &mut Session,
    shell: &mut Shell,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let mut input = InputState::new();
    let start = Instant::now();
    let mut fps = FpsCounter::new(start);
    let frame_sleep = Duration::from_millis(config.timing.frame_ms);
    let mut tick: u64 = 0;

    loop {
        input.drain_events();

        // Keys first, in arrival order, then timers: a cancel in the same
        // frame as a due activation wins.
        let now = start.elapsed();
        for stroke in input.strokes() {
            let events = match *stroke {
                KeyStroke::Quit => return Ok(()),
                KeyStroke::Cancel => session.handle_key(KeyInput::Cancel, now),
                KeyStroke::Char(c) => {
                    shell.type_char(c, session);
                    session.handle_key(KeyInput::Char(c), now)
                }
                KeyStroke::Backspace => {
                    shell.backspace(session);
                    vec![]
                }
                KeyStroke::Submit => shell.submit(session, now),
            };
            dispatch(&events, shell, sound);
        }

        let events = session.tick(start.elapsed());
        dispatch(&events, shell, sound);

        let view = View {
            session,
            shell,
            profile: &config.profile,
            theme: &config.theme,
            fps: fps.frame(Instant::now()),
            tick,
        };
        renderer.render(&view).context("render failed")?;

        tick = tick.wrapping_add(1);
        std::thread::sleep(frame_sleep);
    }
}

/// Fan session events out to the shell and the sound engine.
fn dispatch(events: &[SessionEvent], shell: &mut Shell, sound: Option<&SoundEngine>) {
    shell.observe(events);
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        if let SessionEvent::AudioCue = event {
            sfx.play_activation();
        }
    }
}
