/// External configuration loader.
///
/// Reads `config.toml` from an explicit path, or searches the executable's
/// directory and then the CWD. Falls back to defaults if the file is
/// missing, unreadable or malformed.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

// ── Errors ──

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid colour {0:?}, expected #RRGGBB")]
    InvalidColor(String),
}

// ── Public Config Struct ──

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub timing: TimingConfig,
    pub theme: ThemeConfig,
    pub shell: ShellConfig,
    pub profile: ProfileConfig,
    pub general: GeneralConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Activating -> ZeroGravity delay.
    pub activation_delay_ms: u64,
    pub glitch_line_ms: u64,
    pub flash_ms: u64,
    pub matrix_ms: u64,
    /// Sleep between frames of the main loop.
    pub frame_ms: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Debug)]
pub struct ThemeConfig {
    pub normal_accent: Rgb,
    pub zero_gravity_accent: Rgb,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub history_limit: usize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub name: String,
    pub tagline: String,
    pub about: String,
    pub contact: Vec<String>,
    pub stack: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub sound: bool,
}

// ── TOML Schema ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    theme: TomlTheme,
    #[serde(default)]
    shell: ShellConfig,
    #[serde(default)]
    profile: ProfileConfig,
    #[serde(default)]
    general: GeneralConfig,
}

#[derive(Deserialize, Debug)]
struct TomlTheme {
    #[serde(default = "default_normal_accent")]
    normal_accent: String,
    #[serde(default = "default_zero_gravity_accent")]
    zero_gravity_accent: String,
}

// ── Defaults ──

fn default_normal_accent() -> String { "#00FFA3".into() }
fn default_zero_gravity_accent() -> String { "#BD00FF".into() }

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            activation_delay_ms: 800,
            glitch_line_ms: 800,
            flash_ms: 500,
            matrix_ms: 1500,
            frame_ms: 16,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            normal_accent: Rgb { r: 0x00, g: 0xFF, b: 0xA3 },
            zero_gravity_accent: Rgb { r: 0xBD, g: 0x00, b: 0xFF },
        }
    }
}

impl Default for TomlTheme {
    fn default() -> Self {
        TomlTheme {
            normal_accent: default_normal_accent(),
            zero_gravity_accent: default_zero_gravity_accent(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig { history_limit: 200 }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            name: "ZENITH".into(),
            tagline: "Creative engineer building high-fidelity digital experiences.".into(),
            about: "Zenith: creative engineer building high-fidelity digital experiences.".into(),
            contact: vec![
                "EMAIL: hello@example.com".into(),
                "GITHUB: github.com/example".into(),
                "LOCATION: Distributed Node".into(),
            ],
            stack: "TECH: Rust, crossterm, rodio, serde, tracing".into(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig { sound: true }
    }
}

// ── Colours ──

impl Rgb {
    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn parse(text: &str) -> Result<Rgb, ConfigError> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor(text.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ConfigError::InvalidColor(text.to_string()))
        };
        Ok(Rgb { r: channel(0)?, g: channel(2)?, b: channel(4)? })
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config from `explicit` if given, else search for `config.toml`.
    /// Any failure is logged and replaced by defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let toml_cfg = match explicit {
            Some(path) => read_config(path).unwrap_or_else(|e| {
                warn!("{e}; using default settings");
                TomlConfig::default()
            }),
            None => search_config(&candidate_dirs()),
        };
        Self::from_toml(toml_cfg)
    }

    /// Parse a TOML document directly.
    #[cfg(test)]
    fn from_str(text: &str) -> Result<Self, toml::de::Error> {
        Ok(Self::from_toml(toml::from_str(text)?))
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let defaults = ThemeConfig::default();
        let normal_accent = Rgb::parse(&toml_cfg.theme.normal_accent).unwrap_or_else(|e| {
            warn!("theme.normal_accent: {e}");
            defaults.normal_accent
        });
        let zero_gravity_accent = Rgb::parse(&toml_cfg.theme.zero_gravity_accent)
            .unwrap_or_else(|e| {
                warn!("theme.zero_gravity_accent: {e}");
                defaults.zero_gravity_accent
            });

        let mut shell = toml_cfg.shell;
        shell.history_limit = shell.history_limit.max(1);

        AppConfig {
            timing: toml_cfg.timing,
            theme: ThemeConfig { normal_accent, zero_gravity_accent },
            shell,
            profile: toml_cfg.profile,
            general: toml_cfg.general,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn read_config(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<TomlConfig>(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// First readable config.toml in the candidate directories wins.
fn search_config(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match read_config(&path) {
            Ok(cfg) => {
                info!(path = %path.display(), "loaded config");
                return cfg;
            }
            Err(e @ ConfigError::Parse { .. }) => {
                warn!("{e}; using default settings");
                return TomlConfig::default();
            }
            Err(e) => warn!("{e}"),
        }
    }
    TomlConfig::default()
}
