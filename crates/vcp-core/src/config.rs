//! Configuration management: TOML file with sensible defaults.
//!
//! Config file location: `%ProgramData%\VCP-Toggle\config.toml`
//! Falls back to compiled-in defaults if the file is missing or malformed.

use crate::error::RegistryError;
use crate::profile::{MonitorProfile, ProfileRegistry};
use crate::toggle::{BatchPolicy, MatchPolicy};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Path to the config directory.
pub fn config_dir() -> PathBuf {
    let program_data =
        std::env::var("ProgramData").unwrap_or_else(|_| r"C:\ProgramData".to_string());
    PathBuf::from(program_data).join("VCP-Toggle")
}

/// Full path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// How VCP requests reach the monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    /// Direct DDC/CI calls through the Monitor Configuration API.
    #[default]
    Native,
    /// Spawn an external command-line tool per request.
    External,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Native => "native",
            Transport::External => "external",
        }
    }
}

/// Where the external tool reports the value it read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueSource {
    /// The process exit code is the value (ControlMyMonitor `/GetValue`).
    #[default]
    ExitCode,
    /// The value is captured from stdout with `value_pattern`.
    Stdout,
}

impl ValueSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueSource::ExitCode => "exit-code",
            ValueSource::Stdout => "stdout",
        }
    }
}

/// Invocation templates for the external-tool transport.
///
/// Arguments may contain `{monitor}`, `{code}` and `{value}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalToolConfig {
    pub program: String,
    pub get_args: Vec<String>,
    pub set_args: Vec<String>,
    pub value_source: ValueSource,
    /// Regex with one capture group, applied to stdout when
    /// `value_source = "stdout"`.
    pub value_pattern: String,
}

impl Default for ExternalToolConfig {
    fn default() -> Self {
        Self {
            program: "ControlMyMonitor.exe".to_string(),
            get_args: vec![
                "/GetValue".to_string(),
                "{monitor}".to_string(),
                "{code}".to_string(),
            ],
            set_args: vec![
                "/SetValue".to_string(),
                "{monitor}".to_string(),
                "{code}".to_string(),
                "{value}".to_string(),
            ],
            value_source: ValueSource::ExitCode,
            value_pattern: r"(\d+)".to_string(),
        }
    }
}

/// Tool configuration with defaults for every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monitors to toggle, in batch order.
    pub profiles: Vec<MonitorProfile>,

    /// Native DDC/CI calls or an external tool.
    pub transport: Transport,

    /// Behaviour when several displays share a profile's height.
    pub ambiguous_match: MatchPolicy,

    /// Keep going after a failed profile when toggling all of them.
    pub continue_on_error: bool,

    /// Always write the status log file (same as passing `--log`).
    pub log_to_file: bool,

    /// Directory for status log files. Empty means the working directory.
    pub log_dir: String,

    /// Enable debug logging.
    pub verbose: bool,

    pub external: ExternalToolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profiles: vec![
                MonitorProfile::new("asus", 15, 17, 1080),
                MonitorProfile::new("aoc", 15, 16, 1440),
            ],
            transport: Transport::Native,
            ambiguous_match: MatchPolicy::First,
            continue_on_error: false,
            log_to_file: false,
            log_dir: String::new(),
            verbose: false,
            external: ExternalToolConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the TOML file, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load config from a specific file, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(cfg) => {
                    info!("Config loaded from {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!(
                        "Config parse error in {}: {}, using defaults",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default config to disk (creates directory if needed).
    pub fn write_default() -> Result<(), Box<dyn std::error::Error>> {
        Self::write_config(&Self::default())
    }

    /// Write a specific config to the standard location.
    pub fn write_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
        Self::write_to(&config_path(), cfg)
    }

    /// Write a config to `path`, creating parent directories.
    pub fn write_to(path: &Path, cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(path, Self::to_toml_commented(cfg))?;
        info!("Config written to {}", path.display());
        Ok(())
    }

    /// Build the profile registry, validating names and values.
    pub fn registry(&self) -> Result<ProfileRegistry, RegistryError> {
        ProfileRegistry::new(self.profiles.clone())
    }

    pub fn batch_policy(&self) -> BatchPolicy {
        BatchPolicy::from_continue_flag(self.continue_on_error)
    }

    /// Directory status logs are written to.
    pub fn log_dir_path(&self) -> PathBuf {
        if self.log_dir.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.log_dir)
        }
    }

    /// Serialize config to a TOML string with helpful comments.
    fn to_toml_commented(cfg: &Config) -> String {
        let mut out = format!(
            r##"# VCP Toggle configuration
# Location: %ProgramData%\VCP-Toggle\config.toml

# ─── Transport ───────────────────────────────────────────────────────
# "native":   DDC/CI through the Windows Monitor Configuration API.
# "external": run the tool configured under [external] for every request.
transport = "{transport}"

# ─── Matching ────────────────────────────────────────────────────────
# When several displays have a profile's height:
# "first" uses the first one Windows reports, "error" refuses.
ambiguous_match = "{ambiguous_match}"

# ─── Batch ───────────────────────────────────────────────────────────
# When toggling every profile, keep going after one fails.
continue_on_error = {continue_on_error}

# ─── Status Log ──────────────────────────────────────────────────────
# Write a log<timestamp>.txt file on every run (same as --log).
log_to_file = {log_to_file}
# Directory for log files. Empty = current directory.
log_dir = "{log_dir}"

# ─── Debug ───────────────────────────────────────────────────────────
verbose = {verbose}
{empty_profiles}
# ─── External Tool ───────────────────────────────────────────────────
# Placeholders: {{monitor}} (e.g. \\.\DISPLAY1\Monitor0), {{code}} (hex,
# e.g. 60), {{value}} (decimal).
# value_source: "exit-code" (the exit code is the value) or "stdout"
# (first capture group of value_pattern).
[external]
program = "{program}"
get_args = {get_args}
set_args = {set_args}
value_source = "{value_source}"
value_pattern = "{value_pattern}"

# ─── Profiles ────────────────────────────────────────────────────────
# source_a / source_b: the two VCP 0x60 input codes to switch between
#   (e.g. 15 = DisplayPort-1, 16 = DisplayPort-2, 17 = HDMI-1).
# match_height: bottom edge of the display in pixels, used to find it.
"##,
            transport = cfg.transport.as_str(),
            ambiguous_match = match cfg.ambiguous_match {
                MatchPolicy::First => "first",
                MatchPolicy::Error => "error",
            },
            continue_on_error = cfg.continue_on_error,
            log_to_file = cfg.log_to_file,
            log_dir = escape_toml_string(&cfg.log_dir),
            verbose = cfg.verbose,
            empty_profiles = if cfg.profiles.is_empty() {
                "\n# No profiles configured.\nprofiles = []\n"
            } else {
                ""
            },
            program = escape_toml_string(&cfg.external.program),
            get_args = toml_string_array(&cfg.external.get_args),
            set_args = toml_string_array(&cfg.external.set_args),
            value_source = cfg.external.value_source.as_str(),
            value_pattern = escape_toml_string(&cfg.external.value_pattern),
        );

        for p in &cfg.profiles {
            out.push_str(&format!(
                "\n[[profiles]]\nname = \"{}\"\nsource_a = {}\nsource_b = {}\nmatch_height = {}\n",
                escape_toml_string(&p.name),
                p.source_a,
                p.source_b,
                p.match_height
            ));
        }

        out
    }
}

fn toml_string_array(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|s| format!("\"{}\"", escape_toml_string(s)))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Escape a string for safe inclusion inside a TOML basic string (`"..."`).
fn escape_toml_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
