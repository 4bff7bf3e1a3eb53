//! vcp-toggle: flip monitor input sources over DDC/CI.
//!
//! Each configured profile names a monitor (found by its display height)
//! and two input-source codes. Running the tool reads VCP 0x60 from the
//! monitor and writes the other code, so one keypress sends a shared
//! monitor over to the other machine.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::process::ExitCode;
use vcp_core::config::{self, Config};
use vcp_core::{MonitorProfile, ProfileRegistry, StatusLog};

mod pipeline;

#[derive(Parser)]
#[command(
    name = "vcp-toggle",
    version,
    about = "Toggle monitor input sources over DDC/CI",
    long_about = "Toggles each configured monitor between two input sources by\n\
        reading and rewriting VCP feature 0x60 (Input Source Select).\n\n\
        With no profile, every configured profile is toggled in order."
)]
struct Cli {
    /// Profile to toggle (all profiles when omitted)
    profile: Option<String>,

    /// Write the status log to a timestamped file
    #[arg(short, long, global = true)]
    log: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Toggle one profile, or every profile when none is named
    Toggle {
        /// Profile name
        profile: Option<String>,
    },

    /// Show the current input source without changing it
    Status {
        /// Profile name
        profile: Option<String>,
    },

    /// List active displays and their physical monitors
    List,

    /// List configured profiles
    Profiles,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print config file path
    Path,
    /// Reset config to defaults
    Reset,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    // Console logger. The logger accepts everything; the global max level
    // decides, so `verbose = true` in the config can raise it after loading.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .format_timestamp(None)
        .init();
    log::set_max_level(if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    });

    let cfg = Config::load();
    if cfg.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    match cli.command {
        None => cmd_toggle(&cfg, cli.profile, cli.log)?,
        Some(Commands::Toggle { profile }) => cmd_toggle(&cfg, profile.or(cli.profile), cli.log)?,
        Some(Commands::Status { profile }) => cmd_status(&cfg, profile.or(cli.profile))?,
        Some(Commands::List) => cmd_list()?,
        Some(Commands::Profiles) => cmd_profiles(&cfg)?,
        Some(Commands::Config { action }) => cmd_config(&cfg, action)?,
    }

    Ok(())
}

// ============================================================================
// Command implementations
// ============================================================================

fn cmd_toggle(cfg: &Config, profile: Option<String>, log_flag: bool) -> Result<(), Box<dyn Error>> {
    let mut status = StatusLog::new();
    status.line(format!("args: {:?}", std::env::args().collect::<Vec<_>>()));

    let result = run_toggle(cfg, profile.as_deref(), &mut status);

    if log_flag || cfg.log_to_file {
        if let Some(path) = status.persist(&cfg.log_dir_path()) {
            println!("[INFO] Status log: {}", path.display());
        }
    }

    result
}

fn run_toggle(
    cfg: &Config,
    profile: Option<&str>,
    status: &mut StatusLog,
) -> Result<(), Box<dyn Error>> {
    let registry = load_registry(cfg, status)?;
    let selected = select_profiles(&registry, profile, status)?;
    if selected.is_empty() {
        println!("[SKIP] No profiles configured.");
        return Ok(());
    }

    let pipeline = match pipeline::build(cfg) {
        Ok(p) => p,
        Err(e) => {
            status.line(format!("Error: {}", e));
            return Err(e);
        }
    };

    let report = pipeline.toggle_all(&selected, cfg.batch_policy(), status);

    for outcome in &report.completed {
        println!(
            "[OK]    {}: input {} -> {} ({:?})",
            outcome.profile, outcome.previous, outcome.next, outcome.elapsed
        );
    }
    for (name, err) in &report.failures {
        println!("[ERROR] {}: {}", name, err);
    }
    for name in &report.skipped {
        println!("[SKIP]  {}: not attempted after an earlier failure", name);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(format!(
            "{} of {} profile(s) not toggled",
            report.failures.len() + report.skipped.len(),
            selected.len()
        )
        .into())
    }
}

fn cmd_status(cfg: &Config, profile: Option<String>) -> Result<(), Box<dyn Error>> {
    let mut status = StatusLog::new();
    let registry = load_registry(cfg, &mut status)?;
    let selected = select_profiles(&registry, profile.as_deref(), &mut status)?;
    if selected.is_empty() {
        println!("[SKIP] No profiles configured.");
        return Ok(());
    }

    let pipeline = pipeline::build(cfg)?;
    let mut failed = 0usize;
    for p in &selected {
        match pipeline.current_source(p) {
            Ok(value) => println!(
                "{}: input {} ({}; A={}, B={})",
                p.name,
                value,
                p.classify(value),
                p.source_a,
                p.source_b
            ),
            Err(e) => {
                failed += 1;
                println!("[ERROR] {}: {}", p.name, e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} profile(s) could not be read", failed).into());
    }
    Ok(())
}

#[cfg(windows)]
fn cmd_list() -> Result<(), Box<dyn Error>> {
    use vcp_monitor::{Dxva2Resolver, GdiDisplayEnumerator};

    let displays = vcp_core::describe_displays(&GdiDisplayEnumerator, &Dxva2Resolver)?;
    if displays.is_empty() {
        println!("No active displays found.");
        return Ok(());
    }

    println!("Found {} display(s):\n", displays.len());
    for (i, d) in displays.iter().enumerate() {
        let g = &d.geometry;
        println!(
            "  {}. {}x{} at ({}, {})  bottom={}",
            i + 1,
            g.width(),
            g.height(),
            g.left,
            g.top,
            g.bottom
        );
        if let Some(ref err) = d.error {
            println!("     [ERROR] {}", err);
        } else if d.monitors.is_empty() {
            println!("     (no DDC/CI physical monitor)");
        }
        for (target, description) in &d.monitors {
            println!("     {}  {}", target, description);
        }
    }
    Ok(())
}

#[cfg(not(windows))]
fn cmd_list() -> Result<(), Box<dyn Error>> {
    Err(pipeline::unsupported_platform().into())
}

fn cmd_profiles(cfg: &Config) -> Result<(), Box<dyn Error>> {
    let mut status = StatusLog::new();
    let registry = load_registry(cfg, &mut status)?;
    if registry.is_empty() {
        println!("No profiles configured.");
        return Ok(());
    }

    println!("{:<16} {:>8} {:>8} {:>8}", "NAME", "A", "B", "HEIGHT");
    for p in &registry {
        println!(
            "{:<16} {:>8} {:>8} {:>8}",
            p.name, p.source_a, p.source_b, p.match_height
        );
    }
    Ok(())
}

fn cmd_config(cfg: &Config, action: Option<ConfigAction>) -> Result<(), Box<dyn Error>> {
    match action {
        None | Some(ConfigAction::Show) => {
            println!("Config file: {}\n", config::config_path().display());
            println!("── General ──");
            println!("  transport          = \"{}\"", cfg.transport.as_str());
            println!("  ambiguous_match    = {:?}", cfg.ambiguous_match);
            println!("  continue_on_error  = {}", cfg.continue_on_error);
            println!("  log_to_file        = {}", cfg.log_to_file);
            println!("  log_dir            = \"{}\"", cfg.log_dir);
            println!("  verbose            = {}", cfg.verbose);
            println!("\n── External Tool ──");
            println!("  program            = \"{}\"", cfg.external.program);
            println!("  get_args           = {:?}", cfg.external.get_args);
            println!("  set_args           = {:?}", cfg.external.set_args);
            println!("  value_source       = \"{}\"", cfg.external.value_source.as_str());
            println!("  value_pattern      = \"{}\"", cfg.external.value_pattern);
            println!("\n── Profiles ──");
            for p in &cfg.profiles {
                println!(
                    "  {} = {{ source_a = {}, source_b = {}, match_height = {} }}",
                    p.name, p.source_a, p.source_b, p.match_height
                );
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", config::config_path().display());
        }
        Some(ConfigAction::Reset) => {
            Config::write_default()?;
            println!(
                "[OK] Config reset to defaults at {}",
                config::config_path().display()
            );
        }
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn load_registry(cfg: &Config, status: &mut StatusLog) -> Result<ProfileRegistry, Box<dyn Error>> {
    cfg.registry().map_err(|e| {
        status.line(format!("Error: {}", e));
        e.into()
    })
}

/// The named profile, or every profile in order.
fn select_profiles<'a>(
    registry: &'a ProfileRegistry,
    name: Option<&str>,
    status: &mut StatusLog,
) -> Result<Vec<&'a MonitorProfile>, Box<dyn Error>> {
    match name {
        Some(name) => match registry.get(name) {
            Ok(p) => Ok(vec![p]),
            Err(e) => {
                status.line(format!("Error: {}", e));
                Err(e.into())
            }
        },
        None => Ok(registry.iter().collect()),
    }
}
