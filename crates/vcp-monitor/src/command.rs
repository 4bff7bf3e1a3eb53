//! VCP transport that runs an external DDC/CI tool for every request.
//!
//! The defaults target NirSoft ControlMyMonitor, whose `/GetValue` reports
//! the value as the process exit code. Tools that print the value instead
//! (e.g. `ddcutil getvcp --brief`) are handled with `value_source = "stdout"`
//! and a regex.

use log::debug;
use regex::Regex;
use std::process::{Command, Output, Stdio};

use vcp_core::config::{ExternalToolConfig, ValueSource};
use vcp_core::{MonitorTarget, ToggleError, VcpClient, VcpOp};

/// Substitute `{monitor}`, `{code}` and `{value}` in argument templates.
///
/// `{code}` becomes two uppercase hex digits (`60`), `{value}` is decimal.
/// Without a value, `{value}` is left as is.
pub fn expand_args(templates: &[String], target: &str, code: u8, value: Option<u32>) -> Vec<String> {
    let code = format!("{:02X}", code);
    templates
        .iter()
        .map(|t| {
            let arg = t.replace("{monitor}", target).replace("{code}", &code);
            match value {
                Some(v) => arg.replace("{value}", &v.to_string()),
                None => arg,
            }
        })
        .collect()
}

/// Parse a value printed by a tool: decimal, or hex with `0x`/`x` prefix.
pub fn parse_value(text: &str) -> Option<u32> {
    let t = text.trim();
    let lower = t.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x").or_else(|| lower.strip_prefix('x')) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        t.parse().ok()
    }
}

/// Runs an external program per VCP request.
#[derive(Debug, Clone)]
pub struct CommandVcpClient {
    program: String,
    get_args: Vec<String>,
    set_args: Vec<String>,
    value_source: ValueSource,
    value_pattern: Regex,
}

impl CommandVcpClient {
    /// Fails if `value_pattern` is not a valid regex.
    pub fn from_config(cfg: &ExternalToolConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            program: cfg.program.clone(),
            get_args: cfg.get_args.clone(),
            set_args: cfg.set_args.clone(),
            value_source: cfg.value_source,
            value_pattern: Regex::new(&cfg.value_pattern)?,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// First capture group of `value_pattern` (or the whole match when the
    /// pattern has no groups), parsed with [`parse_value`].
    pub fn parse_stdout(&self, stdout: &str) -> Option<u32> {
        let caps = self.value_pattern.captures(stdout)?;
        let m = caps.get(1).or_else(|| caps.get(0))?;
        parse_value(m.as_str())
    }

    fn run(&self, op: VcpOp, code: u8, args: &[String]) -> Result<Output, ToggleError> {
        debug!("Running {} {:?}", self.program, args);
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.output().map_err(|e| {
            ToggleError::protocol(op, code, format!("failed to run {}: {}", self.program, e))
        })
    }

    fn failure(&self, op: VcpOp, code: u8, out: &Output) -> ToggleError {
        let stderr = String::from_utf8_lossy(&out.stderr);
        let stderr = stderr.trim();
        let message = if stderr.is_empty() {
            format!("{} exited with {}", self.program, out.status)
        } else {
            format!("{} exited with {}: {}", self.program, out.status, stderr)
        };
        ToggleError::protocol(op, code, message)
    }
}

impl<M: MonitorTarget + ?Sized> VcpClient<M> for CommandVcpClient {
    fn get_feature(&self, monitor: &M, code: u8) -> Result<u32, ToggleError> {
        let args = expand_args(&self.get_args, &monitor.target_id(), code, None);
        let out = self.run(VcpOp::Get, code, &args)?;

        match self.value_source {
            ValueSource::ExitCode => match out.status.code() {
                Some(value) if value >= 0 => Ok(value as u32),
                _ => Err(self.failure(VcpOp::Get, code, &out)),
            },
            ValueSource::Stdout => {
                if !out.status.success() {
                    return Err(self.failure(VcpOp::Get, code, &out));
                }
                let stdout = String::from_utf8_lossy(&out.stdout);
                self.parse_stdout(&stdout).ok_or_else(|| {
                    ToggleError::protocol(
                        VcpOp::Get,
                        code,
                        format!("failed to parse {} output: {}", self.program, stdout.trim()),
                    )
                })
            }
        }
    }

    fn set_feature(&self, monitor: &M, code: u8, value: u32) -> Result<(), ToggleError> {
        let args = expand_args(&self.set_args, &monitor.target_id(), code, Some(value));
        let out = self.run(VcpOp::Set, code, &args)?;
        if !out.status.success() {
            return Err(self.failure(VcpOp::Set, code, &out));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
