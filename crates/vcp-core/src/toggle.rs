//! The toggle orchestrator: find display → resolve monitor → read → flip → write.

use crate::error::ToggleError;
use crate::platform::{find_matching, DisplayEnumerator, PhysicalMonitorResolver, VcpClient};
use crate::profile::MonitorProfile;
use crate::status::StatusLog;
use crate::VCP_INPUT_SOURCE;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// What to do when several displays share a profile's height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Use the first display in enumeration order.
    #[default]
    First,
    /// Refuse to guess and fail the toggle.
    Error,
}

/// What a batch run does after one profile fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Stop at the first failure; later profiles are not attempted.
    #[default]
    FailFast,
    /// Attempt every profile and report all failures.
    ContinueOnError,
}

impl BatchPolicy {
    pub fn from_continue_flag(continue_on_error: bool) -> Self {
        if continue_on_error {
            BatchPolicy::ContinueOnError
        } else {
            BatchPolicy::FailFast
        }
    }
}

/// Result of one successful toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub profile: String,
    pub previous: u32,
    pub next: u32,
    pub elapsed: Duration,
}

/// Result of toggling several profiles.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<ToggleOutcome>,
    pub failures: Vec<(String, ToggleError)>,
    /// Profiles never attempted because an earlier one failed.
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }
}

/// Drives one enumerator, resolver and VCP client through the toggle.
///
/// Handles obtained during a call never outlive that call.
pub struct Toggler<E, R, C> {
    enumerator: E,
    resolver: R,
    client: C,
    match_policy: MatchPolicy,
}

impl<E, R, C> Toggler<E, R, C>
where
    E: DisplayEnumerator,
    R: PhysicalMonitorResolver<E::Display>,
    C: VcpClient<R::Monitor>,
{
    pub fn new(enumerator: E, resolver: R, client: C) -> Self {
        Self {
            enumerator,
            resolver,
            client,
            match_policy: MatchPolicy::default(),
        }
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.match_policy
    }

    /// Flip the profile's monitor to the other configured input source.
    pub fn toggle(&self, profile: &MonitorProfile) -> Result<ToggleOutcome, ToggleError> {
        let start = Instant::now();

        let monitor = self.locate(profile)?;
        let previous = self.client.get_feature(&monitor, VCP_INPUT_SOURCE)?;
        let next = profile.next_source(previous);
        debug!(
            "{}: input source is {} ({}), switching to {}",
            profile.name,
            previous,
            profile.classify(previous),
            next
        );
        self.client.set_feature(&monitor, VCP_INPUT_SOURCE, next)?;

        let elapsed = start.elapsed();
        info!(
            "{}: input source {} -> {} in {:?}",
            profile.name, previous, next, elapsed
        );
        Ok(ToggleOutcome {
            profile: profile.name.clone(),
            previous,
            next,
            elapsed,
        })
    }

    /// Read the profile's current input source without changing it.
    pub fn current_source(&self, profile: &MonitorProfile) -> Result<u32, ToggleError> {
        let monitor = self.locate(profile)?;
        self.client.get_feature(&monitor, VCP_INPUT_SOURCE)
    }

    /// [`toggle`](Self::toggle) with progress recorded in `status`.
    pub fn toggle_logged(
        &self,
        profile: &MonitorProfile,
        status: &mut StatusLog,
    ) -> Result<ToggleOutcome, ToggleError> {
        status.line(format!("Begin toggling {}", profile.name));
        match self.toggle(profile) {
            Ok(outcome) => {
                status.line(format!("Duration: {:?}", outcome.elapsed));
                Ok(outcome)
            }
            Err(e) => {
                status.line(format!("Error: {}", e));
                Err(e)
            }
        }
    }

    /// Toggle every profile in order.
    pub fn toggle_all<'a, I>(
        &self,
        profiles: I,
        policy: BatchPolicy,
        status: &mut StatusLog,
    ) -> BatchReport
    where
        I: IntoIterator<Item = &'a MonitorProfile>,
    {
        let mut report = BatchReport::default();
        let mut profiles = profiles.into_iter();

        while let Some(profile) = profiles.next() {
            match self.toggle_logged(profile, status) {
                Ok(outcome) => report.completed.push(outcome),
                Err(e) => {
                    warn!("{}: {}", profile.name, e);
                    report.failures.push((profile.name.clone(), e));
                    if policy == BatchPolicy::FailFast {
                        report.skipped = profiles.by_ref().map(|p| p.name.clone()).collect();
                        break;
                    }
                }
            }
        }

        report
    }

    /// Matched display → first physical monitor. Extra monitors are dropped.
    fn locate(&self, profile: &MonitorProfile) -> Result<R::Monitor, ToggleError> {
        let height = profile.match_height;
        let mut matches = find_matching(&self.enumerator, |g| g.bottom == height)?.into_iter();
        let count = matches.len();

        let display = matches
            .next()
            .ok_or_else(|| ToggleError::NoMatchingDisplay {
                profile: profile.name.clone(),
                height,
            })?;
        if count > 1 {
            match self.match_policy {
                MatchPolicy::Error => {
                    return Err(ToggleError::AmbiguousDisplay {
                        profile: profile.name.clone(),
                        height,
                        count,
                    })
                }
                MatchPolicy::First => warn!(
                    "{}: {} displays have height {}, using the first",
                    profile.name, count, height
                ),
            }
        }

        let physicals = self.resolver.resolve(display)?;
        debug!(
            "{}: display backed by {} physical monitor(s)",
            profile.name,
            physicals.len()
        );
        physicals
            .into_iter()
            .next()
            .ok_or_else(|| ToggleError::NoPhysicalMonitor(profile.name.clone()))
    }
}

#[cfg(test)]
#[path = "tests/toggle_tests.rs"]
mod tests;
