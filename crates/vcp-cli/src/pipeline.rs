//! Transport selection: one object-safe handle over whichever toggler the
//! config asks for.

use std::error::Error;

use vcp_core::config::{Config, Transport};
use vcp_core::{
    BatchPolicy, BatchReport, DisplayEnumerator, MonitorProfile, PhysicalMonitorResolver,
    StatusLog, ToggleError, Toggler, VcpClient,
};

pub trait Pipeline {
    fn toggle_all(
        &self,
        profiles: &[&MonitorProfile],
        policy: BatchPolicy,
        status: &mut StatusLog,
    ) -> BatchReport;

    fn current_source(&self, profile: &MonitorProfile) -> Result<u32, ToggleError>;
}

impl<E, R, C> Pipeline for Toggler<E, R, C>
where
    E: DisplayEnumerator,
    R: PhysicalMonitorResolver<E::Display>,
    C: VcpClient<R::Monitor>,
{
    fn toggle_all(
        &self,
        profiles: &[&MonitorProfile],
        policy: BatchPolicy,
        status: &mut StatusLog,
    ) -> BatchReport {
        Toggler::toggle_all(self, profiles.iter().copied(), policy, status)
    }

    fn current_source(&self, profile: &MonitorProfile) -> Result<u32, ToggleError> {
        Toggler::current_source(self, profile)
    }
}

/// Build the toggler for the configured transport.
#[cfg(windows)]
pub fn build(cfg: &Config) -> Result<Box<dyn Pipeline>, Box<dyn Error>> {
    use vcp_monitor::{CommandVcpClient, Dxva2Client, Dxva2Resolver, GdiDisplayEnumerator};

    let pipeline: Box<dyn Pipeline> = match cfg.transport {
        Transport::Native => Box::new(
            Toggler::new(GdiDisplayEnumerator, Dxva2Resolver, Dxva2Client)
                .with_match_policy(cfg.ambiguous_match),
        ),
        Transport::External => {
            let client = CommandVcpClient::from_config(&cfg.external)
                .map_err(|e| format!("invalid external.value_pattern: {}", e))?;
            log::debug!("Using external tool {}", client.program());
            Box::new(
                Toggler::new(GdiDisplayEnumerator, Dxva2Resolver, client)
                    .with_match_policy(cfg.ambiguous_match),
            )
        }
    };
    Ok(pipeline)
}

#[cfg(not(windows))]
pub fn build(cfg: &Config) -> Result<Box<dyn Pipeline>, Box<dyn Error>> {
    if cfg.transport == Transport::External {
        // Validate the pattern anyway so config mistakes surface early.
        vcp_monitor::CommandVcpClient::from_config(&cfg.external)
            .map_err(|e| format!("invalid external.value_pattern: {}", e))?;
    }
    Err(unsupported_platform().into())
}

#[cfg(not(windows))]
pub fn unsupported_platform() -> String {
    format!(
        "display enumeration is only available on Windows (this is {})",
        std::env::consts::OS
    )
}
