//! Core of the monitor input-source toggle.
//!
//! The pipeline runs in three stages for each configured monitor profile:
//!
//! 1. enumerate active displays and pick the one whose geometry matches the
//!    profile's height ([`platform::find_display`]),
//! 2. resolve that display to its DDC/CI-capable physical monitors,
//! 3. read VCP feature `0x60` (input source) and write back the other of the
//!    profile's two configured values ([`toggle::Toggler`]).
//!
//! Everything that talks to the operating system sits behind the traits in
//! [`platform`], so the pipeline itself is testable with in-memory doubles.

pub mod config;
pub mod error;
pub mod platform;
pub mod profile;
pub mod status;
pub mod toggle;

pub use error::{RegistryError, ToggleError, VcpOp};
pub use platform::{
    describe_displays, find_display, DisplayEnumerator, DisplayGeometry, DisplaySummary,
    EnumeratedDisplay, MonitorTarget, PhysicalMonitorResolver, VcpClient,
};
pub use profile::{MonitorProfile, ProfileRegistry};
pub use status::StatusLog;
pub use toggle::{BatchPolicy, BatchReport, MatchPolicy, ToggleOutcome, Toggler};

/// VCP code for Input Source Select (MCCS).
pub const VCP_INPUT_SOURCE: u8 = 0x60;
