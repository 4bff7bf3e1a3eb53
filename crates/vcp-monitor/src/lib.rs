//! Platform adapters for the toggle pipeline.
//!
//! - [`ddc`] (Windows only) enumerates displays with `EnumDisplayMonitors`,
//!   resolves them to physical monitors through `dxva2.dll` and reads/writes
//!   VCP codes over DDC/CI.
//! - [`command`] implements the same VCP contract by running an external
//!   tool such as NirSoft ControlMyMonitor.

pub mod command;

#[cfg(windows)]
pub mod ddc;

pub use command::CommandVcpClient;

#[cfg(windows)]
pub use ddc::{DisplayHandle, Dxva2Client, Dxva2Resolver, GdiDisplayEnumerator, PhysicalMonitor};
