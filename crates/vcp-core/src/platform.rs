//! Seams between the toggle pipeline and the operating system.
//!
//! The OS pushes displays at a callback; [`DisplayEnumerator`] turns that
//! into a pulled, consumed `Vec` so matching can run without one.

use crate::error::ToggleError;

/// Rectangle reported for a logical display during enumeration.
///
/// Only `bottom` is consulted when matching profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub top: i32,
    pub left: i32,
    pub right: i32,
    pub bottom: i32,
}

impl DisplayGeometry {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// One active logical display as produced by a single enumeration pass.
#[derive(Debug, Clone)]
pub struct EnumeratedDisplay<D> {
    pub handle: D,
    pub geometry: DisplayGeometry,
}

/// Lists the active logical displays.
pub trait DisplayEnumerator {
    /// Opaque per-pass display handle.
    type Display;

    /// Run one enumeration pass. Order is whatever the platform reports.
    fn displays(&self) -> Result<Vec<EnumeratedDisplay<Self::Display>>, ToggleError>;
}

/// Turns a logical display into the physical monitors backing it.
pub trait PhysicalMonitorResolver<D> {
    /// DDC/CI endpoint. Implementations release OS resources on drop.
    type Monitor;

    fn resolve(&self, display: D) -> Result<Vec<Self::Monitor>, ToggleError>;
}

/// Reads and writes a single VCP feature over some transport.
pub trait VcpClient<M: ?Sized> {
    fn get_feature(&self, monitor: &M, code: u8) -> Result<u32, ToggleError>;

    /// Success means the channel accepted the write, not that the monitor
    /// has switched yet.
    fn set_feature(&self, monitor: &M, code: u8, value: u32) -> Result<(), ToggleError>;
}

/// Something an external tool can address by a textual identifier.
pub trait MonitorTarget {
    fn target_id(&self) -> String;

    fn description(&self) -> String {
        String::new()
    }
}

impl MonitorTarget for String {
    fn target_id(&self) -> String {
        self.clone()
    }
}

impl<T: DisplayEnumerator + ?Sized> DisplayEnumerator for &T {
    type Display = T::Display;

    fn displays(&self) -> Result<Vec<EnumeratedDisplay<Self::Display>>, ToggleError> {
        (**self).displays()
    }
}

impl<D, T: PhysicalMonitorResolver<D> + ?Sized> PhysicalMonitorResolver<D> for &T {
    type Monitor = T::Monitor;

    fn resolve(&self, display: D) -> Result<Vec<Self::Monitor>, ToggleError> {
        (**self).resolve(display)
    }
}

impl<M: ?Sized, T: VcpClient<M> + ?Sized> VcpClient<M> for &T {
    fn get_feature(&self, monitor: &M, code: u8) -> Result<u32, ToggleError> {
        (**self).get_feature(monitor, code)
    }

    fn set_feature(&self, monitor: &M, code: u8, value: u32) -> Result<(), ToggleError> {
        (**self).set_feature(monitor, code, value)
    }
}

/// All displays whose geometry satisfies `predicate`, in enumeration order.
pub fn find_matching<E, P>(enumerator: &E, predicate: P) -> Result<Vec<E::Display>, ToggleError>
where
    E: DisplayEnumerator + ?Sized,
    P: Fn(&DisplayGeometry) -> bool,
{
    let displays = enumerator.displays()?;
    log::debug!("Enumerated {} active display(s)", displays.len());
    Ok(displays
        .into_iter()
        .filter(|d| predicate(&d.geometry))
        .map(|d| d.handle)
        .collect())
}

/// The first display whose geometry satisfies `predicate`, if any.
pub fn find_display<E, P>(enumerator: &E, predicate: P) -> Result<Option<E::Display>, ToggleError>
where
    E: DisplayEnumerator + ?Sized,
    P: Fn(&DisplayGeometry) -> bool,
{
    Ok(find_matching(enumerator, predicate)?.into_iter().next())
}

/// One display and whatever could be learned about its physical monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySummary {
    pub geometry: DisplayGeometry,
    /// `(target id, description)` for each physical monitor.
    pub monitors: Vec<(String, String)>,
    /// Set when resolving this display failed.
    pub error: Option<String>,
}

/// Enumerate every display and resolve its physical monitors.
///
/// A display that fails to resolve is reported in its summary rather than
/// aborting the listing.
pub fn describe_displays<E, R>(enumerator: &E, resolver: &R) -> Result<Vec<DisplaySummary>, ToggleError>
where
    E: DisplayEnumerator + ?Sized,
    R: PhysicalMonitorResolver<E::Display> + ?Sized,
    R::Monitor: MonitorTarget,
{
    let mut summaries = Vec::new();
    for display in enumerator.displays()? {
        let summary = match resolver.resolve(display.handle) {
            Ok(monitors) => DisplaySummary {
                geometry: display.geometry,
                monitors: monitors
                    .iter()
                    .map(|m| (m.target_id(), m.description()))
                    .collect(),
                error: None,
            },
            Err(e) => {
                log::warn!("Could not resolve display {:?}: {}", display.geometry, e);
                DisplaySummary {
                    geometry: display.geometry,
                    monitors: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        summaries.push(summary);
    }
    Ok(summaries)
}

#[cfg(test)]
#[path = "tests/platform_tests.rs"]
mod tests;
