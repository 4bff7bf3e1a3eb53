//! DDC/CI input switching via the Windows Monitor Configuration API.
//!
//! Uses `EnumDisplayMonitors` to list logical displays with their rects,
//! `dxva2.dll` to resolve each HMONITOR to physical monitors, then
//! `GetVCPFeatureAndVCPFeatureReply` / `SetVCPFeature` for the VCP exchange.
//!
//! DDC/CI only needs access to the display adapter, so none of this
//! requires admin rights.

use log::{debug, warn};
use std::io;
use std::ptr;

use vcp_core::{
    DisplayEnumerator, DisplayGeometry, EnumeratedDisplay, MonitorTarget,
    PhysicalMonitorResolver, ToggleError, VcpClient, VcpOp,
};
use windows::Win32::Foundation::{BOOL, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOEXW,
};

// ============================================================================
// DDC/CI FFI: dxva2.dll
// ============================================================================

/// Opaque handle to a physical monitor.
type HANDLE = *mut std::ffi::c_void;

/// Physical monitor as returned by `GetPhysicalMonitorsFromHMONITOR`.
#[repr(C)]
struct RawPhysicalMonitor {
    handle: HANDLE,
    description: [u16; 128],
}

#[link(name = "dxva2")]
extern "system" {
    fn GetNumberOfPhysicalMonitorsFromHMONITOR(
        h_monitor: isize,
        num_monitors: *mut u32,
    ) -> BOOL;

    fn GetPhysicalMonitorsFromHMONITOR(
        h_monitor: isize,
        array_size: u32,
        physical_monitors: *mut RawPhysicalMonitor,
    ) -> BOOL;

    fn DestroyPhysicalMonitor(h_monitor: HANDLE) -> BOOL;

    fn SetVCPFeature(
        h_monitor: HANDLE,
        vcp_code: u8,
        new_value: u32,
    ) -> BOOL;

    fn GetVCPFeatureAndVCPFeatureReply(
        h_monitor: HANDLE,
        vcp_code: u8,
        vcp_type: *mut u32,
        current_value: *mut u32,
        maximum_value: *mut u32,
    ) -> BOOL;
}

// ============================================================================
// Enumeration
// ============================================================================

/// HMONITOR of an active logical display. Only valid for the enumeration
/// pass that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayHandle(isize);

/// Lists active displays with `EnumDisplayMonitors`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdiDisplayEnumerator;

impl DisplayEnumerator for GdiDisplayEnumerator {
    type Display = DisplayHandle;

    fn displays(&self) -> Result<Vec<EnumeratedDisplay<DisplayHandle>>, ToggleError> {
        let mut found: Vec<EnumeratedDisplay<DisplayHandle>> = Vec::new();

        unsafe extern "system" fn callback(
            hmonitor: HMONITOR,
            _hdc: HDC,
            rect: *mut RECT,
            data: LPARAM,
        ) -> BOOL {
            let found = &mut *(data.0 as *mut Vec<EnumeratedDisplay<DisplayHandle>>);
            let geometry = if rect.is_null() {
                DisplayGeometry::default()
            } else {
                let r = &*rect;
                DisplayGeometry::new(r.left, r.top, r.right, r.bottom)
            };
            found.push(EnumeratedDisplay {
                handle: DisplayHandle(hmonitor.0 as isize),
                geometry,
            });
            BOOL::from(true)
        }

        let ok = unsafe {
            EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(callback),
                LPARAM(&mut found as *mut Vec<EnumeratedDisplay<DisplayHandle>> as isize),
            )
        };

        if !ok.as_bool() {
            let err = io::Error::last_os_error();
            return Err(ToggleError::Enumeration(format!(
                "EnumDisplayMonitors failed: {}",
                err
            )));
        }

        debug!("EnumDisplayMonitors reported {} display(s)", found.len());
        Ok(found)
    }
}

// ============================================================================
// Physical monitors
// ============================================================================

/// A DDC/CI-capable physical monitor. The handle is destroyed on drop.
#[derive(Debug)]
pub struct PhysicalMonitor {
    handle: HANDLE,
    description: String,
    target_id: String,
}

impl MonitorTarget for PhysicalMonitor {
    /// `\\.\DISPLAYn\Monitorm`, or the description when the GDI device name
    /// is unavailable.
    fn target_id(&self) -> String {
        self.target_id.clone()
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

impl Drop for PhysicalMonitor {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyPhysicalMonitor(self.handle);
        }
    }
}

/// Resolves HMONITORs with `GetPhysicalMonitorsFromHMONITOR`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dxva2Resolver;

impl PhysicalMonitorResolver<DisplayHandle> for Dxva2Resolver {
    type Monitor = PhysicalMonitor;

    fn resolve(&self, display: DisplayHandle) -> Result<Vec<PhysicalMonitor>, ToggleError> {
        let mut count: u32 = 0;
        let ok = unsafe { GetNumberOfPhysicalMonitorsFromHMONITOR(display.0, &mut count) };
        if !ok.as_bool() {
            let err = io::Error::last_os_error();
            return Err(ToggleError::Resolution(format!(
                "GetNumberOfPhysicalMonitorsFromHMONITOR failed: {}",
                err
            )));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut raw = Vec::with_capacity(count as usize);
        for _ in 0..count {
            raw.push(RawPhysicalMonitor {
                handle: ptr::null_mut(),
                description: [0u16; 128],
            });
        }

        let ok = unsafe { GetPhysicalMonitorsFromHMONITOR(display.0, count, raw.as_mut_ptr()) };
        if !ok.as_bool() {
            let err = io::Error::last_os_error();
            return Err(ToggleError::Resolution(format!(
                "GetPhysicalMonitorsFromHMONITOR failed: {}",
                err
            )));
        }

        let device = gdi_device_name(display);
        if device.is_none() {
            warn!("No GDI device name for display {:?}", display);
        }

        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(i, pm)| {
                let description = decode_wide(&pm.description);
                let target_id = match &device {
                    Some(name) => format!(r"{}\Monitor{}", name, i),
                    None => description.clone(),
                };
                PhysicalMonitor {
                    handle: pm.handle,
                    description,
                    target_id,
                }
            })
            .collect())
    }
}

/// GDI device name (`\\.\DISPLAY1`) of an HMONITOR.
fn gdi_device_name(display: DisplayHandle) -> Option<String> {
    let mut mi = MONITORINFOEXW::default();
    mi.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

    let ok = unsafe {
        GetMonitorInfoW(
            HMONITOR(display.0 as *mut std::ffi::c_void),
            &mut mi as *mut MONITORINFOEXW as *mut MONITORINFO,
        )
    };
    if !ok.as_bool() {
        return None;
    }

    let name = decode_wide(&mi.szDevice);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

// ============================================================================
// VCP exchange
// ============================================================================

/// Talks DDC/CI directly through `dxva2.dll`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dxva2Client;

impl VcpClient<PhysicalMonitor> for Dxva2Client {
    fn get_feature(&self, monitor: &PhysicalMonitor, code: u8) -> Result<u32, ToggleError> {
        let mut vcp_type: u32 = 0;
        let mut current: u32 = 0;
        let mut maximum: u32 = 0;

        let ok = unsafe {
            GetVCPFeatureAndVCPFeatureReply(
                monitor.handle,
                code,
                &mut vcp_type,
                &mut current,
                &mut maximum,
            )
        };
        if !ok.as_bool() {
            let err = io::Error::last_os_error();
            return Err(ToggleError::protocol(
                VcpOp::Get,
                code,
                format!("GetVCPFeatureAndVCPFeatureReply: {}", err),
            ));
        }

        debug!(
            "VCP 0x{:02X} on {}: current={} max={} type={}",
            code, monitor.target_id, current, maximum, vcp_type
        );
        Ok(current)
    }

    fn set_feature(&self, monitor: &PhysicalMonitor, code: u8, value: u32) -> Result<(), ToggleError> {
        let ok = unsafe { SetVCPFeature(monitor.handle, code, value) };
        if !ok.as_bool() {
            let err = io::Error::last_os_error();
            return Err(ToggleError::protocol(
                VcpOp::Set,
                code,
                format!("SetVCPFeature({}): {}", value, err),
            ));
        }
        debug!("VCP 0x{:02X} on {} set to {}", code, monitor.target_id, value);
        Ok(())
    }
}

/// Decode a null-terminated UTF-16 buffer.
fn decode_wide(raw: &[u16]) -> String {
    raw.iter()
        .take_while(|&&c| c != 0)
        .filter_map(|&c| char::from_u32(c as u32))
        .collect()
}
