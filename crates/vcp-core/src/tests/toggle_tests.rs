use super::*;
use crate::platform::{find_display, DisplayGeometry, EnumeratedDisplay};
use crate::VcpOp;
use std::cell::{Cell, RefCell};

// ── Test doubles ─────────────────────────────────────────────────

struct FakeDisplays {
    displays: Vec<(u32, DisplayGeometry)>,
    fail: bool,
    calls: Cell<usize>,
}

impl FakeDisplays {
    fn new(displays: &[(u32, i32)]) -> Self {
        Self {
            displays: displays
                .iter()
                .map(|&(id, bottom)| (id, DisplayGeometry::new(0, 0, bottom * 16 / 9, bottom)))
                .collect(),
            fail: false,
            calls: Cell::new(0),
        }
    }

    fn failing() -> Self {
        let mut d = Self::new(&[]);
        d.fail = true;
        d
    }
}

impl DisplayEnumerator for FakeDisplays {
    type Display = u32;

    fn displays(&self) -> Result<Vec<EnumeratedDisplay<u32>>, ToggleError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(ToggleError::Enumeration("access denied".to_string()));
        }
        Ok(self
            .displays
            .iter()
            .map(|&(handle, geometry)| EnumeratedDisplay { handle, geometry })
            .collect())
    }
}

struct FakeResolver {
    monitors_per_display: usize,
    fail: bool,
    resolved: RefCell<Vec<u32>>,
}

impl FakeResolver {
    fn with(monitors_per_display: usize) -> Self {
        Self {
            monitors_per_display,
            fail: false,
            resolved: RefCell::new(Vec::new()),
        }
    }
}

impl PhysicalMonitorResolver<u32> for FakeResolver {
    type Monitor = String;

    fn resolve(&self, display: u32) -> Result<Vec<String>, ToggleError> {
        self.resolved.borrow_mut().push(display);
        if self.fail {
            return Err(ToggleError::Resolution("count query failed".to_string()));
        }
        Ok((0..self.monitors_per_display)
            .map(|i| format!("display{}-monitor{}", display, i))
            .collect())
    }
}

struct FakeClient {
    value: Cell<u32>,
    fail_get: bool,
    fail_set: bool,
    gets: RefCell<Vec<(String, u8)>>,
    sets: RefCell<Vec<(String, u8, u32)>>,
}

impl FakeClient {
    fn reading(value: u32) -> Self {
        Self {
            value: Cell::new(value),
            fail_get: false,
            fail_set: false,
            gets: RefCell::new(Vec::new()),
            sets: RefCell::new(Vec::new()),
        }
    }
}

impl VcpClient<String> for FakeClient {
    fn get_feature(&self, monitor: &String, code: u8) -> Result<u32, ToggleError> {
        self.gets.borrow_mut().push((monitor.clone(), code));
        if self.fail_get {
            return Err(ToggleError::protocol(VcpOp::Get, code, "monitor did not reply"));
        }
        Ok(self.value.get())
    }

    fn set_feature(&self, monitor: &String, code: u8, value: u32) -> Result<(), ToggleError> {
        self.sets.borrow_mut().push((monitor.clone(), code, value));
        if self.fail_set {
            return Err(ToggleError::protocol(VcpOp::Set, code, "write rejected"));
        }
        self.value.set(value);
        Ok(())
    }
}

fn asus() -> MonitorProfile {
    MonitorProfile::new("asus", 15, 17, 1080)
}

fn aoc() -> MonitorProfile {
    MonitorProfile::new("aoc", 15, 16, 1440)
}

// ── Display matching ─────────────────────────────────────────────

#[test]
fn find_display_returns_the_only_match_among_many() {
    let displays = FakeDisplays::new(&[(1, 720), (2, 1440), (3, 1080), (4, 2160), (5, 900)]);
    let found = find_display(&displays, |g| g.bottom == 1080).unwrap();
    assert_eq!(found, Some(3));
}

#[test]
fn find_display_returns_first_of_several_matches() {
    let displays = FakeDisplays::new(&[(7, 1080), (8, 1440), (9, 1080)]);
    let found = find_display(&displays, |g| g.bottom == 1080).unwrap();
    assert_eq!(found, Some(7));
}

#[test]
fn find_display_with_no_match_is_none() {
    let displays = FakeDisplays::new(&[(1, 720), (2, 1440)]);
    assert_eq!(find_display(&displays, |g| g.bottom == 1080).unwrap(), None);
}

#[test]
fn find_display_with_no_displays_is_none() {
    let displays = FakeDisplays::new(&[]);
    assert_eq!(find_display(&displays, |g| g.bottom == 1080).unwrap(), None);
}

#[test]
fn find_display_propagates_enumeration_failure() {
    let displays = FakeDisplays::failing();
    let err = find_display(&displays, |_| true).unwrap_err();
    assert!(matches!(err, ToggleError::Enumeration(_)));
}

// ── Toggle scenarios ─────────────────────────────────────────────

#[test]
fn toggle_from_a_writes_b() {
    let displays = FakeDisplays::new(&[(1, 1440), (2, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let toggler = Toggler::new(&displays, &resolver, &client);

    let outcome = toggler.toggle(&asus()).unwrap();
    assert_eq!(outcome.profile, "asus");
    assert_eq!(outcome.previous, 15);
    assert_eq!(outcome.next, 17);
    assert_eq!(
        *client.sets.borrow(),
        vec![("display2-monitor0".to_string(), 0x60, 17)]
    );
    assert_eq!(*resolver.resolved.borrow(), vec![2]);
}

#[test]
fn toggle_from_b_writes_a() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(17);
    let toggler = Toggler::new(&displays, &resolver, &client);

    assert_eq!(toggler.toggle(&asus()).unwrap().next, 15);
}

#[test]
fn toggle_from_unrecognised_value_writes_a() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(99);
    let toggler = Toggler::new(&displays, &resolver, &client);

    let outcome = toggler.toggle(&asus()).unwrap();
    assert_eq!(outcome.next, 15);
    assert_eq!(client.sets.borrow().len(), 1);
    assert_eq!(client.sets.borrow()[0].2, 15);
}

#[test]
fn toggle_twice_restores_original_value() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(17);
    let toggler = Toggler::new(&displays, &resolver, &client);

    toggler.toggle(&asus()).unwrap();
    assert_eq!(client.value.get(), 15);
    toggler.toggle(&asus()).unwrap();
    assert_eq!(client.value.get(), 17);
}

#[test]
fn toggle_reads_and_writes_input_source_code() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    Toggler::new(&displays, &resolver, &client)
        .toggle(&asus())
        .unwrap();

    assert_eq!(client.gets.borrow()[0].1, 0x60);
    assert_eq!(client.sets.borrow()[0].1, 0x60);
}

#[test]
fn toggle_uses_first_physical_monitor_only() {
    let displays = FakeDisplays::new(&[(4, 1080)]);
    let resolver = FakeResolver::with(3);
    let client = FakeClient::reading(15);
    Toggler::new(&displays, &resolver, &client)
        .toggle(&asus())
        .unwrap();

    assert_eq!(client.gets.borrow()[0].0, "display4-monitor0");
    assert_eq!(client.sets.borrow().len(), 1);
}

// ── Failure paths ────────────────────────────────────────────────

#[test]
fn no_matching_display_skips_resolver_and_client() {
    let displays = FakeDisplays::new(&[(1, 720), (2, 1440)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let toggler = Toggler::new(&displays, &resolver, &client);

    let err = toggler.toggle(&asus()).unwrap_err();
    assert!(matches!(
        err,
        ToggleError::NoMatchingDisplay { ref profile, height: 1080 } if profile == "asus"
    ));
    assert!(resolver.resolved.borrow().is_empty());
    assert!(client.gets.borrow().is_empty());
    assert!(client.sets.borrow().is_empty());
}

#[test]
fn enumeration_failure_skips_resolver() {
    let displays = FakeDisplays::failing();
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let err = Toggler::new(&displays, &resolver, &client)
        .toggle(&asus())
        .unwrap_err();

    assert!(matches!(err, ToggleError::Enumeration(_)));
    assert!(resolver.resolved.borrow().is_empty());
}

#[test]
fn empty_physical_set_reports_no_physical_monitor() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(0);
    let client = FakeClient::reading(15);
    let err = Toggler::new(&displays, &resolver, &client)
        .toggle(&asus())
        .unwrap_err();

    assert!(matches!(err, ToggleError::NoPhysicalMonitor(ref name) if name == "asus"));
    assert!(client.gets.borrow().is_empty());
    assert!(client.sets.borrow().is_empty());
}

#[test]
fn resolver_failure_skips_client() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let mut resolver = FakeResolver::with(1);
    resolver.fail = true;
    let client = FakeClient::reading(15);
    let err = Toggler::new(&displays, &resolver, &client)
        .toggle(&asus())
        .unwrap_err();

    assert!(matches!(err, ToggleError::Resolution(_)));
    assert!(client.gets.borrow().is_empty());
}

#[test]
fn get_failure_never_sets() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(1);
    let mut client = FakeClient::reading(15);
    client.fail_get = true;
    let err = Toggler::new(&displays, &resolver, &client)
        .toggle(&asus())
        .unwrap_err();

    assert!(matches!(
        err,
        ToggleError::Protocol { op: VcpOp::Get, code: 0x60, .. }
    ));
    assert_eq!(client.gets.borrow().len(), 1);
    assert!(client.sets.borrow().is_empty());
}

#[test]
fn set_failure_is_reported_once() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(1);
    let mut client = FakeClient::reading(15);
    client.fail_set = true;
    let err = Toggler::new(&displays, &resolver, &client)
        .toggle(&asus())
        .unwrap_err();

    assert!(matches!(err, ToggleError::Protocol { op: VcpOp::Set, .. }));
    assert_eq!(client.sets.borrow().len(), 1);
}

#[test]
fn protocol_error_message_names_operation_and_code() {
    let err = ToggleError::protocol(VcpOp::Get, 0x60, "timeout");
    assert_eq!(err.to_string(), "VCP get 0x60 failed: timeout");
}

// ── Match policy ─────────────────────────────────────────────────

#[test]
fn ambiguous_match_uses_first_by_default() {
    let displays = FakeDisplays::new(&[(5, 1080), (6, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let toggler = Toggler::new(&displays, &resolver, &client);
    assert_eq!(toggler.match_policy(), MatchPolicy::First);

    toggler.toggle(&asus()).unwrap();
    assert_eq!(*resolver.resolved.borrow(), vec![5]);
}

#[test]
fn ambiguous_match_errors_under_error_policy() {
    let displays = FakeDisplays::new(&[(5, 1080), (6, 1440), (7, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let err = Toggler::new(&displays, &resolver, &client)
        .with_match_policy(MatchPolicy::Error)
        .toggle(&asus())
        .unwrap_err();

    assert!(matches!(err, ToggleError::AmbiguousDisplay { count: 2, .. }));
    assert!(resolver.resolved.borrow().is_empty());
}

#[test]
fn single_match_is_fine_under_error_policy() {
    let displays = FakeDisplays::new(&[(5, 1080), (6, 1440)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let outcome = Toggler::new(&displays, &resolver, &client)
        .with_match_policy(MatchPolicy::Error)
        .toggle(&aoc())
        .unwrap();
    assert_eq!(outcome.next, 16);
}

// ── Status read ──────────────────────────────────────────────────

#[test]
fn current_source_reads_without_writing() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(17);
    let value = Toggler::new(&displays, &resolver, &client)
        .current_source(&asus())
        .unwrap();

    assert_eq!(value, 17);
    assert!(client.sets.borrow().is_empty());
}

// ── Status lines ─────────────────────────────────────────────────

#[test]
fn toggle_logged_records_begin_and_duration() {
    let displays = FakeDisplays::new(&[(1, 1080)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let mut status = StatusLog::new();
    Toggler::new(&displays, &resolver, &client)
        .toggle_logged(&asus(), &mut status)
        .unwrap();

    assert_eq!(status.lines()[0], "Begin toggling asus");
    assert!(status.lines()[1].starts_with("Duration: "));
}

#[test]
fn toggle_logged_records_error() {
    let displays = FakeDisplays::new(&[]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let mut status = StatusLog::new();
    let result = Toggler::new(&displays, &resolver, &client).toggle_logged(&asus(), &mut status);

    assert!(result.is_err());
    assert_eq!(status.lines().len(), 2);
    assert!(status.lines()[1].starts_with("Error: no display matches profile 'asus'"));
}

// ── Batch mode ───────────────────────────────────────────────────

#[test]
fn batch_fail_fast_stops_after_first_failure() {
    // Only the 1440 display exists, so "asus" (1080) fails first.
    let displays = FakeDisplays::new(&[(1, 1440)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let toggler = Toggler::new(&displays, &resolver, &client);
    let profiles = vec![asus(), aoc()];
    let mut status = StatusLog::new();

    let report = toggler.toggle_all(&profiles, BatchPolicy::FailFast, &mut status);

    assert_eq!(displays.calls.get(), 1);
    assert!(resolver.resolved.borrow().is_empty());
    assert!(client.sets.borrow().is_empty());
    assert!(report.completed.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "asus");
    assert_eq!(report.skipped, vec!["aoc".to_string()]);
    assert!(!report.is_success());
    assert!(!status.lines().iter().any(|l| l.contains("aoc")));
}

#[test]
fn batch_continue_on_error_attempts_every_profile() {
    let displays = FakeDisplays::new(&[(1, 1440)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let toggler = Toggler::new(&displays, &resolver, &client);
    let profiles = vec![asus(), aoc()];
    let mut status = StatusLog::new();

    let report = toggler.toggle_all(&profiles, BatchPolicy::ContinueOnError, &mut status);

    assert_eq!(displays.calls.get(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].profile, "aoc");
    assert_eq!(report.completed[0].next, 16);
    assert!(report.skipped.is_empty());
    assert!(!report.is_success());
}

#[test]
fn batch_runs_profiles_in_order() {
    let displays = FakeDisplays::new(&[(1, 1080), (2, 1440)]);
    let resolver = FakeResolver::with(1);
    let client = FakeClient::reading(15);
    let toggler = Toggler::new(&displays, &resolver, &client);
    let profiles = vec![aoc(), asus()];
    let mut status = StatusLog::new();

    let report = toggler.toggle_all(&profiles, BatchPolicy::FailFast, &mut status);

    assert!(report.is_success());
    assert_eq!(*resolver.resolved.borrow(), vec![2, 1]);
    let begins: Vec<&String> = status
        .lines()
        .iter()
        .filter(|l| l.starts_with("Begin"))
        .collect();
    assert_eq!(begins, vec!["Begin toggling aoc", "Begin toggling asus"]);
}

#[test]
fn batch_policy_from_flag() {
    assert_eq!(BatchPolicy::from_continue_flag(false), BatchPolicy::FailFast);
    assert_eq!(
        BatchPolicy::from_continue_flag(true),
        BatchPolicy::ContinueOnError
    );
}
