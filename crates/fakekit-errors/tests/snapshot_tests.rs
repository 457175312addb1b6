//! Snapshot tests for error message formatting.
//!
//! Test failures print these strings, so they are kept stable.

use fakekit_errors::FakeError;
use insta::assert_snapshot;

#[test]
fn test_unknown_method() {
    assert_snapshot!(
        FakeError::unknown_method("foo").to_string(),
        @"Method 'foo' is not tracked by this fake"
    );
}

#[test]
fn test_out_of_range() {
    assert_snapshot!(
        FakeError::out_of_range("get_managed_properties", 2, 1).to_string(),
        @"Call index 2 out of range for 'get_managed_properties' (1 calls recorded)"
    );
}

#[test]
fn test_abandoned() {
    assert_snapshot!(
        FakeError::abandoned("start_scan").to_string(),
        @"Pending await for 'start_scan' was abandoned before it resolved"
    );
}

#[test]
fn test_no_observer() {
    assert_snapshot!(
        FakeError::no_observer("scan_job").to_string(),
        @"No observer bound to event channel 'scan_job'"
    );
}

#[test]
fn test_unresolved_await() {
    assert_snapshot!(
        FakeError::unresolved("enable_hotspot", 250).to_string(),
        @"Timed out after 250ms waiting for 'enable_hotspot'"
    );
}

#[test]
fn test_wrong_type() {
    let err = FakeError::WrongType {
        key: "isHotspotEnabled".to_string(),
        expected: "bool",
    };
    assert_snapshot!(err.to_string(), @"Load-time value 'isHotspotEnabled' is not a bool");
}
