//! Behavioural tests for `read_instance`.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use dispersion_core::InstanceData;
use dispersion_data::{InstanceReadError, ParseError, ReadOptions, read_instance};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

type ReadResult = Result<InstanceData, InstanceReadError>;

fn fixture_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[fixture]
fn target() -> RefCell<Option<Utf8PathBuf>> {
    RefCell::new(None)
}

#[fixture]
fn read_result() -> RefCell<Option<ReadResult>> {
    RefCell::new(None)
}

fn read_instance_ok(result: &RefCell<Option<ReadResult>>) -> InstanceData {
    result
        .borrow()
        .as_ref()
        .expect("read was attempted")
        .as_ref()
        .expect("expected an instance")
        .clone()
}

#[given("the three-site instance file")]
fn three_site_file(#[from(target)] target: &RefCell<Option<Utf8PathBuf>>) {
    *target.borrow_mut() = Some(fixture_path("three_sites.txt"));
}

#[given("a path to a missing instance file")]
fn missing_file(#[from(target)] target: &RefCell<Option<Utf8PathBuf>>) {
    *target.borrow_mut() = Some(fixture_path("missing.txt"));
}

#[given("an instance file with a malformed threshold")]
fn malformed_file(#[from(target)] target: &RefCell<Option<Utf8PathBuf>>) {
    *target.borrow_mut() = Some(fixture_path("bad_threshold.txt"));
}

#[when("I read the instance")]
fn read(
    #[from(target)] target: &RefCell<Option<Utf8PathBuf>>,
    #[from(read_result)] result: &RefCell<Option<ReadResult>>,
) {
    let outcome = {
        let guard = target.borrow();
        let path = guard.as_ref().expect("target path prepared");
        read_instance(path, ReadOptions::default())
    };
    *result.borrow_mut() = Some(outcome);
}

#[then("the instance has 3 sites and 2 facility slots")]
fn instance_shape(#[from(read_result)] result: &RefCell<Option<ReadResult>>) {
    let instance = read_instance_ok(result);
    assert_eq!(instance.points(), 3);
    assert_eq!(instance.facilities(), 2);
}

#[then("the distance between sites 0 and 2 is 10")]
fn distance(#[from(read_result)] result: &RefCell<Option<ReadResult>>) {
    let instance = read_instance_ok(result);
    assert_eq!(instance.distance(0, 2), Some(10));
    assert_eq!(instance.threshold(0, 1), Some(3));
}

#[then("an open error names the missing file")]
fn open_error(#[from(read_result)] result: &RefCell<Option<ReadResult>>) {
    let borrowed = result.borrow();
    match borrowed.as_ref().expect("read was attempted") {
        Err(InstanceReadError::Open { path, .. }) => {
            assert!(path.ends_with("missing.txt"), "unexpected path {path}");
        }
        other => panic!("expected an open error, got {other:?}"),
    }
}

#[then("a parse error points at line 8")]
fn parse_error(#[from(read_result)] result: &RefCell<Option<ReadResult>>) {
    let borrowed = result.borrow();
    match borrowed.as_ref().expect("read was attempted") {
        Err(InstanceReadError::Parse {
            source: ParseError::InvalidNumber { line, value, .. },
            ..
        }) => {
            assert_eq!(*line, 8);
            assert_eq!(value, "abc");
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[scenario(path = "tests/features/read_instance.feature", index = 0)]
fn reading_well_formed_instance(
    target: RefCell<Option<Utf8PathBuf>>,
    read_result: RefCell<Option<ReadResult>>,
) {
    let _ = (target, read_result);
}

#[scenario(path = "tests/features/read_instance.feature", index = 1)]
fn reporting_missing_file(
    target: RefCell<Option<Utf8PathBuf>>,
    read_result: RefCell<Option<ReadResult>>,
) {
    let _ = (target, read_result);
}

#[scenario(path = "tests/features/read_instance.feature", index = 2)]
fn reporting_malformed_threshold(
    target: RefCell<Option<Utf8PathBuf>>,
    read_result: RefCell<Option<ReadResult>>,
) {
    let _ = (target, read_result);
}
