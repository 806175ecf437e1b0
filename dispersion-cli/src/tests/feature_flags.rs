//! Unit tests covering backends compiled out through cargo features.

#![cfg(not(all(feature = "solver-fd", feature = "solver-milp")))]

use super::helpers::{THREE_SITES, utf8_root, write_utf8};
use super::*;
use crate::solve::{BackendKind, DefaultSolveBackendBuilder, run_solve_with};
use rstest::rstest;
use tempfile::TempDir;

fn disabled_backend() -> (BackendKind, &'static str) {
    if cfg!(feature = "solver-fd") {
        (BackendKind::Milp, "solver-milp")
    } else {
        (BackendKind::Fd, "solver-fd")
    }
}

#[rstest]
fn selecting_a_disabled_backend_reports_the_feature() {
    let tmp = TempDir::new().expect("tempdir");
    let path = utf8_root(&tmp).join("three.txt");
    write_utf8(&path, THREE_SITES.as_bytes());
    let (backend, expected) = disabled_backend();

    let args = SolveArgs {
        instance_path: Some(path),
        backend: Some(backend),
        ..SolveArgs::default()
    };
    let mut sink = Vec::new();
    let err = run_solve_with(args, &DefaultSolveBackendBuilder, &mut sink)
        .expect_err("missing feature should error");
    match err {
        CliError::MissingFeature { feature, .. } => assert_eq!(feature, expected),
        other => panic!("expected MissingFeature, found {other:?}"),
    }
    assert!(sink.is_empty());
}
