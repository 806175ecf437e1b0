//! Focused unit tests covering solve configuration and argument handling.

use super::helpers::{THREE_SITES, utf8_root, write_utf8};
use super::*;
use crate::solve::{
    BackendKind, SolveCommandConfig, VariableOrdering, config_from_layers_for_test,
};
use camino::Utf8PathBuf;
use dispersion_core::{ModelType, SolveConfig, TuningKnobs, Verbosity};
use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::json;
use std::num::NonZeroUsize;
use std::time::Duration;
use tempfile::TempDir;

fn parse(argv: &[&str]) -> Result<SolveArgs, clap::Error> {
    let cli = Cli::try_parse_from(argv)?;
    match cli.command {
        Command::Solve(args) => Ok(args),
    }
}

#[rstest]
fn converting_without_instance_errors() {
    let err = SolveCommandConfig::try_from(SolveArgs::default())
        .expect_err("missing instance should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_INSTANCE);
            assert_eq!(env, ENV_INSTANCE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn omitted_options_resolve_to_defaults() {
    let args = SolveArgs {
        instance_path: Some(Utf8PathBuf::from("three.txt")),
        ..SolveArgs::default()
    };
    let config = SolveCommandConfig::try_from(args).expect("config should build");
    assert_eq!(config.backend, BackendKind::Fd);
    assert_eq!(config.model_type, ModelType::Element);
    assert_eq!(config.ordering, VariableOrdering::FirstFail);
    assert_eq!(config.read.decimal_points, 0);
    assert!(!config.model.distinct_sites);
    assert_eq!(config.solve, SolveConfig::default());
    assert_eq!(config.output, None);
}

#[rstest]
fn flags_map_onto_solve_configuration() {
    let args = parse(&[
        "dispersion",
        "solve",
        "three.txt",
        "--backend",
        "milp",
        "--model-type",
        "1DElement",
        "--time-limit",
        "30",
        "--workers",
        "4",
        "--verbosity",
        "quiet",
        "--presolve",
        "off",
        "--max-presolve-iterations",
        "7",
        "--linearization-level",
        "0",
        "--probing-level",
        "2",
        "--ordering",
        "lexico",
        "--decimal-points",
        "2",
        "--distinct-sites",
        "--output",
        "out/result.json",
    ])
    .expect("arguments should parse");
    let config = SolveCommandConfig::try_from(args).expect("config should build");

    assert_eq!(config.instance_path, Utf8PathBuf::from("three.txt"));
    assert_eq!(config.backend, BackendKind::Milp);
    assert_eq!(config.ordering, VariableOrdering::Lexico);
    assert_eq!(config.read.decimal_points, 2);
    assert!(config.model.distinct_sites);
    assert_eq!(config.output, Some(Utf8PathBuf::from("out/result.json")));
    assert_eq!(
        config.solve,
        SolveConfig {
            time_limit: Duration::from_secs(30),
            workers: NonZeroUsize::new(4),
            verbosity: Verbosity::Quiet,
            tuning: TuningKnobs {
                presolve: Some(false),
                max_presolve_iterations: Some(7),
                linearization_level: Some(0),
                probing_level: Some(2),
            },
        }
    );
}

#[rstest]
#[case(&["dispersion", "solve", "x.txt", "--workers", "0"])]
#[case(&["dispersion", "solve", "x.txt", "--backend", "cplex"])]
#[case(&["dispersion", "solve", "x.txt", "--presolve", "maybe"])]
fn invalid_flag_values_are_rejected(#[case] argv: &[&str]) {
    parse(argv).expect_err("clap should reject the value");
}

#[rstest]
fn unknown_model_types_are_rejected() {
    let args = SolveArgs {
        instance_path: Some(Utf8PathBuf::from("three.txt")),
        model_type: Some("Ternary".to_owned()),
        ..SolveArgs::default()
    };
    let err = SolveCommandConfig::try_from(args).expect_err("model type should be rejected");
    match err {
        CliError::ModelType(source) => assert_eq!(source.0, "Ternary"),
        other => panic!("expected ModelType, found {other:?}"),
    }
}

fn config_for(instance_path: Utf8PathBuf) -> SolveCommandConfig {
    SolveCommandConfig::try_from(SolveArgs {
        instance_path: Some(instance_path),
        ..SolveArgs::default()
    })
    .expect("config should build")
}

#[rstest]
fn validate_sources_reports_missing_instance() {
    let tmp = TempDir::new().expect("tempdir");
    let config = config_for(utf8_root(&tmp).join("absent.txt"));
    match config.validate_sources().expect_err("expected failure") {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_INSTANCE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = utf8_root(&tmp).join("instances");
    std::fs::create_dir(&dir).expect("instance directory");
    let config = config_for(dir.clone());
    match config.validate_sources().expect_err("expected failure") {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_INSTANCE);
            assert_eq!(path, dir);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_accepts_existing_files() {
    let tmp = TempDir::new().expect("tempdir");
    let path = utf8_root(&tmp).join("three.txt");
    write_utf8(&path, THREE_SITES.as_bytes());
    config_for(path).validate_sources().expect("instance exists");
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "instance_path": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "instance_path": "from-file.txt",
            "backend": "milp",
            "time_limit": 5,
            "probing_level": 1,
        }),
        None,
    );
    composer.push_environment(json!({
        "instance_path": "from-env.txt",
        "backend": "fd",
    }));
    composer.push_cli(json!({ "time_limit": 9 }));

    let config = config_from_layers_for_test(composer.layers()).expect("layers should merge");
    assert_eq!(config.instance_path, Utf8PathBuf::from("from-env.txt"));
    assert_eq!(config.backend, BackendKind::Fd);
    assert_eq!(config.solve.time_limit, Duration::from_secs(9));
    assert_eq!(config.solve.tuning.probing_level, Some(1));
}
