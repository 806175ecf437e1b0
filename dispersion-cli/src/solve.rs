//! Solve command implementation for the dispersion CLI.

use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use dispersion_core::{
    ModelOptions, ModelType, SolveConfig, SolveResult, SolverBackend, TuningKnobs, Verbosity,
    solve_instance,
};
use dispersion_data::{ReadOptions, read_instance};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BACKEND, ARG_DECIMAL_POINTS, ARG_DISTINCT_SITES, ARG_INSTANCE, ARG_LINEARIZATION_LEVEL,
    ARG_MAX_PRESOLVE_ITERATIONS, ARG_MODEL_TYPE, ARG_ORDERING, ARG_OUTPUT, ARG_PRESOLVE,
    ARG_PROBING_LEVEL, ARG_TIME_LIMIT, ARG_VERBOSITY, ARG_WORKERS, CliError, ENV_INSTANCE,
};

/// Backend selected with `--backend`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum BackendKind {
    /// Finite-domain constraint programming (Pumpkin).
    #[default]
    Fd,
    /// Mixed-integer programming.
    Milp,
}

/// Progress output selected with `--verbosity`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum VerbosityLevel {
    Quiet,
    #[default]
    Normal,
}

impl From<VerbosityLevel> for Verbosity {
    fn from(level: VerbosityLevel) -> Self {
        match level {
            VerbosityLevel::Quiet => Self::Quiet,
            VerbosityLevel::Normal => Self::Normal,
        }
    }
}

/// `on`/`off` switch for boolean tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Toggle {
    On,
    Off,
}

/// Variable ordering for the finite-domain backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum VariableOrdering {
    /// Smallest domain first.
    #[default]
    FirstFail,
    /// Declaration order.
    Lexico,
}

/// CLI arguments for the `solve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "solve",
    long_about = "Read a p-dispersion instance, place its facilities on \
                 candidate sites so the smallest pairwise distance is as \
                 large as possible, and print the result as JSON. Options \
                 can come from CLI flags, configuration files, or \
                 environment variables.",
    about = "Solve a p-dispersion instance"
)]
#[ortho_config(prefix = "DISPERSION")]
pub(crate) struct SolveArgs {
    /// Path to the instance file.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) instance_path: Option<Utf8PathBuf>,
    /// Solver backend.
    #[arg(long = ARG_BACKEND, value_enum)]
    #[serde(default)]
    pub(crate) backend: Option<BackendKind>,
    /// Model formulation (`Element` or `1DElement`).
    #[arg(long = ARG_MODEL_TYPE, value_name = "name")]
    #[serde(default)]
    pub(crate) model_type: Option<String>,
    /// Wall-clock budget in seconds.
    #[arg(long = ARG_TIME_LIMIT, value_name = "seconds")]
    #[serde(default)]
    pub(crate) time_limit: Option<u64>,
    /// Worker threads.
    #[arg(long = ARG_WORKERS, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<NonZeroUsize>,
    /// Progress output level.
    #[arg(long = ARG_VERBOSITY, value_enum)]
    #[serde(default)]
    pub(crate) verbosity: Option<VerbosityLevel>,
    /// Enable or disable presolve.
    #[arg(long = ARG_PRESOLVE, value_enum)]
    #[serde(default)]
    pub(crate) presolve: Option<Toggle>,
    /// Cap on presolve rounds.
    #[arg(long = ARG_MAX_PRESOLVE_ITERATIONS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_presolve_iterations: Option<u32>,
    /// Linear relaxation level; `0` disables.
    #[arg(long = ARG_LINEARIZATION_LEVEL, value_name = "level")]
    #[serde(default)]
    pub(crate) linearization_level: Option<u8>,
    /// Probing level; `0` disables.
    #[arg(long = ARG_PROBING_LEVEL, value_name = "level")]
    #[serde(default)]
    pub(crate) probing_level: Option<u8>,
    /// Variable ordering for the finite-domain backend.
    #[arg(long = ARG_ORDERING, value_enum)]
    #[serde(default)]
    pub(crate) ordering: Option<VariableOrdering>,
    /// Fractional digits kept when reading values.
    #[arg(long = ARG_DECIMAL_POINTS, value_name = "digits")]
    #[serde(default)]
    pub(crate) decimal_points: Option<u32>,
    /// Require facilities to occupy distinct sites.
    #[arg(
        long = ARG_DISTINCT_SITES,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) distinct_sites: Option<bool>,
    /// Write the JSON result to this file instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl SolveArgs {
    pub(crate) fn into_config(self) -> Result<SolveCommandConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SolveCommandConfig::try_from(merged)
    }
}

/// Resolved `solve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SolveCommandConfig {
    pub(crate) instance_path: Utf8PathBuf,
    pub(crate) backend: BackendKind,
    pub(crate) model_type: ModelType,
    pub(crate) ordering: VariableOrdering,
    pub(crate) read: ReadOptions,
    pub(crate) model: ModelOptions,
    pub(crate) solve: SolveConfig,
    pub(crate) output: Option<Utf8PathBuf>,
}

impl SolveCommandConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.instance_path, ARG_INSTANCE)
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match dispersion_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) if path.is_dir() => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Ok(false) => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<SolveArgs> for SolveCommandConfig {
    type Error = CliError;

    fn try_from(args: SolveArgs) -> Result<Self, Self::Error> {
        let instance_path = args.instance_path.ok_or(CliError::MissingArgument {
            field: ARG_INSTANCE,
            env: ENV_INSTANCE,
        })?;
        let model_type = match args.model_type.as_deref() {
            Some(name) => name.parse::<ModelType>()?,
            None => ModelType::default(),
        };

        let defaults = SolveConfig::default();
        let solve = SolveConfig {
            time_limit: args
                .time_limit
                .map_or(defaults.time_limit, Duration::from_secs),
            workers: args.workers,
            verbosity: args.verbosity.unwrap_or_default().into(),
            tuning: TuningKnobs {
                presolve: args.presolve.map(|toggle| toggle == Toggle::On),
                max_presolve_iterations: args.max_presolve_iterations,
                linearization_level: args.linearization_level,
                probing_level: args.probing_level,
            },
        };

        Ok(Self {
            instance_path,
            backend: args.backend.unwrap_or_default(),
            model_type,
            ordering: args.ordering.unwrap_or_default(),
            read: ReadOptions {
                decimal_points: args.decimal_points.unwrap_or(0),
            },
            model: ModelOptions {
                distinct_sites: args.distinct_sites.unwrap_or(false),
            },
            solve,
            output: args.output,
        })
    }
}

/// Builds the backend for the current solve invocation.
pub(super) trait SolveBackendBuilder {
    fn build(&self, config: &SolveCommandConfig) -> Result<Box<dyn SolverBackend>, CliError>;
}

pub(super) struct DefaultSolveBackendBuilder;

impl SolveBackendBuilder for DefaultSolveBackendBuilder {
    fn build(&self, config: &SolveCommandConfig) -> Result<Box<dyn SolverBackend>, CliError> {
        match config.backend {
            BackendKind::Fd => build_fd(config.ordering),
            BackendKind::Milp => build_milp(config.ordering),
        }
    }
}

#[cfg(feature = "solver-fd")]
fn build_fd(ordering: VariableOrdering) -> Result<Box<dyn SolverBackend>, CliError> {
    use dispersion_solver_fd::{FdSolver, FdSolverConfig, SearchOrdering};

    let ordering = match ordering {
        VariableOrdering::FirstFail => SearchOrdering::FirstFail,
        VariableOrdering::Lexico => SearchOrdering::Lexico,
    };
    Ok(Box::new(FdSolver::with_config(FdSolverConfig { ordering })))
}

#[cfg(not(feature = "solver-fd"))]
fn build_fd(_ordering: VariableOrdering) -> Result<Box<dyn SolverBackend>, CliError> {
    Err(CliError::MissingFeature {
        feature: "solver-fd",
        action: "the fd backend",
    })
}

#[cfg(feature = "solver-milp")]
fn build_milp(ordering: VariableOrdering) -> Result<Box<dyn SolverBackend>, CliError> {
    if ordering != VariableOrdering::default() {
        log::debug!("the milp backend ignores --{ARG_ORDERING}");
    }
    Ok(Box::new(dispersion_solver_milp::MilpSolver::new()))
}

#[cfg(not(feature = "solver-milp"))]
fn build_milp(_ordering: VariableOrdering) -> Result<Box<dyn SolverBackend>, CliError> {
    Err(CliError::MissingFeature {
        feature: "solver-milp",
        action: "the milp backend",
    })
}

pub(super) fn run_solve(args: SolveArgs) -> Result<(), CliError> {
    let config = resolve_solve_config(args)?;
    init_logging(config.solve.verbosity);
    let mut stdout = std::io::stdout().lock();
    solve_and_write(&config, &DefaultSolveBackendBuilder, &mut stdout)
}

pub(super) fn run_solve_with(
    args: SolveArgs,
    builder: &dyn SolveBackendBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_solve_config(args)?;
    solve_and_write(&config, builder, writer)
}

fn solve_and_write(
    config: &SolveCommandConfig,
    builder: &dyn SolveBackendBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let result = execute_solve(config, builder)?;
    log::info!(
        "{}: {:?}, objective {:?}, assignment {:?}",
        result.source_id,
        result.status,
        result.objective,
        result.assignment
    );
    match &config.output {
        Some(path) => write_result_file(path, &result),
        None => write_solve_result(writer, &result),
    }
}

fn execute_solve(
    config: &SolveCommandConfig,
    builder: &dyn SolveBackendBuilder,
) -> Result<SolveResult, CliError> {
    let instance = read_instance(&config.instance_path, config.read)?;
    let backend = builder.build(config)?;
    log::debug!(
        "solving {} with the {} backend ({:?} model)",
        config.instance_path,
        backend.name(),
        config.model_type
    );
    solve_instance(
        &instance,
        config.model,
        backend.as_ref(),
        &config.solve,
        config.instance_path.as_str(),
    )
    .map_err(|source| CliError::Solve { source })
}

fn resolve_solve_config(args: SolveArgs) -> Result<SolveCommandConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn init_logging(verbosity: Verbosity) {
    let filter = if verbosity.is_normal() { "info" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("a logger is already installed");
    }
}

fn render(result: &SolveResult) -> Result<String, CliError> {
    let mut payload = serde_json::to_string_pretty(result).map_err(CliError::SerialiseResult)?;
    payload.push('\n');
    Ok(payload)
}

fn write_solve_result(writer: &mut dyn Write, result: &SolveResult) -> Result<(), CliError> {
    let payload = render(result)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.flush().map_err(CliError::WriteOutput)
}

fn write_result_file(path: &Utf8Path, result: &SolveResult) -> Result<(), CliError> {
    let payload = render(result)?;
    dispersion_fs::write_utf8_file(path, payload.as_bytes()).map_err(|source| {
        CliError::WriteResultFile {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SolveCommandConfig, CliError> {
    let merged = SolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SolveCommandConfig::try_from(merged)
}
