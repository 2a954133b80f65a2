//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::PathBuf;

use crate::case::Phase;
use crate::config::RunConfig;
use crate::definition::{CaseCatalog, DefinitionSource, load_definitions};
use crate::engine::Executor;
use crate::run::Harness;

use super::{CliResult, ExitCode};

fn sources(files: Vec<PathBuf>) -> Vec<DefinitionSource> {
    files.into_iter().map(DefinitionSource::from).collect()
}

/// Run both phases over every definition file. Exits with 1 if any method failed.
pub fn run_files(files: Vec<PathBuf>, config: RunConfig, catalog: CaseCatalog) -> CliResult<ExitCode> {
    let report = Harness::new(config, catalog).run_blocking(sources(files))?;
    if report.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::debug!(failed = report.failed(), "run finished with failures");
        Ok(ExitCode::FAILURE)
    }
}

/// Print each suite, its cases, and their phase methods in execution order.
pub fn list_files(files: Vec<PathBuf>, catalog: &CaseCatalog) -> CliResult<ExitCode> {
    let definitions = load_definitions(sources(files), catalog)?;
    let mut executor = Executor::new(RunConfig::default());
    executor.add_test_definitions(definitions)?;
    print!("{}", render_listing(&executor));
    Ok(ExitCode::SUCCESS)
}

fn render_listing(executor: &Executor) -> String {
    let mut out = String::new();
    for suite in executor.registry().suites() {
        out.push_str(&suite.name);
        out.push('\n');
        for entry in &suite.entries {
            out.push_str(&format!("  {}\n", entry.path));
            for method in entry.case.methods() {
                let Some(phase) = method.phase() else {
                    continue;
                };
                let tag = match phase {
                    Phase::Setup => "setup",
                    Phase::Test => "test ",
                };
                let expected = method
                    .expected
                    .as_ref()
                    .map(|e| format!(" (expects {})", e.identifier()))
                    .unwrap_or_default();
                out.push_str(&format!("    [{tag}] {}{expected}\n", method.name));
            }
        }
    }
    out
}
