//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads inputs, calls the library and prints results to a locked stdout.

mod error;
mod input;
mod output;

pub use error::RunnerError;

use std::io::Write;

use anyhow::{Context, Result};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{Cli, Commands, FlagsArgs};
use crate::graph::topologically_sorted;
use crate::ninja::{compute_output_file_name, generate_compile_db_with_ninja};
use crate::spec::TargetSpec;
use crate::toolchain::{Flavor, GeneratorParams, PredefineProber, ToolchainEnv, get_flavor};
use crate::xcode::XcodeSettings;
use input::read_json;
use output::{write_json, write_line};

/// Flags printed by the `flags` command.
#[derive(Debug, Serialize)]
struct FlagsReport {
    cflags: Vec<String>,
    cflags_c: Vec<String>,
    cflags_cc: Vec<String>,
    cflags_objc: Vec<String>,
    cflags_objcc: Vec<String>,
    ldflags: Vec<String>,
    libtool_flags: Vec<String>,
}

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded, the requested operation
/// fails, or stdout cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    run_with(cli, &mut stdout)
}

fn run_with(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Commands::Flavor { flavor } => {
            let params = GeneratorParams {
                flavor: flavor.clone(),
            };
            let detected = get_flavor(&params).context("detect flavor")?;
            write_line(out, detected.as_str())
        }
        Commands::Predefines => {
            let predefines = PredefineProber::new(ToolchainEnv::from_process())
                .probe()
                .context("probe cross-compiler predefines")?;
            write_json(out, &predefines)
        }
        Commands::Order { graph } => handle_order(graph, out),
        Commands::Flags(args) => handle_flags(args, out),
        Commands::OutputName { target, flavor } => {
            handle_output_name(target, flavor.as_deref(), out)
        }
        Commands::Compdb { build_dir } => {
            let entries = generate_compile_db_with_ninja(build_dir)
                .with_context(|| format!("query compile database in {build_dir}"))?;
            info!(count = entries.len(), "collected compile commands");
            write_json(out, &entries)
        }
    }
}

fn handle_order(graph_path: &Utf8Path, out: &mut impl Write) -> Result<()> {
    let graph: IndexMap<String, Vec<String>> = read_json(graph_path)?;
    let order = topologically_sorted(graph.keys().cloned(), &|node: &String| {
        graph.get(node).cloned().unwrap_or_default()
    })
    .with_context(|| format!("order nodes of {graph_path}"))?;
    debug!(nodes = order.len(), "ordered graph");
    write_json(out, &order)
}

fn handle_flags(args: &FlagsArgs, out: &mut impl Write) -> Result<()> {
    let spec: TargetSpec = read_json(&args.target)?;
    let env = ToolchainEnv::from_process();
    let settings = XcodeSettings::new(&spec).with_cross_compile(env.crosscompile_requested);
    let configuration = args.configuration.as_str();
    let arch = args.arch.as_deref();
    let report = FlagsReport {
        cflags: settings.get_cflags(configuration, arch)?,
        cflags_c: settings.get_cflags_c(configuration)?,
        cflags_cc: settings.get_cflags_cc(configuration)?,
        cflags_objc: settings.get_cflags_objc(configuration)?,
        cflags_objcc: settings.get_cflags_objcc(configuration)?,
        ldflags: settings.get_ldflags(configuration, &args.product_dir, str::to_owned, arch)?,
        libtool_flags: settings.get_libtool_flags(configuration)?,
    };
    write_json(out, &report)
}

fn handle_output_name(
    target: &Utf8Path,
    flavor: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let spec: TargetSpec = read_json(target)?;
    let resolved = match flavor {
        Some(name) => Flavor::from(name),
        None => get_flavor(&GeneratorParams::default()).context("detect flavor")?,
    };
    let name = compute_output_file_name(&spec, &spec.target_type, &resolved)?;
    write_line(out, &name)
}
