use std::io::IsTerminal;
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use rk_core::{BindError, Host, HostConfig};
use rk_stdlib::{ManifestCluster, stdlib_commands};

mod config;
#[cfg(test)]
mod config_test;
mod repl;

use config::{FileConfig, Overrides, Settings};

const DEFAULT_LOG_FILTER: &str = "rk::verb=info,rk_core=warn,rk_stdlib=warn,rk_cli=info";

#[derive(Debug, Parser)]
#[command(name = "rk", author, version, about = "Drive a cluster API from Lua scripts", long_about = None)]
struct CliArgs {
    /// Script to run; without it (and without -e) an interactive session starts
    #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
    file: Option<PathBuf>,

    /// Config file (defaults to ./rk.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Manifest file serving as the cluster snapshot; repeatable
    #[arg(long = "cluster", value_name = "PATH")]
    clusters: Vec<PathBuf>,

    /// Default namespace for fetches
    #[arg(short = 'n', long, value_name = "NAMESPACE")]
    namespace: Option<String>,

    /// Command to leave out of the session; repeatable
    #[arg(long, value_name = "NAME")]
    omit: Vec<String>,

    /// Inline code, run after FILE
    #[arg(short = 'e', long = "eval", value_name = "CODE")]
    code: Option<String>,

    /// Do not log verb calls
    #[arg(short, long)]
    quiet: bool,
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in script paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

/// `RK_LOG`, then `RUST_LOG`, then the built-in default.
fn log_filter_expr(rk_log: Option<String>, rust_log: Option<String>) -> String {
    [rk_log, rust_log]
        .into_iter()
        .flatten()
        .map(|raw| raw.trim().to_string())
        .find(|raw| !raw.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn init_tracing(quiet: bool) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let expr = log_filter_expr(std::env::var("RK_LOG").ok(), std::env::var("RUST_LOG").ok());
    let mut filter = EnvFilter::try_new(expr).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if quiet && let Ok(directive) = "rk::verb=off".parse() {
        filter = filter.add_directive(directive);
    }

    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(filter)
        .try_init();
}

fn settings_from(args: &CliArgs) -> anyhow::Result<Settings> {
    let file = FileConfig::discover(args.config.as_deref())?;
    Ok(Settings::merge(
        file,
        Overrides {
            namespace: args.namespace.as_deref(),
            manifests: &args.clusters,
            omit: &args.omit,
        },
    ))
}

fn open_host(settings: &Settings) -> anyhow::Result<Host> {
    let cluster =
        ManifestCluster::load(&settings.manifests).map_err(|e| BindError::Configuration(format!("{e:#}")))?;
    debug!(objects = cluster.len(), namespace = %settings.namespace, "cluster snapshot loaded");
    let config = HostConfig::new(Rc::new(cluster)).namespace(settings.namespace.clone());
    Ok(Host::initialize(config, stdlib_commands()?, &settings.omit)?)
}

fn execute(host: &Host, args: &CliArgs) -> anyhow::Result<()> {
    if args.file.is_none() && args.code.is_none() {
        return repl::run(host);
    }
    if let Some(path) = &args.file {
        let source = std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))?;
        host.run_named(&source, &path.display().to_string())?;
    }
    if let Some(code) = &args.code {
        host.run_named(code, "-e")?;
    }
    Ok(())
}

fn run(args: &CliArgs) -> anyhow::Result<()> {
    let settings = settings_from(args)?;
    let mut host = open_host(&settings)?;
    let outcome = execute(&host, args);
    let closed = host.close();
    outcome?;
    closed?;
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
