use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use env_logger::Env;

use crate::config::EffectiveConfig;
use crate::engine::{Engine, EngineOptions};
use crate::exit::ExitCodeStyle;

#[derive(Debug, Parser)]
#[command(
    name = "copa-wiz",
    version,
    about = "Convert a Wiz vulnerability report into an update manifest for the image patcher"
)]
pub struct Cli {
    /// Wiz JSON report to convert
    pub report_file: PathBuf,
    /// Config file (default: ~/.config/copa-wiz/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Architecture written to the manifest (default: amd64)
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,
    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,
    /// Use a distinct exit code per error kind instead of 1 for every failure
    #[arg(long)]
    pub detailed_exit_codes: bool,
    /// Print debug logs to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

const DETAILED_EXIT_CODES_FLAG: &str = "--detailed-exit-codes";

pub fn run() -> Result<()> {
    run_from(std::env::args_os())
}

pub fn run_from<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) => return handle_parse_error(err, &args),
    };

    let log_level = if cli.verbose { "debug" } else { "warn" };
    let _ = env_logger::try_init_from_env(Env::default().default_filter_or(log_level));

    let home_dir = std::env::var_os("HOME").map(PathBuf::from);
    let env_config_path = std::env::var_os(crate::config::ENV_CONFIG).map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        home_dir.as_deref(),
    )
    .map_err(|err| {
        let style = early_style(cli.detailed_exit_codes);
        crate::exit::with_style(crate::exit::usage_err(err), style)
    })?;
    if let Ok(json) = serde_json::to_string(&cfg) {
        log::debug!("effective config: {json}");
    }

    let style = if cli.detailed_exit_codes || cfg.exit.detailed_codes {
        ExitCodeStyle::Detailed
    } else {
        ExitCodeStyle::Collapsed
    };

    let mut stdout = std::io::stdout().lock();
    execute(&cli, &cfg, &mut stdout).map_err(|err| crate::exit::with_style(err, style))
}

/// Runs the conversion for parsed arguments and writes the manifest to `out`.
pub fn execute(cli: &Cli, cfg: &EffectiveConfig, out: &mut dyn Write) -> Result<()> {
    let default_arch = match cli.arch.as_deref().map(str::trim) {
        Some("") => return Err(crate::exit::usage("--arch must not be empty")),
        Some(arch) => arch.to_string(),
        None => cfg.manifest.default_arch.clone(),
    };

    let engine = Engine::new(EngineOptions { default_arch });
    log::debug!("converting {}", cli.report_file.display());
    let manifest = engine.parse(&cli.report_file)?;

    crate::ui::write_manifest(out, &manifest, cli.pretty || cfg.output.pretty)
        .context("failed to write manifest to stdout")
        .map_err(crate::exit::output_err)
}

fn handle_parse_error(err: clap::Error, args: &[OsString]) -> Result<()> {
    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        err.print().context("failed to print help")?;
        return Ok(());
    }

    let wants_detailed = args
        .iter()
        .skip(1)
        .take_while(|arg| *arg != "--")
        .any(|arg| arg == DETAILED_EXIT_CODES_FLAG);

    let rendered = err.to_string();
    let message = rendered.trim_end();
    let message = message.strip_prefix("error: ").unwrap_or(message);
    Err(crate::exit::with_style(
        crate::exit::usage(message),
        early_style(wants_detailed),
    ))
}

fn early_style(flag: bool) -> ExitCodeStyle {
    let from_env = crate::config::detailed_codes_from_env()
        .ok()
        .flatten()
        .unwrap_or(false);
    if flag || from_env {
        ExitCodeStyle::Detailed
    } else {
        ExitCodeStyle::Collapsed
    }
}
