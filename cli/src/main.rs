//! ansible-ls - binary entry point.
//!
//! Speaks LSP over stdin/stdout. Because stdout is the protocol channel,
//! logs go to stderr (or to the file named in `[log] file`), never stdout.
//!
//! ```text
//! main() -> load config -> init_tracing() -> ansible_ls_server::run(stdin, stdout)
//! ```

use std::{
    env,
    fs::{self, File, OpenOptions},
    io,
    path::Path,
    process::ExitCode,
    sync::Mutex,
};

use ansible_ls_config::{AnsibleLsConfig, LogConfig};
use ansible_ls_server::ServerOptions;
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directives for this server; `RUST_LOG` is consulted when unset.
const LOG_ENV: &str = "ANSIBLE_LS_LOG";

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    version: bool,
    help: bool,
    /// Arguments we don't act on, reported once logging is up.
    ignored: Vec<String>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut parsed = Self::default();
        for arg in args {
            match arg.as_str() {
                "--version" | "-V" => parsed.version = true,
                "--help" | "-h" => parsed.help = true,
                // stdio is the only transport.
                "--stdio" => {}
                _ => parsed.ignored.push(arg),
            }
        }
        parsed
    }
}

fn init_tracing(log: &LogConfig) -> Vec<String> {
    let default_directive = log.filter.as_deref().unwrap_or("info");
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut warnings = Vec::new();

    if let Some(path) = &log.file {
        match open_log_file(path) {
            Ok(file) => {
                tracing_subscriber::registry()
                    .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                    .with(env_filter)
                    .init();
                tracing::info!(path = %path.display(), "Logging initialized");
                return warnings;
            }
            Err(e) => warnings.push(format!("{e:#}; logging to stderr")),
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(io::stderr))
        .with(env_filter)
        .init();
    warnings
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log dir {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

fn print_help() {
    println!(
        "ansible-ls {}\n\n\
         Language server publishing ansible-lint findings as diagnostics.\n\
         Communicates over stdin/stdout.\n\n\
         Options:\n  \
           --stdio      use stdio transport (default)\n  \
           -V, --version  print version\n  \
           -h, --help     print this help\n\n\
         Environment:\n  \
           {LOG_ENV}    log filter (falls back to RUST_LOG, default info)\n  \
           {}  config file path",
        env!("CARGO_PKG_VERSION"),
        ansible_ls_config::CONFIG_PATH_ENV,
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse(env::args().skip(1));
    if args.version {
        println!("ansible-ls {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let (config, config_error) = match AnsibleLsConfig::load() {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(e) => (AnsibleLsConfig::default(), Some(e)),
    };

    for warning in init_tracing(&config.log) {
        tracing::warn!("{warning}");
    }
    if let Some(e) = config_error {
        let path = e.path().display().to_string();
        let err = anyhow::Error::from(e);
        tracing::warn!(path = %path, "Using default configuration: {err:#}");
    }
    if !args.ignored.is_empty() {
        tracing::debug!(args = ?args.ignored, "Ignoring unrecognized arguments");
    }

    let options = ServerOptions {
        checker: config.checker.command,
    };
    tracing::info!(checker = %options.checker, "ansible-ls starting");

    let code = ansible_ls_server::run(options, tokio::io::stdin(), tokio::io::stdout()).await;
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
