//! Otterfetch CLI - one-shot object download from an OTTER server.
//!
//! Parses arguments and environment, wires up logging and the interactive
//! prompt, runs the download workflow from the otterfetch library, and maps
//! every outcome to the documented process exit code.

mod args;
mod error;
mod logging;
mod prompt;

use std::env;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use tracing::info;

use otterfetch::config::DEFAULT_CERT_PATH;
use otterfetch::engine::DEFAULT_SERVICE_URL;
use otterfetch::{AppConfig, DownloadRequest, HttpEngine, ProxyConfig};

use crate::args::Cli;
use crate::error::{CliError, EXIT_USAGE};
use crate::prompt::InteractiveConfirmation;

fn main() {
    // Invoked without any arguments: print usage, exit with the usage code.
    if env::args().len() <= 1 {
        let _ = Cli::command().print_help();
        std::process::exit(EXIT_USAGE);
    }
    // Unknown options make clap exit with its native code 2.
    let cli = Cli::parse();
    std::process::exit(run(cli));
}

/// Resolved invocation: the request plus everything around it.
struct Invocation {
    request: DownloadRequest,
    config: AppConfig,
    service_url: String,
}

fn run(cli: Cli) -> i32 {
    let invocation = match resolve(cli) {
        Ok(invocation) => invocation,
        Err(e) => return fail(&e.to_string(), e.exit_code()),
    };
    let _log_guard = logging::init(&invocation.config.log_dir);
    info!(
        version = otterfetch::VERSION,
        object_id = %invocation.request.object_id,
        "Starting download"
    );

    let engine = HttpEngine::new(invocation.service_url);
    match otterfetch::run(
        engine,
        &invocation.request,
        &invocation.config,
        &InteractiveConfirmation,
    ) {
        Ok(report) => {
            println!(
                "[INFO]  Downloaded content saved in: {}",
                report.path.display()
            );
            0
        }
        Err(e) => fail(&e.to_string(), e.exit_code()),
    }
}

/// Resolves arguments and environment into one invocation. Validation order:
/// object id, size argument, developer id; all before any resource exists.
fn resolve(cli: Cli) -> Result<Invocation, CliError> {
    let object_id = cli.object_id.ok_or(CliError::MissingObjectId)?;
    let expected_size = cli
        .size
        .as_deref()
        .map(args::parse_expected_size)
        .transpose()?;
    let developer_id = env_non_empty("DEVELOPER_ID").ok_or(CliError::MissingDeveloperId)?;

    let dest_dir = env_non_empty("PATH_DOWNLOAD")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let cert_path = env_non_empty("PATH_CERTIFICATE")
        .unwrap_or_else(|| DEFAULT_CERT_PATH.to_string());
    let log_dir = env_non_empty("PATH_LOG").unwrap_or_else(|| ".".to_string());
    let proxy_url = cli.proxy.or_else(|| env_non_empty("OTTER_PROXY_URL"));
    let service_url =
        env_non_empty("OTTER_SERVICE_URL").unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

    let request = DownloadRequest {
        object_id,
        developer_id,
        dest_dir,
        extension: cli.extension,
        expected_size,
        force_overwrite: cli.force,
    };
    let config = AppConfig::new(log_dir)
        .with_certificate(cert_path, cli.password)
        .with_proxy(proxy_url.map(ProxyConfig::new));
    Ok(Invocation {
        request,
        config,
        service_url,
    })
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// Prints the two-line failure report and returns the exit code.
fn fail(message: &str, code: i32) -> i32 {
    eprintln!("[ERROR] {}", message);
    eprintln!("[CODE]  {}", code);
    code
}
