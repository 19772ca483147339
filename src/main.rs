use clap::Parser;
use scowl_deploy::config::{Config, Verbosity};
use scowl_deploy::constants::{DEPLOY_ROOT, SERVICE_UNIT};
use scowl_deploy::deploy::{self, DeployOutcome};
use scowl_deploy::output::{self, ProgressCallbacks};
use scowl_deploy::service::SystemdUnit;
use std::path::Path;
use std::process::ExitCode;

/// Update the live checkout from upstream, rebuild scowl.db, swap it into
/// place, and restart the service.
#[derive(Parser)]
#[command(name = "scowl-deploy", version)]
struct Cli {
    /// Only print the final outcome line (failures go to stderr).
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Trace every external command as it runs.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config {
        verbosity: if cli.quiet {
            Verbosity::Quiet
        } else if cli.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        },
    };

    let root = Path::new(DEPLOY_ROOT);
    let service = SystemdUnit::new(SERVICE_UNIT);
    let callbacks = ProgressCallbacks::new(output::create_progress(&config), config);

    let result = deploy::run(root, &service, &callbacks, &config);
    callbacks.finish(&result);
    output::print_summary(&result, &config);

    match result.outcome {
        DeployOutcome::Success(_) => ExitCode::SUCCESS,
        DeployOutcome::Failed(_) => ExitCode::FAILURE,
    }
}
