mod config;
mod logging;

use clap::{Args, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "keyrelay", about = "Password-gated proxy that rotates upstream API keys")]
enum CliCommand {
    /// Run the proxy and admin listeners
    Proxy(ConfigArgs),
    /// Load and validate a config file, then exit
    ValidateConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to the YAML config file
    #[arg(long, short, default_value = "keyrelay.yaml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match cli {
        CliCommand::Proxy(args) => run_proxy(&args.config),
        CliCommand::ValidateConfig(args) => match config::Config::from_file(&args.config) {
            Ok(_) => {
                println!("{}: ok", args.config.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {e}", args.config.display());
                ExitCode::FAILURE
            }
        },
    }
}

fn run_proxy(path: &std::path::Path) -> ExitCode {
    let config = match config::Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let _sentry_guard = match logging::init(config.common.logging.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Invalid sentry_dsn: {e}");
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(proxy::run(config.proxy)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Proxy exited with error");
            ExitCode::FAILURE
        }
    }
}
