mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use lwrf_core::Hub;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // No hub needed
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "lwrf", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let resolved = config::resolve_hub(&cli.global)?;
            debug!(profile = %resolved.profile_name, hub = %resolved.config.ip, "resolved hub");

            let hub = Hub::new(resolved.config);
            hub.load_static(resolved.static_devices).await;

            debug!(command = ?cmd, "dispatching command");
            let result = tokio::select! {
                result = commands::dispatch(cmd, &hub, &cli.global) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted, closing hub connection");
                    Err(CliError::Interrupted)
                }
            };
            hub.close().await;
            result
        }
    }
}
