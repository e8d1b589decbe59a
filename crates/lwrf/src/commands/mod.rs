//! Command dispatch: routes each subcommand to its handler.

pub mod config_cmd;
pub mod control;
pub mod devices;
pub mod energy;

use lwrf_core::Hub;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Run a subcommand that needs a hub.
pub async fn dispatch(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(hub, &args, global).await,
        Command::Energy => energy::handle(hub, global).await,
        Command::Config(_) | Command::Completions(_) => {
            unreachable!("handled before the hub is built")
        }
        other => control::handle(hub, other, global).await,
    }
}
