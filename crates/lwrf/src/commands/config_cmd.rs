//! Config subcommand handlers.

use lwrf_config::{config_path, load_config, to_toml};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
        }
        ConfigCommand::Show => {
            let config = load_config()?;
            output::print_output(to_toml(&config)?.trim_end(), global.quiet);
        }
    }
    Ok(())
}
