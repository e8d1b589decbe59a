//! Energy monitor reading.

use lwrf_core::{EnergyReading, Hub};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(r: &EnergyReading) -> String {
    [
        format!("Current:   {}", r.current),
        format!("Max:       {}", r.max),
        format!("Today:     {}", r.today),
        format!("Yesterday: {}", r.yesterday),
        format!("Read at:   {}", r.read_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ]
    .join("\n")
}

pub async fn handle(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    hub.start().await?;
    let reading = hub.request_energy().await?;
    let out = output::render_single(&global.output, &reading, detail, |r| r.current.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}
