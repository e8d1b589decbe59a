//! Device and room control: on/off, open/close/stop, dim, identify, register.

use serde::Serialize;
use tracing::debug;

use lwrf_core::{Ack, Action, Hub, HubCommand};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Result of one hub command, as reported to the user.
#[derive(Debug, Serialize)]
struct Outcome {
    command: String,
    status: &'static str,
    reply: Option<String>,
}

impl Outcome {
    fn new(command: &HubCommand, ack: &Ack) -> Self {
        let status = match ack {
            Ack::Replied(_) => "replied",
            Ack::Coalesced => "coalesced",
            Ack::Superseded => "superseded",
        };
        Self {
            command: command.label(),
            status,
            reply: ack.content().map(ToOwned::to_owned),
        }
    }
}

fn detail(outcome: &Outcome, color: bool) -> String {
    match outcome.reply.as_deref() {
        Some(reply) => format!(
            "{} {} ({reply})",
            output::success("sent", color),
            outcome.command
        ),
        None => format!(
            "{} {} ({})",
            output::notice("skipped", color),
            outcome.command,
            outcome.status
        ),
    }
}

/// Commands with a single hub round trip.
fn single_command(cmd: &Command) -> Option<HubCommand> {
    Some(match *cmd {
        Command::On(t) => HubCommand::on(t.room, t.device),
        Command::Off(t) => HubCommand::off(t.room, t.device),
        Command::Open(t) => HubCommand::device(t.room, t.device, Action::Open),
        Command::Close(t) => HubCommand::device(t.room, t.device, Action::Close),
        Command::Stop(t) => HubCommand::device(t.room, t.device, Action::Stop),
        Command::RoomOff(t) => HubCommand::room_off(t.room),
        Command::Dim(d) => HubCommand::dim(d.room, d.device, d.percent),
        Command::Register => HubCommand::register(),
        _ => return None,
    })
}

pub async fn handle(hub: &Hub, cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    hub.start().await?;

    let (command, ack) = if let Command::Identify(t) = cmd {
        let ack = hub.identify(t.room, t.device).await?;
        (HubCommand::off(t.room, t.device), ack)
    } else {
        let Some(command) = single_command(&cmd) else {
            return Err(CliError::Validation {
                field: "command".into(),
                reason: format!("{cmd:?} does not talk to the hub"),
            });
        };
        debug!(command = %command.label(), "executing");
        let ack = hub.execute(command).await?;
        (command, ack)
    };

    let outcome = Outcome::new(&command, &ack);
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &outcome,
        |o| detail(o, color),
        |o| o.reply.clone().unwrap_or_else(|| o.status.to_owned()),
    );
    output::print_output(&out, global.quiet);

    if matches!(cmd, Command::Register) && !global.quiet {
        eprintln!("Confirm the pairing request on the hub.");
    }
    Ok(())
}
