//! Clap derive structures for the `lwrf` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use lwrf_core::ManagerProtocol;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lwrf -- control LightwaveRF devices through a Wi-Fi Link hub
#[derive(Debug, Parser)]
#[command(
    name = "lwrf",
    version,
    about = "Control LightwaveRF devices from the command line",
    long_about = "Sends commands to a LightwaveRF Wi-Fi Link hub over the local network.\n\n\
        Device lists come from the LightwaveRF manager service (legacy or cloud)\n\
        or from static devices configured in a profile.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Hub profile to use
    #[arg(long, short = 'p', env = "LWRF_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Hub IP address (overrides profile)
    #[arg(long, env = "LWRF_HUB_IP", global = true)]
    pub hub_ip: Option<String>,

    /// Manager account email (overrides profile)
    #[arg(long, env = "LWRF_EMAIL", global = true, hide_env = true)]
    pub email: Option<String>,

    /// Manager host (overrides profile)
    #[arg(long, global = true)]
    pub manager_host: Option<String>,

    /// Manager API generation
    #[arg(long, global = true)]
    pub protocol: Option<ProtocolArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LWRF_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Gap between hub commands in milliseconds
    #[arg(long, env = "LWRF_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProtocolArg {
    /// Cloud API for control-api.lightwaverf.com, legacy page otherwise
    Auto,
    /// Legacy manager page
    V1,
    /// Cloud token API
    V2,
}

impl From<ProtocolArg> for ManagerProtocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Auto => Self::Auto,
            ProtocolArg::V1 => Self::V1,
            ProtocolArg::V2 => Self::V2,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List known devices (synchronized from the manager, plus static ones)
    #[command(alias = "ls")]
    Devices(DevicesArgs),

    /// Turn a device on
    On(DeviceTarget),

    /// Turn a device off
    Off(DeviceTarget),

    /// Open a blind or door
    Open(DeviceTarget),

    /// Close a blind or door
    Close(DeviceTarget),

    /// Stop a moving blind or door
    Stop(DeviceTarget),

    /// Turn every device in a room off
    RoomOff(RoomTarget),

    /// Dim a device to a percentage
    Dim(DimArgs),

    /// Blink a device on and off to locate it
    Identify(DeviceTarget),

    /// Pair this client with the hub (confirm on the hub afterwards)
    Register,

    /// Read the energy monitor
    Energy,

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Skip manager synchronization; list configured devices only
    #[arg(long)]
    pub static_only: bool,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct DeviceTarget {
    /// Room number
    pub room: u32,
    /// Device number within the room
    pub device: u32,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct RoomTarget {
    /// Room number
    pub room: u32,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct DimArgs {
    /// Room number
    pub room: u32,
    /// Device number within the room
    pub device: u32,
    /// Brightness, 0-100 (0 turns the device off)
    #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
    pub percent: u8,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Print the loaded configuration (PINs redacted)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
