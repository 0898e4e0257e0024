use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wf",
    about = concat!("[~] weft v", env!("CARGO_PKG_VERSION"), " - parallel programs as plain text"),
    version,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Program file to open in the TUI (default: most recent)
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold a new program file
    New(NewArgs),
    /// Validate a program: parse issues, scope, expressions, task count
    Check(CheckArgs),
    /// Reformat a program to canonical text
    Emit(EmitArgs),
    /// Show each statement's resolved participation pairs
    Resolve(ResolveArgs),
    /// Read or edit weft.toml
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct NewArgs {
    /// Path of the program file to create (`.wft` appended if missing)
    pub file: String,
    /// Task count (default: from weft.toml)
    #[arg(long)]
    pub tasks: Option<usize>,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    pub file: String,
}

#[derive(Args)]
pub struct EmitArgs {
    pub file: String,
    /// Rewrite the file in place instead of printing
    #[arg(long)]
    pub write: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub file: String,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a config value
    Get { key: String },
    /// Set a config value (creates ./weft.toml if needed)
    Set { key: String, value: String },
}
