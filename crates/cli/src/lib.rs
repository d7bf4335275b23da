use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    ConfigArgs, CorrectArgs, ResolveArgs, TagArgs, TriggersArgs, VersionArgs, handle_config,
    handle_correct, handle_resolve, handle_tag, handle_triggers, handle_version,
};
pub mod commands;
pub mod context;
mod logging;
pub mod options;

pub use context::CommandContext;
pub use logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "branchbuild",
    author,
    version,
    about = "Branch based building and source correction for multi-repository builds",
    help_template = "{name} {version}\n{about}\n\n{usage-heading} {usage}\n\n{all-args}"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Correct(CorrectArgs),
    Tag(TagArgs),
    Version(VersionArgs),
    Resolve(ResolveArgs),
    Triggers(TriggersArgs),
    Config(ConfigArgs),
}

pub async fn main(args: &[String]) -> Result<()> {
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose, cli.json_logs);
    match cli.command {
        Commands::Correct(args) => handle_correct(&args).await?,
        Commands::Tag(args) => handle_tag(&args).await?,
        Commands::Version(args) => handle_version(&args).await?,
        Commands::Resolve(args) => handle_resolve(&args).await?,
        Commands::Triggers(args) => handle_triggers(&args).await?,
        Commands::Config(args) => handle_config(&args).await?,
    }
    Ok(())
}
