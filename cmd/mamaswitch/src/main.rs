//! mamaswitch - speaker-aware voice command sessions from the command line.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{ClassifyCommand, IdentifyCommand, RespondCommand, RunCommand};

/// mamaswitch - tells the mother's voice from the child's and answers
/// accordingly.
///
/// Configuration is read from ~/.mamaswitch/config.yaml when present.
#[derive(Parser)]
#[command(name = "mamaswitch")]
#[command(about = "Speaker-aware voice command session tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.mamaswitch/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the speaker of a WAV file
    Identify(IdentifyCommand),
    /// Extract command and attitude from text or recognizer output
    Classify(ClassifyCommand),
    /// Show the reply for a text spoken in a given role
    Respond(RespondCommand),
    /// Interactive session over stdin
    Run(RunCommand),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Identify(cmd) => cmd.run(&cli).await,
        Commands::Classify(cmd) => cmd.run(&cli),
        Commands::Respond(cmd) => cmd.run(&cli),
        Commands::Run(cmd) => cmd.run(&cli).await,
    }
}
