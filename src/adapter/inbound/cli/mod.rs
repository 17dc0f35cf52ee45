//! CLI module graph.

pub mod check;
pub mod command;
pub mod mutate;
pub mod output;
pub mod rank;
pub mod session;

use command::{CheckCommand, Cli, Commands};
use output::Output;
use session::Session;

/// Run the parsed command line.
pub async fn run(cli: &Cli, out: Output) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Check(CheckCommand::Config) => check::execute_config(&cli.config, out),
        Commands::Check(CheckCommand::Connection) => {
            let session = Session::open(&cli.config)?;
            check::execute_connection(&session, out).await
        }
        Commands::Rank(args) => {
            let session = Session::open(&cli.config)?;
            rank::execute(&session, args, out).await
        }
        Commands::Mutate(command) => {
            let session = Session::open(&cli.config)?;
            mutate::execute(&session, command, out).await
        }
    }
}
