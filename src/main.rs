use clap::Parser;
use wheeldesk::adapter::inbound::cli::{self, command::Cli, output::Output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let out = Output::from_cli(&cli);

    if let Err(e) = cli::run(&cli, out).await {
        out.error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
