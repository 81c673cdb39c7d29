use anyhow::Result;
use clap::Parser;
use jarvis_cli::commands::{self, ask, chat, ingest};
use jarvis_cli::{Cli, Command, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads environment fallbacks.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    jarvis_telemetry::init_with_format("jarvis", cli.options.log_format);

    let settings = Settings::from_options(&cli.options)?;
    match &cli.command {
        Command::Ingest { documents_dir } => {
            ingest::run(&cli.options, &settings, documents_dir).await
        }
        Command::Ask { question, json } => {
            let assistant = commands::build_assistant(&cli.options, &settings)?;
            ask::run(&assistant, question, *json).await
        }
        Command::Chat => {
            let assistant = commands::build_assistant(&cli.options, &settings)?;
            chat::run(&assistant).await
        }
    }
}
