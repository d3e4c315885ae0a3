use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;

use curedoc_cli::{Cli, Exchange, FileStore, Repl, ReqwestTransport, Terminal};
use curedoc_client::{ClientConfig, ClientState, Dispatcher};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = ClientConfig::new(cli.server_url.clone());
    log::info!("Using CureBot service at {}", config.base_url);

    let store = FileStore::new(&cli.data_dir)?;
    log::debug!("History kept in {}", store.dir().display());
    let state = ClientState::load(store, &config).context("Failed to load chat history")?;

    let dispatcher = Dispatcher::new(ReqwestTransport::new(), config);
    let mut repl = Repl::new(dispatcher, state);
    let mut terminal = Terminal::new()?;

    if let Some(query) = cli.ask {
        println!("{} {}", "You:".bright_green().bold(), query);
        if repl.ask(&query, &mut terminal).await? == Exchange::Failed {
            bail!("CureBot could not answer the question");
        }
        return Ok(());
    }

    repl.run(&mut terminal).await
}
