use clap::Parser;
use score_ledger::cli::Cli;
use score_ledger::logging::init_logging;
use score_ledger::Ledger;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log)?;

    let store = cli.database.open().await?;
    let ledger = Ledger::new(store.clone());
    let output = cli.command.execute(&ledger).await;
    store.close().await;

    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}
