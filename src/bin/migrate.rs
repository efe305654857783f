use clap::Parser;
use score_ledger::config::DatabaseArgs;
use score_ledger::logging::{init_logging, LogArgs};
use tracing::info;

/// Creates the scores table and indexes if they do not exist yet.
#[derive(Debug, Parser)]
#[command(name = "migrate")]
struct MigrateArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = MigrateArgs::parse();
    init_logging(&args.log)?;

    let store = args.database.open().await?;
    info!(backend = store.backend(), "migration complete");
    store.close().await;
    Ok(())
}
