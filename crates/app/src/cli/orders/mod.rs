use clap::{Args, Subcommand};

use crate::cli::DatabaseArgs;

mod backfill_tokens;

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// Store tokens for orders created before tokens were persisted
    BackfillTokens(backfill_tokens::BackfillTokensArgs),
}

pub(crate) async fn run(command: OrdersCommand) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::BackfillTokens(args) => backfill_tokens::run(args).await,
    }
}

#[derive(Debug, Args)]
pub(crate) struct OrderSecretArgs {
    /// Secret keying order token derivation
    #[arg(long, env = "ORDER_TOKEN_SECRET", hide_env_values = true)]
    order_token_secret: String,

    #[command(flatten)]
    database: DatabaseArgs,
}
