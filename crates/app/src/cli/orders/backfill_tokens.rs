use clap::Args;
use storefront::tokens::OrderTokenSecret;
use storefront_app::domain::orders::{OrdersService, PgOrdersService};

use super::OrderSecretArgs;

#[derive(Debug, Args)]
pub(crate) struct BackfillTokensArgs {
    #[command(flatten)]
    secret: OrderSecretArgs,
}

pub(crate) async fn run(args: BackfillTokensArgs) -> Result<(), String> {
    let secret = OrderTokenSecret::new(args.secret.order_token_secret)
        .map_err(|error| format!("invalid order token secret: {error}"))?;

    let db = args.secret.database.connect().await?;

    let stored = PgOrdersService::new(db, secret)
        .backfill_tokens()
        .await
        .map_err(|error| format!("failed to backfill order tokens: {error}"))?;

    println!("tokens_stored: {stored}");

    Ok(())
}
