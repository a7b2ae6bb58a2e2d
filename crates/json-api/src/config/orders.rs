//! Orders Config

use std::fmt;

use clap::Args;

/// Order token settings.
#[derive(Args)]
pub struct OrdersConfig {
    /// Server-side secret keying public order tokens
    #[arg(long, env = "ORDER_TOKEN_SECRET", hide_env_values = true)]
    pub order_token_secret: String,
}

impl fmt::Debug for OrdersConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrdersConfig")
            .field("order_token_secret", &"<redacted>")
            .finish()
    }
}
