//! Database Config

use std::fmt;

use clap::Args;

/// Database settings.
#[derive(Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string; may embed credentials
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("database_url", &"<redacted>")
            .finish()
    }
}
