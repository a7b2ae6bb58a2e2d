//! Identity Provider Config

use std::fmt;

use clap::Args;

/// Identity provider settings.
#[derive(Args)]
pub struct IdentityProviderConfig {
    /// Userinfo endpoint used to resolve bearer tokens to subjects
    #[arg(long, env = "IDENTITY_USERINFO_URL")]
    pub userinfo_url: String,

    /// Shared secret signing identity webhook payloads
    #[arg(long, env = "IDENTITY_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,
}

impl fmt::Debug for IdentityProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityProviderConfig")
            .field("userinfo_url", &self.userinfo_url)
            .field("webhook_secret", &"<redacted>")
            .finish()
    }
}
