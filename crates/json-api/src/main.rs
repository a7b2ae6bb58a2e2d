//! Storefront JSON API Server

use std::process;

use salvo::{
    affix_state::inject,
    oapi::{
        OpenApi,
        security::{Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    trailing_slash::remove_slash,
};
use tracing::{error, info};

use storefront::tokens::OrderTokenSecret;
use storefront_app::{
    auth::{IdentityClient, IdentityConfig, WebhookSecret},
    context::AppContext,
};

use crate::{
    config::ServerConfig,
    observability::{Observability, request_logging},
    state::State,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod auth;
mod categories;
mod config;
mod extensions;
mod healthcheck;
mod observability;
mod orders;
mod products;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;
mod webhooks;

/// Storefront JSON API Server entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    let observability = Observability::init(&config).unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Observability error: {e}");
        }

        process::exit(1);
    });

    let order_token_secret = match OrderTokenSecret::new(config.orders.order_token_secret.as_str())
    {
        Ok(secret) => secret,
        Err(secret_error) => {
            error!("invalid ORDER_TOKEN_SECRET: {secret_error}");

            process::exit(1);
        }
    };

    let webhook_secret = match WebhookSecret::new(config.identity.webhook_secret.as_str()) {
        Ok(secret) => secret,
        Err(secret_error) => {
            error!("invalid IDENTITY_WEBHOOK_SECRET: {secret_error}");

            process::exit(1);
        }
    };

    let identity = IdentityClient::new(IdentityConfig {
        userinfo_url: config.identity.userinfo_url.clone(),
    });

    let app = match AppContext::from_database_url(
        &config.database.database_url,
        identity,
        order_token_secret,
    )
    .await
    {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            process::exit(1);
        }
    };

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let mut router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(request_logging)
        .hoop(inject(State::from_app_context(app, webhook_secret)))
        .push(router::app_router());

    if config.server.docs_enabled {
        let doc = OpenApi::new("Storefront API", env!("CARGO_PKG_VERSION"))
            .add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
            .merge_router(&router);

        router = router
            .push(doc.into_router("/api-doc/openapi.json"))
            .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));
    }

    let server = Server::new(listener);

    let handle = server.handle();

    // Listen for shutdown signal
    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    // Start serving requests
    server.serve(router).await;

    observability.shutdown();
}
