//! Identity Webhook Handler
//!
//! Mirrors identity-provider account changes into the local users table. Deliveries are
//! authenticated by an HMAC-SHA256 signature over the raw body.

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use storefront_app::domain::users::{UsersServiceError, models::NewUser};

use crate::{extensions::*, state::State};

pub(crate) const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: String,

    #[serde(default)]
    email: String,

    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WebhookAck {
    /// Whether the event changed the users mirror
    pub applied: bool,
}

/// Identity Webhook Handler
#[endpoint(
    tags("webhooks"),
    summary = "Identity Provider Webhook",
    responses(
        (status_code = StatusCode::OK, description = "Event acknowledged"),
        (status_code = StatusCode::BAD_REQUEST, description = "Malformed event"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid signature"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<WebhookAck>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let signature = req
        .header::<String>(SIGNATURE_HEADER)
        .ok_or_else(|| StatusError::unauthorized().brief("Missing webhook signature"))?;

    let body = req.payload().await.or_400("unreadable webhook body")?.clone();

    if !state.webhook_secret.verify(&body, &signature) {
        tracing::warn!("rejected identity webhook with invalid signature");

        return Err(StatusError::unauthorized().brief("Invalid webhook signature"));
    }

    let event: WebhookEvent = serde_json::from_slice(&body).or_400("invalid webhook event")?;

    let applied = match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let user: IdentityUser =
                serde_json::from_value(event.data).or_400("invalid webhook user")?;

            state
                .app
                .users
                .upsert_user(NewUser {
                    subject: user.id,
                    email: user.email,
                    name: user.name,
                })
                .await
                .map_err(into_status_error)?;

            true
        }
        "user.deleted" => {
            let user: IdentityUser =
                serde_json::from_value(event.data).or_400("invalid webhook user")?;

            match state.app.users.delete_user(&user.id).await {
                Ok(()) => true,
                Err(UsersServiceError::NotFound) => false,
                Err(error) => return Err(into_status_error(error)),
            }
        }
        other => {
            tracing::debug!(event_type = other, "ignored identity webhook event");

            false
        }
    };

    tracing::info!(event_type = %event.kind, applied, "handled identity webhook");

    Ok(Json(WebhookAck { applied }))
}

fn into_status_error(error: UsersServiceError) -> StatusError {
    match error {
        UsersServiceError::NotFound => StatusError::not_found(),
        UsersServiceError::EmptySubject
        | UsersServiceError::MissingRequiredData
        | UsersServiceError::InvalidData => StatusError::bad_request().brief(error.to_string()),
        UsersServiceError::AlreadyExists => StatusError::conflict(),
        UsersServiceError::Sql(source) => {
            tracing::error!("storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
