use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::store::Filter;

use super::Factory;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    name: String,
    version: String,
    store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and backing store are healthy", body = Health),
        (status = 503, description = "Backing store is unhealthy", body = Health)
    ),
    tag = "health"
)]
pub async fn health(factory: Extension<Factory>) -> impl IntoResponse {
    // Cheap read against the store; a timeout here means the store is down.
    let store_ok = match factory.users().find_one(&Filter::all()).await {
        Ok(_) => true,
        Err(err) => {
            error!("health probe against the store failed: {err}");
            false
        }
    };

    let health = Health {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if store_ok { "ok" } else { "error" }.to_string(),
    };

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(health))
}
