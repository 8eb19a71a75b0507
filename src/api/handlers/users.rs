//! User read endpoints.
//!
//! Read-only views over credential records; password hashes never leave the
//! handler layer.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::Filter;

use super::auth::UserRecord;
use super::Factory;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetail {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for UserSummary {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            verified: record.verified,
        }
    }
}

impl From<UserRecord> for UserDetail {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            verified: record.verified,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "List users", body = [UserSummary]),
        (status = 503, description = "Backing store is unavailable")
    ),
    tag = "users"
)]
pub async fn list_users(factory: Extension<Factory>) -> Response {
    match factory.users().find(&Filter::all()).await {
        Ok(records) => {
            let users: Vec<UserSummary> = records.into_iter().map(UserSummary::from).collect();
            Json(json!({ "users": users })).into_response()
        }
        Err(err) => {
            error!("failed to list users: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/user/{id}",
    params(
        ("id" = Uuid, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User detail", body = UserDetail),
        (status = 404, description = "User not found"),
        (status = 503, description = "Backing store is unavailable")
    ),
    tag = "users"
)]
pub async fn get_user(Path(id): Path<Uuid>, factory: Extension<Factory>) -> Response {
    match factory
        .users()
        .find_one(&Filter::eq("id", json!(id)))
        .await
    {
        Ok(Some(record)) => Json(UserDetail::from(record)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("failed to fetch user: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
