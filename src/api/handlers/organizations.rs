//! Organization endpoints.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::{Document, Filter, StoreError};

use super::Factory;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct OrganizationRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for OrganizationRecord {
    const COLLECTION: &'static str = "organizations";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrganizationCreateRequest {
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/organization",
    responses(
        (status = 200, description = "List organizations", body = [OrganizationRecord]),
        (status = 503, description = "Backing store is unavailable")
    ),
    tag = "organizations"
)]
pub async fn list_organizations(factory: Extension<Factory>) -> Response {
    match factory.organizations().find(&Filter::all()).await {
        Ok(records) => Json(json!({ "organizations": records })).into_response(),
        Err(err) => {
            error!("failed to list organizations: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/organization",
    request_body = OrganizationCreateRequest,
    responses(
        (status = 201, description = "Organization created", body = OrganizationRecord),
        (status = 400, description = "Missing or empty name"),
        (status = 409, description = "Name already taken"),
        (status = 503, description = "Backing store is unavailable")
    ),
    tag = "organizations"
)]
pub async fn create_organization(
    factory: Extension<Factory>,
    payload: Option<Json<OrganizationCreateRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing request payload" })),
        )
            .into_response();
    };

    let name = payload.name.trim();
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "organization name must not be empty" })),
        )
            .into_response();
    }

    let now = Utc::now();
    let record = OrganizationRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    };
    match factory.organizations().create(&record).await {
        Ok(_) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(StoreError::UniqueViolation(_)) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "organization name already taken" })),
        )
            .into_response(),
        Err(err) => {
            error!("failed to create organization: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/organization/{id}",
    params(
        ("id" = Uuid, Path, description = "Organization id")
    ),
    responses(
        (status = 200, description = "Organization detail", body = OrganizationRecord),
        (status = 404, description = "Organization not found"),
        (status = 503, description = "Backing store is unavailable")
    ),
    tag = "organizations"
)]
pub async fn get_organization(Path(id): Path<Uuid>, factory: Extension<Factory>) -> Response {
    match factory
        .organizations()
        .find_one(&Filter::eq("id", json!(id)))
        .await
    {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("failed to fetch organization: {err}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
