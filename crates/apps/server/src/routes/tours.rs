//! Tours: listing, authoring, publishing and public access by slug.

use ::auth::password::{hash_password, verify_password};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tour::models::floor_plan::FloorPlan;
use tour::models::tour::{CreateTour, SceneWithHotspots, Tour, TourDetail, TourSettings, UpdateTour};
use tour::models::nullable;
use tour::PublicTour;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, CurrentUser, MaybeUser};
use crate::state::AppState;

/// Routes reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/slug/:slug", get(by_slug))
        .route("/:id/verify-password", post(verify_tour_password))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(detail).put(update).delete(remove))
        .route("/:id/publish", post(publish))
        .route("/:id/unpublish", post(unpublish))
}

/// Tour as sent to clients: the password hash is replaced by a flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_published: bool,
    pub is_password_protected: bool,
    pub settings: TourSettings,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tour> for TourView {
    fn from(tour: Tour) -> Self {
        Self {
            is_password_protected: tour.is_password_protected(),
            id: tour.id,
            name: tour.name,
            slug: tour.slug,
            description: tour.description,
            thumbnail_url: tour.thumbnail_url,
            is_published: tour.is_published,
            settings: tour.settings,
            created_by: tour.created_by,
            created_at: tour.created_at,
            updated_at: tour.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDetailView {
    #[serde(flatten)]
    pub tour: TourView,
    pub scenes: Vec<SceneWithHotspots>,
    pub floor_plans: Vec<FloorPlan>,
}

impl From<TourDetail> for TourDetailView {
    fn from(detail: TourDetail) -> Self {
        Self {
            tour: detail.tour.into(),
            scenes: detail.scenes,
            floor_plans: detail.floor_plans,
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    published: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTourBody {
    #[serde(default)]
    name: String,
    slug: Option<String>,
    description: Option<String>,
    #[serde(default)]
    is_password_protected: bool,
    password: Option<String>,
    settings: Option<TourSettings>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct UpdateTourBody {
    name: Option<String>,
    slug: Option<String>,
    #[serde(deserialize_with = "nullable")]
    description: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    thumbnail_url: Option<Option<String>>,
    is_published: Option<bool>,
    is_password_protected: Option<bool>,
    password: Option<String>,
    settings: Option<TourSettings>,
}

#[derive(Deserialize)]
struct PasswordBody {
    #[serde(default)]
    password: Option<String>,
}

/// Hash for a new or changed tour password, if one applies.
fn gate_hash(protect: bool, password: Option<&str>) -> ApiResult<Option<String>> {
    match password.filter(|p| !p.is_empty()) {
        Some(password) if protect => Ok(Some(hash_password(password)?)),
        _ => Ok(None),
    }
}

async fn list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let published_only = user.is_none() || query.published.as_deref() == Some("true");
    let tours: Vec<TourView> = state
        .content
        .list_tours(published_only)
        .await?
        .into_iter()
        .map(TourView::from)
        .collect();
    Ok(Json(json!({ "tours": tours })))
}

async fn by_slug(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<Json<serde_json::Value>> {
    match state.content.open_published(&slug).await? {
        PublicTour::Locked(tour) => Ok(Json(json!({
            "needsPassword": true,
            "tour": { "id": tour.id, "name": tour.name, "slug": tour.slug },
        }))),
        PublicTour::Open(detail) => Ok(Json(json!({ "tour": TourDetailView::from(detail) }))),
    }
}

async fn verify_tour_password(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<PasswordBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let Some(password) = body.password.filter(|p| !p.is_empty()) else {
        return Err(ApiError::bad_request("Password is required"));
    };
    let detail = state
        .content
        .unlock_published(id, |hash| Ok(verify_password(&password, hash)?))
        .await?;
    Ok(Json(json!({ "tour": TourDetailView::from(detail) })))
}

async fn detail(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let detail = state.content.tour_detail(id).await?;
    Ok(Json(json!({ "tour": TourDetailView::from(detail) })))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiJson(body): ApiJson<CreateTourBody>,
) -> ApiResult<impl IntoResponse> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let password_hash = gate_hash(body.is_password_protected, body.password.as_deref())?;
    let tour = state
        .content
        .create_tour(CreateTour {
            name: body.name,
            slug: body.slug,
            description: body.description,
            password_hash,
            settings: body.settings,
            created_by: ctx.user.id,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "tour": TourView::from(tour) })),
    ))
}

async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateTourBody>,
) -> ApiResult<Json<serde_json::Value>> {
    // Turning protection off clears the password; turning it on without a
    // password keeps the current one.
    let password_hash = match body.is_password_protected {
        Some(false) => Some(None),
        Some(true) => gate_hash(true, body.password.as_deref())?.map(Some),
        None => None,
    };
    let tour = state
        .content
        .update_tour(
            id,
            UpdateTour {
                name: body.name,
                slug: body.slug,
                description: body.description,
                thumbnail_url: body.thumbnail_url,
                is_published: body.is_published,
                password_hash,
                settings: body.settings,
            },
        )
        .await?;
    Ok(Json(json!({ "tour": TourView::from(tour) })))
}

async fn remove(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.content.delete_tour(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn publish(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let tour = state.content.set_published(id, true).await?;
    Ok(Json(json!({ "tour": TourView::from(tour) })))
}

async fn unpublish(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let tour = state.content.set_published(id, false).await?;
    Ok(Json(json!({ "tour": TourView::from(tour) })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_only_hashed_when_protected() {
        assert_eq!(gate_hash(false, Some("secret")).unwrap(), None);
        assert_eq!(gate_hash(true, None).unwrap(), None);
        assert_eq!(gate_hash(true, Some("")).unwrap(), None);
        let hash = gate_hash(true, Some("secret")).unwrap().unwrap();
        assert!(verify_password("secret", &hash).unwrap());
    }

    #[test]
    fn update_body_keeps_null_apart_from_absent() {
        let body: UpdateTourBody =
            serde_json::from_value(json!({ "description": null, "name": "Loft" })).unwrap();
        assert_eq!(body.description, Some(None));
        assert_eq!(body.thumbnail_url, None);
        assert_eq!(body.name.as_deref(), Some("Loft"));
    }
}
