use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tour::models::scene::{CreateScene, UpdateScene};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, CurrentUser};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id/scenes", get(list).post(create))
        .route("/:id/scenes/reorder", post(reorder))
        .route(
            "/:id/scenes/:scene_id",
            get(fetch).put(update).delete(remove),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderBody {
    scene_ids: Option<Vec<Uuid>>,
}

async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(tour_id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    state.content.get_tour(tour_id).await?;
    let scenes = state.content.list_scenes(tour_id).await?;
    Ok(Json(json!({ "scenes": scenes })))
}

async fn fetch(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, scene_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let scene = state.content.get_scene(tour_id, scene_id).await?;
    Ok(Json(json!({ "scene": scene })))
}

async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(tour_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateScene>,
) -> ApiResult<impl IntoResponse> {
    let scene = state.content.create_scene(tour_id, body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "scene": scene }))))
}

async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, scene_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<UpdateScene>,
) -> ApiResult<Json<Value>> {
    let scene = state.content.update_scene(tour_id, scene_id, body).await?;
    Ok(Json(json!({ "scene": scene })))
}

async fn remove(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, scene_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.content.delete_scene(tour_id, scene_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(tour_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ReorderBody>,
) -> ApiResult<Json<Value>> {
    let scene_ids = body
        .scene_ids
        .ok_or_else(|| ApiError::bad_request("sceneIds must be an array"))?;
    let scenes = state.content.reorder_scenes(tour_id, scene_ids).await?;
    Ok(Json(json!({ "success": true, "scenes": scenes })))
}
