use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tour::models::floor_plan::{CreateFloorPlan, UpdateFloorPlan};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, CurrentUser};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id/floorplans", get(list).post(create))
        .route(
            "/:id/floorplans/:floor_plan_id",
            get(fetch).put(update).delete(remove),
        )
        .route(
            "/:id/floorplans/:floor_plan_id/scenes/:scene_id",
            put(place_scene),
        )
}

#[derive(Deserialize)]
struct PlacementBody {
    x: Option<f64>,
    y: Option<f64>,
}

async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(tour_id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    state.content.get_tour(tour_id).await?;
    let floor_plans = state.content.list_floor_plans(tour_id).await?;
    Ok(Json(json!({ "floorPlans": floor_plans })))
}

async fn fetch(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, floor_plan_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let floor_plan = state
        .content
        .get_floor_plan(tour_id, floor_plan_id)
        .await?;
    Ok(Json(json!({ "floorPlan": floor_plan })))
}

async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath(tour_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateFloorPlan>,
) -> ApiResult<impl IntoResponse> {
    let floor_plan = state.content.create_floor_plan(tour_id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "floorPlan": floor_plan })),
    ))
}

async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, floor_plan_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<UpdateFloorPlan>,
) -> ApiResult<Json<Value>> {
    let floor_plan = state
        .content
        .update_floor_plan(tour_id, floor_plan_id, body)
        .await?;
    Ok(Json(json!({ "floorPlan": floor_plan })))
}

async fn remove(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, floor_plan_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .content
        .delete_floor_plan(tour_id, floor_plan_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn place_scene(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, floor_plan_id, scene_id)): ApiPath<(Uuid, Uuid, Uuid)>,
    ApiJson(body): ApiJson<PlacementBody>,
) -> ApiResult<Json<Value>> {
    let (Some(x), Some(y)) = (body.x, body.y) else {
        return Err(ApiError::bad_request("x and y are required"));
    };
    state
        .content
        .get_floor_plan(tour_id, floor_plan_id)
        .await?;
    let scene = state
        .content
        .place_scene(tour_id, floor_plan_id, scene_id, x, y)
        .await?;
    Ok(Json(json!({ "scene": scene })))
}
