use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tour::models::hotspot::{HotspotKind, HotspotStyle, NewHotspot, UpdateHotspot};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, CurrentUser};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id/scenes/:scene_id/hotspots", get(list).post(create))
        .route(
            "/:id/scenes/:scene_id/hotspots/:hotspot_id",
            get(fetch).put(update).delete(remove),
        )
}

/// Scalar fields of a hotspot update. Kind-specific fields are read
/// separately, and only when `kind` is present.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct HotspotPatch {
    name: Option<String>,
    yaw: Option<f64>,
    pitch: Option<f64>,
    color: Option<String>,
    icon: Option<String>,
    scale: Option<f64>,
}

impl HotspotPatch {
    fn touches_style(&self) -> bool {
        self.color.is_some() || self.icon.is_some() || self.scale.is_some()
    }

    fn apply_style(self, mut style: HotspotStyle) -> HotspotStyle {
        if let Some(color) = self.color {
            style.color = color;
        }
        if let Some(icon) = self.icon {
            style.icon = icon;
        }
        if let Some(scale) = self.scale {
            style.scale = scale;
        }
        style
    }
}

fn parse_kind(body: &Value) -> ApiResult<Option<HotspotKind>> {
    if body.get("kind").is_none() {
        return Ok(None);
    }
    serde_json::from_value(body.clone())
        .map(Some)
        .map_err(|e| ApiError::bad_request(format!("Invalid hotspot: {e}")))
}

async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, scene_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let hotspots = state.content.list_hotspots(tour_id, scene_id).await?;
    Ok(Json(json!({ "hotspots": hotspots })))
}

async fn fetch(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, scene_id, hotspot_id)): ApiPath<(Uuid, Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let hotspot = state
        .content
        .get_hotspot(tour_id, scene_id, hotspot_id)
        .await?;
    Ok(Json(json!({ "hotspot": hotspot })))
}

async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, scene_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<NewHotspot>,
) -> ApiResult<impl IntoResponse> {
    let hotspot = state
        .content
        .create_hotspot(tour_id, scene_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "hotspot": hotspot }))))
}

async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, scene_id, hotspot_id)): ApiPath<(Uuid, Uuid, Uuid)>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Json<Value>> {
    if !body.is_object() {
        return Err(ApiError::bad_request("Expected a JSON object"));
    }
    let kind = parse_kind(&body)?;
    let patch: HotspotPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid hotspot: {e}")))?;

    let style = if patch.touches_style() {
        let current = state
            .content
            .get_hotspot(tour_id, scene_id, hotspot_id)
            .await?;
        Some(current.style)
    } else {
        None
    };

    let input = UpdateHotspot {
        name: patch.name.clone(),
        yaw: patch.yaw,
        pitch: patch.pitch,
        kind,
        style: style.map(|s| patch.apply_style(s)),
    };
    let hotspot = state
        .content
        .update_hotspot(tour_id, scene_id, hotspot_id, input)
        .await?;
    Ok(Json(json!({ "hotspot": hotspot })))
}

async fn remove(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiPath((tour_id, scene_id, hotspot_id)): ApiPath<(Uuid, Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .content
        .delete_hotspot(tour_id, scene_id, hotspot_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_only_parsed_when_present() {
        assert_eq!(parse_kind(&json!({ "name": "x" })).unwrap(), None);
        let kind = parse_kind(&json!({ "kind": "LINK", "url": "https://example.com" }))
            .unwrap()
            .unwrap();
        assert_eq!(kind, HotspotKind::Link { url: "https://example.com".into() });
        assert!(parse_kind(&json!({ "kind": "LINK" })).is_err());
    }

    #[test]
    fn style_patch_merges_onto_current() {
        let patch: HotspotPatch = serde_json::from_value(json!({ "scale": 2.0 })).unwrap();
        assert!(patch.touches_style());
        let style = patch.apply_style(HotspotStyle::default());
        assert_eq!(style.scale, 2.0);
        assert_eq!(style.color, HotspotStyle::default().color);
    }
}
