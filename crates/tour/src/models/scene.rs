//! Scenes: one panorama each, ordered within a tour.

use chrono::{DateTime, Utc};
use foundation::Direction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::nullable;

/// Position of a scene marker on a floor plan image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlanPlacement {
    pub floor_plan_id: Uuid,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub name: String,
    pub panorama_url: String,
    pub thumbnail_url: Option<String>,
    pub order: u32,
    pub initial_yaw: f64,
    pub initial_pitch: f64,
    pub placement: Option<FloorPlanPlacement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scene {
    pub fn initial_direction(&self) -> Direction {
        Direction::new(self.initial_yaw, self.initial_pitch)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScene {
    pub name: String,
    pub panorama_url: String,
    pub thumbnail_url: Option<String>,
    /// Appended after the last scene when absent.
    pub order: Option<u32>,
    pub initial_yaw: Option<f64>,
    pub initial_pitch: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateScene {
    pub name: Option<String>,
    pub panorama_url: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub thumbnail_url: Option<Option<String>>,
    pub order: Option<u32>,
    pub initial_yaw: Option<f64>,
    pub initial_pitch: Option<f64>,
    /// `Some(None)` removes the scene from its floor plan.
    #[serde(deserialize_with = "nullable")]
    pub placement: Option<Option<FloorPlanPlacement>>,
}
