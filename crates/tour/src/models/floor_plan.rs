use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::nullable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlan {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub name: String,
    pub image_url: String,
    pub floor: i32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFloorPlan {
    /// Defaults to `Floor <n>`.
    pub name: Option<String>,
    pub image_url: String,
    /// Defaults to one above the highest existing floor.
    pub floor: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateFloorPlan {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub floor: Option<i32>,
    #[serde(deserialize_with = "nullable")]
    pub width: Option<Option<u32>>,
    #[serde(deserialize_with = "nullable")]
    pub height: Option<Option<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: UpdateFloorPlan =
            serde_json::from_value(json!({ "width": null, "floor": 2 })).unwrap();
        assert_eq!(patch.width, Some(None));
        assert_eq!(patch.height, None);
        assert_eq!(patch.floor, Some(2));
    }
}
