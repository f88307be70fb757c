//! Tour aggregate root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::floor_plan::FloorPlan;
use super::hotspot::Hotspot;
use super::scene::Scene;

/// Longest slug generated from a name.
pub const MAX_SLUG_LEN: usize = 50;

/// Viewer presentation settings stored with a tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TourSettings {
    pub auto_rotate: bool,
    /// Degrees per second.
    pub auto_rotate_speed: f64,
    /// Vertical field of view of the viewer camera, degrees.
    pub default_fov: f64,
    pub show_floor_plan: bool,
    pub show_thumbnails: bool,
    /// Dwell time per scene in guided mode.
    pub guided_tour_delay_ms: u64,
}

impl Default for TourSettings {
    fn default() -> Self {
        Self {
            auto_rotate: false,
            auto_rotate_speed: 0.5,
            default_fov: 80.0,
            show_floor_plan: true,
            show_thumbnails: true,
            guided_tour_delay_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_published: bool,
    /// Argon2 PHC string. Never part of an API response.
    pub password_hash: Option<String>,
    pub settings: TourSettings,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tour {
    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateTour {
    pub name: String,
    /// Custom slug; slugified and made unique.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub password_hash: Option<String>,
    pub settings: Option<TourSettings>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTour {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` clears.
    pub description: Option<Option<String>>,
    pub thumbnail_url: Option<Option<String>>,
    pub is_published: Option<bool>,
    /// `Some(None)` removes the password gate.
    pub password_hash: Option<Option<String>>,
    pub settings: Option<TourSettings>,
}

/// Tour with its scenes (ordered, each with hotspots) and floor plans.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDetail {
    pub tour: Tour,
    pub scenes: Vec<SceneWithHotspots>,
    pub floor_plans: Vec<FloorPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneWithHotspots {
    #[serde(flatten)]
    pub scene: Scene,
    pub hotspots: Vec<Hotspot>,
}

/// Lower-case, runs of anything outside `[a-z0-9]` collapsed to `-`, trimmed,
/// at most [`MAX_SLUG_LEN`] characters.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("tour");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  Harbour View -- Flat 3B! "), "harbour-view-flat-3b");
        assert_eq!(slugify("Café Ünïcode"), "caf-n-code");
        assert_eq!(slugify("***"), "tour");
    }

    #[test]
    fn slugify_caps_length() {
        let slug = slugify(&"a".repeat(80));
        assert_eq!(slug.len(), MAX_SLUG_LEN);
        let slug = slugify(&format!("{} b", "a".repeat(49)));
        assert_eq!(slug, "a".repeat(49));
    }

    #[test]
    fn settings_fill_missing_fields() {
        let s: TourSettings = serde_json::from_str(r#"{"autoRotate":true}"#).unwrap();
        assert!(s.auto_rotate);
        assert_eq!(s.guided_tour_delay_ms, 8_000);
        assert_eq!(s.default_fov, 80.0);
    }
}
