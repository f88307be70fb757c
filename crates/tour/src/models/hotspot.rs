//! Hotspots: interactive markers anchored to a direction within a scene.

use chrono::{DateTime, Utc};
use foundation::Direction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TourError, TourResult};

pub const DEFAULT_HOTSPOT_COLOR: &str = "#7c8cfb";
pub const DEFAULT_HOTSPOT_ICON: &str = "arrow";

/// What activating the hotspot does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HotspotKind {
    #[serde(rename_all = "camelCase")]
    Navigation { target_scene_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Info {
        title: String,
        #[serde(default)]
        content: String,
        media_url: Option<String>,
    },
    Link { url: String },
    #[serde(rename_all = "camelCase")]
    Audio {
        audio_url: String,
        #[serde(default, rename = "audioLoop")]
        looped: bool,
        #[serde(default)]
        autoplay: bool,
    },
}

impl HotspotKind {
    pub fn label(&self) -> &'static str {
        match self {
            HotspotKind::Navigation { .. } => "Go to",
            HotspotKind::Info { .. } => "Info",
            HotspotKind::Link { .. } => "Link",
            HotspotKind::Audio { .. } => "Audio",
        }
    }

    pub fn target_scene(&self) -> Option<Uuid> {
        match self {
            HotspotKind::Navigation { target_scene_id } => Some(*target_scene_id),
            _ => None,
        }
    }

    /// Payload checks that need no other entity.
    pub fn validate(&self) -> TourResult<()> {
        match self {
            HotspotKind::Link { url } if url.trim().is_empty() => {
                Err(TourError::validation("link hotspot requires a url"))
            }
            HotspotKind::Audio { audio_url, .. } if audio_url.trim().is_empty() => {
                Err(TourError::validation("audio hotspot requires an audioUrl"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HotspotStyle {
    pub color: String,
    pub icon: String,
    pub scale: f64,
}

impl Default for HotspotStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_HOTSPOT_COLOR.to_string(),
            icon: DEFAULT_HOTSPOT_ICON.to_string(),
            scale: 1.0,
        }
    }
}

impl HotspotStyle {
    pub fn validate(&self) -> TourResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(TourError::validation("scale must be a positive number"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub id: Uuid,
    pub scene_id: Uuid,
    pub name: String,
    /// (-180, 180]
    pub yaw: f64,
    /// [-90, 90]
    pub pitch: f64,
    #[serde(flatten)]
    pub kind: HotspotKind,
    #[serde(flatten)]
    pub style: HotspotStyle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hotspot {
    pub fn direction(&self) -> Direction {
        Direction::new(self.yaw, self.pitch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHotspot {
    #[serde(default)]
    pub name: Option<String>,
    pub yaw: f64,
    pub pitch: f64,
    #[serde(flatten)]
    pub kind: HotspotKind,
    #[serde(flatten)]
    pub style: HotspotStyle,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateHotspot {
    pub name: Option<String>,
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
    pub kind: Option<HotspotKind>,
    pub style: Option<HotspotStyle>,
}

/// Rejects non-finite angles and returns the stored form: yaw wrapped,
/// pitch clamped.
pub fn checked_direction(yaw: f64, pitch: f64) -> TourResult<Direction> {
    let direction = Direction::new(yaw, pitch);
    if !direction.is_finite() {
        return Err(TourError::validation("yaw and pitch must be finite numbers"));
    }
    Ok(direction.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_navigation_body() {
        let target = Uuid::new_v4();
        let body = json!({
            "kind": "NAVIGATION",
            "targetSceneId": target,
            "yaw": 30.0,
            "pitch": -5.0,
        });
        let new: NewHotspot = serde_json::from_value(body).unwrap();
        assert_eq!(new.kind, HotspotKind::Navigation { target_scene_id: target });
        assert_eq!(new.style, HotspotStyle::default());
        assert_eq!(new.name, None);
    }

    #[test]
    fn parses_audio_flags() {
        let body = json!({
            "kind": "AUDIO",
            "audioUrl": "/uploads/audio/a.mp3",
            "audioLoop": true,
            "yaw": 0.0,
            "pitch": 0.0,
            "color": "#ff0000",
        });
        let new: NewHotspot = serde_json::from_value(body).unwrap();
        assert_eq!(
            new.kind,
            HotspotKind::Audio {
                audio_url: "/uploads/audio/a.mp3".into(),
                looped: true,
                autoplay: false,
            }
        );
        assert_eq!(new.style.color, "#ff0000");
        assert_eq!(new.style.icon, DEFAULT_HOTSPOT_ICON);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let body = json!({ "kind": "PORTAL", "yaw": 0.0, "pitch": 0.0 });
        assert!(serde_json::from_value::<NewHotspot>(body).is_err());
    }

    #[test]
    fn direction_is_normalized_on_write() {
        let d = checked_direction(270.0, 120.0).unwrap();
        assert_eq!(d.yaw, -90.0);
        assert_eq!(d.pitch, 90.0);
        assert!(checked_direction(f64::NAN, 0.0).is_err());
        assert!(checked_direction(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn empty_link_fails_validation() {
        let kind = HotspotKind::Link { url: "  ".into() };
        assert!(kind.validate().is_err());
    }
}
