//! Viewer state for one loaded tour.
//!
//! The state is owned by the caller and advanced explicitly: input methods
//! mutate it, [`ViewerState::tick`] drives guided playback and auto-rotation,
//! and every visible effect is queued on the event bus.

use foundation::{
    to_cartesian, Direction, FieldOfView, Vec2, Vec3, ViewCamera, VisibilityMargin,
    DragSensitivity,
};
use tour::models::floor_plan::FloorPlan;
use tour::models::hotspot::{Hotspot, HotspotKind};
use tour::models::scene::Scene;
use tour::models::tour::{SceneWithHotspots, TourDetail, TourSettings};
use tracing::debug;
use uuid::Uuid;

use crate::event_bus::{EventBus, ViewerEventKind};

const DEFAULT_ASPECT: f64 = 16.0 / 9.0;

/// Content shown by an INFO hotspot.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoModal {
    pub hotspot_id: Uuid,
    pub title: String,
    pub content: String,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioPlayback {
    pub hotspot_id: Uuid,
    pub url: String,
    pub looped: bool,
}

/// What activating a hotspot did.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
    Navigated(Uuid),
    ShowInfo(InfoModal),
    /// The host should open `url` in a new window.
    OpenLink(String),
    PlayAudio(AudioPlayback),
    /// Unknown hotspot, or a navigation target that is not in the tour.
    Nothing,
}

/// A hotspot marker in viewport pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerMarker {
    pub hotspot_id: Uuid,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug)]
pub struct ViewerState {
    scenes: Vec<SceneWithHotspots>,
    floor_plans: Vec<FloorPlan>,
    settings: TourSettings,
    current: Option<usize>,
    camera: ViewCamera,
    aspect: f64,
    pub sensitivity: DragSensitivity,
    pub margin: VisibilityMargin,
    info_modal: Option<InfoModal>,
    audio: Option<AudioPlayback>,
    guided: bool,
    guided_elapsed_s: f64,
    frame_index: u64,
    events: EventBus,
}

impl ViewerState {
    /// Opens the tour at its first scene.
    pub fn new(detail: TourDetail) -> Self {
        let TourDetail {
            tour,
            mut scenes,
            floor_plans,
        } = detail;
        scenes.sort_by_key(|s| s.scene.order);

        let mut state = Self {
            scenes,
            floor_plans,
            settings: tour.settings,
            current: None,
            camera: ViewCamera::default(),
            aspect: DEFAULT_ASPECT,
            sensitivity: DragSensitivity::default(),
            margin: VisibilityMargin::default(),
            info_modal: None,
            audio: None,
            guided: false,
            guided_elapsed_s: 0.0,
            frame_index: 0,
            events: EventBus::new(),
        };
        state.camera.fov = state.field_of_view();
        if let Some(first) = state.scenes.first().map(|s| s.scene.id) {
            state.enter(first);
        }
        state
    }

    fn field_of_view(&self) -> FieldOfView {
        let vertical = self.settings.default_fov;
        FieldOfView::new(vertical * self.aspect, vertical)
    }

    /// Resize the viewport. The vertical field of view stays fixed.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            self.aspect = width / height;
            self.camera.fov = self.field_of_view();
        }
    }

    pub fn settings(&self) -> &TourSettings {
        &self.settings
    }

    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.map(|i| &self.scenes[i].scene)
    }

    pub fn scene_index(&self) -> Option<usize> {
        self.current
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        match self.current {
            Some(i) => &self.scenes[i].hotspots,
            None => &[],
        }
    }

    /// Floor plan the current scene is placed on.
    pub fn current_floor_plan(&self) -> Option<&FloorPlan> {
        let placement = self.current_scene()?.placement?;
        self.floor_plans
            .iter()
            .find(|fp| fp.id == placement.floor_plan_id)
    }

    pub fn info_modal(&self) -> Option<&InfoModal> {
        self.info_modal.as_ref()
    }

    pub fn close_info(&mut self) {
        self.info_modal = None;
    }

    pub fn audio(&self) -> Option<&AudioPlayback> {
        self.audio.as_ref()
    }

    pub fn stop_audio(&mut self) {
        if self.audio.take().is_some() {
            self.events.emit(self.frame_index, ViewerEventKind::AudioStopped);
        }
    }

    pub fn is_guided(&self) -> bool {
        self.guided
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Switch to `scene_id`. Returns false for an unknown scene or the scene
    /// already shown.
    pub fn navigate_to(&mut self, scene_id: Uuid) -> bool {
        if self.current_scene().map(|s| s.id) == Some(scene_id) {
            return false;
        }
        if !self.scenes.iter().any(|s| s.scene.id == scene_id) {
            debug!(scene_id = %scene_id, "navigation to unknown scene ignored");
            return false;
        }
        self.enter(scene_id);
        true
    }

    fn enter(&mut self, scene_id: Uuid) {
        let Some(index) = self.scenes.iter().position(|s| s.scene.id == scene_id) else {
            return;
        };
        let from = self.current_scene().map(|s| s.id);
        self.current = Some(index);
        self.camera
            .set_direction(self.scenes[index].scene.initial_direction());
        self.info_modal = None;
        self.stop_audio();
        self.guided_elapsed_s = 0.0;
        self.events.emit(
            self.frame_index,
            ViewerEventKind::SceneChanged { from, to: scene_id },
        );
    }

    fn step(&mut self, forward: bool) -> bool {
        let len = self.scenes.len();
        if len < 2 {
            return false;
        }
        let index = self.current.unwrap_or(0);
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        let id = self.scenes[next].scene.id;
        self.enter(id);
        true
    }

    /// Next scene in tour order, wrapping to the first.
    pub fn next_scene(&mut self) -> bool {
        self.step(true)
    }

    /// Previous scene in tour order, wrapping to the last.
    pub fn prev_scene(&mut self) -> bool {
        self.step(false)
    }

    // -----------------------------------------------------------------------
    // Hotspots
    // -----------------------------------------------------------------------

    pub fn activate_hotspot(&mut self, hotspot_id: Uuid) -> ViewerAction {
        let Some(hotspot) = self.hotspots().iter().find(|h| h.id == hotspot_id).cloned() else {
            return ViewerAction::Nothing;
        };
        match hotspot.kind {
            HotspotKind::Navigation { target_scene_id } => {
                if self.navigate_to(target_scene_id) {
                    ViewerAction::Navigated(target_scene_id)
                } else {
                    ViewerAction::Nothing
                }
            }
            HotspotKind::Info {
                title,
                content,
                media_url,
            } => {
                let modal = InfoModal {
                    hotspot_id,
                    title,
                    content,
                    media_url,
                };
                self.info_modal = Some(modal.clone());
                self.events
                    .emit(self.frame_index, ViewerEventKind::InfoOpened { hotspot_id });
                ViewerAction::ShowInfo(modal)
            }
            HotspotKind::Link { url } => {
                self.events.emit(
                    self.frame_index,
                    ViewerEventKind::LinkOpened { url: url.clone() },
                );
                ViewerAction::OpenLink(url)
            }
            HotspotKind::Audio {
                audio_url, looped, ..
            } => {
                let playback = AudioPlayback {
                    hotspot_id,
                    url: audio_url,
                    looped,
                };
                self.audio = Some(playback.clone());
                self.events.emit(
                    self.frame_index,
                    ViewerEventKind::AudioStarted {
                        hotspot_id,
                        url: playback.url.clone(),
                    },
                );
                ViewerAction::PlayAudio(playback)
            }
        }
    }

    /// World-space anchor of every hotspot in the current scene on a sphere
    /// of `radius`.
    pub fn hotspot_anchors(&self, radius: f64) -> Vec<(Uuid, Vec3)> {
        self.hotspots()
            .iter()
            .map(|h| (h.id, to_cartesian(h.yaw, h.pitch, radius)))
            .collect()
    }

    /// Markers for hotspots in view on a `width` x `height` viewport.
    pub fn visible_markers(&self, width: f64, height: f64) -> Vec<ViewerMarker> {
        self.hotspots()
            .iter()
            .filter_map(|h| {
                let view = self.camera.direction_to_view(h.direction(), self.margin)?;
                let (x, y) = view.to_pixels(width, height);
                Some(ViewerMarker {
                    hotspot_id: h.id,
                    x,
                    y,
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Camera and time
    // -----------------------------------------------------------------------

    pub fn drag(&mut self, delta: Vec2) {
        self.camera.pan_by_pixels(delta, self.sensitivity);
    }

    pub fn look_at(&mut self, direction: Direction) {
        self.camera.set_direction(direction);
    }

    pub fn toggle_guided(&mut self) -> bool {
        self.guided = !self.guided;
        self.guided_elapsed_s = 0.0;
        self.events.emit(
            self.frame_index,
            ViewerEventKind::GuidedModeChanged {
                enabled: self.guided,
            },
        );
        self.guided
    }

    /// Advance by `dt_s` seconds. Guided mode moves to the next scene once
    /// the tour's dwell time has passed; auto-rotation turns the camera.
    pub fn tick(&mut self, dt_s: f64) {
        self.frame_index += 1;
        if !dt_s.is_finite() || dt_s <= 0.0 {
            return;
        }

        if self.settings.auto_rotate {
            let d = self.camera.direction();
            self.camera.set_direction(Direction::new(
                d.yaw + self.settings.auto_rotate_speed * dt_s,
                d.pitch,
            ));
        }

        if self.guided {
            self.guided_elapsed_s += dt_s;
            let dwell_s = self.settings.guided_tour_delay_ms as f64 / 1000.0;
            if self.guided_elapsed_s >= dwell_s {
                self.guided_elapsed_s = 0.0;
                self.next_scene();
            }
        }
    }

    /// Fraction of the guided dwell time already spent on this scene.
    pub fn guided_progress(&self) -> f64 {
        let dwell_s = self.settings.guided_tour_delay_ms as f64 / 1000.0;
        if !self.guided || dwell_s <= 0.0 {
            return 0.0;
        }
        (self.guided_elapsed_s / dwell_s).min(1.0)
    }
}
