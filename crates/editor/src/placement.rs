//! Pointer-driven hotspot placement over a panorama.
//!
//! The operator drags to aim the camera, picks a hotspot kind, then clicks
//! where the hotspot should go. A click produces a [`PlacementRequest`]; the
//! hotspot only joins the local list once the store confirms it through
//! [`PlacementTool::complete`]. Requests cannot be cancelled once sent, so
//! every request carries a ticket and results for a scene that has since
//! been switched or torn down are dropped.

use foundation::{DragSensitivity, FieldOfView, Vec2, ViewCamera, ViewPoint, VisibilityMargin};
use tour::models::hotspot::{Hotspot, HotspotKind, HotspotStyle, NewHotspot};
use tour::models::scene::Scene;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::PlacementError;
use crate::sink::HotspotSink;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolState {
    Idle,
    /// Pointer held down; moves pan the camera.
    Dragging { last_pointer: Vec2 },
    /// Waiting for the click that positions a hotspot of this kind.
    Placing { pending_kind: HotspotKind },
}

/// Identifies one create request. Only tickets from the current scene
/// generation are honoured.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlacementTicket {
    generation: u64,
    seq: u64,
}

/// A create request produced by a placement click.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    pub ticket: PlacementTicket,
    pub scene_id: Uuid,
    pub hotspot: NewHotspot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    /// The store confirmed the hotspot; it is now in the local list.
    Added(Hotspot),
    /// The store rejected the hotspot; nothing was added.
    Failed(PlacementError),
    /// The result arrived for a scene that is no longer loaded.
    Discarded,
}

/// A hotspot marker to draw, in viewport pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub hotspot_id: Uuid,
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct PlacementTool {
    camera: ViewCamera,
    state: ToolState,
    pub sensitivity: DragSensitivity,
    pub margin: VisibilityMargin,
    scene_id: Option<Uuid>,
    hotspots: Vec<Hotspot>,
    selected: Option<Uuid>,
    generation: u64,
    next_seq: u64,
    in_flight: Vec<PlacementTicket>,
    last_error: Option<PlacementError>,
}

impl Default for PlacementTool {
    fn default() -> Self {
        Self::new(FieldOfView::default())
    }
}

impl PlacementTool {
    pub fn new(fov: FieldOfView) -> Self {
        Self {
            camera: ViewCamera::new(fov),
            state: ToolState::Idle,
            sensitivity: DragSensitivity::default(),
            margin: VisibilityMargin::default(),
            scene_id: None,
            hotspots: Vec::new(),
            selected: None,
            generation: 0,
            next_seq: 0,
            in_flight: Vec::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    pub fn scene_id(&self) -> Option<Uuid> {
        self.scene_id
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// The most recent failure, until the next successful placement or scene
    /// switch.
    pub fn last_error(&self) -> Option<&PlacementError> {
        self.last_error.as_ref()
    }

    /// Load `scene` with its persisted hotspots. Results of requests sent
    /// for the previous scene will be discarded.
    pub fn reset_scene(&mut self, scene: &Scene, hotspots: Vec<Hotspot>) {
        self.invalidate();
        self.scene_id = Some(scene.id);
        self.hotspots = hotspots;
        self.camera.set_direction(scene.initial_direction());
    }

    /// Tear the view down. Outstanding results will be discarded.
    pub fn close(&mut self) {
        self.invalidate();
        self.scene_id = None;
        self.hotspots.clear();
        self.camera.reset();
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.in_flight.clear();
        self.state = ToolState::Idle;
        self.selected = None;
        self.last_error = None;
    }

    // -----------------------------------------------------------------------
    // Pointer input
    // -----------------------------------------------------------------------

    /// Start a drag. Ignored while placing.
    pub fn pointer_down(&mut self, pos: Vec2) {
        if matches!(self.state, ToolState::Idle) {
            self.state = ToolState::Dragging { last_pointer: pos };
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if let ToolState::Dragging { last_pointer } = &mut self.state {
            let delta = pos - *last_pointer;
            *last_pointer = pos;
            self.camera.pan_by_pixels(delta, self.sensitivity);
        }
    }

    pub fn pointer_up(&mut self) {
        if matches!(self.state, ToolState::Dragging { .. }) {
            self.state = ToolState::Idle;
        }
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Arm the tool with the kind of hotspot the next click creates. Ends any
    /// drag in progress.
    pub fn begin_placement(&mut self, kind: HotspotKind) {
        self.state = ToolState::Placing { pending_kind: kind };
    }

    /// Drop the pending kind without placing anything.
    pub fn cancel(&mut self) {
        if matches!(self.state, ToolState::Placing { .. }) {
            self.state = ToolState::Idle;
        }
    }

    /// Place the pending hotspot under `view` (normalized viewport position).
    ///
    /// Returns `None` when not placing. With no scene loaded the placement is
    /// abandoned and [`PlacementError::NoScene`] recorded.
    pub fn click(&mut self, view: ViewPoint) -> Option<PlacementRequest> {
        let pending_kind = match std::mem::replace(&mut self.state, ToolState::Idle) {
            ToolState::Placing { pending_kind } => pending_kind,
            other => {
                self.state = other;
                return None;
            }
        };
        let Some(scene_id) = self.scene_id else {
            self.last_error = Some(PlacementError::NoScene);
            return None;
        };

        let direction = self.camera.view_to_direction(view);
        let ordinal = self.hotspots.len() + self.in_flight.len() + 1;
        let name = format!("{} {}", pending_kind.label(), ordinal);
        let ticket = PlacementTicket {
            generation: self.generation,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.in_flight.push(ticket);

        debug!(
            scene_id = %scene_id,
            yaw = direction.yaw,
            pitch = direction.pitch,
            "placement requested"
        );
        Some(PlacementRequest {
            ticket,
            scene_id,
            hotspot: NewHotspot {
                name: Some(name),
                yaw: direction.yaw,
                pitch: direction.pitch,
                kind: pending_kind,
                style: HotspotStyle::default(),
            },
        })
    }

    /// Apply the store's answer to a placement request.
    pub fn complete<E>(
        &mut self,
        ticket: PlacementTicket,
        result: Result<Hotspot, E>,
    ) -> PlacementOutcome
    where
        E: std::fmt::Display,
    {
        let Some(index) = self.in_flight.iter().position(|t| *t == ticket) else {
            debug!("stale placement result discarded");
            return PlacementOutcome::Discarded;
        };
        self.in_flight.swap_remove(index);

        match result {
            Ok(hotspot) => {
                self.last_error = None;
                self.selected = Some(hotspot.id);
                self.hotspots.push(hotspot.clone());
                PlacementOutcome::Added(hotspot)
            }
            Err(err) => {
                warn!(error = %err, "hotspot placement failed");
                let error = PlacementError::CreateFailed(err.to_string());
                self.last_error = Some(error.clone());
                PlacementOutcome::Failed(error)
            }
        }
    }

    /// `click` then `complete` against `sink`. Returns `None` when the tool
    /// was not placing.
    pub async fn place<K>(&mut self, view: ViewPoint, sink: &K) -> Option<PlacementOutcome>
    where
        K: HotspotSink,
    {
        let request = self.click(view)?;
        let result = sink
            .create_hotspot(request.scene_id, request.hotspot)
            .await;
        Some(self.complete(request.ticket, result))
    }

    // -----------------------------------------------------------------------
    // Local list maintenance after confirmed edits
    // -----------------------------------------------------------------------

    pub fn select(&mut self, hotspot_id: Option<Uuid>) {
        self.selected = hotspot_id.filter(|id| self.hotspots.iter().any(|h| h.id == *id));
    }

    /// Swap in a hotspot the store confirmed as updated.
    pub fn replace_hotspot(&mut self, hotspot: Hotspot) -> bool {
        match self.hotspots.iter_mut().find(|h| h.id == hotspot.id) {
            Some(slot) => {
                *slot = hotspot;
                true
            }
            None => false,
        }
    }

    /// Drop a hotspot the store confirmed as deleted.
    pub fn remove_hotspot(&mut self, hotspot_id: Uuid) -> bool {
        let before = self.hotspots.len();
        self.hotspots.retain(|h| h.id != hotspot_id);
        if self.selected == Some(hotspot_id) {
            self.selected = None;
        }
        self.hotspots.len() != before
    }

    /// Markers for the hotspots currently in view on a `width` x `height`
    /// viewport. Hotspots outside the visibility margin are skipped.
    pub fn markers(&self, width: f64, height: f64) -> Vec<Marker> {
        self.hotspots
            .iter()
            .filter_map(|h| {
                let view = self.camera.direction_to_view(h.direction(), self.margin)?;
                let (x, y) = view.to_pixels(width, height);
                Some(Marker {
                    hotspot_id: h.id,
                    x,
                    y,
                    label: h.name.clone(),
                    selected: self.selected == Some(h.id),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn scene(initial_yaw: f64) -> Scene {
        let now = Utc::now();
        Scene {
            id: Uuid::new_v4(),
            tour_id: Uuid::new_v4(),
            name: "Lobby".into(),
            panorama_url: "/uploads/panoramas/lobby.jpg".into(),
            thumbnail_url: None,
            order: 0,
            initial_yaw,
            initial_pitch: 0.0,
            placement: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn confirm(scene_id: Uuid, request: &NewHotspot) -> Hotspot {
        let now = Utc::now();
        Hotspot {
            id: Uuid::new_v4(),
            scene_id,
            name: request.name.clone().unwrap_or_default(),
            yaw: request.yaw,
            pitch: request.pitch,
            kind: request.kind.clone(),
            style: request.style.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn link() -> HotspotKind {
        HotspotKind::Link {
            url: "https://example.com".into(),
        }
    }

    #[test]
    fn drag_pans_camera() {
        let mut tool = PlacementTool::default();
        tool.reset_scene(&scene(0.0), Vec::new());

        tool.pointer_down(Vec2::new(100.0, 100.0));
        assert_close(tool.camera().yaw(), 0.0, 1e-12);
        tool.pointer_move(Vec2::new(150.0, 100.0));
        assert_close(tool.camera().yaw(), -10.0, 1e-12);
        tool.pointer_move(Vec2::new(150.0, 125.0));
        assert_close(tool.camera().pitch(), 5.0, 1e-12);
        tool.pointer_up();
        assert_eq!(tool.state(), &ToolState::Idle);

        tool.pointer_move(Vec2::new(500.0, 500.0));
        assert_close(tool.camera().yaw(), -10.0, 1e-12);
    }

    #[test]
    fn drag_is_disabled_while_placing() {
        let mut tool = PlacementTool::default();
        tool.reset_scene(&scene(0.0), Vec::new());
        tool.begin_placement(link());
        tool.pointer_down(Vec2::new(0.0, 0.0));
        tool.pointer_move(Vec2::new(300.0, 0.0));
        assert!(matches!(tool.state(), ToolState::Placing { .. }));
        assert_close(tool.camera().yaw(), 0.0, 1e-12);

        tool.cancel();
        assert_eq!(tool.state(), &ToolState::Idle);
        assert!(tool.click(ViewPoint::CENTER).is_none());
    }

    #[test]
    fn click_aims_at_view_direction() {
        let mut tool = PlacementTool::default();
        let scene = scene(0.0);
        tool.reset_scene(&scene, Vec::new());
        tool.begin_placement(link());

        let request = tool.click(ViewPoint::new(1.0, 0.5)).unwrap();
        assert_eq!(tool.state(), &ToolState::Idle);
        assert_eq!(request.scene_id, scene.id);
        assert_close(request.hotspot.yaw, 60.0, 1e-12);
        assert_close(request.hotspot.pitch, 0.0, 1e-12);
        assert_eq!(request.hotspot.name.as_deref(), Some("Link 1"));
        // Nothing is shown until the store confirms.
        assert!(tool.hotspots().is_empty());
        assert_eq!(tool.in_flight(), 1);
    }

    #[test]
    fn confirmed_placement_is_added() {
        let mut tool = PlacementTool::default();
        let scene = scene(0.0);
        tool.reset_scene(&scene, Vec::new());
        tool.begin_placement(link());
        let request = tool.click(ViewPoint::CENTER).unwrap();

        let hotspot = confirm(scene.id, &request.hotspot);
        let outcome = tool.complete::<String>(request.ticket, Ok(hotspot.clone()));
        assert_eq!(outcome, PlacementOutcome::Added(hotspot.clone()));
        assert_eq!(tool.hotspots(), &[hotspot.clone()]);
        assert_eq!(tool.selected(), Some(hotspot.id));

        // A duplicate answer for the same ticket is ignored.
        let again = tool.complete::<String>(request.ticket, Ok(hotspot));
        assert_eq!(again, PlacementOutcome::Discarded);
        assert_eq!(tool.hotspots().len(), 1);
    }

    #[test]
    fn failed_placement_is_surfaced_and_not_added() {
        let mut tool = PlacementTool::default();
        tool.reset_scene(&scene(0.0), Vec::new());
        tool.begin_placement(link());
        let request = tool.click(ViewPoint::CENTER).unwrap();

        let outcome = tool.complete(request.ticket, Err("scene not found"));
        assert!(matches!(outcome, PlacementOutcome::Failed(_)));
        assert_eq!(
            tool.last_error(),
            Some(&PlacementError::CreateFailed("scene not found".into()))
        );
        assert!(tool.hotspots().is_empty());
        assert_eq!(tool.state(), &ToolState::Idle);
        assert_eq!(tool.in_flight(), 0);
    }

    #[test]
    fn results_for_a_previous_scene_are_discarded() {
        let mut tool = PlacementTool::default();
        let first = scene(0.0);
        tool.reset_scene(&first, Vec::new());
        tool.begin_placement(link());
        let request = tool.click(ViewPoint::CENTER).unwrap();

        tool.reset_scene(&scene(90.0), Vec::new());
        assert_close(tool.camera().yaw(), 90.0, 1e-12);

        let late = confirm(first.id, &request.hotspot);
        let outcome = tool.complete::<String>(request.ticket, Ok(late));
        assert_eq!(outcome, PlacementOutcome::Discarded);
        assert!(tool.hotspots().is_empty());
    }

    #[test]
    fn overlapping_placements_get_distinct_names() {
        let mut tool = PlacementTool::default();
        let scene = scene(0.0);
        tool.reset_scene(&scene, Vec::new());

        tool.begin_placement(link());
        let first = tool.click(ViewPoint::CENTER).unwrap();
        tool.begin_placement(link());
        let second = tool.click(ViewPoint::new(0.25, 0.5)).unwrap();
        assert_eq!(first.hotspot.name.as_deref(), Some("Link 1"));
        assert_eq!(second.hotspot.name.as_deref(), Some("Link 2"));

        let confirmed = confirm(scene.id, &first.hotspot);
        tool.complete::<String>(first.ticket, Ok(confirmed));
        tool.begin_placement(link());
        let third = tool.click(ViewPoint::new(0.75, 0.5)).unwrap();
        assert_eq!(third.hotspot.name.as_deref(), Some("Link 3"));
    }

    #[test]
    fn click_without_scene_records_error() {
        let mut tool = PlacementTool::default();
        tool.begin_placement(link());
        assert!(tool.click(ViewPoint::CENTER).is_none());
        assert_eq!(tool.last_error(), Some(&PlacementError::NoScene));
        assert_eq!(tool.state(), &ToolState::Idle);
    }

    #[test]
    fn markers_skip_hotspots_out_of_view() {
        let mut tool = PlacementTool::default();
        let scene = scene(0.0);
        let ahead = confirm(
            scene.id,
            &NewHotspot {
                name: Some("Ahead".into()),
                yaw: 0.0,
                pitch: 0.0,
                kind: link(),
                style: HotspotStyle::default(),
            },
        );
        let mut behind = ahead.clone();
        behind.id = Uuid::new_v4();
        behind.yaw = 180.0;

        tool.reset_scene(&scene, vec![ahead.clone(), behind]);
        let markers = tool.markers(800.0, 600.0);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].hotspot_id, ahead.id);
        assert_close(markers[0].x, 400.0, 1e-9);
        assert_close(markers[0].y, 300.0, 1e-9);
    }

    #[test]
    fn replace_and_remove_track_confirmed_edits() {
        let mut tool = PlacementTool::default();
        let scene = scene(0.0);
        let hotspot = confirm(
            scene.id,
            &NewHotspot {
                name: Some("Door".into()),
                yaw: 10.0,
                pitch: 0.0,
                kind: link(),
                style: HotspotStyle::default(),
            },
        );
        tool.reset_scene(&scene, vec![hotspot.clone()]);
        tool.select(Some(hotspot.id));

        let mut renamed = hotspot.clone();
        renamed.name = "Front door".into();
        assert!(tool.replace_hotspot(renamed));
        assert_eq!(tool.hotspots()[0].name, "Front door");

        assert!(tool.remove_hotspot(hotspot.id));
        assert_eq!(tool.selected(), None);
        assert!(!tool.remove_hotspot(hotspot.id));
    }
}
