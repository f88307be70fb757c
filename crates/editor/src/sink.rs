//! Where placement requests are sent.

use std::fmt::Display;

use tour::ContentService;
use tour::error::TourError;
use tour::models::hotspot::{Hotspot, NewHotspot};
use tour::repository::{FloorPlanRepository, HotspotRepository, SceneRepository, TourRepository};
use uuid::Uuid;

/// Persists hotspots created by the placement tool.
pub trait HotspotSink {
    type Error: Display;

    fn create_hotspot(
        &self,
        scene_id: Uuid,
        hotspot: NewHotspot,
    ) -> impl Future<Output = Result<Hotspot, Self::Error>>;
}

/// Sends placements straight to a [`ContentService`] for one tour.
pub struct ContentSink<'a, S> {
    content: &'a ContentService<S>,
    tour_id: Uuid,
}

impl<'a, S> ContentSink<'a, S> {
    pub fn new(content: &'a ContentService<S>, tour_id: Uuid) -> Self {
        Self { content, tour_id }
    }
}

impl<S> HotspotSink for ContentSink<'_, S>
where
    S: TourRepository + SceneRepository + HotspotRepository + FloorPlanRepository,
{
    type Error = TourError;

    async fn create_hotspot(&self, scene_id: Uuid, hotspot: NewHotspot) -> Result<Hotspot, TourError> {
        self.content
            .create_hotspot(self.tour_id, scene_id, hotspot)
            .await
    }
}
