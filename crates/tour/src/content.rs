//! Content service: tours, scenes, hotspots and floor plans.
//!
//! Input validation and cross-entity rules live here; the repositories only
//! enforce ownership (a child addressed through the wrong parent is not found).

use tracing::info;
use uuid::Uuid;

use crate::error::{TourError, TourResult};
use crate::models::{
    floor_plan::{CreateFloorPlan, FloorPlan, UpdateFloorPlan},
    hotspot::{Hotspot, HotspotKind, NewHotspot, UpdateHotspot, checked_direction},
    scene::{CreateScene, FloorPlanPlacement, Scene, UpdateScene},
    tour::{CreateTour, SceneWithHotspots, Tour, TourDetail, UpdateTour},
};
use crate::repository::{FloorPlanRepository, HotspotRepository, SceneRepository, TourRepository};

/// Result of opening a tour by its public slug.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicTour {
    /// Password-gated: only the tour itself, no content.
    Locked(Tour),
    Open(TourDetail),
}

#[derive(Clone)]
pub struct ContentService<S> {
    store: S,
}

fn require_text(value: &str, field: &str) -> TourResult<()> {
    if value.trim().is_empty() {
        return Err(TourError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn checked_optional_direction(
    yaw: Option<f64>,
    pitch: Option<f64>,
) -> TourResult<(Option<f64>, Option<f64>)> {
    let direction = checked_direction(yaw.unwrap_or(0.0), pitch.unwrap_or(0.0))?;
    Ok((yaw.map(|_| direction.yaw), pitch.map(|_| direction.pitch)))
}

impl<S> ContentService<S>
where
    S: TourRepository + SceneRepository + HotspotRepository + FloorPlanRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // -----------------------------------------------------------------------
    // Tours
    // -----------------------------------------------------------------------

    pub async fn list_tours(&self, published_only: bool) -> TourResult<Vec<Tour>> {
        self.store.list_tours(published_only).await
    }

    pub async fn get_tour(&self, id: Uuid) -> TourResult<Tour> {
        self.store.get_tour(id).await
    }

    pub async fn tour_detail(&self, id: Uuid) -> TourResult<TourDetail> {
        let tour = self.store.get_tour(id).await?;
        self.detail_of(tour).await
    }

    async fn detail_of(&self, tour: Tour) -> TourResult<TourDetail> {
        let mut scenes = Vec::new();
        for scene in self.store.list_scenes(tour.id).await? {
            let hotspots = self.store.list_hotspots(scene.id).await?;
            scenes.push(SceneWithHotspots { scene, hotspots });
        }
        let floor_plans = self.store.list_floor_plans(tour.id).await?;
        Ok(TourDetail {
            tour,
            scenes,
            floor_plans,
        })
    }

    /// Published tour by slug. Unpublished tours are reported as not found.
    pub async fn open_published(&self, slug: &str) -> TourResult<PublicTour> {
        let tour = self
            .store
            .find_tour_by_slug(slug)
            .await?
            .filter(|t| t.is_published)
            .ok_or_else(|| TourError::not_found("tour", slug))?;
        if tour.is_password_protected() {
            return Ok(PublicTour::Locked(tour));
        }
        Ok(PublicTour::Open(self.detail_of(tour).await?))
    }

    /// Unlocks a published, password-gated tour. `verify` checks the supplied
    /// password against the stored hash.
    pub async fn unlock_published<V>(&self, id: Uuid, verify: V) -> TourResult<TourDetail>
    where
        V: FnOnce(&str) -> TourResult<bool>,
    {
        let tour = self.store.get_tour(id).await?;
        if !tour.is_published {
            return Err(TourError::not_found("tour", id));
        }
        if let Some(hash) = &tour.password_hash {
            if !verify(hash)? {
                return Err(TourError::IncorrectPassword);
            }
        }
        self.detail_of(tour).await
    }

    pub async fn create_tour(&self, input: CreateTour) -> TourResult<Tour> {
        require_text(&input.name, "name")?;
        let tour = self.store.create_tour(input).await?;
        info!(tour_id = %tour.id, slug = %tour.slug, "tour created");
        Ok(tour)
    }

    pub async fn update_tour(&self, id: Uuid, input: UpdateTour) -> TourResult<Tour> {
        if let Some(name) = &input.name {
            require_text(name, "name")?;
        }
        self.store.update_tour(id, input).await
    }

    pub async fn delete_tour(&self, id: Uuid) -> TourResult<()> {
        self.store.delete_tour(id).await?;
        info!(tour_id = %id, "tour deleted");
        Ok(())
    }

    pub async fn set_published(&self, id: Uuid, published: bool) -> TourResult<Tour> {
        let tour = self
            .store
            .update_tour(
                id,
                UpdateTour {
                    is_published: Some(published),
                    ..UpdateTour::default()
                },
            )
            .await?;
        info!(tour_id = %id, published, "tour publish state changed");
        Ok(tour)
    }

    // -----------------------------------------------------------------------
    // Scenes
    // -----------------------------------------------------------------------

    pub async fn list_scenes(&self, tour_id: Uuid) -> TourResult<Vec<Scene>> {
        self.store.list_scenes(tour_id).await
    }

    pub async fn get_scene(&self, tour_id: Uuid, scene_id: Uuid) -> TourResult<Scene> {
        self.store.get_scene(tour_id, scene_id).await
    }

    pub async fn create_scene(&self, tour_id: Uuid, mut input: CreateScene) -> TourResult<Scene> {
        require_text(&input.name, "name")?;
        require_text(&input.panorama_url, "panoramaUrl")?;
        (input.initial_yaw, input.initial_pitch) =
            checked_optional_direction(input.initial_yaw, input.initial_pitch)?;
        let scene = self.store.create_scene(tour_id, input).await?;
        info!(tour_id = %tour_id, scene_id = %scene.id, "scene created");
        Ok(scene)
    }

    pub async fn update_scene(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
        mut input: UpdateScene,
    ) -> TourResult<Scene> {
        if let Some(name) = &input.name {
            require_text(name, "name")?;
        }
        if let Some(Some(placement)) = &input.placement {
            check_placement(placement.x, placement.y)?;
        }
        (input.initial_yaw, input.initial_pitch) =
            checked_optional_direction(input.initial_yaw, input.initial_pitch)?;
        self.store.update_scene(tour_id, scene_id, input).await
    }

    pub async fn delete_scene(&self, tour_id: Uuid, scene_id: Uuid) -> TourResult<()> {
        self.store.delete_scene(tour_id, scene_id).await?;
        info!(tour_id = %tour_id, scene_id = %scene_id, "scene deleted");
        Ok(())
    }

    pub async fn reorder_scenes(&self, tour_id: Uuid, scene_ids: Vec<Uuid>) -> TourResult<Vec<Scene>> {
        self.store.reorder_scenes(tour_id, scene_ids).await
    }

    // -----------------------------------------------------------------------
    // Hotspots
    // -----------------------------------------------------------------------

    pub async fn list_hotspots(&self, tour_id: Uuid, scene_id: Uuid) -> TourResult<Vec<Hotspot>> {
        self.store.get_scene(tour_id, scene_id).await?;
        self.store.list_hotspots(scene_id).await
    }

    pub async fn get_hotspot(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
        hotspot_id: Uuid,
    ) -> TourResult<Hotspot> {
        self.store.get_scene(tour_id, scene_id).await?;
        self.store.get_hotspot(scene_id, hotspot_id).await
    }

    /// Creates a hotspot in `scene_id`.
    ///
    /// Fails `NotFound` when the scene is not part of the tour and
    /// `Validation` for a bad payload or a navigation target outside the tour.
    pub async fn create_hotspot(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
        mut input: NewHotspot,
    ) -> TourResult<Hotspot> {
        self.store.get_scene(tour_id, scene_id).await?;
        let direction = checked_direction(input.yaw, input.pitch)?;
        input.yaw = direction.yaw;
        input.pitch = direction.pitch;
        self.check_kind(tour_id, &input.kind).await?;
        input.style.validate()?;

        let hotspot = self.store.create_hotspot(scene_id, input).await?;
        info!(
            tour_id = %tour_id,
            scene_id = %scene_id,
            hotspot_id = %hotspot.id,
            yaw = hotspot.yaw,
            pitch = hotspot.pitch,
            "hotspot created"
        );
        Ok(hotspot)
    }

    pub async fn update_hotspot(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
        hotspot_id: Uuid,
        mut input: UpdateHotspot,
    ) -> TourResult<Hotspot> {
        self.store.get_scene(tour_id, scene_id).await?;
        (input.yaw, input.pitch) = checked_optional_direction(input.yaw, input.pitch)?;
        if let Some(kind) = &input.kind {
            self.check_kind(tour_id, kind).await?;
        }
        if let Some(style) = &input.style {
            style.validate()?;
        }
        self.store.update_hotspot(scene_id, hotspot_id, input).await
    }

    pub async fn delete_hotspot(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
        hotspot_id: Uuid,
    ) -> TourResult<()> {
        self.store.get_scene(tour_id, scene_id).await?;
        self.store.delete_hotspot(scene_id, hotspot_id).await
    }

    async fn check_kind(&self, tour_id: Uuid, kind: &HotspotKind) -> TourResult<()> {
        kind.validate()?;
        if let Some(target) = kind.target_scene() {
            match self.store.get_scene(tour_id, target).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    return Err(TourError::validation(
                        "target scene must belong to the same tour",
                    ));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Floor plans
    // -----------------------------------------------------------------------

    pub async fn list_floor_plans(&self, tour_id: Uuid) -> TourResult<Vec<FloorPlan>> {
        self.store.list_floor_plans(tour_id).await
    }

    pub async fn get_floor_plan(&self, tour_id: Uuid, floor_plan_id: Uuid) -> TourResult<FloorPlan> {
        self.store.get_floor_plan(tour_id, floor_plan_id).await
    }

    pub async fn create_floor_plan(
        &self,
        tour_id: Uuid,
        input: CreateFloorPlan,
    ) -> TourResult<FloorPlan> {
        require_text(&input.image_url, "imageUrl")?;
        let plan = self.store.create_floor_plan(tour_id, input).await?;
        info!(tour_id = %tour_id, floor_plan_id = %plan.id, floor = plan.floor, "floor plan created");
        Ok(plan)
    }

    pub async fn update_floor_plan(
        &self,
        tour_id: Uuid,
        floor_plan_id: Uuid,
        input: UpdateFloorPlan,
    ) -> TourResult<FloorPlan> {
        if let Some(url) = &input.image_url {
            require_text(url, "imageUrl")?;
        }
        self.store
            .update_floor_plan(tour_id, floor_plan_id, input)
            .await
    }

    pub async fn delete_floor_plan(&self, tour_id: Uuid, floor_plan_id: Uuid) -> TourResult<()> {
        self.store.delete_floor_plan(tour_id, floor_plan_id).await
    }

    /// Puts the scene's marker at `(x, y)` on the floor plan.
    pub async fn place_scene(
        &self,
        tour_id: Uuid,
        floor_plan_id: Uuid,
        scene_id: Uuid,
        x: f64,
        y: f64,
    ) -> TourResult<Scene> {
        check_placement(x, y)?;
        self.store
            .update_scene(
                tour_id,
                scene_id,
                UpdateScene {
                    placement: Some(Some(FloorPlanPlacement {
                        floor_plan_id,
                        x,
                        y,
                    })),
                    ..UpdateScene::default()
                },
            )
            .await
    }
}

fn check_placement(x: f64, y: f64) -> TourResult<()> {
    if !x.is_finite() || !y.is_finite() {
        return Err(TourError::validation("x and y must be finite numbers"));
    }
    Ok(())
}
