//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Child entities are always addressed
//! through their parent (`tour_id` for scenes and floor plans, `scene_id` for
//! hotspots); an id that exists under another parent is reported as not found.
//! Methods carry an entity prefix so one backend can implement every trait
//! without call-site ambiguity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TourResult;
use crate::models::{
    floor_plan::{CreateFloorPlan, FloorPlan, UpdateFloorPlan},
    hotspot::{Hotspot, NewHotspot, UpdateHotspot},
    invite::{CreateInvite, InviteCreator, InviteLink},
    scene::{CreateScene, Scene, UpdateScene},
    session::{CreateSession, Session},
    tour::{CreateTour, Tour, UpdateTour},
    user::{CreateUser, User},
};

// ---------------------------------------------------------------------------
// Operators and credentials
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn count_users(&self) -> impl Future<Output = TourResult<usize>> + Send;
    fn get_user(&self, id: Uuid) -> impl Future<Output = TourResult<User>> + Send;
    /// `email` must already be normalized.
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = TourResult<Option<User>>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create_session(
        &self,
        input: CreateSession,
    ) -> impl Future<Output = TourResult<Session>> + Send;
    fn find_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = TourResult<Option<Session>>> + Send;
    /// Returns whether a session was removed.
    fn delete_session(&self, id: Uuid) -> impl Future<Output = TourResult<bool>> + Send;
    /// Removes every session expired at `now`, returning how many.
    fn purge_expired_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = TourResult<usize>> + Send;
}

pub trait InviteRepository: Send + Sync {
    fn create_invite(
        &self,
        input: CreateInvite,
    ) -> impl Future<Output = TourResult<InviteLink>> + Send;
    fn get_invite(&self, id: Uuid) -> impl Future<Output = TourResult<InviteLink>> + Send;
    fn find_invite_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = TourResult<Option<InviteLink>>> + Send;
    /// Newest first.
    fn list_invites_by_creator(
        &self,
        creator: InviteCreator,
    ) -> impl Future<Output = TourResult<Vec<InviteLink>>> + Send;
    fn delete_invite(&self, id: Uuid) -> impl Future<Output = TourResult<bool>> + Send;

    /// First-run invite, decided atomically.
    ///
    /// Returns `None` once any user exists. Otherwise returns a pending
    /// `SYSTEM` invite, inserting `candidate` when none is usable at `now`.
    fn bootstrap_invite(
        &self,
        candidate: CreateInvite,
        now: DateTime<Utc>,
    ) -> impl Future<Output = TourResult<Option<InviteLink>>> + Send;

    /// Consumes the invite identified by `token` and creates the user, as one
    /// all-or-nothing commit.
    ///
    /// Fails with `NotFound`, `InviteAlreadyUsed` or `InviteExpired` for the
    /// invite and `Conflict` when the email is taken. The first user ever
    /// created is an admin.
    fn redeem_invite(
        &self,
        token: &str,
        user: CreateUser,
        now: DateTime<Utc>,
    ) -> impl Future<Output = TourResult<User>> + Send;
}

// ---------------------------------------------------------------------------
// Content graph
// ---------------------------------------------------------------------------

pub trait TourRepository: Send + Sync {
    /// Slugifies the requested slug (or the name) and makes it unique.
    fn create_tour(&self, input: CreateTour) -> impl Future<Output = TourResult<Tour>> + Send;
    fn get_tour(&self, id: Uuid) -> impl Future<Output = TourResult<Tour>> + Send;
    fn find_tour_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = TourResult<Option<Tour>>> + Send;
    /// Most recently updated first.
    fn list_tours(
        &self,
        published_only: bool,
    ) -> impl Future<Output = TourResult<Vec<Tour>>> + Send;
    fn update_tour(
        &self,
        id: Uuid,
        input: UpdateTour,
    ) -> impl Future<Output = TourResult<Tour>> + Send;
    /// Cascades to scenes, hotspots and floor plans.
    fn delete_tour(&self, id: Uuid) -> impl Future<Output = TourResult<()>> + Send;
}

pub trait SceneRepository: Send + Sync {
    fn create_scene(
        &self,
        tour_id: Uuid,
        input: CreateScene,
    ) -> impl Future<Output = TourResult<Scene>> + Send;
    fn get_scene(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
    ) -> impl Future<Output = TourResult<Scene>> + Send;
    /// Ascending `order`.
    fn list_scenes(&self, tour_id: Uuid) -> impl Future<Output = TourResult<Vec<Scene>>> + Send;
    fn update_scene(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
        input: UpdateScene,
    ) -> impl Future<Output = TourResult<Scene>> + Send;
    /// Also removes the scene's hotspots and navigation hotspots targeting it.
    fn delete_scene(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
    ) -> impl Future<Output = TourResult<()>> + Send;
    /// Assigns `order = index` following `scene_ids`. Ids outside the tour are
    /// skipped; scenes not listed keep their relative order after the listed ones.
    fn reorder_scenes(
        &self,
        tour_id: Uuid,
        scene_ids: Vec<Uuid>,
    ) -> impl Future<Output = TourResult<Vec<Scene>>> + Send;
}

pub trait HotspotRepository: Send + Sync {
    fn create_hotspot(
        &self,
        scene_id: Uuid,
        input: NewHotspot,
    ) -> impl Future<Output = TourResult<Hotspot>> + Send;
    fn get_hotspot(
        &self,
        scene_id: Uuid,
        hotspot_id: Uuid,
    ) -> impl Future<Output = TourResult<Hotspot>> + Send;
    /// Creation order.
    fn list_hotspots(
        &self,
        scene_id: Uuid,
    ) -> impl Future<Output = TourResult<Vec<Hotspot>>> + Send;
    fn update_hotspot(
        &self,
        scene_id: Uuid,
        hotspot_id: Uuid,
        input: UpdateHotspot,
    ) -> impl Future<Output = TourResult<Hotspot>> + Send;
    fn delete_hotspot(
        &self,
        scene_id: Uuid,
        hotspot_id: Uuid,
    ) -> impl Future<Output = TourResult<()>> + Send;
}

pub trait FloorPlanRepository: Send + Sync {
    fn create_floor_plan(
        &self,
        tour_id: Uuid,
        input: CreateFloorPlan,
    ) -> impl Future<Output = TourResult<FloorPlan>> + Send;
    fn get_floor_plan(
        &self,
        tour_id: Uuid,
        floor_plan_id: Uuid,
    ) -> impl Future<Output = TourResult<FloorPlan>> + Send;
    /// Ascending floor.
    fn list_floor_plans(
        &self,
        tour_id: Uuid,
    ) -> impl Future<Output = TourResult<Vec<FloorPlan>>> + Send;
    fn update_floor_plan(
        &self,
        tour_id: Uuid,
        floor_plan_id: Uuid,
        input: UpdateFloorPlan,
    ) -> impl Future<Output = TourResult<FloorPlan>> + Send;
    /// Scenes placed on the plan lose their placement.
    fn delete_floor_plan(
        &self,
        tour_id: Uuid,
        floor_plan_id: Uuid,
    ) -> impl Future<Output = TourResult<()>> + Send;
}

/// Every repository the services need, implemented by one backend.
pub trait Store:
    UserRepository
    + SessionRepository
    + InviteRepository
    + TourRepository
    + SceneRepository
    + HotspotRepository
    + FloorPlanRepository
    + Clone
    + 'static
{
}

impl<T> Store for T where
    T: UserRepository
        + SessionRepository
        + InviteRepository
        + TourRepository
        + SceneRepository
        + HotspotRepository
        + FloorPlanRepository
        + Clone
        + 'static
{
}
