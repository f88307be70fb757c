//! In-memory backend implementing every repository trait.
//!
//! All tables sit behind one `RwLock`, so each mutation, including the
//! multi-table ones (invite redemption, cascading deletes), commits as a unit.
//! When opened with a snapshot path, each mutation is staged on a copy of the
//! tables and published only after the copy is written to `<path>.tmp` and
//! renamed into place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{TourError, TourResult};
use crate::models::{
    floor_plan::{CreateFloorPlan, FloorPlan, UpdateFloorPlan},
    hotspot::{Hotspot, NewHotspot, UpdateHotspot},
    invite::{CreateInvite, InviteCreator, InviteLink, InviteStatus},
    scene::{CreateScene, Scene, UpdateScene},
    session::{CreateSession, Session},
    tour::{CreateTour, Tour, UpdateTour, slugify},
    user::{CreateUser, Role, User},
};
use crate::repository::{
    FloorPlanRepository, HotspotRepository, InviteRepository, SceneRepository,
    SessionRepository, TourRepository, UserRepository,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    invites: HashMap<Uuid, InviteLink>,
    tours: HashMap<Uuid, Tour>,
    scenes: HashMap<Uuid, Scene>,
    hotspots: HashMap<Uuid, Hotspot>,
    floor_plans: HashMap<Uuid, FloorPlan>,
}

impl Tables {
    fn tour(&self, id: Uuid) -> TourResult<&Tour> {
        self.tours
            .get(&id)
            .ok_or_else(|| TourError::not_found("tour", id))
    }

    fn scene_mut(&mut self, tour_id: Uuid, scene_id: Uuid) -> TourResult<&mut Scene> {
        self.scenes
            .get_mut(&scene_id)
            .filter(|s| s.tour_id == tour_id)
            .ok_or_else(|| TourError::not_found("scene", scene_id))
    }

    fn hotspot_mut(&mut self, scene_id: Uuid, hotspot_id: Uuid) -> TourResult<&mut Hotspot> {
        self.hotspots
            .get_mut(&hotspot_id)
            .filter(|h| h.scene_id == scene_id)
            .ok_or_else(|| TourError::not_found("hotspot", hotspot_id))
    }

    fn floor_plan_mut(&mut self, tour_id: Uuid, floor_plan_id: Uuid) -> TourResult<&mut FloorPlan> {
        self.floor_plans
            .get_mut(&floor_plan_id)
            .filter(|fp| fp.tour_id == tour_id)
            .ok_or_else(|| TourError::not_found("floor plan", floor_plan_id))
    }

    fn ensure_floor_plan(&self, tour_id: Uuid, floor_plan_id: Uuid) -> TourResult<()> {
        match self.floor_plans.get(&floor_plan_id) {
            Some(fp) if fp.tour_id == tour_id => Ok(()),
            _ => Err(TourError::not_found("floor plan", floor_plan_id)),
        }
    }

    /// `base`, or `base-1`, `base-2`, ... whichever is free first.
    fn unique_slug(&self, base: &str, exclude: Option<Uuid>) -> String {
        let taken = |slug: &str| {
            self.tours
                .values()
                .any(|t| t.slug == slug && Some(t.id) != exclude)
        };
        if !taken(base) {
            return base.to_string();
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{base}-{n}");
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn sorted_scenes(&self, tour_id: Uuid) -> Vec<Scene> {
        let mut scenes: Vec<Scene> = self
            .scenes
            .values()
            .filter(|s| s.tour_id == tour_id)
            .cloned()
            .collect();
        scenes.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        scenes
    }

    fn remove_scene_hotspots(&mut self, scene_id: Uuid) {
        self.hotspots
            .retain(|_, h| h.scene_id != scene_id && h.kind.target_scene() != Some(scene_id));
    }
}

/// Writes `text` to `<path>.tmp` and renames it over `path`.
async fn write_snapshot(path: &Path, text: String) -> TourResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TourError::Storage(e.to_string()))?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, text)
        .await
        .map_err(|e| TourError::Storage(e.to_string()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| TourError::Storage(e.to_string()))?;
    debug!(path = %path.display(), "snapshot written");
    Ok(())
}

struct SnapshotFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

struct Inner {
    tables: RwLock<Tables>,
    snapshot: Option<SnapshotFile>,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Volatile store; contents are lost on drop.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(Tables::default()),
                snapshot: None,
            }),
        }
    }

    /// Store persisted to `path`. A missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> TourResult<Self> {
        let path = path.into();
        let tables = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str::<Tables>(&text)
                .map_err(|e| TourError::Storage(format!("corrupt snapshot {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => {
                return Err(TourError::Storage(format!(
                    "failed to read snapshot {}: {e}",
                    path.display()
                )));
            }
        };
        info!(
            path = %path.display(),
            tours = tables.tours.len(),
            users = tables.users.len(),
            "opened snapshot store"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(tables),
                snapshot: Some(SnapshotFile {
                    path,
                    write_lock: Mutex::new(()),
                }),
            }),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.inner.snapshot.as_ref().map(|s| s.path.as_path())
    }

    /// Runs `f` and commits its result.
    ///
    /// Without a snapshot `f` edits the tables in place, so it must validate
    /// before it mutates. With a snapshot `f` edits a copy under the file
    /// lock; the copy replaces the live tables only once it is on disk, so a
    /// failed write leaves memory and disk unchanged.
    async fn mutate<T, F>(&self, f: F) -> TourResult<T>
    where
        F: FnOnce(&mut Tables) -> TourResult<T> + Send,
        T: Send,
    {
        let Some(snapshot) = &self.inner.snapshot else {
            let mut tables = self.inner.tables.write();
            return f(&mut tables);
        };

        let _guard = snapshot.write_lock.lock().await;
        let (next, out, text) = {
            let mut next = self.inner.tables.read().clone();
            let out = f(&mut next)?;
            let text = serde_json::to_string_pretty(&next)
                .map_err(|e| TourError::Storage(e.to_string()))?;
            (next, out, text)
        };
        if let Err(err) = write_snapshot(&snapshot.path, text).await {
            error!(error = %err, "snapshot write failed");
            return Err(err);
        }
        *self.inner.tables.write() = next;
        Ok(out)
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.inner.tables.read())
    }
}

// ---------------------------------------------------------------------------
// Operators and credentials
// ---------------------------------------------------------------------------

impl UserRepository for MemoryStore {
    async fn count_users(&self) -> TourResult<usize> {
        Ok(self.read(|t| t.users.len()))
    }

    async fn get_user(&self, id: Uuid) -> TourResult<User> {
        self.read(|t| t.users.get(&id).cloned())
            .ok_or_else(|| TourError::not_found("user", id))
    }

    async fn find_user_by_email(&self, email: &str) -> TourResult<Option<User>> {
        Ok(self.read(|t| t.users.values().find(|u| u.email == email).cloned()))
    }
}

impl SessionRepository for MemoryStore {
    async fn create_session(&self, input: CreateSession) -> TourResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            token_hash: input.token_hash,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        self.mutate(move |t| {
            t.sessions.insert(session.id, session.clone());
            Ok(session)
        })
        .await
    }

    async fn find_session_by_token_hash(&self, token_hash: &str) -> TourResult<Option<Session>> {
        Ok(self.read(|t| {
            t.sessions
                .values()
                .find(|s| s.token_hash == token_hash)
                .cloned()
        }))
    }

    async fn delete_session(&self, id: Uuid) -> TourResult<bool> {
        self.mutate(|t| Ok(t.sessions.remove(&id).is_some())).await
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> TourResult<usize> {
        self.mutate(|t| {
            let before = t.sessions.len();
            t.sessions.retain(|_, s| !s.is_expired(now));
            Ok(before - t.sessions.len())
        })
        .await
    }
}

fn new_invite(input: CreateInvite) -> InviteLink {
    InviteLink {
        id: Uuid::new_v4(),
        token: input.token,
        email: input.email,
        created_by: input.created_by,
        expires_at: input.expires_at,
        used_at: None,
        used_by: None,
        created_at: Utc::now(),
    }
}

impl InviteRepository for MemoryStore {
    async fn create_invite(&self, input: CreateInvite) -> TourResult<InviteLink> {
        let invite = new_invite(input);
        self.mutate(move |t| {
            t.invites.insert(invite.id, invite.clone());
            Ok(invite)
        })
        .await
    }

    async fn get_invite(&self, id: Uuid) -> TourResult<InviteLink> {
        self.read(|t| t.invites.get(&id).cloned())
            .ok_or_else(|| TourError::not_found("invite", id))
    }

    async fn find_invite_by_token(&self, token: &str) -> TourResult<Option<InviteLink>> {
        Ok(self.read(|t| t.invites.values().find(|i| i.token == token).cloned()))
    }

    async fn list_invites_by_creator(&self, creator: InviteCreator) -> TourResult<Vec<InviteLink>> {
        let mut invites: Vec<InviteLink> = self.read(|t| {
            t.invites
                .values()
                .filter(|i| i.created_by == creator)
                .cloned()
                .collect()
        });
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn delete_invite(&self, id: Uuid) -> TourResult<bool> {
        self.mutate(|t| Ok(t.invites.remove(&id).is_some())).await
    }

    async fn bootstrap_invite(
        &self,
        candidate: CreateInvite,
        now: DateTime<Utc>,
    ) -> TourResult<Option<InviteLink>> {
        if self.read(|t| !t.users.is_empty()) {
            return Ok(None);
        }
        self.mutate(move |t| {
            if !t.users.is_empty() {
                return Ok(None);
            }
            let existing = t
                .invites
                .values()
                .filter(|i| i.created_by == InviteCreator::System && i.is_pending(now))
                .max_by_key(|i| i.created_at)
                .cloned();
            if let Some(invite) = existing {
                return Ok(Some(invite));
            }
            let invite = new_invite(candidate);
            t.invites.insert(invite.id, invite.clone());
            Ok(Some(invite))
        })
        .await
    }

    async fn redeem_invite(
        &self,
        token: &str,
        user: CreateUser,
        now: DateTime<Utc>,
    ) -> TourResult<User> {
        let token = token.to_string();
        self.mutate(move |t| {
            let invite_id = t
                .invites
                .values()
                .find(|i| i.token == token)
                .map(|i| (i.id, i.status(now)))
                .ok_or_else(|| TourError::not_found("invite", "token"))
                .and_then(|(id, status)| match status {
                    InviteStatus::Pending => Ok(id),
                    InviteStatus::Used => Err(TourError::InviteAlreadyUsed),
                    InviteStatus::Expired => Err(TourError::InviteExpired),
                })?;

            if t.users.values().any(|u| u.email == user.email) {
                return Err(TourError::conflict("a user with this email already exists"));
            }

            let created = User {
                id: Uuid::new_v4(),
                email: user.email,
                name: user.name,
                role: Role::for_registration(t.users.len()),
                invited_by: user.invited_by,
                created_at: now,
            };
            t.users.insert(created.id, created.clone());
            if let Some(invite) = t.invites.get_mut(&invite_id) {
                invite.used_at = Some(now);
                invite.used_by = Some(created.id);
            }
            Ok(created)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Content graph
// ---------------------------------------------------------------------------

impl TourRepository for MemoryStore {
    async fn create_tour(&self, input: CreateTour) -> TourResult<Tour> {
        self.mutate(move |t| {
            let base = slugify(input.slug.as_deref().unwrap_or(&input.name));
            let now = Utc::now();
            let tour = Tour {
                id: Uuid::new_v4(),
                slug: t.unique_slug(&base, None),
                name: input.name,
                description: input.description,
                thumbnail_url: None,
                is_published: false,
                password_hash: input.password_hash,
                settings: input.settings.unwrap_or_default(),
                created_by: input.created_by,
                created_at: now,
                updated_at: now,
            };
            t.tours.insert(tour.id, tour.clone());
            Ok(tour)
        })
        .await
    }

    async fn get_tour(&self, id: Uuid) -> TourResult<Tour> {
        self.read(|t| t.tour(id).cloned())
    }

    async fn find_tour_by_slug(&self, slug: &str) -> TourResult<Option<Tour>> {
        Ok(self.read(|t| t.tours.values().find(|tour| tour.slug == slug).cloned()))
    }

    async fn list_tours(&self, published_only: bool) -> TourResult<Vec<Tour>> {
        let mut tours: Vec<Tour> = self.read(|t| {
            t.tours
                .values()
                .filter(|tour| !published_only || tour.is_published)
                .cloned()
                .collect()
        });
        tours.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tours)
    }

    async fn update_tour(&self, id: Uuid, input: UpdateTour) -> TourResult<Tour> {
        self.mutate(move |t| {
            t.tour(id)?;
            let slug = input
                .slug
                .as_deref()
                .map(|s| t.unique_slug(&slugify(s), Some(id)));
            let Some(tour) = t.tours.get_mut(&id) else {
                return Err(TourError::not_found("tour", id));
            };
            if let Some(name) = input.name {
                tour.name = name;
            }
            if let Some(slug) = slug {
                tour.slug = slug;
            }
            if let Some(description) = input.description {
                tour.description = description;
            }
            if let Some(thumbnail_url) = input.thumbnail_url {
                tour.thumbnail_url = thumbnail_url;
            }
            if let Some(is_published) = input.is_published {
                tour.is_published = is_published;
            }
            if let Some(password_hash) = input.password_hash {
                tour.password_hash = password_hash;
            }
            if let Some(settings) = input.settings {
                tour.settings = settings;
            }
            tour.updated_at = Utc::now();
            Ok(tour.clone())
        })
        .await
    }

    async fn delete_tour(&self, id: Uuid) -> TourResult<()> {
        self.mutate(|t| {
            t.tours
                .remove(&id)
                .ok_or_else(|| TourError::not_found("tour", id))?;
            let scene_ids: Vec<Uuid> = t
                .scenes
                .values()
                .filter(|s| s.tour_id == id)
                .map(|s| s.id)
                .collect();
            t.hotspots.retain(|_, h| !scene_ids.contains(&h.scene_id));
            t.scenes.retain(|_, s| s.tour_id != id);
            t.floor_plans.retain(|_, fp| fp.tour_id != id);
            Ok(())
        })
        .await
    }
}

impl SceneRepository for MemoryStore {
    async fn create_scene(&self, tour_id: Uuid, input: CreateScene) -> TourResult<Scene> {
        self.mutate(move |t| {
            t.tour(tour_id)?;
            let order = input.order.unwrap_or_else(|| {
                t.scenes
                    .values()
                    .filter(|s| s.tour_id == tour_id)
                    .map(|s| s.order + 1)
                    .max()
                    .unwrap_or(0)
            });
            let now = Utc::now();
            let scene = Scene {
                id: Uuid::new_v4(),
                tour_id,
                name: input.name,
                panorama_url: input.panorama_url,
                thumbnail_url: input.thumbnail_url,
                order,
                initial_yaw: input.initial_yaw.unwrap_or(0.0),
                initial_pitch: input.initial_pitch.unwrap_or(0.0),
                placement: None,
                created_at: now,
                updated_at: now,
            };
            t.scenes.insert(scene.id, scene.clone());
            Ok(scene)
        })
        .await
    }

    async fn get_scene(&self, tour_id: Uuid, scene_id: Uuid) -> TourResult<Scene> {
        self.read(|t| {
            t.scenes
                .get(&scene_id)
                .filter(|s| s.tour_id == tour_id)
                .cloned()
        })
        .ok_or_else(|| TourError::not_found("scene", scene_id))
    }

    async fn list_scenes(&self, tour_id: Uuid) -> TourResult<Vec<Scene>> {
        self.read(|t| {
            t.tour(tour_id)?;
            Ok::<_, TourError>(t.sorted_scenes(tour_id))
        })
    }

    async fn update_scene(
        &self,
        tour_id: Uuid,
        scene_id: Uuid,
        input: UpdateScene,
    ) -> TourResult<Scene> {
        self.mutate(move |t| {
            if let Some(Some(placement)) = &input.placement {
                t.ensure_floor_plan(tour_id, placement.floor_plan_id)?;
            }
            let scene = t.scene_mut(tour_id, scene_id)?;
            if let Some(name) = input.name {
                scene.name = name;
            }
            if let Some(panorama_url) = input.panorama_url {
                scene.panorama_url = panorama_url;
            }
            if let Some(thumbnail_url) = input.thumbnail_url {
                scene.thumbnail_url = thumbnail_url;
            }
            if let Some(order) = input.order {
                scene.order = order;
            }
            if let Some(yaw) = input.initial_yaw {
                scene.initial_yaw = yaw;
            }
            if let Some(pitch) = input.initial_pitch {
                scene.initial_pitch = pitch;
            }
            if let Some(placement) = input.placement {
                scene.placement = placement;
            }
            scene.updated_at = Utc::now();
            Ok(scene.clone())
        })
        .await
    }

    async fn delete_scene(&self, tour_id: Uuid, scene_id: Uuid) -> TourResult<()> {
        self.mutate(|t| {
            t.scene_mut(tour_id, scene_id)?;
            t.scenes.remove(&scene_id);
            t.remove_scene_hotspots(scene_id);
            Ok(())
        })
        .await
    }

    async fn reorder_scenes(&self, tour_id: Uuid, scene_ids: Vec<Uuid>) -> TourResult<Vec<Scene>> {
        self.mutate(move |t| {
            t.tour(tour_id)?;
            let current = t.sorted_scenes(tour_id);
            let mut ordered: Vec<Uuid> = Vec::with_capacity(current.len());
            for id in scene_ids {
                if current.iter().any(|s| s.id == id) && !ordered.contains(&id) {
                    ordered.push(id);
                }
            }
            for scene in &current {
                if !ordered.contains(&scene.id) {
                    ordered.push(scene.id);
                }
            }

            let now = Utc::now();
            for (index, id) in ordered.iter().enumerate() {
                if let Some(scene) = t.scenes.get_mut(id) {
                    let order = index as u32;
                    if scene.order != order {
                        scene.order = order;
                        scene.updated_at = now;
                    }
                }
            }
            Ok(t.sorted_scenes(tour_id))
        })
        .await
    }
}

impl HotspotRepository for MemoryStore {
    async fn create_hotspot(&self, scene_id: Uuid, input: NewHotspot) -> TourResult<Hotspot> {
        self.mutate(move |t| {
            if !t.scenes.contains_key(&scene_id) {
                return Err(TourError::not_found("scene", scene_id));
            }
            let now = Utc::now();
            let hotspot = Hotspot {
                id: Uuid::new_v4(),
                scene_id,
                name: input
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "Hotspot".to_string()),
                yaw: input.yaw,
                pitch: input.pitch,
                kind: input.kind,
                style: input.style,
                created_at: now,
                updated_at: now,
            };
            t.hotspots.insert(hotspot.id, hotspot.clone());
            Ok(hotspot)
        })
        .await
    }

    async fn get_hotspot(&self, scene_id: Uuid, hotspot_id: Uuid) -> TourResult<Hotspot> {
        self.read(|t| {
            t.hotspots
                .get(&hotspot_id)
                .filter(|h| h.scene_id == scene_id)
                .cloned()
        })
        .ok_or_else(|| TourError::not_found("hotspot", hotspot_id))
    }

    async fn list_hotspots(&self, scene_id: Uuid) -> TourResult<Vec<Hotspot>> {
        let mut hotspots: Vec<Hotspot> = self.read(|t| {
            t.hotspots
                .values()
                .filter(|h| h.scene_id == scene_id)
                .cloned()
                .collect()
        });
        hotspots.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(hotspots)
    }

    async fn update_hotspot(
        &self,
        scene_id: Uuid,
        hotspot_id: Uuid,
        input: UpdateHotspot,
    ) -> TourResult<Hotspot> {
        self.mutate(move |t| {
            let hotspot = t.hotspot_mut(scene_id, hotspot_id)?;
            if let Some(name) = input.name {
                hotspot.name = name;
            }
            if let Some(yaw) = input.yaw {
                hotspot.yaw = yaw;
            }
            if let Some(pitch) = input.pitch {
                hotspot.pitch = pitch;
            }
            if let Some(kind) = input.kind {
                hotspot.kind = kind;
            }
            if let Some(style) = input.style {
                hotspot.style = style;
            }
            hotspot.updated_at = Utc::now();
            Ok(hotspot.clone())
        })
        .await
    }

    async fn delete_hotspot(&self, scene_id: Uuid, hotspot_id: Uuid) -> TourResult<()> {
        self.mutate(|t| {
            t.hotspot_mut(scene_id, hotspot_id)?;
            t.hotspots.remove(&hotspot_id);
            Ok(())
        })
        .await
    }
}

impl FloorPlanRepository for MemoryStore {
    async fn create_floor_plan(&self, tour_id: Uuid, input: CreateFloorPlan) -> TourResult<FloorPlan> {
        self.mutate(move |t| {
            t.tour(tour_id)?;
            let existing: Vec<&FloorPlan> = t
                .floor_plans
                .values()
                .filter(|fp| fp.tour_id == tour_id)
                .collect();
            let floor = input.floor.unwrap_or_else(|| {
                existing
                    .iter()
                    .map(|fp| fp.floor + 1)
                    .max()
                    .unwrap_or(0)
            });
            let name = input
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Floor {}", existing.len() + 1));
            let now = Utc::now();
            let plan = FloorPlan {
                id: Uuid::new_v4(),
                tour_id,
                name,
                image_url: input.image_url,
                floor,
                width: input.width,
                height: input.height,
                created_at: now,
                updated_at: now,
            };
            t.floor_plans.insert(plan.id, plan.clone());
            Ok(plan)
        })
        .await
    }

    async fn get_floor_plan(&self, tour_id: Uuid, floor_plan_id: Uuid) -> TourResult<FloorPlan> {
        self.read(|t| {
            t.floor_plans
                .get(&floor_plan_id)
                .filter(|fp| fp.tour_id == tour_id)
                .cloned()
        })
        .ok_or_else(|| TourError::not_found("floor plan", floor_plan_id))
    }

    async fn list_floor_plans(&self, tour_id: Uuid) -> TourResult<Vec<FloorPlan>> {
        let mut plans: Vec<FloorPlan> = self.read(|t| {
            t.tour(tour_id)?;
            Ok::<_, TourError>(
                t.floor_plans
                    .values()
                    .filter(|fp| fp.tour_id == tour_id)
                    .cloned()
                    .collect(),
            )
        })?;
        plans.sort_by(|a, b| a.floor.cmp(&b.floor).then(a.created_at.cmp(&b.created_at)));
        Ok(plans)
    }

    async fn update_floor_plan(
        &self,
        tour_id: Uuid,
        floor_plan_id: Uuid,
        input: UpdateFloorPlan,
    ) -> TourResult<FloorPlan> {
        self.mutate(move |t| {
            let plan = t.floor_plan_mut(tour_id, floor_plan_id)?;
            if let Some(name) = input.name {
                plan.name = name;
            }
            if let Some(image_url) = input.image_url {
                plan.image_url = image_url;
            }
            if let Some(floor) = input.floor {
                plan.floor = floor;
            }
            if let Some(width) = input.width {
                plan.width = width;
            }
            if let Some(height) = input.height {
                plan.height = height;
            }
            plan.updated_at = Utc::now();
            Ok(plan.clone())
        })
        .await
    }

    async fn delete_floor_plan(&self, tour_id: Uuid, floor_plan_id: Uuid) -> TourResult<()> {
        self.mutate(|t| {
            t.ensure_floor_plan(tour_id, floor_plan_id)?;
            t.floor_plans.remove(&floor_plan_id);
            for scene in t.scenes.values_mut() {
                if scene
                    .placement
                    .is_some_and(|p| p.floor_plan_id == floor_plan_id)
                {
                    scene.placement = None;
                }
            }
            Ok(())
        })
        .await
    }
}
