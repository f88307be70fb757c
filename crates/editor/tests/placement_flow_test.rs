//! Placement against the content service.

use editor::{ContentSink, PlacementError, PlacementOutcome, PlacementTool};
use foundation::{Vec2, ViewPoint};
use tour::models::hotspot::HotspotKind;
use tour::models::scene::CreateScene;
use tour::models::tour::CreateTour;
use tour::{ContentService, MemoryStore};
use uuid::Uuid;

async fn two_scene_tour(svc: &ContentService<MemoryStore>) -> (Uuid, Vec<tour::models::scene::Scene>) {
    let tour = svc
        .create_tour(CreateTour {
            name: "Studio".into(),
            created_by: Uuid::new_v4(),
            ..CreateTour::default()
        })
        .await
        .unwrap();
    let mut scenes = Vec::new();
    for name in ["Entrance", "Kitchen"] {
        scenes.push(
            svc.create_scene(
                tour.id,
                CreateScene {
                    name: name.into(),
                    panorama_url: format!("/uploads/panoramas/{name}.jpg"),
                    ..CreateScene::default()
                },
            )
            .await
            .unwrap(),
        );
    }
    (tour.id, scenes)
}

#[tokio::test]
async fn placed_hotspot_is_persisted_then_shown() {
    let svc = ContentService::new(MemoryStore::new());
    let (tour_id, scenes) = two_scene_tour(&svc).await;
    let sink = ContentSink::new(&svc, tour_id);

    let mut tool = PlacementTool::default();
    tool.reset_scene(&scenes[0], Vec::new());

    // Aim 20 degrees to the left, then drop a door at the right edge.
    tool.pointer_down(Vec2::new(0.0, 0.0));
    tool.pointer_move(Vec2::new(100.0, 0.0));
    tool.pointer_up();
    tool.begin_placement(HotspotKind::Navigation {
        target_scene_id: scenes[1].id,
    });

    let outcome = tool.place(ViewPoint::new(1.0, 0.5), &sink).await.unwrap();
    let PlacementOutcome::Added(hotspot) = outcome else {
        panic!("expected hotspot to be added, got {outcome:?}");
    };
    assert_eq!(hotspot.name, "Go to 1");
    assert!((hotspot.yaw - 40.0).abs() < 1e-9);

    let stored = svc.list_hotspots(tour_id, scenes[0].id).await.unwrap();
    assert_eq!(stored, vec![hotspot.clone()]);
    assert_eq!(tool.markers(1000.0, 500.0).len(), 1);
}

#[tokio::test]
async fn rejected_placement_leaves_no_phantom() {
    let svc = ContentService::new(MemoryStore::new());
    let (tour_id, scenes) = two_scene_tour(&svc).await;
    let sink = ContentSink::new(&svc, tour_id);

    let mut tool = PlacementTool::default();
    tool.reset_scene(&scenes[0], Vec::new());
    tool.begin_placement(HotspotKind::Navigation {
        target_scene_id: Uuid::new_v4(),
    });

    let outcome = tool.place(ViewPoint::CENTER, &sink).await.unwrap();
    assert!(matches!(outcome, PlacementOutcome::Failed(_)));
    assert!(matches!(
        tool.last_error(),
        Some(PlacementError::CreateFailed(_))
    ));
    assert!(tool.hotspots().is_empty());
    assert!(svc.list_hotspots(tour_id, scenes[0].id).await.unwrap().is_empty());

    // Not placing any more: a second click does nothing.
    assert!(tool.place(ViewPoint::CENTER, &sink).await.is_none());
}
