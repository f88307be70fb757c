//! Public panorama viewer: scene navigation, hotspot activation and guided
//! playback over a loaded tour.

pub mod event_bus;
pub mod state;

pub use event_bus::{EventBus, ViewerEvent, ViewerEventKind};
pub use state::{AudioPlayback, InfoModal, ViewerAction, ViewerMarker, ViewerState};
