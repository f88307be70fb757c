//! Authoring tools for the tour editor.

pub mod error;
pub mod placement;
pub mod sink;

pub use error::PlacementError;
pub use placement::{
    Marker, PlacementOutcome, PlacementRequest, PlacementTicket, PlacementTool, ToolState,
};
pub use sink::{ContentSink, HotspotSink};
