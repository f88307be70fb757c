//! Tour content graph: models, error taxonomy, repositories and the content
//! service shared by the auth service, the authoring tools and the server.

pub mod content;
pub mod error;
pub mod models;
pub mod repository;
pub mod store;

pub use content::{ContentService, PublicTour};
pub use error::{TourError, TourResult};
pub use store::MemoryStore;
