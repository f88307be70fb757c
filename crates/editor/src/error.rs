use thiserror::Error;

/// Failure surfaced to the operator by the placement tool.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("no scene is loaded")]
    NoScene,

    #[error("hotspot could not be saved: {0}")]
    CreateFailed(String),
}
