//! Domain models for the tour content graph and its operators.
//!
//! Wire and snapshot formats use camelCase field names.

pub mod floor_plan;
pub mod hotspot;
pub mod invite;
pub mod scene;
pub mod session;
pub mod tour;
pub mod user;

use serde::{Deserialize, Deserializer};

/// For `Option<Option<T>>` patch fields: absent stays `None` (with
/// `#[serde(default)]`), `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
