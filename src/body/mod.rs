//! Body hierarchy module
//!
//! Star, planets and moons built from the static catalog into an arena
//! addressed by generational handles.

pub mod catalog;
pub mod hierarchy;
pub mod info;
pub mod model;
pub mod scale;

pub use catalog::{Catalog, CatalogError, InvalidParameter};
pub use hierarchy::{BodyHierarchy, BodyTransform, Diagnostics, TickReport};
pub use info::{BodyInfo, SystemSnapshot};
pub use model::{Body, BodyId, BodyKind, BodyUpdateError};
