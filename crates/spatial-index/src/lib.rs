//! Spatial queries over geographic point sets.
//!
//! [`SpatialIndex`] answers planar bounding-box queries and geodesic radius
//! queries. [`DeclutterCache`] removes near-duplicate points per zoom level
//! while keeping every point that was visible at a coarser zoom.

pub mod declutter;
pub mod index;

pub use declutter::{collection_key, DeclutterCache, DeclutterConfig, DeclutterMode, DeclutterStats};
pub use index::SpatialIndex;
