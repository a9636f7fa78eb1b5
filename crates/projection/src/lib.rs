//! Coordinate transformations for gridded fields.
//!
//! Implements the spherical and planar math from scratch without external
//! dependencies:
//!
//! - [`geodesy`]: great-circle distance, destination point and bearing
//! - [`transform`]: affine pixel <-> geographic mapping for a raster grid
//! - [`wrap`]: longitude wrapping and bounds clipping
//! - [`mercator`]: Web Mercator world-pixel coordinates at a zoom level

pub mod geodesy;
pub mod mercator;
pub mod transform;
pub mod wrap;

pub use geodesy::{destination_point, distance, initial_bearing, EARTH_RADIUS_M};
pub use transform::{project, unproject, GridTransform};
pub use wrap::{clip_bounds, wrap_bounds, wrap_longitude};
