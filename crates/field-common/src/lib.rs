//! Common types shared by the field feature-extraction crates.
//!
//! A [`Raster`] is a decoded 1-4 band numeric grid covering a geographic
//! [`Bounds`]. The [`FieldDecoder`] is resolved once per raster and turns
//! the bands of one pixel into physical values, magnitudes and directions.

pub mod bounds;
pub mod decoder;
pub mod error;
pub mod raster;
pub mod sample;

pub use bounds::{Bounds, LngLat, MAX_MERCATOR_LAT};
pub use decoder::{vector_direction, FieldDecoder};
pub use error::{FieldError, FieldResult};
pub use raster::{
    FieldKind, PixelBands, Raster, RasterData, RasterKind, ScalarGrid, UnscaleRange, MAX_BANDS,
};
pub use sample::{GridSample, Sample};
