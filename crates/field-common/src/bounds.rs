//! Geographic bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic position as `[lng, lat]` in degrees.
pub type LngLat = [f64; 2];

/// Latitude limit of the Web Mercator projection.
pub const MAX_MERCATOR_LAT: f64 = 85.051129;

/// An axis-aligned geographic bounding box in degrees.
///
/// The box is tied 1:1 to a raster's pixel grid: the top-left corner of
/// pixel (0, 0) is `(min_lng, max_lat)`. `max_lng` may exceed 180 for boxes
/// crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// The whole globe, `[-180, -90, 180, 90]`.
    pub fn global() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Parse a comma separated "minLng,minLat,maxLng,maxLat" string.
    pub fn parse(s: &str) -> Result<Self, BoundsParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BoundsParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BoundsParseError::InvalidNumber(part.to_string()))?;
        }

        Ok(Self::from(values))
    }

    /// Width of the box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    /// Height of the box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// True when the box spans exactly the full longitude range [-180, 180].
    ///
    /// Contour tracing buffers such grids as a cylinder.
    pub fn is_global(&self) -> bool {
        self.min_lng == -180.0 && self.max_lng == 180.0
    }

    /// Check if this box intersects another.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_lng < other.max_lng
            && self.max_lng > other.min_lng
            && self.min_lat < other.max_lat
            && self.max_lat > other.min_lat
    }

    /// Check if a position is contained within this box (edges inclusive).
    pub fn contains(&self, position: LngLat) -> bool {
        let [lng, lat] = position;
        lng >= self.min_lng && lng <= self.max_lng && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Box shifted by `dx` degrees of longitude.
    pub fn shifted(&self, dx: f64) -> Bounds {
        Bounds::new(self.min_lng + dx, self.min_lat, self.max_lng + dx, self.max_lat)
    }

    /// Center position of the box.
    pub fn center(&self) -> LngLat {
        [
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        ]
    }

    /// The box as `[minLng, minLat, maxLng, maxLat]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }

    /// Generate a cache key fragment for this box (quantized to avoid floating point issues).
    pub fn cache_key(&self) -> String {
        format!(
            "{:.6}_{:.6}_{:.6}_{:.6}",
            self.min_lng, self.min_lat, self.max_lng, self.max_lat
        )
    }
}

impl From<[f64; 4]> for Bounds {
    fn from(b: [f64; 4]) -> Self {
        Bounds::new(b[0], b[1], b[2], b[3])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BoundsParseError {
    #[error("Invalid bounds format: {0}. Expected 'minLng,minLat,maxLng,maxLat'")]
    InvalidFormat(String),

    #[error("Invalid number in bounds: {0}")]
    InvalidNumber(String),
}
