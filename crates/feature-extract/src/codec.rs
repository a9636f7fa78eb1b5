//! Flat `f64` buffers for moving results across the worker boundary.
//!
//! Contours: `[count, (value, n, lng0, lat0, .. lng(n-1), lat(n-1))*]`.
//! Extrema: `[count, (lng, lat, kind, value)*]` with kind `1` for a high
//! and `-1` for a low.

use crate::contour::ContourFeature;
use crate::extremum::{Extremum, ExtremumKind};
use field_common::{FieldError, FieldResult};

pub fn encode_contours(features: &[ContourFeature]) -> Vec<f64> {
    let len = 1 + features
        .iter()
        .map(|f| 2 + 2 * f.coordinates.len())
        .sum::<usize>();
    let mut buffer = Vec::with_capacity(len);
    buffer.push(features.len() as f64);
    for feature in features {
        buffer.push(feature.value);
        buffer.push(feature.coordinates.len() as f64);
        for c in &feature.coordinates {
            buffer.extend_from_slice(c);
        }
    }
    buffer
}

pub fn decode_contours(buffer: &[f64]) -> FieldResult<Vec<ContourFeature>> {
    let mut reader = Reader::new(buffer);
    let count = reader.count()?;
    let mut features = Vec::with_capacity(count.min(buffer.len()));
    for _ in 0..count {
        let value = reader.read()?;
        let n = reader.count()?;
        let mut coordinates = Vec::with_capacity(n.min(buffer.len()));
        for _ in 0..n {
            coordinates.push([reader.read()?, reader.read()?]);
        }
        features.push(ContourFeature { coordinates, value });
    }
    reader.finish()?;
    Ok(features)
}

pub fn encode_extrema(points: &[Extremum]) -> Vec<f64> {
    let mut buffer = Vec::with_capacity(1 + 4 * points.len());
    buffer.push(points.len() as f64);
    for p in points {
        buffer.extend_from_slice(&[
            p.position[0],
            p.position[1],
            match p.kind {
                ExtremumKind::High => 1.0,
                ExtremumKind::Low => -1.0,
            },
            p.value,
        ]);
    }
    buffer
}

pub fn decode_extrema(buffer: &[f64]) -> FieldResult<Vec<Extremum>> {
    let mut reader = Reader::new(buffer);
    let count = reader.count()?;
    let mut points = Vec::with_capacity(count.min(buffer.len()));
    for _ in 0..count {
        let position = [reader.read()?, reader.read()?];
        let kind = match reader.read()? {
            k if k == 1.0 => ExtremumKind::High,
            k if k == -1.0 => ExtremumKind::Low,
            k => {
                return Err(FieldError::MalformedBuffer(format!(
                    "unknown extremum kind {}",
                    k
                )))
            }
        };
        points.push(Extremum {
            position,
            kind,
            value: reader.read()?,
        });
    }
    reader.finish()?;
    Ok(points)
}

struct Reader<'a> {
    buffer: &'a [f64],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buffer: &'a [f64]) -> Self {
        Self { buffer, pos: 0 }
    }

    fn read(&mut self) -> FieldResult<f64> {
        let value = self.buffer.get(self.pos).copied().ok_or_else(|| {
            FieldError::MalformedBuffer(format!("truncated at offset {}", self.pos))
        })?;
        self.pos += 1;
        Ok(value)
    }

    fn count(&mut self) -> FieldResult<usize> {
        let value = self.read()?;
        if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
            return Err(FieldError::MalformedBuffer(format!(
                "invalid count {} at offset {}",
                value,
                self.pos - 1
            )));
        }
        Ok(value as usize)
    }

    fn finish(&self) -> FieldResult<()> {
        if self.pos != self.buffer.len() {
            return Err(FieldError::MalformedBuffer(format!(
                "{} trailing values",
                self.buffer.len() - self.pos
            )));
        }
        Ok(())
    }
}
