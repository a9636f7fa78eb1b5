//! Label anchors along contour lines.

use crate::config::LabelPlacement;
use crate::contour::ContourFeature;
use field_common::LngLat;
use projection::initial_bearing;
use serde::{Deserialize, Serialize};

/// Anchor for one contour label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourLabel {
    pub position: LngLat,
    /// Text rotation in degrees, counter-clockwise from east, in `[-90, 90]`.
    pub angle: f64,
    /// Threshold value of the labelled line.
    pub value: f64,
}

/// Text rotation for a line heading (degrees clockwise from north).
///
/// Headings past 180° are flipped by half a turn so text never renders
/// upside down.
pub fn label_angle(heading: f64) -> f64 {
    let angle = 90.0 - heading;
    if heading > 180.0 {
        angle + 180.0
    } else {
        angle
    }
}

/// Walk every line at the placement cadence and emit label anchors.
///
/// Distances are measured in coordinate units along the line. The first
/// anchor sits at `offset * repeat`, then one every `repeat`, and none
/// within `end_offset * repeat` of the line end.
pub fn contour_labels(features: &[ContourFeature], placement: &LabelPlacement) -> Vec<ContourLabel> {
    let mut labels = Vec::new();
    if !(placement.repeat > 0.0) {
        return labels;
    }

    for feature in features {
        let coords = &feature.coordinates;
        let total: f64 = coords.windows(2).map(|w| planar_length(w[0], w[1])).sum();
        let stop = total - placement.end_offset * placement.repeat;
        let mut next = placement.offset * placement.repeat;
        let mut walked = 0.0;

        for w in coords.windows(2) {
            if next > stop {
                break;
            }
            let seg = planar_length(w[0], w[1]);
            if seg <= 0.0 {
                continue;
            }

            while next <= walked + seg && next <= stop {
                let t = (next - walked) / seg;
                let position = [
                    w[0][0] + t * (w[1][0] - w[0][0]),
                    w[0][1] + t * (w[1][1] - w[0][1]),
                ];
                labels.push(ContourLabel {
                    position,
                    angle: label_angle(initial_bearing(w[0], w[1])),
                    value: feature.value,
                });
                next += placement.repeat;
            }
            walked += seg;
        }
    }

    labels
}

fn planar_length(a: LngLat, b: LngLat) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}
