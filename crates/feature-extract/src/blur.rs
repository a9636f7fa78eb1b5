//! 3x3 box blur applied before contour tracing and extremum scanning.

use field_common::ScalarGrid;

/// Average each interior cell with its 8 neighbours.
///
/// Border cells pass through unchanged. A NaN anywhere in the 3x3 window
/// makes the output NaN.
pub fn box_blur(grid: &ScalarGrid) -> ScalarGrid {
    let (width, height) = (grid.width, grid.height);
    let mut data = grid.data.clone();
    if width < 3 || height < 3 {
        return ScalarGrid {
            width,
            height,
            data,
        };
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sum = 0.0;
            for row in y - 1..=y + 1 {
                let start = row * width + x - 1;
                sum += grid.data[start..start + 3].iter().sum::<f64>();
            }
            data[y * width + x] = sum / 9.0;
        }
    }

    ScalarGrid {
        width,
        height,
        data,
    }
}
