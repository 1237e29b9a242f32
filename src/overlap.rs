//! Overlap detection between apertures sharing a detector
//!
//! Spectra run along y, so two apertures on the same detector collide whenever
//! their x intervals intersect. The earlier shape in the list always wins.

use crate::shape::{Shape, ShapeState};

/// Which detector a y coordinate falls on, relative to the split line
fn on_lower_detector(y: f64, split_y: f64) -> bool {
    y < split_y
}

/// Re-run exclusion from scratch and return how many shapes were excluded
///
/// Every excluded shape is first made active again. Deleted shapes never take
/// part. For each pair `i < j` on the same side of `split_y` whose closed x
/// intervals intersect, shape `j` is excluded.
pub fn exclude_overlaps(shapes: &mut [Shape], split_y: f64) -> usize {
    for shape in shapes.iter_mut() {
        if shape.state == ShapeState::Excluded {
            shape.state = ShapeState::Active;
        }
    }

    let mut excluded = 0;
    for i in 0..shapes.len() {
        if !shapes[i].is_active() {
            continue;
        }
        let (min1, max1) = shapes[i].x_bounds();
        let lower = on_lower_detector(shapes[i].y(), split_y);

        for j in i + 1..shapes.len() {
            let other = &shapes[j];
            if !other.is_active() || on_lower_detector(other.y(), split_y) != lower {
                continue;
            }
            let (min2, max2) = other.x_bounds();
            if max1 >= min2 && max2 >= min1 {
                shapes[j].state = ShapeState::Excluded;
                excluded += 1;
            }
        }
    }
    excluded
}
