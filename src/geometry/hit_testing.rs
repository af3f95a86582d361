use egui::{Pos2, Rect};

use super::{Affine, to_point, to_pos2};

/// Extra slop around small elements so they stay grabbable on touch screens.
pub const HIT_PADDING: f32 = 4.0;

/// Whether `point` (in the transform's output space) lands on `local_rect`
/// after it has been mapped through `to_screen`.
///
/// The point is pulled back into the element's local space instead of
/// testing the rotated quad, so rotation and scale need no special casing.
pub fn hits_transformed_rect(point: Pos2, local_rect: Rect, to_screen: &Affine) -> bool {
    let det = to_screen.determinant();
    if !det.is_finite() || det.abs() < f64::EPSILON {
        return false;
    }
    let local = to_pos2(to_screen.inverse() * to_point(point));
    local_rect.expand(HIT_PADDING).contains(local)
}
