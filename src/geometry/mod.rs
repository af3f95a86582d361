//! Coordinate math shared by the live renderer and the export rasterizer.
//!
//! Layer placements are [`kurbo::Affine`]s in canvas points. The renderer,
//! hit testing and the export all map through the same
//! [`Layer::local_to_canvas`](crate::layer::Layer::local_to_canvas), which is
//! what keeps preview and export in agreement. The helpers below bridge to
//! egui's `f32` types.

pub mod fit;
pub mod hit_testing;

use egui::{Pos2, Rect, Vec2, pos2};
pub use kurbo::Affine;

pub fn to_point(p: Pos2) -> kurbo::Point {
    kurbo::Point::new(f64::from(p.x), f64::from(p.y))
}

pub fn to_pos2(p: kurbo::Point) -> Pos2 {
    pos2(p.x as f32, p.y as f32)
}

pub fn to_kurbo_vec(v: Vec2) -> kurbo::Vec2 {
    kurbo::Vec2::new(f64::from(v.x), f64::from(v.y))
}

pub fn map_point(affine: &Affine, p: Pos2) -> Pos2 {
    to_pos2(*affine * to_point(p))
}

/// The four corners of `rect` mapped through `affine`, clockwise starting at
/// the top-left.
pub fn map_rect_corners(affine: &Affine, rect: Rect) -> [Pos2; 4] {
    [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()].map(|p| map_point(affine, p))
}

/// Maps the pixel grid of a `size` bitmap onto `dest`.
pub fn stretch(size: Vec2, dest: Rect) -> Affine {
    Affine::translate(to_kurbo_vec(dest.min.to_vec2()))
        * Affine::scale_non_uniform(
            f64::from(dest.width()) / f64::from(size.x),
            f64::from(dest.height()) / f64::from(size.y),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    fn assert_close(a: Pos2, b: Pos2) {
        assert!((a - b).length() < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn rotation_is_clockwise_on_screen() {
        let p = map_point(&Affine::rotate(90f64.to_radians()), pos2(1.0, 0.0));
        assert_close(p, pos2(0.0, 1.0));
    }

    #[test]
    fn corners_run_clockwise_from_top_left() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(4.0, 2.0));
        let corners = map_rect_corners(&Affine::translate((10.0, 0.0)), rect);
        assert_eq!(corners, [pos2(10.0, 0.0), pos2(14.0, 0.0), pos2(14.0, 2.0), pos2(10.0, 2.0)]);
    }

    #[test]
    fn stretch_lands_bitmap_corners_on_dest() {
        let dest = Rect::from_min_size(pos2(0.0, 30.0), vec2(120.0, 60.0));
        let to_dest = stretch(vec2(60.0, 30.0), dest);
        assert_close(map_point(&to_dest, pos2(0.0, 0.0)), pos2(0.0, 30.0));
        assert_close(map_point(&to_dest, pos2(60.0, 30.0)), pos2(120.0, 90.0));
    }
}
