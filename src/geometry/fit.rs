use egui::{Rect, Vec2, pos2, vec2};

/// Largest rect with the source aspect ratio that fits inside `target`,
/// centered (CSS `object-fit: contain`).
pub fn contain(source_size: Vec2, target: Rect) -> Rect {
    if source_size.x <= 0.0 || source_size.y <= 0.0 {
        return Rect::from_center_size(target.center(), Vec2::ZERO);
    }
    let source_ratio = source_size.x / source_size.y;
    let target_ratio = target.width() / target.height();

    let size = if source_ratio > target_ratio {
        vec2(target.width(), target.width() / source_ratio)
    } else {
        vec2(target.height() * source_ratio, target.height())
    };
    Rect::from_center_size(target.center(), size)
}

/// Smallest rect with the source aspect ratio that covers `target`,
/// centered; the overflow is meant to be clipped (CSS `object-fit: cover`).
pub fn cover(source_size: Vec2, target: Rect) -> Rect {
    if source_size.x <= 0.0 || source_size.y <= 0.0 {
        return target;
    }
    let source_ratio = source_size.x / source_size.y;
    let target_ratio = target.width() / target.height();

    if source_ratio > target_ratio {
        let scale = target.height() / source_size.y;
        let width = source_size.x * scale;
        Rect::from_min_size(
            pos2(target.min.x + (target.width() - width) / 2.0, target.min.y),
            vec2(width, target.height()),
        )
    } else {
        let scale = target.width() / source_size.x;
        let height = source_size.y * scale;
        Rect::from_min_size(
            pos2(target.min.x, target.min.y + (target.height() - height) / 2.0),
            vec2(target.width(), height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f32) -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(size, size))
    }

    #[test]
    fn contain_wide_image_fills_width() {
        let r = contain(vec2(200.0, 100.0), square(120.0));
        assert_eq!(r.width(), 120.0);
        assert_eq!(r.height(), 60.0);
        assert_eq!(r.min.y, 30.0);
    }

    #[test]
    fn contain_tall_image_fills_height() {
        let r = contain(vec2(50.0, 100.0), square(120.0));
        assert_eq!(r.height(), 120.0);
        assert_eq!(r.width(), 60.0);
        assert_eq!(r.min.x, 30.0);
    }

    #[test]
    fn cover_crops_the_long_side() {
        let target = Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 300.0));
        let r = cover(vec2(100.0, 100.0), target);
        assert_eq!(r.width(), 400.0);
        assert_eq!(r.height(), 400.0);
        assert_eq!(r.min.y, -50.0);
    }
}
