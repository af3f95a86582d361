use collage_canvas::assets::{MemoryAssetLoader, decode_data_url_bitmap};
use collage_canvas::export::{ExportOptions, capture_collage_as_png, rasterize};
use collage_canvas::layer::ImageSource;
use collage_canvas::matting::matte;
use collage_canvas::renderer::project;
use collage_canvas::Document;
use egui::{Pos2, Vec2, pos2, vec2};
use futures::executor::block_on;
use image::{Rgba, RgbaImage};

const FALLBACK: Rgba<u8> = Rgba([0xf5, 0xe6, 0xff, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

fn near(a: &Rgba<u8>, b: Rgba<u8>) -> bool {
    a.0.iter().zip(b.0).all(|(x, y)| x.abs_diff(y) <= 2)
}

fn assert_pixel(out: &RgbaImage, p: Pos2, expected: Rgba<u8>) {
    let (x, y) = (p.x.floor() as u32, p.y.floor() as u32);
    let actual = out.get_pixel(x, y);
    assert!(near(actual, expected), "pixel ({x}, {y}) is {actual:?}, expected {expected:?}");
}

/// 40x40 bitmap: red top-left, green top-right, blue bottom-left, yellow
/// bottom-right.
fn quadrants() -> RgbaImage {
    RgbaImage::from_fn(40, 40, |x, y| match (x < 20, y < 20) {
        (true, true) => RED,
        (false, true) => GREEN,
        (true, false) => BLUE,
        (false, false) => YELLOW,
    })
}

/// Exports a single quadrant layer and checks it against the box the live
/// renderer projects for it: each projected corner must carry the color of
/// the bitmap corner it came from, and just outside it the fill shows.
fn export_matches_projection(position: Vec2, scale: f32, rotation: f32, size: u32) -> (RgbaImage, [Pos2; 4]) {
    let loader = MemoryAssetLoader::new().with_image("quad.png", quadrants());
    let mut doc = Document::new();
    let id = doc.add_image_layer("quad.png", ImageSource::App, position);
    let layer = doc.layer_mut(id).unwrap();
    layer.set_scale(scale);
    layer.set_rotation(rotation);

    let corners = project(&doc, |_| Vec2::ZERO)[0].corners();
    let out = block_on(rasterize(&doc, &loader, &ExportOptions::new(size, size))).unwrap();

    let center = pos2(
        corners.iter().map(|c| c.x).sum::<f32>() / 4.0,
        corners.iter().map(|c| c.y).sum::<f32>() / 4.0,
    );
    for (corner, color) in corners.into_iter().zip([RED, GREEN, YELLOW, BLUE]) {
        let toward_center = center - corner;
        assert_pixel(&out, corner + toward_center * 0.15, color);
        assert_pixel(&out, corner + toward_center * 0.5, color);
        assert_pixel(&out, corner - toward_center * 0.1, FALLBACK);
    }
    (out, corners)
}

#[test]
fn test_empty_export_is_the_fallback_color() {
    let out = block_on(rasterize(&Document::new(), &MemoryAssetLoader::new(), &ExportOptions::new(64, 48))).unwrap();
    assert_eq!(out.dimensions(), (64, 48));
    assert!(out.pixels().all(|p| near(p, FALLBACK)));
}

#[test]
fn test_wide_image_is_contained_and_centered() {
    let loader = MemoryAssetLoader::new().with_image("wide.png", RgbaImage::from_pixel(60, 30, RED));
    let mut doc = Document::new();
    doc.add_image_layer("wide.png", ImageSource::App, Vec2::ZERO);

    let out = block_on(rasterize(&doc, &loader, &ExportOptions::new(120, 120))).unwrap();

    // 60x30 contained in the 120 box is 120x60, centered: rows 30..90.
    assert!(near(out.get_pixel(60, 60), RED));
    assert!(near(out.get_pixel(5, 35), RED));
    assert!(near(out.get_pixel(115, 85), RED));
    assert!(near(out.get_pixel(60, 10), FALLBACK));
    assert!(near(out.get_pixel(60, 110), FALLBACK));
}

#[test]
fn test_unrotated_layer_lands_pixel_for_pixel() {
    let (out, corners) = export_matches_projection(vec2(40.0, 40.0), 1.0, 0.0, 200);
    assert_eq!(corners, [pos2(40.0, 40.0), pos2(160.0, 40.0), pos2(160.0, 160.0), pos2(40.0, 160.0)]);

    // Each source texel covers 3x3 pixels. Skip the blended seams.
    let seam = |v: u32| (37..=43).contains(&v) || (97..=103).contains(&v) || (157..=163).contains(&v);
    for y in 0..200 {
        for x in 0..200 {
            if seam(x) || seam(y) {
                continue;
            }
            let inside = (40..160).contains(&x) && (40..160).contains(&y);
            let expected = match (inside, x < 100, y < 100) {
                (false, _, _) => FALLBACK,
                (true, true, true) => RED,
                (true, false, true) => GREEN,
                (true, true, false) => BLUE,
                (true, false, false) => YELLOW,
            };
            let actual = out.get_pixel(x, y);
            assert!(near(actual, expected), "pixel ({x}, {y}) is {actual:?}, expected {expected:?}");
        }
    }
}

#[test]
fn test_rotated_and_scaled_layer_follows_the_projected_box() {
    let (out, corners) = export_matches_projection(vec2(90.0, 90.0), 2.0, 90.0, 300);

    // The box is 240 wide around (150, 150); a quarter turn clockwise puts
    // the red top-left corner at the top right.
    let close = |a: Pos2, b: Pos2| (a - b).length() < 1e-3;
    assert!(close(corners[0], pos2(270.0, 30.0)), "{corners:?}");
    assert!(close(corners[2], pos2(30.0, 270.0)), "{corners:?}");
    assert!(near(out.get_pixel(240, 60), RED));
    assert!(near(out.get_pixel(60, 240), YELLOW));
    assert!(near(out.get_pixel(240, 240), GREEN));
    assert!(near(out.get_pixel(60, 60), BLUE));
}

#[test]
fn test_odd_rotation_keeps_orientation() {
    export_matches_projection(vec2(90.0, 90.0), 1.5, -30.0, 300);
}

#[test]
fn test_capture_encodes_the_rasterized_canvas() {
    let loader = MemoryAssetLoader::new().with_image("quad.png", quadrants());
    let mut doc = Document::new();
    doc.add_image_layer("quad.png", ImageSource::Device, Vec2::ZERO);

    let url = block_on(capture_collage_as_png(&doc, &loader, &ExportOptions::new(200, 150))).unwrap();
    let decoded = decode_data_url_bitmap(&url).unwrap();
    assert_eq!(decoded.dimensions(), (200, 150));
    assert!(near(decoded.get_pixel(30, 30), RED));
    assert!(near(decoded.get_pixel(90, 30), GREEN));
    assert!(near(decoded.get_pixel(30, 90), BLUE));
    assert!(near(decoded.get_pixel(90, 90), YELLOW));
    assert!(near(decoded.get_pixel(180, 140), FALLBACK));
}

#[test]
fn test_matting_a_uniform_square_clears_everything() {
    let out = matte(&RgbaImage::from_pixel(16, 16, Rgba([30, 140, 200, 255])));
    assert!(out.pixels().all(|p| p[3] == 0));
}

#[test]
fn test_matting_keeps_a_contrasting_disc() {
    let size = 41;
    let center = 20.0;
    let img = RgbaImage::from_fn(size, size, |x, y| {
        let d = ((x as f32 - center).powi(2) + (y as f32 - center).powi(2)).sqrt();
        if d <= 12.0 { Rgba([200, 20, 20, 255]) } else { Rgba([250, 250, 250, 255]) }
    });

    let out = matte(&img);
    assert_eq!(out.get_pixel(20, 20)[3], 255);
    assert_eq!(out.get_pixel(20, 9)[3], 255);
    assert_eq!(out.get_pixel(0, 0)[3], 0);
    assert_eq!(out.get_pixel(40, 20)[3], 0);
}
