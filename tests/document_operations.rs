use std::collections::HashSet;

use collage_canvas::command::{Command, CommandOutcome};
use collage_canvas::layer::{ImageSource, LayerId, TextContent};
use collage_canvas::{Document, InputError};
use egui::{Vec2, vec2};

fn paint_ids(doc: &Document) -> Vec<LayerId> {
    doc.paint_order().iter().map(|layer| layer.id).collect()
}

#[test]
fn test_layer_ids_are_unique() {
    let mut doc = Document::new();
    for i in 0..100 {
        if i % 2 == 0 {
            doc.add_image_layer(format!("{i}.png"), ImageSource::App, Vec2::ZERO);
        } else {
            doc.add_text_layer(TextContent::default(), Vec2::ZERO);
        }
    }
    let ids: HashSet<LayerId> = doc.layers().iter().map(|layer| layer.id).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn test_new_layers_stack_on_top() {
    let mut doc = Document::new();
    let a = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
    let b = doc.add_text_layer(TextContent::default(), vec2(5.0, 5.0));
    assert_eq!(doc.layer(a).unwrap().order, 1);
    assert_eq!(doc.layer(b).unwrap().order, 2);
    assert_eq!(paint_ids(&doc), vec![a, b]);
}

#[test]
fn test_bring_to_front_paints_last() {
    let mut doc = Document::new();
    let a = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
    let b = doc.add_image_layer("b.png", ImageSource::App, Vec2::ZERO);
    let c = doc.add_image_layer("c.png", ImageSource::App, Vec2::ZERO);

    doc.bring_to_front(a);
    assert_eq!(paint_ids(&doc), vec![b, c, a]);
    assert_eq!(doc.layer(a).unwrap().order, 4);
}

#[test]
fn test_send_to_back_ties_with_the_first_layer() {
    let mut doc = Document::new();
    let a = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
    let b = doc.add_image_layer("b.png", ImageSource::App, Vec2::ZERO);
    let c = doc.add_image_layer("c.png", ImageSource::App, Vec2::ZERO);

    doc.send_to_back(c);

    // c now shares order 1 with a; insertion order breaks the tie.
    assert_eq!(doc.layer(c).unwrap().order, 1);
    assert_eq!(doc.layer(a).unwrap().order, 1);
    assert_eq!(paint_ids(&doc), vec![a, c, b]);
}

#[test]
fn test_commands_drive_the_document() {
    let mut doc = Document::new();
    let CommandOutcome::Added(image) = Command::AddImageLayer {
        src: "a.png".into(),
        source: ImageSource::Device,
    }
    .execute(&mut doc)
    .unwrap() else {
        panic!("expected a new layer");
    };

    Command::SelectLayer(Some(image)).execute(&mut doc).unwrap();
    Command::SetScale(1.5).execute(&mut doc).unwrap();
    Command::SetRotation(-45.0).execute(&mut doc).unwrap();

    let transform = doc.layer(image).unwrap().transform;
    assert_eq!(transform.scale, 1.5);
    assert_eq!(transform.rotation, -45.0);

    assert_eq!(
        Command::SetFontFamily("serif".into()).execute(&mut doc),
        Err(InputError::NotATextLayer)
    );

    Command::DeleteSelected.execute(&mut doc).unwrap();
    assert!(doc.layers().is_empty());
    assert_eq!(doc.selected_layer_id(), None);
}

#[test]
fn test_background_is_replaced_and_cleared() {
    let mut doc = Document::new();
    assert!(!doc.has_content());

    Command::SetBackground(Some("beach.jpg".into())).execute(&mut doc).unwrap();
    Command::SetBackground(Some("forest.jpg".into())).execute(&mut doc).unwrap();
    assert_eq!(doc.background().unwrap().src, "forest.jpg");
    assert!(doc.has_content());

    Command::Clear.execute(&mut doc).unwrap();
    assert!(doc.background().is_none());
    assert!(!doc.has_content());
}
