mod common;

use common::*;
use futures::executor::block_on;
use kakera_core::compositor::{build_piece_texture, shape_texture};
use kakera_core::{PieceId, PieceLoadError, Rect, ShapeDataError, Vec2};
use kakera_image_pipeline::{MaskError, PIECE_PAD_PX};

#[test]
fn shape_texture_is_bbox_plus_padding() {
    let backend = FakeBackend::default();
    let source = source_image();
    let mut piece = shape_piece("a", 10.0, 20.0);
    piece.shape = Some(vec![
        Vec2::new(10.5, 20.0),
        Vec2::new(150.0, 30.2),
        Vec2::new(90.0, 140.9),
    ]);
    let art = shape_texture(&backend, &piece, Some(&source)).expect("art");
    assert_eq!(art.texture.width, 140 + 2 * PIECE_PAD_PX);
    assert_eq!(art.texture.height, 121 + 2 * PIECE_PAD_PX);
    assert_eq!(art.natural_size, Vec2::new(148.0, 129.0));
    assert!(!art.mirrored);

    let cuts = backend.cuts.borrow();
    let (cut, local) = &cuts[0];
    assert_eq!((cut.origin_x, cut.origin_y), (6, 16));
    assert_eq!(local[0], [4.5, 4.0]);
    assert_eq!(local[1][0], 144.0);
    assert!((local[1][1] - 14.2).abs() < 1e-4);
}

#[test]
fn hit_shape_is_centered_on_texture() {
    let backend = FakeBackend::default();
    let source = source_image();
    let art = shape_texture(&backend, &shape_piece("a", 0.0, 0.0), Some(&source)).expect("art");
    let shape = art.hit_shape.expect("shape");
    assert_eq!(shape[0], Vec2::new(-100.0, -100.0));
    assert_eq!(shape[2], Vec2::new(100.0, 100.0));
}

#[test]
fn degenerate_shape_falls_back_to_prerendered() {
    let backend = FakeBackend::default();
    let source = source_image();
    let mut piece = shape_piece("a", 0.0, 0.0);
    piece.shape = Some(vec![Vec2::new(0.0, 5.0), Vec2::new(9.0, 5.0), Vec2::new(20.0, 5.0)]);
    piece.image = Some("pieces/a.png".to_string());
    piece.bounds = Some(Rect::new(0.0, 0.0, 120.0, 90.0));
    piece.flipped = true;
    let art = block_on(build_piece_texture(&backend, &piece, Some(&source))).expect("art");
    assert_eq!(art.texture.from_image.as_deref(), Some("pieces/a.png"));
    assert_eq!(art.natural_size, Vec2::new(120.0, 90.0));
    assert!(art.mirrored);
    assert!(art.hit_shape.is_none());
}

#[test]
fn prerendered_without_bounds_uses_texture_size() {
    let backend = FakeBackend::default();
    let mut piece = shape_piece("a", 0.0, 0.0);
    piece.shape = None;
    piece.bounds = None;
    piece.image = Some("a.png".to_string());
    let art = block_on(build_piece_texture(&backend, &piece, None)).expect("art");
    assert_eq!(art.natural_size, Vec2::new(64.0, 48.0));
}

#[test]
fn shape_preferred_over_image() {
    let backend = FakeBackend::default();
    let source = source_image();
    let mut piece = shape_piece("a", 0.0, 0.0);
    piece.image = Some("a.png".to_string());
    let art = block_on(build_piece_texture(&backend, &piece, Some(&source))).expect("art");
    assert!(art.texture.from_image.is_none());
    assert_eq!(backend.image_loads.get(), 0);
}

#[test]
fn surface_failure_falls_back() {
    let backend = FakeBackend {
        fail_surfaces: true,
        ..FakeBackend::default()
    };
    let source = source_image();
    let mut piece = shape_piece("a", 0.0, 0.0);
    let err = block_on(build_piece_texture(&backend, &piece, Some(&source))).unwrap_err();
    assert!(matches!(err, PieceLoadError::DrawSurface { .. }));
    piece.image = Some("a.png".to_string());
    assert!(block_on(build_piece_texture(&backend, &piece, Some(&source))).is_ok());
}

#[test]
fn missing_source_image_is_a_shape_error() {
    let backend = FakeBackend::default();
    let piece = shape_piece("a", 0.0, 0.0);
    let err = block_on(build_piece_texture(&backend, &piece, None)).unwrap_err();
    assert_eq!(
        err,
        PieceLoadError::Shape {
            piece: PieceId::from("a"),
            source: ShapeDataError::SourceUnavailable,
        }
    );
}

#[test]
fn too_few_points_reported() {
    let backend = FakeBackend::default();
    let source = source_image();
    let mut piece = shape_piece("a", 0.0, 0.0);
    piece.shape = Some(vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0)]);
    let err = block_on(build_piece_texture(&backend, &piece, Some(&source))).unwrap_err();
    assert_eq!(
        err,
        PieceLoadError::Shape {
            piece: PieceId::from("a"),
            source: ShapeDataError::Mask(MaskError::TooFewPoints(2)),
        }
    );
}

#[test]
fn oversized_shape_falls_back_to_prerendered() {
    let backend = FakeBackend::default();
    let source = source_image();
    let mut piece = shape_piece("a", 0.0, 0.0);
    piece.shape = Some(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(4_294_967_296.0, 0.0),
        Vec2::new(0.0, 10.0),
    ]);
    let err = block_on(build_piece_texture(&backend, &piece, Some(&source))).unwrap_err();
    assert!(matches!(
        err,
        PieceLoadError::Shape {
            source: ShapeDataError::Mask(MaskError::Oversized { .. }),
            ..
        }
    ));
    assert!(backend.cuts.borrow().is_empty());

    piece.image = Some("a.png".to_string());
    let art = block_on(build_piece_texture(&backend, &piece, Some(&source))).expect("art");
    assert_eq!(art.texture.from_image.as_deref(), Some("a.png"));
}

#[test]
fn broken_image_and_no_art() {
    let backend = FakeBackend::default();
    let mut piece = shape_piece("a", 0.0, 0.0);
    piece.shape = None;
    piece.image = Some("missing.png".to_string());
    let err = block_on(build_piece_texture(&backend, &piece, None)).unwrap_err();
    assert!(matches!(err, PieceLoadError::Asset { .. }));
    assert_eq!(err.piece(), &PieceId::from("a"));

    piece.image = Some("  ".to_string());
    let err = block_on(build_piece_texture(&backend, &piece, None)).unwrap_err();
    assert_eq!(err, PieceLoadError::NoArtwork { piece: PieceId::from("a") });
}
