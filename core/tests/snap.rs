use kakera_core::snap::{try_snap, SnapCriteria, SnapTimings};
use kakera_core::tween::{Animator, TweenProperty};
use kakera_core::{PieceId, RuntimePiece, Vec2};

fn criteria(rotation_enabled: bool) -> SnapCriteria {
    SnapCriteria {
        board_origin: Vec2::new(10.0, 10.0),
        board_scale: 2.0,
        position_threshold_px: 5.0,
        rotation_enabled,
        rotation_tolerance_deg: 10.0,
    }
}

fn timings() -> SnapTimings {
    SnapTimings {
        snap_ms: 180.0,
        return_ms: 260.0,
        flash_ms: 420.0,
    }
}

fn piece_at(position: Vec2, rotation: f32) -> RuntimePiece<()> {
    RuntimePiece {
        id: PieceId::from("p"),
        texture: (),
        natural_size: Vec2::new(50.0, 50.0),
        hit_shape: None,
        position,
        rotation,
        scale: 0.4,
        in_board_zone: true,
        snapped: false,
        home: Vec2::new(700.0, 300.0),
        flash: 0.0,
        mirrored: false,
        correct_position: Vec2::new(50.0, 50.0),
        correct_rotation: 0.0,
    }
}

#[test]
fn target_maps_board_pixels_to_stage() {
    assert_eq!(criteria(false).target_position(Vec2::new(50.0, 50.0)), Vec2::new(110.0, 110.0));
}

#[test]
fn threshold_is_strict() {
    let criteria = criteria(false);
    let correct = Vec2::new(50.0, 50.0);
    assert!(!criteria.evaluate(Vec2::new(115.0, 110.0), 0.0, correct, 0.0));
    assert!(criteria.evaluate(Vec2::new(114.99, 110.0), 0.0, correct, 0.0));
    assert!(criteria.evaluate(Vec2::new(110.0, 110.0), 173.0, correct, 0.0));
}

#[test]
fn rotation_tolerance_is_strict_and_wraps() {
    let criteria = criteria(true);
    let correct = Vec2::new(50.0, 50.0);
    let at = Vec2::new(110.0, 110.0);
    assert!(!criteria.evaluate(at, 10.0, correct, 0.0));
    assert!(!criteria.evaluate(at, 350.0, correct, 0.0));
    assert!(criteria.evaluate(at, 9.9, correct, 0.0));
    assert!(criteria.evaluate(at, 4.0, correct, 355.0));
}

#[test]
fn success_marks_snapped_and_tweens_to_target() {
    let mut animator = Animator::new();
    let mut piece = piece_at(Vec2::new(112.0, 109.0), 6.0);
    assert!(try_snap(&mut piece, &criteria(true), 0.4, &timings(), &mut animator));
    assert!(piece.snapped);
    assert!(animator.is_running(&piece.id, TweenProperty::Flash));
    assert_eq!(animator.scale_target(&piece.id), Some(2.0));

    animator.advance(0.0);
    for (_, sample) in animator.advance(1_000.0) {
        match sample {
            kakera_core::tween::TweenSample::Position(position) => piece.position = position,
            kakera_core::tween::TweenSample::Rotation(rotation) => piece.rotation = rotation,
            kakera_core::tween::TweenSample::Scale(scale) => piece.scale = scale,
            kakera_core::tween::TweenSample::Flash(flash) => piece.flash = flash,
        }
    }
    assert_eq!(piece.position, Vec2::new(110.0, 110.0));
    assert_eq!(piece.rotation, 0.0);
    assert_eq!(piece.scale, 2.0);
}

#[test]
fn miss_heads_home_at_tray_scale() {
    let mut animator = Animator::new();
    let mut piece = piece_at(Vec2::new(116.0, 110.0), 0.0);
    assert!(!try_snap(&mut piece, &criteria(false), 0.35, &timings(), &mut animator));
    assert!(!piece.snapped);
    assert!(!piece.in_board_zone);
    assert!(animator.is_running(&piece.id, TweenProperty::Position));
    assert_eq!(animator.scale_target(&piece.id), Some(0.35));
    assert!(!animator.is_running(&piece.id, TweenProperty::Flash));
}
