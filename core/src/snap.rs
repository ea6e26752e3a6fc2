use crate::geom::{angle_delta, Vec2};
use crate::piece::RuntimePiece;
use crate::tween::{Animator, Easing, TweenTrack};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCriteria {
    pub board_origin: Vec2,
    pub board_scale: f32,
    pub position_threshold_px: f32,
    pub rotation_enabled: bool,
    pub rotation_tolerance_deg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTimings {
    pub snap_ms: f32,
    pub return_ms: f32,
    pub flash_ms: f32,
}

impl SnapCriteria {
    /// Stage position of a board-image point.
    pub fn target_position(&self, correct_position: Vec2) -> Vec2 {
        self.board_origin + correct_position * self.board_scale
    }

    /// Both comparisons are strict: landing exactly on the threshold misses.
    pub fn evaluate(&self, position: Vec2, rotation: f32, correct_position: Vec2, correct_rotation: f32) -> bool {
        let distance = position.distance(self.target_position(correct_position));
        let close = distance < self.position_threshold_px;
        let aligned = !self.rotation_enabled
            || angle_delta(correct_rotation, rotation).abs() < self.rotation_tolerance_deg;
        close && aligned
    }
}

/// Settles a released piece into its solved slot, or sends it home.
pub fn try_snap<T>(
    piece: &mut RuntimePiece<T>,
    criteria: &SnapCriteria,
    home_scale: f32,
    timings: &SnapTimings,
    animator: &mut Animator,
) -> bool {
    if piece.snapped {
        return true;
    }
    if !criteria.evaluate(piece.position, piece.rotation, piece.correct_position, piece.correct_rotation) {
        send_home(piece, home_scale, timings, animator);
        return false;
    }
    let target = criteria.target_position(piece.correct_position);
    let rotation = if criteria.rotation_enabled {
        piece.correct_rotation
    } else {
        piece.rotation
    };
    animator.cancel_piece(&piece.id);
    animator.start(
        &piece.id,
        TweenTrack::Position {
            from: piece.position,
            to: target,
        },
        timings.snap_ms,
        Easing::EaseOutCubic,
    );
    animator.start(
        &piece.id,
        TweenTrack::Rotation {
            from: piece.rotation,
            to: rotation,
        },
        timings.snap_ms,
        Easing::EaseOutCubic,
    );
    animator.start(
        &piece.id,
        TweenTrack::Scale {
            from: piece.scale,
            to: criteria.board_scale,
        },
        timings.snap_ms,
        Easing::EaseOutCubic,
    );
    animator.start(&piece.id, TweenTrack::Flash, timings.flash_ms, Easing::Linear);
    piece.snapped = true;
    piece.in_board_zone = true;
    true
}

pub fn send_home<T>(piece: &mut RuntimePiece<T>, home_scale: f32, timings: &SnapTimings, animator: &mut Animator) {
    animator.start(
        &piece.id,
        TweenTrack::Position {
            from: piece.position,
            to: piece.home,
        },
        timings.return_ms,
        Easing::EaseInOutQuad,
    );
    animator.start(
        &piece.id,
        TweenTrack::Scale {
            from: piece.scale,
            to: home_scale,
        },
        timings.return_ms,
        Easing::EaseInOutQuad,
    );
    piece.in_board_zone = false;
}
