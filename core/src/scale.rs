use crate::geom::{Rect, Vec2};
use crate::piece::RuntimePiece;
use crate::rules::clamp_zoom;
use crate::tween::{Animator, Easing, TweenTrack};

/// Board-zone membership with hysteresis: entering needs the center inside
/// the board grown by `margin`, leaving needs it outside `margin + hysteresis`.
pub fn in_board_zone(center: Vec2, board: Rect, was_in: bool, margin: f32, hysteresis: f32) -> bool {
    let grow = if was_in { margin + hysteresis } else { margin };
    board.expanded(grow).contains(center)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleCoordinator {
    pub board: Rect,
    pub board_scale: f32,
    pub tray_scale: f32,
    pub zoom: f32,
    pub margin: f32,
    pub hysteresis: f32,
    pub tween_ms: f32,
}

impl ScaleCoordinator {
    pub fn target_scale(&self, in_zone: bool) -> f32 {
        if in_zone {
            self.board_scale
        } else {
            self.tray_scale * self.zoom
        }
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = clamp_zoom(zoom);
        self.zoom
    }

    /// Re-evaluates the zone for a dragged piece, then retargets its scale.
    pub fn update_piece<T>(&self, piece: &mut RuntimePiece<T>, animator: &mut Animator) -> bool {
        if piece.snapped {
            return false;
        }
        piece.in_board_zone = in_board_zone(
            piece.position,
            self.board,
            piece.in_board_zone,
            self.margin,
            self.hysteresis,
        );
        self.retarget(piece, animator)
    }

    /// Starts a scale tween when the piece's target scale moved. Returns
    /// whether a tween was started.
    pub fn retarget<T>(&self, piece: &RuntimePiece<T>, animator: &mut Animator) -> bool {
        if piece.snapped {
            return false;
        }
        let target = self.target_scale(piece.in_board_zone);
        let current_target = animator.scale_target(&piece.id).unwrap_or(piece.scale);
        if (current_target - target).abs() <= f32::EPSILON {
            return false;
        }
        animator.start(
            &piece.id,
            TweenTrack::Scale {
                from: piece.scale,
                to: target,
            },
            self.tween_ms,
            Easing::EaseOutCubic,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PieceId;

    fn coordinator() -> ScaleCoordinator {
        ScaleCoordinator {
            board: Rect::new(100.0, 100.0, 200.0, 200.0),
            board_scale: 1.0,
            tray_scale: 0.5,
            zoom: 1.0,
            margin: 8.0,
            hysteresis: 24.0,
            tween_ms: 160.0,
        }
    }

    fn loose_piece(position: Vec2) -> RuntimePiece<()> {
        RuntimePiece {
            id: PieceId::from("p"),
            texture: (),
            natural_size: Vec2::new(40.0, 40.0),
            hit_shape: None,
            position,
            rotation: 0.0,
            scale: 0.5,
            in_board_zone: false,
            snapped: false,
            home: position,
            flash: 0.0,
            mirrored: false,
            correct_position: Vec2::ZERO,
            correct_rotation: 0.0,
        }
    }

    #[test]
    fn oscillating_inside_band_keeps_target() {
        let scale = coordinator();
        let mut animator = Animator::new();
        let mut piece = loose_piece(Vec2::new(150.0, 150.0));
        assert!(scale.update_piece(&mut piece, &mut animator));
        assert_eq!(animator.scale_target(&piece.id), Some(1.0));
        for x in [80.0, 95.0, 75.0, 90.0] {
            piece.position = Vec2::new(x, 150.0);
            assert!(!scale.update_piece(&mut piece, &mut animator), "x = {x}");
            assert!(piece.in_board_zone);
        }
        piece.position = Vec2::new(50.0, 150.0);
        assert!(scale.update_piece(&mut piece, &mut animator));
        assert_eq!(animator.scale_target(&piece.id), Some(0.5));
    }

    #[test]
    fn snapped_piece_is_left_alone() {
        let scale = coordinator();
        let mut animator = Animator::new();
        let mut piece = loose_piece(Vec2::new(150.0, 150.0));
        piece.snapped = true;
        assert!(!scale.update_piece(&mut piece, &mut animator));
        assert!(!animator.is_animating());
    }

    #[test]
    fn hysteresis_band_is_sticky() {
        let board = Rect::new(100.0, 100.0, 200.0, 200.0);
        let just_outside = Vec2::new(100.0 - 20.0, 150.0);
        assert!(!in_board_zone(just_outside, board, false, 8.0, 24.0));
        assert!(in_board_zone(just_outside, board, true, 8.0, 24.0));
        let far = Vec2::new(100.0 - 40.0, 150.0);
        assert!(!in_board_zone(far, board, true, 8.0, 24.0));
    }
}
