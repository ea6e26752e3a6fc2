use std::collections::BTreeMap;

use crate::definition::PieceId;
use crate::geom::{normalize_angle, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiecePart {
    Body,
    DragHandle,
    RotateHandle,
}

/// What a pointer-down landed on, resolved by the session's hit test.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    Piece {
        id: PieceId,
        part: PiecePart,
        center: Vec2,
        rotation: f32,
    },
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragMode {
    /// Keeps the offset between the grab point and the piece center.
    Body { grab_offset: Vec2 },
    /// Keeps the drag handle under the pointer.
    Handle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub piece: PieceId,
    pub pointer: PointerId,
    pub mode: DragMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotateSession {
    pub piece: PieceId,
    pub pointer: PointerId,
    pub center: Vec2,
    pub initial_offset_deg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchSession {
    pub first: PointerId,
    pub second: PointerId,
    pub last_distance: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging(DragSession),
    Rotating(RotateSession),
    PinchZooming(PinchSession),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEffect {
    None,
    Grab { piece: PieceId, pointer: PointerId },
    Drag { piece: PieceId, pointer: Vec2, mode: DragMode },
    Rotate { piece: PieceId, rotation: f32 },
    Zoom { distance_delta: f32 },
    ReleaseDrag { piece: PieceId },
    ReleaseRotate { piece: PieceId },
    CancelDrag { piece: PieceId },
}

/// Pointer gesture state machine. It owns no piece state; the session turns
/// its effects into piece mutations.
#[derive(Debug, Default)]
pub struct InteractionController {
    state: Interaction,
    background: BTreeMap<PointerId, Vec2>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Interaction {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, Interaction::Idle)
    }

    pub fn active_piece(&self) -> Option<&PieceId> {
        match &self.state {
            Interaction::Dragging(session) => Some(&session.piece),
            Interaction::Rotating(session) => Some(&session.piece),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = Interaction::Idle;
        self.background.clear();
    }

    pub fn pointer_down(&mut self, pointer: PointerId, position: Vec2, hit: Hit) -> InteractionEffect {
        if matches!(self.state, Interaction::Dragging(_) | Interaction::Rotating(_)) {
            return InteractionEffect::None;
        }
        match hit {
            Hit::Piece {
                id,
                part,
                center,
                rotation,
            } => {
                if !self.is_idle() {
                    return InteractionEffect::None;
                }
                self.state = match part {
                    PiecePart::Body => Interaction::Dragging(DragSession {
                        piece: id.clone(),
                        pointer,
                        mode: DragMode::Body {
                            grab_offset: center - position,
                        },
                    }),
                    PiecePart::DragHandle => Interaction::Dragging(DragSession {
                        piece: id.clone(),
                        pointer,
                        mode: DragMode::Handle,
                    }),
                    PiecePart::RotateHandle => Interaction::Rotating(RotateSession {
                        piece: id.clone(),
                        pointer,
                        center,
                        initial_offset_deg: (position - center).angle_deg() - rotation,
                    }),
                };
                InteractionEffect::Grab { piece: id, pointer }
            }
            Hit::Background => {
                self.background.insert(pointer, position);
                if self.is_idle() {
                    self.try_start_pinch();
                }
                InteractionEffect::None
            }
        }
    }

    pub fn pointer_move(&mut self, pointer: PointerId, position: Vec2) -> InteractionEffect {
        if let Some(stored) = self.background.get_mut(&pointer) {
            *stored = position;
        }
        match &mut self.state {
            Interaction::Idle => InteractionEffect::None,
            Interaction::Dragging(session) => {
                if session.pointer != pointer {
                    return InteractionEffect::None;
                }
                InteractionEffect::Drag {
                    piece: session.piece.clone(),
                    pointer: position,
                    mode: session.mode,
                }
            }
            Interaction::Rotating(session) => {
                if session.pointer != pointer {
                    return InteractionEffect::None;
                }
                let rotation = normalize_angle((position - session.center).angle_deg() - session.initial_offset_deg);
                InteractionEffect::Rotate {
                    piece: session.piece.clone(),
                    rotation,
                }
            }
            Interaction::PinchZooming(pinch) => {
                if pointer != pinch.first && pointer != pinch.second {
                    return InteractionEffect::None;
                }
                let (Some(a), Some(b)) = (self.background.get(&pinch.first), self.background.get(&pinch.second))
                else {
                    return InteractionEffect::None;
                };
                let distance = a.distance(*b);
                let distance_delta = distance - pinch.last_distance;
                pinch.last_distance = distance;
                InteractionEffect::Zoom { distance_delta }
            }
        }
    }

    pub fn pointer_up(&mut self, pointer: PointerId) -> InteractionEffect {
        self.finish(pointer, false)
    }

    /// Like pointer-up, except a dragged piece goes home without snapping.
    pub fn pointer_cancel(&mut self, pointer: PointerId) -> InteractionEffect {
        self.finish(pointer, true)
    }

    fn finish(&mut self, pointer: PointerId, cancelled: bool) -> InteractionEffect {
        self.background.remove(&pointer);
        match &self.state {
            Interaction::Dragging(session) if session.pointer == pointer => {
                let piece = session.piece.clone();
                self.state = Interaction::Idle;
                if cancelled {
                    InteractionEffect::CancelDrag { piece }
                } else {
                    InteractionEffect::ReleaseDrag { piece }
                }
            }
            Interaction::Rotating(session) if session.pointer == pointer => {
                let piece = session.piece.clone();
                self.state = Interaction::Idle;
                InteractionEffect::ReleaseRotate { piece }
            }
            Interaction::PinchZooming(pinch) if pointer == pinch.first || pointer == pinch.second => {
                self.state = Interaction::Idle;
                self.try_start_pinch();
                InteractionEffect::None
            }
            _ => InteractionEffect::None,
        }
    }

    fn try_start_pinch(&mut self) {
        let mut pointers = self.background.iter();
        let (Some((&first, a)), Some((&second, b))) = (pointers.next(), pointers.next()) else {
            return;
        };
        self.state = Interaction::PinchZooming(PinchSession {
            first,
            second,
            last_distance: a.distance(*b),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyCommand {
    Rotate { clockwise: bool, fast: bool },
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

impl KeyCommand {
    pub fn from_key(key: &str, shift: bool) -> Option<Self> {
        match key {
            "q" | "Q" | "ArrowLeft" => Some(KeyCommand::Rotate {
                clockwise: false,
                fast: shift,
            }),
            "e" | "E" | "ArrowRight" => Some(KeyCommand::Rotate {
                clockwise: true,
                fast: shift,
            }),
            "+" | "=" => Some(KeyCommand::ZoomIn),
            "-" | "_" => Some(KeyCommand::ZoomOut),
            "0" => Some(KeyCommand::ZoomReset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece_hit(id: &str, part: PiecePart) -> Hit {
        Hit::Piece {
            id: PieceId::from(id),
            part,
            center: Vec2::new(100.0, 100.0),
            rotation: 0.0,
        }
    }

    #[test]
    fn body_drag_keeps_grab_offset() {
        let mut controller = InteractionController::new();
        let grab = controller.pointer_down(PointerId(1), Vec2::new(90.0, 95.0), piece_hit("a", PiecePart::Body));
        assert!(matches!(grab, InteractionEffect::Grab { .. }));
        match controller.pointer_move(PointerId(1), Vec2::new(200.0, 200.0)) {
            InteractionEffect::Drag {
                mode: DragMode::Body { grab_offset },
                pointer,
                ..
            } => assert_eq!(pointer + grab_offset, Vec2::new(210.0, 205.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rotate_session_tracks_pointer_angle() {
        let mut controller = InteractionController::new();
        controller.pointer_down(
            PointerId(1),
            Vec2::new(100.0, 50.0),
            piece_hit("a", PiecePart::RotateHandle),
        );
        match controller.pointer_move(PointerId(1), Vec2::new(150.0, 100.0)) {
            InteractionEffect::Rotate { rotation, .. } => assert!((rotation - 90.0).abs() < 1e-3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            controller.pointer_up(PointerId(1)),
            InteractionEffect::ReleaseRotate {
                piece: PieceId::from("a")
            }
        );
        assert!(controller.is_idle());
    }

    #[test]
    fn second_piece_is_ignored_during_drag() {
        let mut controller = InteractionController::new();
        controller.pointer_down(PointerId(1), Vec2::ZERO, piece_hit("a", PiecePart::DragHandle));
        let effect = controller.pointer_down(PointerId(2), Vec2::ZERO, piece_hit("b", PiecePart::Body));
        assert_eq!(effect, InteractionEffect::None);
        assert_eq!(controller.active_piece(), Some(&PieceId::from("a")));
    }

    #[test]
    fn pinch_starts_with_two_background_pointers() {
        let mut controller = InteractionController::new();
        controller.pointer_down(PointerId(1), Vec2::new(0.0, 0.0), Hit::Background);
        assert!(controller.is_idle());
        controller.pointer_down(PointerId(2), Vec2::new(100.0, 0.0), Hit::Background);
        assert!(matches!(controller.state(), Interaction::PinchZooming(_)));
        assert_eq!(
            controller.pointer_move(PointerId(2), Vec2::new(150.0, 0.0)),
            InteractionEffect::Zoom { distance_delta: 50.0 }
        );
        controller.pointer_up(PointerId(1));
        assert!(controller.is_idle());
    }

    #[test]
    fn pinch_blocks_piece_grab() {
        let mut controller = InteractionController::new();
        controller.pointer_down(PointerId(1), Vec2::new(0.0, 0.0), Hit::Background);
        controller.pointer_down(PointerId(2), Vec2::new(10.0, 0.0), Hit::Background);
        let effect = controller.pointer_down(PointerId(3), Vec2::ZERO, piece_hit("a", PiecePart::Body));
        assert_eq!(effect, InteractionEffect::None);
    }

    #[test]
    fn cancel_sends_drag_home() {
        let mut controller = InteractionController::new();
        controller.pointer_down(PointerId(4), Vec2::ZERO, piece_hit("a", PiecePart::Body));
        assert_eq!(
            controller.pointer_cancel(PointerId(4)),
            InteractionEffect::CancelDrag {
                piece: PieceId::from("a")
            }
        );
    }

    #[test]
    fn keymap() {
        assert_eq!(
            KeyCommand::from_key("Q", true),
            Some(KeyCommand::Rotate {
                clockwise: false,
                fast: true
            })
        );
        assert_eq!(KeyCommand::from_key("=", false), Some(KeyCommand::ZoomIn));
        assert_eq!(KeyCommand::from_key("x", false), None);
    }
}
