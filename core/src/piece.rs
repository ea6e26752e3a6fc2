use crate::definition::PieceId;
use crate::geom::{point_in_polygon, Vec2};

/// Anything the renderer can draw a piece from.
pub trait PieceTexture {
    fn pixel_size(&self) -> (u32, u32);
}

#[derive(Debug, Clone)]
pub struct RuntimePiece<T> {
    pub id: PieceId,
    pub texture: T,
    /// Drawn size at scale 1.
    pub natural_size: Vec2,
    /// Outline relative to the texture center, when the piece was cut from
    /// a polygon.
    pub hit_shape: Option<Vec<Vec2>>,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: f32,
    pub in_board_zone: bool,
    pub snapped: bool,
    pub home: Vec2,
    pub flash: f32,
    pub mirrored: bool,
    pub correct_position: Vec2,
    pub correct_rotation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceHandles {
    pub drag: Vec2,
    pub rotate: Option<Vec2>,
    pub radius: f32,
}

impl PieceHandles {
    pub fn drag_contains(&self, point: Vec2) -> bool {
        self.drag.distance(point) <= self.radius
    }

    pub fn rotate_contains(&self, point: Vec2) -> bool {
        self.rotate
            .is_some_and(|center| center.distance(point) <= self.radius)
    }
}

impl<T> RuntimePiece<T> {
    pub fn half_diagonal(&self) -> f32 {
        self.natural_size.length() * 0.5
    }

    /// Distance from the piece center to each handle center at the current
    /// scale.
    pub fn handle_distance(&self, handle_radius: f32, handle_gap: f32) -> f32 {
        self.half_diagonal() * self.scale + handle_gap + handle_radius
    }

    /// Offset from the center to the drag handle, which hangs below the piece
    /// in its own frame.
    pub fn drag_handle_offset(&self, handle_radius: f32, handle_gap: f32) -> Vec2 {
        Vec2::new(0.0, self.handle_distance(handle_radius, handle_gap)).rotated(self.rotation)
    }

    pub fn handles(&self, handle_radius: f32, handle_gap: f32, rotation_enabled: bool) -> Option<PieceHandles> {
        if self.snapped {
            return None;
        }
        let distance = self.handle_distance(handle_radius, handle_gap);
        let drag = self.position + Vec2::new(0.0, distance).rotated(self.rotation);
        let rotate = rotation_enabled.then(|| self.position + Vec2::new(0.0, -distance).rotated(self.rotation));
        Some(PieceHandles {
            drag,
            rotate,
            radius: handle_radius,
        })
    }

    /// Maps a stage point into the unscaled, unrotated texture frame.
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        let scale = if self.scale.abs() > f32::EPSILON { self.scale } else { 1.0 };
        let mut local = (point - self.position).rotated(-self.rotation) * (1.0 / scale);
        if self.mirrored {
            local.x = -local.x;
        }
        local
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let local = self.to_local(point);
        match &self.hit_shape {
            Some(shape) => point_in_polygon(local, shape),
            None => {
                local.x.abs() <= self.natural_size.x * 0.5 && local.y.abs() <= self.natural_size.y * 0.5
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f32) -> RuntimePiece<()> {
        RuntimePiece {
            id: PieceId::from("p"),
            texture: (),
            natural_size: Vec2::new(size, size),
            hit_shape: None,
            position: Vec2::new(100.0, 100.0),
            rotation: 0.0,
            scale: 1.0,
            in_board_zone: false,
            snapped: false,
            home: Vec2::new(100.0, 100.0),
            flash: 0.0,
            mirrored: false,
            correct_position: Vec2::ZERO,
            correct_rotation: 0.0,
        }
    }

    #[test]
    fn handles_follow_rotation_and_scale() {
        let mut piece = square(60.0);
        piece.scale = 0.5;
        let handles = piece.handles(10.0, 5.0, true).expect("handles");
        let distance = 30.0 * std::f32::consts::SQRT_2 * 0.5 + 15.0;
        assert!((handles.drag.y - (100.0 + distance)).abs() < 1e-3);
        piece.rotation = 90.0;
        let rotated = piece.handles(10.0, 5.0, true).expect("handles");
        assert!((rotated.drag.x - (100.0 - distance)).abs() < 1e-3);
        let rotate = rotated.rotate.expect("rotate handle");
        assert!((rotate.x - (100.0 + distance)).abs() < 1e-3);
    }

    #[test]
    fn snapped_pieces_have_no_handles() {
        let mut piece = square(40.0);
        assert!(piece.handles(10.0, 5.0, false).expect("handles").rotate.is_none());
        piece.snapped = true;
        assert!(piece.handles(10.0, 5.0, true).is_none());
    }

    #[test]
    fn contains_uses_polygon_when_present() {
        let mut piece = square(40.0);
        piece.hit_shape = Some(vec![
            Vec2::new(-20.0, -20.0),
            Vec2::new(20.0, -20.0),
            Vec2::new(-20.0, 20.0),
        ]);
        assert!(piece.contains(Vec2::new(90.0, 90.0)));
        assert!(!piece.contains(Vec2::new(115.0, 115.0)));
        piece.hit_shape = None;
        assert!(piece.contains(Vec2::new(115.0, 115.0)));
    }
}
