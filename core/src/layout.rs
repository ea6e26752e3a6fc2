use crate::error::EngineError;
use crate::geom::{Rect, Vec2};
use crate::rules::EngineRules;

/// Where the board and the tray sit inside the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageLayout {
    pub container: Vec2,
    pub board_area: Rect,
    pub board: Rect,
    pub board_scale: f32,
    pub tray: Rect,
}

fn inset(rect: Rect, padding: f32) -> Rect {
    Rect::new(
        rect.x + padding,
        rect.y + padding,
        rect.width - padding * 2.0,
        rect.height - padding * 2.0,
    )
}

impl StageLayout {
    pub fn is_landscape(&self) -> bool {
        self.container.x >= self.container.y
    }

    /// Splits the container along its longer axis: the board gets
    /// `board_fraction` of it (left or top) and the tray takes the rest.
    pub fn compute(container: Vec2, board_size: Vec2, rules: &EngineRules) -> Result<Self, EngineError> {
        let too_small = || EngineError::Layout {
            width: container.x,
            height: container.y,
        };
        if !(container.x > 0.0 && container.y > 0.0) || !(board_size.x > 0.0 && board_size.y > 0.0) {
            return Err(too_small());
        }
        let fraction = rules.board_fraction;
        let (board_outer, tray_outer) = if container.x >= container.y {
            let split = container.x * fraction;
            (
                Rect::new(0.0, 0.0, split, container.y),
                Rect::new(split, 0.0, container.x - split, container.y),
            )
        } else {
            let split = container.y * fraction;
            (
                Rect::new(0.0, 0.0, container.x, split),
                Rect::new(0.0, split, container.x, container.y - split),
            )
        };
        let board_area = inset(board_outer, rules.stage_padding);
        let tray = inset(tray_outer, rules.stage_padding);
        if board_area.width <= 0.0 || board_area.height <= 0.0 || tray.width <= 0.0 || tray.height <= 0.0 {
            return Err(too_small());
        }
        let board_scale = (board_area.width / board_size.x).min(board_area.height / board_size.y);
        let width = board_size.x * board_scale;
        let height = board_size.y * board_scale;
        let board = Rect::new(
            board_area.x + (board_area.width - width) * 0.5,
            board_area.y + (board_area.height - height) * 0.5,
            width,
            height,
        );
        Ok(Self {
            container,
            board_area,
            board,
            board_scale,
            tray,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_puts_board_left() {
        let rules = EngineRules {
            board_fraction: 0.5,
            stage_padding: 10.0,
            ..EngineRules::default()
        };
        let layout = StageLayout::compute(Vec2::new(1000.0, 500.0), Vec2::new(400.0, 200.0), &rules)
            .expect("layout");
        assert!(layout.is_landscape());
        assert_eq!(layout.board_scale, 1.2);
        assert_eq!(layout.board.x, 10.0);
        assert_eq!(layout.tray, Rect::new(510.0, 10.0, 480.0, 480.0));
    }

    #[test]
    fn portrait_puts_board_on_top() {
        let rules = EngineRules::default();
        let layout = StageLayout::compute(Vec2::new(400.0, 800.0), Vec2::new(100.0, 100.0), &rules)
            .expect("layout");
        assert!(!layout.is_landscape());
        assert!(layout.board.bottom() <= layout.tray.y);
    }

    #[test]
    fn tiny_container_is_an_error() {
        let rules = EngineRules::default();
        assert!(matches!(
            StageLayout::compute(Vec2::new(20.0, 20.0), Vec2::new(100.0, 100.0), &rules),
            Err(EngineError::Layout { .. })
        ));
    }
}
