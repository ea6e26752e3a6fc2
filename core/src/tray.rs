use crate::geom::{Rect, Vec2};
use crate::rules::{EngineRules, TRAY_GAP_SHRINK_RATIO};

pub const TRAY_MIN_PIECE_SCALE: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrayParams {
    pub max_rows: u32,
    pub gap: f32,
    pub diagonal_clearance: f32,
    pub side_clearance: f32,
    pub safety: f32,
}

impl From<&EngineRules> for TrayParams {
    fn from(rules: &EngineRules) -> Self {
        Self {
            max_rows: rules.tray_max_rows.max(1),
            gap: rules.tray_gap,
            diagonal_clearance: rules.diagonal_clearance,
            side_clearance: rules.side_clearance,
            safety: rules.tray_safety,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrayGrid {
    pub columns: usize,
    pub rows_per_column: usize,
    pub gap_x: f32,
    pub gap_y: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    pub piece_scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrayLayout {
    pub grid: TrayGrid,
    /// Home slot centers, in piece order.
    pub slots: Vec<Vec2>,
}

/// Keeps the naive gap unless it leaves no room for cells, then shrinks it
/// to a fraction of the extent.
fn fit_gap(extent: f32, slots: usize, gap: f32) -> f32 {
    let gaps = (slots + 1) as f32;
    if extent - gap * gaps > 0.0 {
        gap
    } else {
        TRAY_GAP_SHRINK_RATIO * extent / gaps
    }
}

fn piece_fit_scale(size: Vec2, cell_min: f32, params: &TrayParams) -> f32 {
    let diagonal = size.length();
    let longest = size.x.max(size.y);
    if diagonal <= f32::EPSILON || longest <= f32::EPSILON {
        return f32::INFINITY;
    }
    let diagonal_fit = (cell_min - params.diagonal_clearance) / diagonal;
    let side_fit = (cell_min - params.side_clearance) / longest;
    diagonal_fit.min(side_fit)
}

/// Picks the column count that shows pieces largest without exceeding
/// `max_rows` per column. On a tie the fewer-column grid is kept.
pub fn compute_tray_grid(width: f32, height: f32, sizes: &[Vec2], params: &TrayParams) -> Option<TrayGrid> {
    let n = sizes.len();
    if n == 0 || !(width > 0.0 && height > 0.0) {
        return None;
    }
    let max_rows = params.max_rows.max(1) as usize;
    let mut best: Option<TrayGrid> = None;
    for columns in n.div_ceil(max_rows)..=n {
        let rows = n.div_ceil(columns);
        if rows > max_rows {
            continue;
        }
        let gap_x = fit_gap(width, columns, params.gap);
        let gap_y = fit_gap(height, rows, params.gap);
        let cell_width = (width - gap_x * (columns + 1) as f32) / columns as f32;
        let cell_height = (height - gap_y * (rows + 1) as f32) / rows as f32;
        let cell_min = cell_width.min(cell_height);
        let fit = sizes
            .iter()
            .map(|size| piece_fit_scale(*size, cell_min, params))
            .fold(f32::INFINITY, f32::min);
        let piece_scale = if fit.is_finite() { fit * params.safety } else { 1.0 };
        let candidate = TrayGrid {
            columns,
            rows_per_column: rows,
            gap_x,
            gap_y,
            cell_width,
            cell_height,
            piece_scale,
        };
        match best {
            Some(current) if candidate.piece_scale > current.piece_scale => best = Some(candidate),
            None => best = Some(candidate),
            _ => {}
        }
    }
    best.map(|grid| TrayGrid {
        piece_scale: grid.piece_scale.max(TRAY_MIN_PIECE_SCALE),
        ..grid
    })
}

/// Column-major slot centers: each column is centered vertically on its own
/// content and the occupied columns are centered horizontally.
pub fn place_slots(tray: Rect, grid: &TrayGrid, count: usize) -> Vec<Vec2> {
    if count == 0 || grid.rows_per_column == 0 {
        return Vec::new();
    }
    let used_columns = count.div_ceil(grid.rows_per_column);
    let grid_width =
        used_columns as f32 * grid.cell_width + used_columns.saturating_sub(1) as f32 * grid.gap_x;
    let left = tray.x + (tray.width - grid_width) * 0.5;
    let mut slots = Vec::with_capacity(count);
    for column in 0..used_columns {
        let first = column * grid.rows_per_column;
        let in_column = (count - first).min(grid.rows_per_column);
        let content_height =
            in_column as f32 * grid.cell_height + in_column.saturating_sub(1) as f32 * grid.gap_y;
        let top = tray.y + (tray.height - content_height) * 0.5;
        let x = left + column as f32 * (grid.cell_width + grid.gap_x) + grid.cell_width * 0.5;
        for row in 0..in_column {
            let y = top + row as f32 * (grid.cell_height + grid.gap_y) + grid.cell_height * 0.5;
            slots.push(Vec2::new(x, y));
        }
    }
    slots
}

impl TrayLayout {
    pub fn compute(tray: Rect, sizes: &[Vec2], params: &TrayParams) -> Option<Self> {
        let grid = compute_tray_grid(tray.width, tray.height, sizes, params)?;
        let slots = place_slots(tray, &grid, sizes.len());
        Some(Self { grid, slots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_gap_shrinks_only_when_needed() {
        assert_eq!(fit_gap(200.0, 3, 12.0), 12.0);
        let shrunk = fit_gap(40.0, 3, 12.0);
        assert!((shrunk - 1.0).abs() < 1e-5);
    }

    #[test]
    fn single_column_is_vertically_centered() {
        let params = TrayParams::from(&EngineRules::default());
        let tray = Rect::new(0.0, 0.0, 100.0, 400.0);
        let layout = TrayLayout::compute(tray, &[Vec2::new(10.0, 10.0)], &params).expect("layout");
        assert_eq!(layout.grid.columns, 1);
        assert_eq!(layout.slots, vec![Vec2::new(50.0, 200.0)]);
    }
}
