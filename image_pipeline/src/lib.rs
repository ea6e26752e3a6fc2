use std::fmt::Write as _;

pub const PIECE_PAD_PX: u32 = 4;
pub const PIECE_SURFACE_MAX_PX: u32 = 8192;
/// Polygon coordinates past this magnitude are rejected outright.
pub const PIECE_COORD_LIMIT: f64 = 16_777_216.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaskError {
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("polygon has non-finite coordinates")]
    NonFinite,
    #[error("polygon coordinates out of range")]
    OutOfRange,
    #[error("polygon bounds are degenerate ({width}x{height})")]
    Degenerate { width: f64, height: f64 },
    #[error("piece surface too large ({width}x{height})")]
    Oversized { width: f64, height: f64 },
}

/// Integer bounding box of a polygon in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: i64,
    pub min_y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelBounds {
    /// Floors the minima and ceils the maxima. Spans are measured in `f64`
    /// and checked against the surface limit before any narrowing.
    pub fn from_points(points: &[[f32; 2]]) -> Result<Self, MaskError> {
        if points.len() < 3 {
            return Err(MaskError::TooFewPoints(points.len()));
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for point in points {
            let (x, y) = (point[0] as f64, point[1] as f64);
            if !x.is_finite() || !y.is_finite() {
                return Err(MaskError::NonFinite);
            }
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let left = min_x.floor();
        let top = min_y.floor();
        let width = max_x.ceil() - left;
        let height = max_y.ceil() - top;
        if width <= 0.0 || height <= 0.0 {
            return Err(MaskError::Degenerate { width, height });
        }
        let limit = PIECE_SURFACE_MAX_PX as f64;
        if width > limit || height > limit {
            return Err(MaskError::Oversized { width, height });
        }
        if left.abs() > PIECE_COORD_LIMIT || top.abs() > PIECE_COORD_LIMIT {
            return Err(MaskError::OutOfRange);
        }
        Ok(Self {
            min_x: left as i64,
            min_y: top as i64,
            width: u32::try_from(width as i64).map_err(|_| MaskError::Oversized { width, height })?,
            height: u32::try_from(height as i64).map_err(|_| MaskError::Oversized { width, height })?,
        })
    }
}

/// Where a piece is cut from the source image: the padded surface and its
/// top-left corner in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceCut {
    pub bounds: PixelBounds,
    pub origin_x: i64,
    pub origin_y: i64,
    pub width: u32,
    pub height: u32,
}

impl PieceCut {
    /// Source offset for drawing the whole image onto the surface.
    pub fn source_offset(&self) -> [f64; 2] {
        [-self.origin_x as f64, -self.origin_y as f64]
    }

    /// Polygon points translated into surface space.
    pub fn local_points(&self, points: &[[f32; 2]]) -> Vec<[f32; 2]> {
        let (x, y) = (self.origin_x as f32, self.origin_y as f32);
        points
            .iter()
            .map(|point| [point[0] - x, point[1] - y])
            .collect()
    }

    /// Polygon points relative to the surface center.
    pub fn centered_points(&self, points: &[[f32; 2]]) -> Vec<[f32; 2]> {
        let center_x = self.origin_x as f32 + self.width as f32 * 0.5;
        let center_y = self.origin_y as f32 + self.height as f32 * 0.5;
        points
            .iter()
            .map(|point| [point[0] - center_x, point[1] - center_y])
            .collect()
    }
}

/// Sizes the surface a polygon is cut onto: its bounding box grown by
/// `pad` on every side.
pub fn plan_piece_cut(points: &[[f32; 2]], pad: u32) -> Result<PieceCut, MaskError> {
    let bounds = PixelBounds::from_points(points)?;
    let width = bounds.width + pad * 2;
    let height = bounds.height + pad * 2;
    if width > PIECE_SURFACE_MAX_PX || height > PIECE_SURFACE_MAX_PX {
        return Err(MaskError::Oversized {
            width: width as f64,
            height: height as f64,
        });
    }
    Ok(PieceCut {
        bounds,
        origin_x: bounds.min_x - pad as i64,
        origin_y: bounds.min_y - pad as i64,
        width,
        height,
    })
}

/// Closed SVG path data for a polygon, as accepted by `Path2D`.
pub fn outline_path(points: &[[f32; 2]]) -> String {
    let mut path = String::with_capacity(points.len() * 16);
    for (index, point) in points.iter().enumerate() {
        let command = if index == 0 { 'M' } else { 'L' };
        let _ = write!(path, "{command}{} {} ", point[0], point[1]);
    }
    if !points.is_empty() {
        path.push('Z');
    }
    path
}
