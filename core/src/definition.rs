use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::geom::{Rect, Vec2};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "IdRepr")]
pub struct PieceId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(i64),
}

impl From<IdRepr> for PieceId {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Text(text) => PieceId(text),
            IdRepr::Number(value) => PieceId(value.to_string()),
        }
    }
}

impl From<&str> for PieceId {
    fn from(value: &str) -> Self {
        PieceId(value.to_string())
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceDefinition {
    pub id: PieceId,
    /// Polygon in original-image pixel space.
    #[serde(default)]
    pub shape: Option<Vec<Vec2>>,
    /// Pre-rendered piece image.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bounds: Option<Rect>,
    /// Piece center in board-image pixel space.
    pub correct_position: Vec2,
    #[serde(default)]
    pub correct_rotation: f32,
    #[serde(default)]
    pub flipped: bool,
}

impl PieceDefinition {
    pub fn has_shape(&self) -> bool {
        self.shape.as_ref().is_some_and(|points| !points.is_empty())
    }

    pub fn shape_points(&self) -> Option<Vec<[f32; 2]>> {
        self.shape
            .as_ref()
            .map(|points| points.iter().map(|point| point.to_array()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleDefinition {
    pub board_image: String,
    pub original_image: String,
    pub image_width: u32,
    pub image_height: u32,
    pub pieces: Vec<PieceDefinition>,
    #[serde(default)]
    pub enable_rotation: bool,
    #[serde(default = "default_snap_position_threshold")]
    pub snap_position_threshold_px: f32,
    #[serde(default = "default_rotation_snap_tolerance")]
    pub rotation_snap_tolerance_deg: f32,
}

pub const SNAP_POSITION_THRESHOLD_DEFAULT_PX: f32 = 30.0;
pub const ROTATION_SNAP_TOLERANCE_DEFAULT_DEG: f32 = 10.0;

fn default_snap_position_threshold() -> f32 {
    SNAP_POSITION_THRESHOLD_DEFAULT_PX
}

fn default_rotation_snap_tolerance() -> f32 {
    ROTATION_SNAP_TOLERANCE_DEFAULT_DEG
}

impl PuzzleDefinition {
    pub fn from_json(raw: &str) -> Result<Self, DefinitionError> {
        let definition: PuzzleDefinition =
            serde_json::from_str(raw).map_err(|err| DefinitionError::Parse(err.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Structural checks only. Per-piece artwork problems are handled while
    /// loading so one bad piece does not sink the puzzle.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.board_image.trim().is_empty() {
            return Err(DefinitionError::MissingBoardImage);
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(DefinitionError::ImageSize {
                width: self.image_width,
                height: self.image_height,
            });
        }
        if self.pieces.is_empty() {
            return Err(DefinitionError::NoPieces);
        }
        if !(self.snap_position_threshold_px.is_finite() && self.snap_position_threshold_px > 0.0) {
            return Err(DefinitionError::SnapThreshold(self.snap_position_threshold_px));
        }
        if !(self.rotation_snap_tolerance_deg.is_finite() && self.rotation_snap_tolerance_deg >= 0.0) {
            return Err(DefinitionError::RotationTolerance(self.rotation_snap_tolerance_deg));
        }
        let mut seen = HashSet::with_capacity(self.pieces.len());
        for piece in &self.pieces {
            if !seen.insert(&piece.id) {
                return Err(DefinitionError::DuplicatePiece(piece.id.clone()));
            }
        }
        Ok(())
    }

    /// The original image is only decoded when some piece is cut from it.
    pub fn needs_source_image(&self) -> bool {
        !self.original_image.trim().is_empty() && self.pieces.iter().any(PieceDefinition::has_shape)
    }

    pub fn board_size(&self) -> Vec2 {
        Vec2::new(self.image_width as f32, self.image_height as f32)
    }
}
