use kakera_image_pipeline::MaskError;

use crate::definition::PieceId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeDataError {
    #[error("piece has no shape data")]
    Missing,
    #[error("source image is not available")]
    SourceUnavailable,
    #[error(transparent)]
    Mask(#[from] MaskError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("drawing surface unavailable: {0}")]
pub struct DrawSurfaceError(pub String);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to load {key}: direct decode: {direct}; fallback: {fallback}")]
pub struct AssetLoadError {
    pub key: String,
    pub direct: String,
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PieceLoadError {
    #[error("piece {piece}: {source}")]
    Shape {
        piece: PieceId,
        #[source]
        source: ShapeDataError,
    },
    #[error("piece {piece}: {source}")]
    DrawSurface {
        piece: PieceId,
        #[source]
        source: DrawSurfaceError,
    },
    #[error("piece {piece}: {source}")]
    Asset {
        piece: PieceId,
        #[source]
        source: AssetLoadError,
    },
    #[error("piece {piece}: no usable artwork")]
    NoArtwork { piece: PieceId },
    #[error("piece {piece}: loaded twice")]
    Duplicate { piece: PieceId },
}

impl PieceLoadError {
    pub fn piece(&self) -> &PieceId {
        match self {
            PieceLoadError::Shape { piece, .. }
            | PieceLoadError::DrawSurface { piece, .. }
            | PieceLoadError::Asset { piece, .. }
            | PieceLoadError::NoArtwork { piece }
            | PieceLoadError::Duplicate { piece } => piece,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("invalid puzzle json: {0}")]
    Parse(String),
    #[error("missing board image")]
    MissingBoardImage,
    #[error("invalid image size {width}x{height}")]
    ImageSize { width: u32, height: u32 },
    #[error("puzzle has no pieces")]
    NoPieces,
    #[error("duplicate piece id {0}")]
    DuplicatePiece(PieceId),
    #[error("invalid snap threshold {0}")]
    SnapThreshold(f32),
    #[error("invalid rotation tolerance {0}")]
    RotationTolerance(f32),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error("board image unavailable: {0}")]
    BoardUnavailable(AssetLoadError),
    #[error("original image unavailable: {0}")]
    OriginalUnavailable(AssetLoadError),
    #[error("initialization failed: {0}")]
    Initialization(String),
    #[error("container too small to lay out ({width}x{height})")]
    Layout { width: f32, height: f32 },
    #[error("no puzzle pieces could be loaded")]
    NoPieces,
}
