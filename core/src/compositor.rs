use kakera_image_pipeline::{plan_piece_cut, PieceCut, PIECE_PAD_PX};

use crate::definition::{PieceDefinition, PieceId};
use crate::error::{AssetLoadError, DrawSurfaceError, PieceLoadError, ShapeDataError};
use crate::geom::Vec2;
use crate::piece::PieceTexture;

/// A resolved piece texture plus what the session needs to place it.
#[derive(Debug, Clone)]
pub struct PieceArt<T> {
    pub id: PieceId,
    pub texture: T,
    pub natural_size: Vec2,
    pub hit_shape: Option<Vec<Vec2>>,
    pub mirrored: bool,
}

#[allow(async_fn_in_trait)]
pub trait TextureBackend {
    type Texture: PieceTexture;
    /// The decoded original image shape pieces are cut from.
    type Source;

    /// Draws `source` onto a `cut.width` x `cut.height` surface offset by
    /// the cut origin, then keeps only what `local_points` covers.
    fn cut_piece(
        &self,
        source: &Self::Source,
        cut: &PieceCut,
        local_points: &[[f32; 2]],
    ) -> Result<Self::Texture, DrawSurfaceError>;

    async fn load_piece_image(&self, piece: &PieceId, source: &str) -> Result<Self::Texture, AssetLoadError>;
}

enum ShapeFailure {
    Shape(ShapeDataError),
    Surface(DrawSurfaceError),
}

impl ShapeFailure {
    fn into_load_error(self, piece: &PieceId) -> PieceLoadError {
        match self {
            ShapeFailure::Shape(source) => PieceLoadError::Shape {
                piece: piece.clone(),
                source,
            },
            ShapeFailure::Surface(source) => PieceLoadError::DrawSurface {
                piece: piece.clone(),
                source,
            },
        }
    }
}

/// Cuts the piece polygon out of the source image.
pub fn shape_texture<B: TextureBackend>(
    backend: &B,
    piece: &PieceDefinition,
    source: Option<&B::Source>,
) -> Result<PieceArt<B::Texture>, PieceLoadError> {
    shape_art(backend, piece, source).map_err(|failure| failure.into_load_error(&piece.id))
}

fn shape_art<B: TextureBackend>(
    backend: &B,
    piece: &PieceDefinition,
    source: Option<&B::Source>,
) -> Result<PieceArt<B::Texture>, ShapeFailure> {
    let points = piece
        .shape_points()
        .filter(|points| !points.is_empty())
        .ok_or(ShapeFailure::Shape(ShapeDataError::Missing))?;
    let source = source.ok_or(ShapeFailure::Shape(ShapeDataError::SourceUnavailable))?;
    let cut = plan_piece_cut(&points, PIECE_PAD_PX)
        .map_err(|err| ShapeFailure::Shape(ShapeDataError::from(err)))?;
    let texture = backend
        .cut_piece(source, &cut, &cut.local_points(&points))
        .map_err(ShapeFailure::Surface)?;
    let hit_shape = cut
        .centered_points(&points)
        .into_iter()
        .map(|[x, y]| Vec2::new(x, y))
        .collect();
    Ok(PieceArt {
        id: piece.id.clone(),
        texture,
        natural_size: Vec2::new(cut.width as f32, cut.height as f32),
        hit_shape: Some(hit_shape),
        mirrored: false,
    })
}

/// Loads the piece's pre-rendered image. Flipped artwork is drawn mirrored.
pub async fn prerendered_texture<B: TextureBackend>(
    backend: &B,
    piece: &PieceDefinition,
    source: &str,
) -> Result<PieceArt<B::Texture>, PieceLoadError> {
    let texture = backend
        .load_piece_image(&piece.id, source)
        .await
        .map_err(|source| PieceLoadError::Asset {
            piece: piece.id.clone(),
            source,
        })?;
    let natural_size = match piece.bounds {
        Some(bounds) if bounds.width > 0.0 && bounds.height > 0.0 => bounds.size(),
        _ => {
            let (width, height) = texture.pixel_size();
            Vec2::new(width as f32, height as f32)
        }
    };
    Ok(PieceArt {
        id: piece.id.clone(),
        texture,
        natural_size,
        hit_shape: None,
        mirrored: piece.flipped,
    })
}

/// Shape data first, then the pre-rendered image. A piece with neither
/// usable is reported and left out.
pub async fn build_piece_texture<B: TextureBackend>(
    backend: &B,
    piece: &PieceDefinition,
    source: Option<&B::Source>,
) -> Result<PieceArt<B::Texture>, PieceLoadError> {
    let shape_error = if piece.shape.is_some() {
        match shape_texture(backend, piece, source) {
            Ok(art) => return Ok(art),
            Err(err) => Some(err),
        }
    } else {
        None
    };
    match piece.image.as_deref().map(str::trim).filter(|image| !image.is_empty()) {
        Some(image) => prerendered_texture(backend, piece, image).await,
        None => Err(shape_error.unwrap_or(PieceLoadError::NoArtwork {
            piece: piece.id.clone(),
        })),
    }
}
