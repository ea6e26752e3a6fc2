use std::rc::Rc;

use kakera_core::{
    AssetKey, AssetLoadError, DrawSurfaceError, PieceId, PieceTexture, ResourceManager, TextureBackend,
};
use kakera_image_pipeline::{outline_path, PieceCut};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, CanvasWindingRule, HtmlCanvasElement, HtmlImageElement, Path2d};

use crate::resources::{js_error, BrowserFetch};

/// A piece's draw source: an offscreen canvas for shape cut-outs, or the
/// decoded image for pre-rendered artwork.
#[derive(Clone, Debug)]
pub(crate) enum CanvasTexture {
    Canvas {
        canvas: HtmlCanvasElement,
        width: u32,
        height: u32,
    },
    Image {
        image: HtmlImageElement,
        width: u32,
        height: u32,
    },
}

impl PieceTexture for CanvasTexture {
    fn pixel_size(&self) -> (u32, u32) {
        match self {
            CanvasTexture::Canvas { width, height, .. } | CanvasTexture::Image { width, height, .. } => {
                (*width, *height)
            }
        }
    }
}

impl CanvasTexture {
    /// Draws the texture centered on the context origin at `width` x `height`.
    pub(crate) fn draw_centered(
        &self,
        ctx: &CanvasRenderingContext2d,
        width: f64,
        height: f64,
    ) -> Result<(), JsValue> {
        let (x, y) = (-width * 0.5, -height * 0.5);
        match self {
            CanvasTexture::Canvas { canvas, .. } => {
                ctx.draw_image_with_html_canvas_element_and_dw_and_dh(canvas, x, y, width, height)
            }
            CanvasTexture::Image { image, .. } => {
                ctx.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, width, height)
            }
        }
    }
}

fn offscreen_canvas(width: u32, height: u32) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    canvas.set_width(width);
    canvas.set_height(height);
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((canvas, ctx))
}

/// Crops `source` onto a padded surface and masks it with the piece outline
/// through `destination-in`. Pixels outside the source stay transparent.
pub(crate) fn cut_piece_canvas(
    source: &HtmlImageElement,
    cut: &PieceCut,
    local_points: &[[f32; 2]],
) -> Result<HtmlCanvasElement, JsValue> {
    let (surface, ctx) = offscreen_canvas(cut.width, cut.height)?;
    let [offset_x, offset_y] = cut.source_offset();
    ctx.draw_image_with_html_image_element(source, offset_x, offset_y)?;

    let (mask, mask_ctx) = offscreen_canvas(cut.width, cut.height)?;
    let outline = Path2d::new_with_path_string(&outline_path(local_points))?;
    mask_ctx.set_fill_style_str("white");
    mask_ctx.fill_with_path_2d_and_winding(&outline, CanvasWindingRule::Evenodd);

    ctx.set_global_composite_operation("destination-in")?;
    ctx.draw_image_with_html_canvas_element(&mask, 0.0, 0.0)?;
    ctx.set_global_composite_operation("source-over")?;
    Ok(surface)
}

pub(crate) struct BrowserTextureBackend {
    resources: Rc<ResourceManager<BrowserFetch>>,
}

impl BrowserTextureBackend {
    pub(crate) fn new(resources: Rc<ResourceManager<BrowserFetch>>) -> Self {
        Self { resources }
    }
}

impl TextureBackend for BrowserTextureBackend {
    type Texture = CanvasTexture;
    type Source = HtmlImageElement;

    fn cut_piece(
        &self,
        source: &HtmlImageElement,
        cut: &PieceCut,
        local_points: &[[f32; 2]],
    ) -> Result<CanvasTexture, DrawSurfaceError> {
        let canvas = cut_piece_canvas(source, cut, local_points).map_err(|err| DrawSurfaceError(js_error(err)))?;
        Ok(CanvasTexture::Canvas {
            canvas,
            width: cut.width,
            height: cut.height,
        })
    }

    async fn load_piece_image(&self, piece: &PieceId, source: &str) -> Result<CanvasTexture, AssetLoadError> {
        let image = self
            .resources
            .load_texture(AssetKey::Piece(piece.clone()), source)
            .await?;
        Ok(CanvasTexture::Image {
            width: image.natural_width(),
            height: image.natural_height(),
            image,
        })
    }
}
