use std::f64::consts::TAU;

use kakera_core::{PieceHandles, PuzzleSession, RuntimePiece, StageLayout, Theme, Vec2};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::textures::CanvasTexture;

const BOARD_IMAGE_ALPHA: f64 = 0.5;
const FLASH_ALPHA: f64 = 0.65;
const FRAME_WIDTH: f64 = 2.0;
const HANDLE_STROKE_WIDTH: f64 = 2.0;
const GLYPH_RATIO: f64 = 0.45;

/// Stage colors. The theme changes nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Palette {
    pub background: &'static str,
    pub tray: &'static str,
    pub board_backdrop: &'static str,
    pub board_frame: &'static str,
    pub handle_fill: &'static str,
    pub handle_stroke: &'static str,
    pub handle_glyph: &'static str,
}

impl Palette {
    pub(crate) fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                background: "#15171c",
                tray: "#1f232b",
                board_backdrop: "#0d0f12",
                board_frame: "#8a93a6",
                handle_fill: "rgba(24, 28, 36, 0.88)",
                handle_stroke: "#e8ecf4",
                handle_glyph: "#e8ecf4",
            },
            Theme::Light => Self {
                background: "#f4f1ea",
                tray: "#e6e1d6",
                board_backdrop: "#ffffff",
                board_frame: "#6b6457",
                handle_fill: "rgba(255, 255, 255, 0.92)",
                handle_stroke: "#2b2822",
                handle_glyph: "#2b2822",
            },
        }
    }
}

pub(crate) fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|window| window.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}

/// Canvas 2D painter for one stage.
pub(crate) struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    palette: Palette,
    css_size: Vec2,
    dpr: f64,
}

impl Renderer {
    pub(crate) fn new(canvas: HtmlCanvasElement, theme: Theme) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            palette: Palette::for_theme(theme),
            css_size: Vec2::ZERO,
            dpr: 1.0,
        })
    }

    pub(crate) fn css_size(&self) -> Vec2 {
        self.css_size
    }

    /// Sizes the backing store for the current device pixel ratio.
    pub(crate) fn resize(&mut self, css_size: Vec2) -> Result<(), JsValue> {
        let dpr = device_pixel_ratio();
        let width = (css_size.x.max(1.0) as f64 * dpr).ceil() as u32;
        let height = (css_size.y.max(1.0) as f64 * dpr).ceil() as u32;
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", css_size.x))?;
        style.set_property("height", &format!("{}px", css_size.y))?;
        self.css_size = css_size;
        self.dpr = dpr;
        Ok(())
    }

    pub(crate) fn render(
        &self,
        session: &PuzzleSession<CanvasTexture>,
        board_image: Option<&HtmlImageElement>,
    ) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0)?;
        ctx.set_global_alpha(1.0);
        ctx.set_global_composite_operation("source-over")?;
        ctx.set_fill_style_str(self.palette.background);
        ctx.fill_rect(0.0, 0.0, self.css_size.x as f64, self.css_size.y as f64);

        let Some(layout) = session.layout() else {
            return Ok(());
        };
        self.draw_stage(layout, board_image)?;
        for piece in session.pieces_in_draw_order() {
            self.draw_piece(piece)?;
        }
        if let Some(handles) = session.selected_handles() {
            self.draw_handles(&handles)?;
        }
        Ok(())
    }

    fn draw_stage(&self, layout: &StageLayout, board_image: Option<&HtmlImageElement>) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let tray = layout.tray;
        ctx.set_fill_style_str(self.palette.tray);
        ctx.fill_rect(tray.x as f64, tray.y as f64, tray.width as f64, tray.height as f64);

        let board = layout.board;
        let (x, y, w, h) = (board.x as f64, board.y as f64, board.width as f64, board.height as f64);
        ctx.set_fill_style_str(self.palette.board_backdrop);
        ctx.fill_rect(x, y, w, h);
        if let Some(image) = board_image {
            ctx.set_global_alpha(BOARD_IMAGE_ALPHA);
            ctx.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, w, h)?;
            ctx.set_global_alpha(1.0);
        }
        ctx.set_stroke_style_str(self.palette.board_frame);
        ctx.set_line_width(FRAME_WIDTH);
        ctx.stroke_rect(x, y, w, h);
        Ok(())
    }

    fn draw_piece(&self, piece: &RuntimePiece<CanvasTexture>) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let width = (piece.natural_size.x * piece.scale) as f64;
        let height = (piece.natural_size.y * piece.scale) as f64;
        if width <= 0.0 || height <= 0.0 {
            return Ok(());
        }
        ctx.save();
        ctx.translate(piece.position.x as f64, piece.position.y as f64)?;
        ctx.rotate((piece.rotation as f64).to_radians())?;
        if piece.mirrored {
            ctx.scale(-1.0, 1.0)?;
        }
        let drawn = piece.texture.draw_centered(ctx, width, height).and_then(|()| {
            if piece.flash > 0.0 {
                ctx.set_global_alpha(piece.flash as f64 * FLASH_ALPHA);
                ctx.set_global_composite_operation("lighter")?;
                piece.texture.draw_centered(ctx, width, height)?;
            }
            Ok(())
        });
        ctx.restore();
        drawn
    }

    fn draw_handles(&self, handles: &PieceHandles) -> Result<(), JsValue> {
        let radius = handles.radius as f64;
        self.draw_handle_disc(handles.drag, radius)?;
        self.draw_move_glyph(handles.drag, radius * GLYPH_RATIO)?;
        if let Some(rotate) = handles.rotate {
            self.draw_handle_disc(rotate, radius)?;
            self.draw_rotate_glyph(rotate, radius * GLYPH_RATIO)?;
        }
        Ok(())
    }

    fn draw_handle_disc(&self, center: Vec2, radius: f64) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.begin_path();
        ctx.arc(center.x as f64, center.y as f64, radius, 0.0, TAU)?;
        ctx.set_fill_style_str(self.palette.handle_fill);
        ctx.fill();
        ctx.set_stroke_style_str(self.palette.handle_stroke);
        ctx.set_line_width(HANDLE_STROKE_WIDTH);
        ctx.stroke();
        Ok(())
    }

    fn draw_move_glyph(&self, center: Vec2, size: f64) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let (x, y) = (center.x as f64, center.y as f64);
        ctx.begin_path();
        ctx.move_to(x - size, y);
        ctx.line_to(x + size, y);
        ctx.move_to(x, y - size);
        ctx.line_to(x, y + size);
        ctx.set_stroke_style_str(self.palette.handle_glyph);
        ctx.set_line_width(HANDLE_STROKE_WIDTH);
        ctx.stroke();
        Ok(())
    }

    fn draw_rotate_glyph(&self, center: Vec2, size: f64) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let (x, y) = (center.x as f64, center.y as f64);
        ctx.begin_path();
        ctx.arc(x, y, size, -0.25 * TAU, 0.5 * TAU)?;
        ctx.set_stroke_style_str(self.palette.handle_glyph);
        ctx.set_line_width(HANDLE_STROKE_WIDTH);
        ctx.stroke();
        // arrow head at the start of the arc
        ctx.begin_path();
        ctx.move_to(x - size * 0.6, y - size * 1.4);
        ctx.line_to(x + size * 0.2, y - size);
        ctx.line_to(x - size * 0.6, y - size * 0.6);
        ctx.stroke();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_differ_only_in_color() {
        let dark = Palette::for_theme(Theme::Dark);
        let light = Palette::for_theme(Theme::Light);
        assert_ne!(dark, light);
        assert_eq!(Palette::for_theme(Theme::default()), dark);
    }
}
