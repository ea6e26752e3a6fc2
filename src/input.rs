use kakera_core::{PointerId, Vec2};
use web_sys::{DomRect, Element, HtmlCanvasElement, PointerEvent, WheelEvent};

const WHEEL_LINE_PX: f32 = 16.0;

pub(crate) trait HasClientRect {
    fn client_rect(&self) -> DomRect;
}

impl HasClientRect for HtmlCanvasElement {
    fn client_rect(&self) -> DomRect {
        self.get_bounding_client_rect()
    }
}

impl HasClientRect for Element {
    fn client_rect(&self) -> DomRect {
        self.get_bounding_client_rect()
    }
}

/// Maps a client-space point into stage coordinates, where the stage spans
/// `stage` CSS pixels over the element's box.
pub(crate) fn map_client_point(
    client: Vec2,
    rect_origin: Vec2,
    rect_size: Vec2,
    stage: Vec2,
) -> Option<Vec2> {
    if rect_size.x <= 0.0 || rect_size.y <= 0.0 || !client.is_finite() {
        return None;
    }
    Some(Vec2::new(
        (client.x - rect_origin.x) * stage.x / rect_size.x,
        (client.y - rect_origin.y) * stage.y / rect_size.y,
    ))
}

pub(crate) fn client_to_stage(
    client_x: f32,
    client_y: f32,
    element: &impl HasClientRect,
    stage: Vec2,
) -> Option<Vec2> {
    let rect = element.client_rect();
    map_client_point(
        Vec2::new(client_x, client_y),
        Vec2::new(rect.left() as f32, rect.top() as f32),
        Vec2::new(rect.width() as f32, rect.height() as f32),
        stage,
    )
}

pub(crate) fn pointer_position(
    event: &PointerEvent,
    element: &impl HasClientRect,
    stage: Vec2,
) -> Option<Vec2> {
    client_to_stage(event.client_x() as f32, event.client_y() as f32, element, stage)
}

pub(crate) fn pointer_id(event: &PointerEvent) -> PointerId {
    PointerId(event.pointer_id())
}

/// Converts a wheel delta to pixels. Mode 1 counts lines, mode 2 pages.
pub(crate) fn normalize_wheel_delta(delta: f32, delta_mode: u32, page_extent: f32) -> f32 {
    match delta_mode {
        1 => delta * WHEEL_LINE_PX,
        2 => delta * page_extent,
        _ => delta,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct WheelInput {
    pub position: Vec2,
    pub delta_y: f32,
    pub zoom_modifier: bool,
}

pub(crate) fn wheel_input(event: &WheelEvent, element: &impl HasClientRect, stage: Vec2) -> Option<WheelInput> {
    let rect = element.client_rect();
    let position = map_client_point(
        Vec2::new(event.client_x() as f32, event.client_y() as f32),
        Vec2::new(rect.left() as f32, rect.top() as f32),
        Vec2::new(rect.width() as f32, rect.height() as f32),
        stage,
    )?;
    Some(WheelInput {
        position,
        delta_y: normalize_wheel_delta(event.delta_y() as f32, event.delta_mode(), rect.height() as f32),
        zoom_modifier: event.ctrl_key() || event.meta_key(),
    })
}
