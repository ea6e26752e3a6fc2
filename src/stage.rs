use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::console;
use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{request_animation_frame, AnimationFrame};
use kakera_core::{
    build_piece_texture, AssetKey, EngineError, EngineRules, KeyCommand, LoadOutcome, LoadTicket, Progress,
    PuzzleDefinition, PuzzleSession, ResourceManager, SessionEvent, Theme, Vec2,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlCanvasElement, HtmlElement, HtmlImageElement, KeyboardEvent, PointerEvent, WheelEvent};

use crate::input::{pointer_id, pointer_position, wheel_input, HasClientRect};
use crate::renderer::Renderer;
use crate::resources::{js_error, BrowserFetch};
use crate::textures::{BrowserTextureBackend, CanvasTexture};

const CANVAS_STYLE: &str = "display: block; touch-action: none; user-select: none; outline: none;";

#[derive(Clone)]
pub(crate) struct StageHooks {
    pub on_complete: Rc<dyn Fn()>,
    pub on_error: Rc<dyn Fn(String)>,
}

/// A mounted puzzle: owns the canvas, the session and every browser
/// callback feeding it.
pub(crate) struct PuzzleStage {
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    renderer: RefCell<Renderer>,
    session: RefCell<PuzzleSession<CanvasTexture>>,
    definition: Rc<PuzzleDefinition>,
    resources: Rc<ResourceManager<BrowserFetch>>,
    board_image: RefCell<Option<HtmlImageElement>>,
    hooks: StageHooks,
    listeners: RefCell<Vec<EventListener>>,
    frame: RefCell<Option<AnimationFrame>>,
    layout_frame: RefCell<Option<AnimationFrame>>,
    completion_sent: Cell<bool>,
    destroyed: Cell<bool>,
}

impl PuzzleStage {
    pub(crate) fn mount(
        container: HtmlElement,
        definition: Rc<PuzzleDefinition>,
        rules: EngineRules,
        theme: Theme,
        hooks: StageHooks,
    ) -> Result<Rc<Self>, EngineError> {
        definition.validate()?;
        let canvas = create_canvas().map_err(|err| EngineError::Initialization(js_error(err)))?;
        container
            .append_child(&canvas)
            .map_err(|err| EngineError::Initialization(js_error(err)))?;
        let renderer = match Renderer::new(canvas.clone(), theme) {
            Ok(renderer) => renderer,
            Err(err) => {
                canvas.remove();
                return Err(EngineError::Initialization(js_error(err)));
            }
        };
        let stage = Rc::new(Self {
            container,
            canvas,
            renderer: RefCell::new(renderer),
            session: RefCell::new(PuzzleSession::new(rules)),
            definition,
            resources: Rc::new(ResourceManager::new(BrowserFetch)),
            board_image: RefCell::new(None),
            hooks,
            listeners: RefCell::new(Vec::new()),
            frame: RefCell::new(None),
            layout_frame: RefCell::new(None),
            completion_sent: Cell::new(false),
            destroyed: Cell::new(false),
        });
        stage.install_listeners();
        stage.start_load();
        Ok(stage)
    }

    pub(crate) fn progress(&self) -> Progress {
        self.session
            .try_borrow()
            .map(|session| session.progress())
            .unwrap_or_default()
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Tears the stage down synchronously: listeners, pending frames, pieces
    /// and object URLs all go before this returns.
    pub(crate) fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.listeners.borrow_mut().clear();
        self.frame.borrow_mut().take();
        self.layout_frame.borrow_mut().take();
        if let Ok(mut session) = self.session.try_borrow_mut() {
            session.teardown();
        }
        self.resources.release_all();
        self.board_image.borrow_mut().take();
        self.canvas.remove();
    }

    fn container_size(&self) -> Vec2 {
        let rect = self.container.client_rect();
        Vec2::new(rect.width() as f32, rect.height() as f32)
    }

    /// Starts a fresh load pass sized to the container. A container that has
    /// not been laid out yet is retried on the next frame.
    fn start_load(self: &Rc<Self>) {
        if self.destroyed.get() {
            return;
        }
        let size = self.container_size();
        if size.x <= 0.0 || size.y <= 0.0 {
            self.retry_load_next_frame();
            return;
        }
        if let Err(err) = self.renderer.borrow_mut().resize(size) {
            console::warn!(format!("canvas resize failed: {}", js_error(err)));
        }
        self.resources.release_all();
        self.board_image.borrow_mut().take();
        let ticket = self
            .session
            .borrow_mut()
            .begin_load(Rc::clone(&self.definition), size);
        self.request_frame();
        let stage = Rc::clone(self);
        spawn_local(async move {
            stage.run_load(ticket).await;
        });
    }

    fn retry_load_next_frame(self: &Rc<Self>) {
        if self.layout_frame.borrow().is_some() {
            return;
        }
        let stage = Rc::downgrade(self);
        let handle = request_animation_frame(move |_| {
            let Some(stage) = stage.upgrade() else {
                return;
            };
            stage.layout_frame.borrow_mut().take();
            stage.start_load();
        });
        *self.layout_frame.borrow_mut() = Some(handle);
    }

    fn is_current(&self, ticket: LoadTicket) -> bool {
        !self.destroyed.get()
            && self
                .session
                .try_borrow()
                .is_ok_and(|session| session.is_current(ticket))
    }

    async fn run_load(self: Rc<Self>, ticket: LoadTicket) {
        let definition = Rc::clone(&self.definition);
        let board = match self
            .resources
            .load_texture(AssetKey::Board, &definition.board_image)
            .await
        {
            Ok(image) => image,
            Err(err) => return self.fail(ticket, EngineError::BoardUnavailable(err)),
        };
        if !self.is_current(ticket) {
            return self.drop_stale(ticket);
        }
        *self.board_image.borrow_mut() = Some(board);
        self.request_frame();

        let source = if definition.needs_source_image() {
            match self
                .resources
                .load_texture(AssetKey::Original, &definition.original_image)
                .await
            {
                Ok(image) => Some(image),
                Err(err) => return self.fail(ticket, EngineError::OriginalUnavailable(err)),
            }
        } else {
            None
        };
        if !self.is_current(ticket) {
            return self.drop_stale(ticket);
        }

        let backend = BrowserTextureBackend::new(Rc::clone(&self.resources));
        let mut results = Vec::with_capacity(definition.pieces.len());
        for piece in &definition.pieces {
            results.push(build_piece_texture(&backend, piece, source.as_ref()).await);
            if !self.is_current(ticket) {
                return self.drop_stale(ticket);
            }
        }

        let outcome = self.session.borrow_mut().complete_load(ticket, results);
        match outcome {
            Ok(LoadOutcome::Stale) => self.drop_stale(ticket),
            Ok(LoadOutcome::Loaded(report)) => {
                for skipped in &report.skipped {
                    console::warn!(format!("piece skipped: {skipped}"));
                }
                console::log!(format!(
                    "puzzle loaded: {} pieces, {} skipped",
                    report.loaded,
                    report.skipped.len()
                ));
                self.request_frame();
            }
            Err(err) => self.fail(ticket, err),
        }
    }

    fn drop_stale(&self, ticket: LoadTicket) {
        console::log!(format!("load {} superseded", ticket.seq()));
    }

    fn fail(&self, ticket: LoadTicket, err: EngineError) {
        if !self.is_current(ticket) {
            return self.drop_stale(ticket);
        }
        console::error!(format!("puzzle failed: {err}"));
        (self.hooks.on_error)(err.to_string());
    }

    fn request_frame(self: &Rc<Self>) {
        if self.destroyed.get() || self.frame.borrow().is_some() {
            return;
        }
        let stage = Rc::downgrade(self);
        let handle = request_animation_frame(move |timestamp| {
            if let Some(stage) = stage.upgrade() {
                stage.on_frame(timestamp);
            }
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn on_frame(self: &Rc<Self>, timestamp: f64) {
        self.frame.borrow_mut().take();
        if self.destroyed.get() {
            return;
        }
        let (animating, events) = {
            let mut session = self.session.borrow_mut();
            let animating = session.tick(timestamp);
            (animating, session.drain_events())
        };
        self.render();
        // Hooks run with no borrows held; they may destroy the stage.
        self.dispatch(events);
        if animating {
            self.request_frame();
        }
    }

    fn render(&self) {
        let session = self.session.borrow();
        let board = self.board_image.borrow();
        if let Err(err) = self.renderer.borrow().render(&session, board.as_ref()) {
            console::warn!(format!("render failed: {}", js_error(err)));
        }
    }

    fn dispatch(&self, events: Vec<SessionEvent>) {
        for event in events {
            if let SessionEvent::Completed = event {
                if !self.completion_sent.replace(true) {
                    console::log!("puzzle complete");
                    (self.hooks.on_complete)();
                }
            }
        }
    }

    fn stage_size(&self) -> Vec2 {
        self.renderer.borrow().css_size()
    }

    fn handle_resize(self: &Rc<Self>) {
        let size = self.container_size();
        if size == self.stage_size() {
            return;
        }
        self.start_load();
    }

    fn handle_pointer(self: &Rc<Self>, event: &PointerEvent, phase: PointerPhase) {
        let pointer = pointer_id(event);
        let redraw = match phase {
            PointerPhase::Down => {
                let Some(position) = pointer_position(event, &self.canvas, self.stage_size()) else {
                    return;
                };
                event.prevent_default();
                let _ = self.canvas.set_pointer_capture(pointer.0);
                let _ = self.canvas.focus();
                self.session.borrow_mut().pointer_down(pointer, position)
            }
            PointerPhase::Move => {
                let Some(position) = pointer_position(event, &self.canvas, self.stage_size()) else {
                    return;
                };
                self.session.borrow_mut().pointer_move(pointer, position)
            }
            PointerPhase::Up => {
                let _ = self.canvas.release_pointer_capture(pointer.0);
                self.session.borrow_mut().pointer_up(pointer)
            }
            PointerPhase::Cancel => {
                let _ = self.canvas.release_pointer_capture(pointer.0);
                self.session.borrow_mut().pointer_cancel(pointer)
            }
        };
        if redraw {
            self.request_frame();
        }
    }

    fn handle_wheel(self: &Rc<Self>, event: &WheelEvent) {
        let Some(input) = wheel_input(event, &self.canvas, self.stage_size()) else {
            return;
        };
        let consumed = self
            .session
            .borrow_mut()
            .wheel(input.position, input.delta_y, input.zoom_modifier);
        if consumed {
            event.prevent_default();
            self.request_frame();
        }
    }

    fn handle_key(self: &Rc<Self>, event: &KeyboardEvent) {
        if event.ctrl_key() || event.meta_key() || event.alt_key() {
            return;
        }
        let Some(command) = KeyCommand::from_key(&event.key(), event.shift_key()) else {
            return;
        };
        if self.session.borrow_mut().key(command) {
            event.prevent_default();
            self.request_frame();
        }
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = Vec::new();
        let active = EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: false,
        };
        for (name, phase) in [
            ("pointerdown", PointerPhase::Down),
            ("pointermove", PointerPhase::Move),
            ("pointerup", PointerPhase::Up),
            ("pointercancel", PointerPhase::Cancel),
        ] {
            let stage = Rc::downgrade(self);
            let listener = EventListener::new_with_options(&self.canvas, name, active, move |event: &Event| {
                let (Some(stage), Some(event)) = (stage.upgrade(), event.dyn_ref::<PointerEvent>()) else {
                    return;
                };
                stage.handle_pointer(event, phase);
            });
            listeners.push(listener);
        }

        let stage = Rc::downgrade(self);
        let listener = EventListener::new_with_options(&self.canvas, "wheel", active, move |event: &Event| {
            let (Some(stage), Some(event)) = (stage.upgrade(), event.dyn_ref::<WheelEvent>()) else {
                return;
            };
            stage.handle_wheel(event);
        });
        listeners.push(listener);

        let listener = EventListener::new_with_options(&self.canvas, "contextmenu", active, |event: &Event| {
            event.prevent_default();
        });
        listeners.push(listener);

        // Keys only reach the stage while the canvas has focus.
        let stage = Rc::downgrade(self);
        let listener = EventListener::new_with_options(&self.canvas, "keydown", active, move |event: &Event| {
            let (Some(stage), Some(event)) = (stage.upgrade(), event.dyn_ref::<KeyboardEvent>()) else {
                return;
            };
            stage.handle_key(event);
        });
        listeners.push(listener);

        if let Some(window) = web_sys::window() {
            let stage: Weak<Self> = Rc::downgrade(self);
            let listener = EventListener::new(&window, "resize", move |_event| {
                if let Some(stage) = stage.upgrade() {
                    stage.handle_resize();
                }
            });
            listeners.push(listener);
        }

        *self.listeners.borrow_mut() = listeners;
    }
}

impl Drop for PuzzleStage {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

fn create_canvas() -> Result<HtmlCanvasElement, wasm_bindgen::JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| wasm_bindgen::JsValue::from_str("no document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    canvas.set_attribute("style", CANVAS_STYLE)?;
    canvas.set_attribute("tabindex", "0")?;
    Ok(canvas)
}
