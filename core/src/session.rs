use std::collections::HashMap;
use std::rc::Rc;

use crate::compositor::PieceArt;
use crate::definition::{PieceId, PuzzleDefinition};
use crate::error::{EngineError, PieceLoadError};
use crate::geom::{normalize_angle, Vec2};
use crate::interaction::{
    DragMode, Hit, InteractionController, InteractionEffect, KeyCommand, PiecePart, PointerId,
};
use crate::layout::StageLayout;
use crate::piece::{PieceHandles, PieceTexture, RuntimePiece};
use crate::rules::{clamp_zoom, EngineRules, ZOOM_DEFAULT};
use crate::scale::ScaleCoordinator;
use crate::scramble::{initial_rotation, load_seed};
use crate::snap::{send_home, try_snap, SnapCriteria, SnapTimings};
use crate::tray::{TrayLayout, TrayParams};
use crate::tween::{Animator, TweenProperty, TweenSample};

/// Captures the load sequence at the start of a load pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
}

impl LoadTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<PieceLoadError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A newer load or a teardown happened while this one was in flight.
    Stale,
    Loaded(LoadReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PieceSnapped(PieceId),
    PieceReturned(PieceId),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub placed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.placed as f32 / self.total as f32
        }
    }
}

struct Placement {
    layout: StageLayout,
    tray: TrayLayout,
    scale: ScaleCoordinator,
    snap: SnapCriteria,
}

/// One puzzle instance: the piece arena, the active interaction and the
/// load sequence that guards async continuations.
pub struct PuzzleSession<T> {
    rules: EngineRules,
    load_seq: u64,
    definition: Option<Rc<PuzzleDefinition>>,
    container: Vec2,
    placement: Option<Placement>,
    pieces: HashMap<PieceId, RuntimePiece<T>>,
    draw_order: Vec<PieceId>,
    animator: Animator,
    interaction: InteractionController,
    zoom: f32,
    selected: Option<PieceId>,
    completed: bool,
    events: Vec<SessionEvent>,
}

impl<T: PieceTexture> PuzzleSession<T> {
    pub fn new(rules: EngineRules) -> Self {
        Self {
            rules: rules.sanitized(),
            load_seq: 0,
            definition: None,
            container: Vec2::ZERO,
            placement: None,
            pieces: HashMap::new(),
            draw_order: Vec::new(),
            animator: Animator::new(),
            interaction: InteractionController::new(),
            zoom: ZOOM_DEFAULT,
            selected: None,
            completed: false,
            events: Vec::new(),
        }
    }

    pub fn rules(&self) -> &EngineRules {
        &self.rules
    }

    pub fn definition(&self) -> Option<&Rc<PuzzleDefinition>> {
        self.definition.as_ref()
    }

    /// Starts a load pass: drops every piece of the previous pass and
    /// invalidates its in-flight continuations.
    pub fn begin_load(&mut self, definition: Rc<PuzzleDefinition>, container: Vec2) -> LoadTicket {
        self.clear_pieces();
        self.load_seq += 1;
        self.definition = Some(definition);
        self.container = container;
        LoadTicket { seq: self.load_seq }
    }

    /// Restarts the current puzzle, e.g. after the container was resized.
    pub fn reload(&mut self, container: Vec2) -> Option<LoadTicket> {
        let definition = self.definition.clone()?;
        Some(self.begin_load(definition, container))
    }

    pub fn teardown(&mut self) {
        self.clear_pieces();
        self.load_seq += 1;
        self.definition = None;
    }

    fn clear_pieces(&mut self) {
        self.pieces.clear();
        self.draw_order.clear();
        self.placement = None;
        self.animator.clear();
        self.interaction.reset();
        self.selected = None;
        self.completed = false;
        self.events.clear();
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.seq == self.load_seq && self.definition.is_some()
    }

    /// Builds the runtime pieces for a finished load pass and lays them out
    /// in the tray.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        results: Vec<Result<PieceArt<T>, PieceLoadError>>,
    ) -> Result<LoadOutcome, EngineError> {
        if !self.is_current(ticket) {
            return Ok(LoadOutcome::Stale);
        }
        let definition = self
            .definition
            .clone()
            .ok_or_else(|| EngineError::Initialization("no puzzle definition".to_string()))?;

        let mut skipped = Vec::new();
        let mut arts: Vec<PieceArt<T>> = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(art) if arts.iter().any(|loaded| loaded.id == art.id) => {
                    skipped.push(PieceLoadError::Duplicate { piece: art.id });
                }
                Ok(art) => arts.push(art),
                Err(err) => skipped.push(err),
            }
        }
        if arts.is_empty() {
            return Err(EngineError::NoPieces);
        }

        let layout = StageLayout::compute(self.container, definition.board_size(), &self.rules)?;
        let sizes: Vec<Vec2> = arts.iter().map(|art| art.natural_size).collect();
        let tray = TrayLayout::compute(layout.tray, &sizes, &TrayParams::from(&self.rules)).ok_or(
            EngineError::Layout {
                width: self.container.x,
                height: self.container.y,
            },
        )?;
        let scale = ScaleCoordinator {
            board: layout.board,
            board_scale: layout.board_scale,
            tray_scale: tray.grid.piece_scale,
            zoom: self.zoom,
            margin: self.rules.zone_margin,
            hysteresis: self.rules.zone_hysteresis,
            tween_ms: self.rules.scale_tween_ms,
        };
        let snap = SnapCriteria {
            board_origin: layout.board.origin(),
            board_scale: layout.board_scale,
            position_threshold_px: definition.snap_position_threshold_px,
            rotation_enabled: definition.enable_rotation,
            rotation_tolerance_deg: definition.rotation_snap_tolerance_deg,
        };

        let seed = load_seed(self.load_seq);
        let tray_scale = scale.target_scale(false);
        for (index, (art, slot)) in arts.into_iter().zip(tray.slots.iter().copied()).enumerate() {
            let Some(piece_def) = definition.pieces.iter().find(|piece| piece.id == art.id) else {
                skipped.push(PieceLoadError::NoArtwork { piece: art.id });
                continue;
            };
            let rotation = if definition.enable_rotation {
                initial_rotation(seed, index, piece_def.correct_rotation, self.rules.rotate_step_deg)
            } else {
                piece_def.correct_rotation
            };
            self.draw_order.push(art.id.clone());
            self.pieces.insert(
                art.id.clone(),
                RuntimePiece {
                    id: art.id,
                    texture: art.texture,
                    natural_size: art.natural_size,
                    hit_shape: art.hit_shape,
                    position: slot,
                    rotation,
                    scale: tray_scale,
                    in_board_zone: false,
                    snapped: false,
                    home: slot,
                    flash: 0.0,
                    mirrored: art.mirrored,
                    correct_position: piece_def.correct_position,
                    correct_rotation: piece_def.correct_rotation,
                },
            );
        }
        if self.pieces.is_empty() {
            return Err(EngineError::NoPieces);
        }
        self.placement = Some(Placement {
            layout,
            tray,
            scale,
            snap,
        });
        Ok(LoadOutcome::Loaded(LoadReport {
            loaded: self.pieces.len(),
            skipped,
        }))
    }

    pub fn is_loaded(&self) -> bool {
        self.placement.is_some()
    }

    pub fn layout(&self) -> Option<&StageLayout> {
        self.placement.as_ref().map(|placement| &placement.layout)
    }

    pub fn tray(&self) -> Option<&TrayLayout> {
        self.placement.as_ref().map(|placement| &placement.tray)
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn selected(&self) -> Option<&PieceId> {
        self.selected.as_ref()
    }

    pub fn piece(&self, id: &PieceId) -> Option<&RuntimePiece<T>> {
        self.pieces.get(id)
    }

    pub fn pieces_in_draw_order(&self) -> impl Iterator<Item = &RuntimePiece<T>> + '_ {
        self.draw_order.iter().filter_map(|id| self.pieces.get(id))
    }

    pub fn progress(&self) -> Progress {
        Progress {
            placed: self.pieces.values().filter(|piece| piece.snapped).count(),
            total: self.pieces.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Stage position a piece snaps to.
    pub fn snap_target(&self, id: &PieceId) -> Option<Vec2> {
        let placement = self.placement.as_ref()?;
        let piece = self.pieces.get(id)?;
        Some(placement.snap.target_position(piece.correct_position))
    }

    fn rotation_enabled(&self) -> bool {
        self.definition
            .as_ref()
            .is_some_and(|definition| definition.enable_rotation)
    }

    /// Handles are only shown for the selected, still loose piece.
    pub fn selected_handles(&self) -> Option<PieceHandles> {
        let piece = self.pieces.get(self.selected.as_ref()?)?;
        piece.handles(self.rules.handle_radius, self.rules.handle_gap, self.rotation_enabled())
    }

    pub fn hit_test(&self, point: Vec2) -> Hit {
        if let (Some(handles), Some(id)) = (self.selected_handles(), self.selected.as_ref()) {
            if let Some(piece) = self.pieces.get(id) {
                let part = if handles.rotate_contains(point) {
                    Some(PiecePart::RotateHandle)
                } else if handles.drag_contains(point) {
                    Some(PiecePart::DragHandle)
                } else {
                    None
                };
                if let Some(part) = part {
                    return Hit::Piece {
                        id: id.clone(),
                        part,
                        center: piece.position,
                        rotation: piece.rotation,
                    };
                }
            }
        }
        self.draw_order
            .iter()
            .rev()
            .filter_map(|id| self.pieces.get(id))
            .find(|piece| !piece.snapped && piece.contains(point))
            .map(|piece| Hit::Piece {
                id: piece.id.clone(),
                part: PiecePart::Body,
                center: piece.position,
                rotation: piece.rotation,
            })
            .unwrap_or(Hit::Background)
    }

    /// Returns whether the stage needs a redraw.
    pub fn pointer_down(&mut self, pointer: PointerId, position: Vec2) -> bool {
        if !self.is_loaded() {
            return false;
        }
        let hit = self.hit_test(position);
        let effect = self.interaction.pointer_down(pointer, position, hit);
        self.apply(effect)
    }

    pub fn pointer_move(&mut self, pointer: PointerId, position: Vec2) -> bool {
        let effect = self.interaction.pointer_move(pointer, position);
        self.apply(effect)
    }

    pub fn pointer_up(&mut self, pointer: PointerId) -> bool {
        let effect = self.interaction.pointer_up(pointer);
        self.apply(effect)
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) -> bool {
        let effect = self.interaction.pointer_cancel(pointer);
        self.apply(effect)
    }

    /// Whether a piece or pinch session currently owns the pointer.
    pub fn is_interacting(&self) -> bool {
        !self.interaction.is_idle()
    }

    pub fn active_piece(&self) -> Option<&PieceId> {
        self.interaction.active_piece()
    }

    fn apply(&mut self, effect: InteractionEffect) -> bool {
        match effect {
            InteractionEffect::None => false,
            InteractionEffect::Grab { piece, .. } => {
                self.animator.cancel(&piece, TweenProperty::Position);
                self.animator.cancel(&piece, TweenProperty::Rotation);
                self.raise(&piece);
                self.selected = Some(piece);
                true
            }
            InteractionEffect::Drag { piece, pointer, mode } => self.drag_piece(&piece, pointer, mode),
            InteractionEffect::Rotate { piece, rotation } => match self.pieces.get_mut(&piece) {
                Some(runtime) if !runtime.snapped => {
                    runtime.rotation = rotation;
                    true
                }
                _ => false,
            },
            InteractionEffect::Zoom { distance_delta } => {
                self.zoom_by(distance_delta * self.rules.pinch_sensitivity);
                true
            }
            InteractionEffect::ReleaseDrag { piece } => {
                self.release_piece(&piece);
                true
            }
            InteractionEffect::ReleaseRotate { .. } => true,
            InteractionEffect::CancelDrag { piece } => {
                self.return_piece(&piece);
                true
            }
        }
    }

    fn drag_piece(&mut self, id: &PieceId, pointer: Vec2, mode: DragMode) -> bool {
        let (Some(placement), Some(piece)) = (self.placement.as_ref(), self.pieces.get_mut(id)) else {
            return false;
        };
        if piece.snapped {
            return false;
        }
        piece.position = match mode {
            DragMode::Body { grab_offset } => pointer + grab_offset,
            DragMode::Handle => pointer - piece.drag_handle_offset(self.rules.handle_radius, self.rules.handle_gap),
        };
        placement.scale.update_piece(piece, &mut self.animator);
        true
    }

    fn timings(&self) -> SnapTimings {
        SnapTimings {
            snap_ms: self.rules.snap_tween_ms,
            return_ms: self.rules.return_tween_ms,
            flash_ms: self.rules.flash_ms,
        }
    }

    /// Tries to snap a released piece; a miss sends it back to its slot.
    pub fn release_piece(&mut self, id: &PieceId) -> bool {
        let timings = self.timings();
        let (Some(placement), Some(piece)) = (self.placement.as_ref(), self.pieces.get_mut(id)) else {
            return false;
        };
        if piece.snapped {
            return false;
        }
        let home_scale = placement.scale.target_scale(false);
        if try_snap(piece, &placement.snap, home_scale, &timings, &mut self.animator) {
            self.sink(id);
            if self.selected.as_ref() == Some(id) {
                self.selected = None;
            }
            self.events.push(SessionEvent::PieceSnapped(id.clone()));
            self.check_complete();
            true
        } else {
            self.events.push(SessionEvent::PieceReturned(id.clone()));
            false
        }
    }

    fn return_piece(&mut self, id: &PieceId) {
        let timings = self.timings();
        let (Some(placement), Some(piece)) = (self.placement.as_ref(), self.pieces.get_mut(id)) else {
            return;
        };
        if piece.snapped {
            return;
        }
        send_home(piece, placement.scale.target_scale(false), &timings, &mut self.animator);
        self.events.push(SessionEvent::PieceReturned(id.clone()));
    }

    fn check_complete(&mut self) {
        if self.completed {
            return;
        }
        let progress = self.progress();
        if progress.total > 0 && progress.placed == progress.total {
            self.completed = true;
            self.events.push(SessionEvent::Completed);
        }
    }

    fn raise(&mut self, id: &PieceId) {
        if let Some(index) = self.draw_order.iter().position(|entry| entry == id) {
            let entry = self.draw_order.remove(index);
            self.draw_order.push(entry);
        }
    }

    fn sink(&mut self, id: &PieceId) {
        if let Some(index) = self.draw_order.iter().position(|entry| entry == id) {
            let entry = self.draw_order.remove(index);
            self.draw_order.insert(0, entry);
        }
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = clamp_zoom(zoom);
        if let Some(placement) = self.placement.as_mut() {
            placement.scale.set_zoom(self.zoom);
            for piece in self.pieces.values() {
                if !piece.in_board_zone {
                    placement.scale.retarget(piece, &mut self.animator);
                }
            }
        }
        self.zoom
    }

    pub fn zoom_by(&mut self, delta: f32) -> f32 {
        self.set_zoom(self.zoom + delta)
    }

    fn rotate_selected(&mut self, degrees: f32) -> bool {
        if !self.rotation_enabled() {
            return false;
        }
        let Some(id) = self.selected.clone() else {
            return false;
        };
        let Some(piece) = self.pieces.get_mut(&id) else {
            return false;
        };
        if piece.snapped {
            return false;
        }
        self.animator.cancel(&id, TweenProperty::Rotation);
        piece.rotation = normalize_angle(piece.rotation + degrees);
        true
    }

    pub fn key(&mut self, command: KeyCommand) -> bool {
        match command {
            KeyCommand::Rotate { clockwise, fast } => {
                let step = if fast {
                    self.rules.rotate_fast_step_deg
                } else {
                    self.rules.rotate_step_deg
                };
                self.rotate_selected(if clockwise { step } else { -step })
            }
            KeyCommand::ZoomIn => {
                let before = self.zoom;
                before != self.zoom_by(self.rules.zoom_step)
            }
            KeyCommand::ZoomOut => {
                let before = self.zoom;
                before != self.zoom_by(-self.rules.zoom_step)
            }
            KeyCommand::ZoomReset => {
                let before = self.zoom;
                before != self.set_zoom(ZOOM_DEFAULT)
            }
        }
    }

    /// Ctrl+wheel zooms; a plain wheel over the selected piece rotates it.
    /// Returns whether the wheel was consumed.
    pub fn wheel(&mut self, position: Vec2, delta_y: f32, zoom_modifier: bool) -> bool {
        if !self.is_loaded() || delta_y == 0.0 {
            return false;
        }
        if zoom_modifier {
            self.zoom_by(-delta_y.signum() * self.rules.zoom_step);
            return true;
        }
        let over_selected = self
            .selected
            .as_ref()
            .and_then(|id| self.pieces.get(id))
            .is_some_and(|piece| piece.contains(position));
        over_selected && self.rotate_selected(delta_y.signum() * self.rules.rotate_step_deg)
    }

    /// Advances animations. Returns whether more frames are needed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        for (id, sample) in self.animator.advance(now_ms) {
            let Some(piece) = self.pieces.get_mut(&id) else {
                continue;
            };
            match sample {
                TweenSample::Position(position) => piece.position = position,
                TweenSample::Rotation(rotation) => piece.rotation = rotation,
                TweenSample::Scale(scale) => piece.scale = scale,
                TweenSample::Flash(flash) => piece.flash = flash,
            }
        }
        self.animator.is_animating()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}
