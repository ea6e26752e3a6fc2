#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::block_on;
use kakera_core::compositor::build_piece_texture;
use kakera_image_pipeline::PieceCut;
use kakera_core::{
    AssetLoadError, DrawSurfaceError, EngineRules, LoadOutcome, LoadReport, PieceDefinition, PieceId,
    PieceTexture, PointerId, PuzzleDefinition, PuzzleSession, Rect, TextureBackend, Vec2,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeTexture {
    pub width: u32,
    pub height: u32,
    pub from_image: Option<String>,
}

impl PieceTexture for FakeTexture {
    fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Stand-in for a decoded original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeSource {
    pub width: u32,
    pub height: u32,
}

#[derive(Default)]
pub struct FakeBackend {
    pub fail_surfaces: bool,
    pub image_loads: Cell<usize>,
    pub cuts: RefCell<Vec<(PieceCut, Vec<[f32; 2]>)>>,
}

impl TextureBackend for FakeBackend {
    type Texture = FakeTexture;
    type Source = FakeSource;

    fn cut_piece(
        &self,
        _source: &FakeSource,
        cut: &PieceCut,
        local_points: &[[f32; 2]],
    ) -> Result<FakeTexture, DrawSurfaceError> {
        if self.fail_surfaces {
            return Err(DrawSurfaceError("canvas context lost".to_string()));
        }
        self.cuts.borrow_mut().push((*cut, local_points.to_vec()));
        Ok(FakeTexture {
            width: cut.width,
            height: cut.height,
            from_image: None,
        })
    }

    async fn load_piece_image(&self, piece: &PieceId, source: &str) -> Result<FakeTexture, AssetLoadError> {
        self.image_loads.set(self.image_loads.get() + 1);
        if source.contains("missing") {
            return Err(AssetLoadError {
                key: format!("piece {piece} image"),
                direct: "404".to_string(),
                fallback: "404".to_string(),
            });
        }
        Ok(FakeTexture {
            width: 64,
            height: 48,
            from_image: Some(source.to_string()),
        })
    }
}

pub fn source_image() -> FakeSource {
    FakeSource {
        width: 400,
        height: 400,
    }
}

pub fn square(x: f32, y: f32, size: f32) -> Vec<Vec2> {
    vec![
        Vec2::new(x, y),
        Vec2::new(x + size, y),
        Vec2::new(x + size, y + size),
        Vec2::new(x, y + size),
    ]
}

pub fn shape_piece(id: &str, x: f32, y: f32) -> PieceDefinition {
    PieceDefinition {
        id: PieceId::from(id),
        shape: Some(square(x, y, 200.0)),
        image: None,
        bounds: Some(Rect::new(x, y, 200.0, 200.0)),
        correct_position: Vec2::new(x + 100.0, y + 100.0),
        correct_rotation: 0.0,
        flipped: false,
    }
}

/// Four 200px squares tiling a 400x400 image.
pub fn quad_puzzle(threshold: f32, enable_rotation: bool) -> PuzzleDefinition {
    PuzzleDefinition {
        board_image: "board.png".to_string(),
        original_image: "original.png".to_string(),
        image_width: 400,
        image_height: 400,
        pieces: vec![
            shape_piece("tl", 0.0, 0.0),
            shape_piece("tr", 200.0, 0.0),
            shape_piece("bl", 0.0, 200.0),
            shape_piece("br", 200.0, 200.0),
        ],
        enable_rotation,
        snap_position_threshold_px: threshold,
        rotation_snap_tolerance_deg: 10.0,
    }
}

pub fn container() -> Vec2 {
    Vec2::new(1000.0, 600.0)
}

pub fn new_session() -> PuzzleSession<FakeTexture> {
    PuzzleSession::new(EngineRules::default())
}

/// Runs a full load pass against the fake backend.
pub fn load(session: &mut PuzzleSession<FakeTexture>, definition: PuzzleDefinition) -> LoadReport {
    let definition = Rc::new(definition);
    let ticket = session.begin_load(definition.clone(), container());
    let backend = FakeBackend::default();
    let source = source_image();
    let results = block_on(async {
        let mut results = Vec::new();
        for piece in &definition.pieces {
            results.push(build_piece_texture(&backend, piece, Some(&source)).await);
        }
        results
    });
    match session.complete_load(ticket, results).expect("load") {
        LoadOutcome::Loaded(report) => report,
        LoadOutcome::Stale => panic!("load went stale"),
    }
}

/// Grabs a piece by its center and drops it `offset` away from its target.
pub fn drop_near_target(session: &mut PuzzleSession<FakeTexture>, id: &str, offset: Vec2) {
    let id = PieceId::from(id);
    let start = session.piece(&id).expect("piece").position;
    let target = session.snap_target(&id).expect("target");
    session.pointer_down(PointerId(1), start);
    assert_eq!(session.active_piece(), Some(&id));
    session.pointer_move(PointerId(1), target + offset);
    session.pointer_up(PointerId(1));
}

/// Runs every pending tween to completion.
pub fn settle(session: &mut PuzzleSession<FakeTexture>) {
    session.tick(0.0);
    session.tick(10_000.0);
}
