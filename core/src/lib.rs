pub mod compositor;
pub mod definition;
pub mod error;
pub mod geom;
pub mod interaction;
pub mod layout;
pub mod piece;
pub mod resources;
pub mod rules;
pub mod scale;
pub mod scramble;
pub mod session;
pub mod snap;
pub mod tray;
pub mod tween;

pub use compositor::{build_piece_texture, PieceArt, TextureBackend};
pub use definition::{PieceDefinition, PieceId, PuzzleDefinition};
pub use error::{
    AssetLoadError, DefinitionError, DrawSurfaceError, EngineError, PieceLoadError, ShapeDataError,
};
pub use geom::{Rect, Vec2};
pub use interaction::{KeyCommand, PointerId};
pub use layout::StageLayout;
pub use piece::{PieceHandles, PieceTexture, RuntimePiece};
pub use resources::{AssetKey, FetchBackend, ResourceManager};
pub use rules::{EngineRules, Theme, MAX_ZOOM, MIN_ZOOM};
pub use session::{LoadOutcome, LoadReport, LoadTicket, Progress, PuzzleSession, SessionEvent};
pub use tray::{TrayGrid, TrayLayout};
