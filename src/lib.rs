//! Browser host for the kakera puzzle engine: a canvas stage driven by
//! pointer, wheel and keyboard input, mountable from JavaScript or as a
//! `yew` component.

mod input;
mod renderer;
mod resources;
mod stage;
mod textures;
mod yew_app;

use std::rc::Rc;

use gloo::console;
use kakera_core::{EngineRules, PuzzleDefinition, Theme};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::stage::{PuzzleStage, StageHooks};

pub use kakera_core;
pub use yew_app::{PuzzleView, PuzzleViewProps};

/// Host options: a theme plus any subset of the engine rules, flattened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MountOptions {
    theme: Theme,
    #[serde(flatten)]
    rules: EngineRules,
}

impl MountOptions {
    fn parse(raw: Option<&str>) -> Result<Self, serde_json::Error> {
        match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => serde_json::from_str(raw),
            None => Ok(Self::default()),
        }
    }
}

/// Mounts a puzzle into `container`. `on_complete` is called once, when the
/// last piece snaps; `on_error` receives fatal load errors.
#[wasm_bindgen(js_name = mountPuzzle)]
pub fn mount_puzzle(
    container: HtmlElement,
    definition_json: &str,
    options_json: Option<String>,
    on_complete: js_sys::Function,
    on_error: Option<js_sys::Function>,
) -> Result<PuzzleHandle, JsValue> {
    let definition = PuzzleDefinition::from_json(definition_json).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let options = MountOptions::parse(options_json.as_deref())
        .map_err(|err| JsValue::from_str(&format!("invalid options: {err}")))?;
    let hooks = StageHooks {
        on_complete: Rc::new(move || {
            if let Err(err) = on_complete.call0(&JsValue::NULL) {
                console::error!("on_complete threw", err);
            }
        }),
        on_error: Rc::new(move |message: String| {
            if let Some(on_error) = on_error.as_ref() {
                if let Err(err) = on_error.call1(&JsValue::NULL, &JsValue::from_str(&message)) {
                    console::error!("on_error threw", err);
                }
            }
        }),
    };
    let stage = PuzzleStage::mount(
        container,
        Rc::new(definition),
        options.rules.sanitized(),
        options.theme,
        hooks,
    )
    .map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(PuzzleHandle { stage: Some(stage) })
}

#[wasm_bindgen]
pub struct PuzzleHandle {
    stage: Option<Rc<PuzzleStage>>,
}

#[wasm_bindgen]
impl PuzzleHandle {
    /// Pieces locked onto the board.
    pub fn placed(&self) -> u32 {
        self.stage
            .as_ref()
            .map_or(0, |stage| stage.progress().placed as u32)
    }

    /// Pieces that loaded; skipped pieces do not count.
    pub fn total(&self) -> u32 {
        self.stage
            .as_ref()
            .map_or(0, |stage| stage.progress().total as u32)
    }

    /// `placed / total`, 0 before the pieces load.
    pub fn progress(&self) -> f32 {
        self.stage
            .as_ref()
            .map_or(0.0, |stage| stage.progress().fraction())
    }

    #[wasm_bindgen(js_name = isDestroyed)]
    pub fn is_destroyed(&self) -> bool {
        self.stage.as_ref().map_or(true, |stage| stage.is_destroyed())
    }

    pub fn destroy(&mut self) {
        if let Some(stage) = self.stage.take() {
            stage.destroy();
        }
    }
}

impl Drop for PuzzleHandle {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_when_absent() {
        assert_eq!(MountOptions::parse(None).expect("options"), MountOptions::default());
        assert_eq!(MountOptions::parse(Some("  ")).expect("options"), MountOptions::default());
    }

    #[test]
    fn options_mix_theme_and_rules() {
        let options = MountOptions::parse(Some(r#"{"theme":"light","trayMaxRows":2,"zoomStep":0.25}"#))
            .expect("options");
        assert_eq!(options.theme, Theme::Light);
        assert_eq!(options.rules.tray_max_rows, 2);
        assert_eq!(options.rules.zoom_step, 0.25);
        assert_eq!(options.rules.tray_gap, EngineRules::default().tray_gap);
    }

    #[test]
    fn bad_options_are_rejected() {
        assert!(MountOptions::parse(Some(r#"{"theme":"sepia"}"#)).is_err());
    }
}
