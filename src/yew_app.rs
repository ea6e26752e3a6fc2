use std::rc::Rc;

use kakera_core::{EngineRules, PuzzleDefinition, Theme};
use web_sys::HtmlElement;
use yew::prelude::*;

use crate::stage::{PuzzleStage, StageHooks};

const CONTAINER_STYLE: &str = "position: relative; width: 100%; height: 100%; overflow: hidden;";

#[derive(Properties, PartialEq)]
pub struct PuzzleViewProps {
    pub definition: Rc<PuzzleDefinition>,
    #[prop_or_default]
    pub theme: Theme,
    #[prop_or_default]
    pub rules: EngineRules,
    #[prop_or_default]
    pub on_complete: Callback<()>,
    #[prop_or_default]
    pub on_error: Callback<String>,
    #[prop_or_default]
    pub class: Classes,
}

/// Fills its parent with a puzzle stage. Changing the definition, theme or
/// rules remounts the stage from scratch.
#[function_component(PuzzleView)]
pub fn puzzle_view(props: &PuzzleViewProps) -> Html {
    let container_ref = use_node_ref();
    {
        let container_ref = container_ref.clone();
        let on_complete = props.on_complete.clone();
        let on_error = props.on_error.clone();
        use_effect_with(
            (props.definition.clone(), props.theme, props.rules),
            move |(definition, theme, rules)| {
                let stage = container_ref.cast::<HtmlElement>().and_then(|container| {
                    let hooks = StageHooks {
                        on_complete: Rc::new(move || on_complete.emit(())),
                        on_error: {
                            let on_error = on_error.clone();
                            Rc::new(move |message: String| on_error.emit(message))
                        },
                    };
                    match PuzzleStage::mount(container, Rc::clone(definition), *rules, *theme, hooks) {
                        Ok(stage) => Some(stage),
                        Err(err) => {
                            gloo::console::error!(format!("puzzle mount failed: {err}"));
                            on_error.emit(err.to_string());
                            None
                        }
                    }
                });
                move || {
                    if let Some(stage) = stage {
                        stage.destroy();
                    }
                }
            },
        );
    }

    html! {
        <div
            ref={container_ref}
            class={classes!("kakera-stage", props.class.clone())}
            style={CONTAINER_STYLE}
        />
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use console_error_panic_hook::set_once as set_panic_hook;
    use gloo::timers::future::TimeoutFuture;
    use kakera_core::{PieceDefinition, PieceId, Rect, Vec2};
    use std::cell::Cell;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    // 2x2 opaque red PNG.
    const RED_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAIAAAACCAYAAABytg0kAAAAEUlEQVR4nGP4z8DwH4QZYAwAR8oH+WdZbrcAAAAASUVORK5CYII=";

    fn definition() -> Rc<PuzzleDefinition> {
        Rc::new(PuzzleDefinition {
            board_image: RED_PNG.to_string(),
            original_image: String::new(),
            image_width: 200,
            image_height: 200,
            pieces: vec![PieceDefinition {
                id: PieceId::from("solo"),
                shape: None,
                image: Some(RED_PNG.to_string()),
                bounds: Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
                correct_position: Vec2::new(50.0, 50.0),
                correct_rotation: 0.0,
                flipped: false,
            }],
            enable_rotation: false,
            snap_position_threshold_px: 30.0,
            rotation_snap_tolerance_deg: 10.0,
        })
    }

    fn test_root() -> web_sys::Element {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .expect("document available");
        let root = document.create_element("div").expect("create test root");
        root.set_attribute("style", "width: 800px; height: 500px;")
            .expect("style root");
        document.body().expect("body").append_child(&root).expect("attach root");
        root
    }

    #[wasm_bindgen_test(async)]
    async fn view_mounts_and_unmounts_canvas() {
        set_panic_hook();
        let root = test_root();
        let errors = Rc::new(Cell::new(0u32));
        let props = PuzzleViewProps {
            definition: definition(),
            theme: Theme::Light,
            rules: EngineRules::default(),
            on_complete: Callback::noop(),
            on_error: {
                let errors = errors.clone();
                Callback::from(move |_message: String| errors.set(errors.get() + 1))
            },
            class: Classes::new(),
        };
        let handle = yew::Renderer::<PuzzleView>::with_root_and_props(root.clone(), props).render();
        TimeoutFuture::new(300).await;
        let canvas = root
            .query_selector("canvas")
            .expect("query")
            .expect("canvas mounted")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("canvas element");
        assert!(canvas.width() >= 800);
        assert_eq!(errors.get(), 0);

        handle.destroy();
        TimeoutFuture::new(0).await;
        assert!(root.query_selector("canvas").expect("query").is_none());
        root.remove();
    }
}
