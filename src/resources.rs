use kakera_core::FetchBackend;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, HtmlImageElement, Response, Url};

/// Image loading through the browser: `<img>` decode first, `fetch` plus a
/// blob object URL when the direct decode is refused.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct BrowserFetch;

impl FetchBackend for BrowserFetch {
    type Image = HtmlImageElement;
    type Error = String;

    async fn decode_direct(&self, url: &str) -> Result<HtmlImageElement, String> {
        decode_image(url, true).await
    }

    async fn fetch_object_url(&self, url: &str) -> Result<String, String> {
        let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
        let response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(js_error)?
            .dyn_into::<Response>()
            .map_err(js_error)?;
        if !response.ok() {
            return Err(format!("http status {}", response.status()));
        }
        let blob = JsFuture::from(response.blob().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .dyn_into::<Blob>()
            .map_err(js_error)?;
        Url::create_object_url_with_blob(&blob).map_err(js_error)
    }

    async fn decode_object_url(&self, object_url: &str) -> Result<HtmlImageElement, String> {
        decode_image(object_url, false).await
    }

    fn revoke_object_url(&self, object_url: &str) {
        let _ = Url::revoke_object_url(object_url);
    }
}

async fn decode_image(src: &str, anonymous: bool) -> Result<HtmlImageElement, String> {
    let image = HtmlImageElement::new().map_err(js_error)?;
    if anonymous {
        image.set_cross_origin(Some("anonymous"));
    }
    image.set_src(src);
    JsFuture::from(image.decode()).await.map_err(js_error)?;
    if image.natural_width() == 0 || image.natural_height() == 0 {
        return Err("image has no pixels".to_string());
    }
    Ok(image)
}

pub(crate) fn js_error(err: JsValue) -> String {
    if let Some(message) = err.as_string() {
        return message;
    }
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{err:?}")
}
