use curedoc_client::{DownloadTarget, TextReport};
use js_sys::Array;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, Url};

/// Open the PDF in a new tab, or save the text report through a
/// temporary object URL
pub fn start_download(document: &Document, target: DownloadTarget) -> Result<(), JsValue> {
    match target {
        DownloadTarget::Pdf(url) => {
            log::info!("Opening report {}", url);
            let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
            window.open_with_url_and_target(&url, "_blank")?;
            Ok(())
        }
        DownloadTarget::TextReport(report) => save_text_report(document, &report),
    }
}

fn save_text_report(document: &Document, report: &TextReport) -> Result<(), JsValue> {
    let parts = Array::new();
    parts.push(&JsValue::from_str(&report.content));
    let options = BlobPropertyBag::new();
    options.set_type("text/plain");
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;

    let url = Url::create_object_url_with_blob(&blob)?;
    let anchor = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()?;
    anchor.set_href(&url);
    anchor.set_download(&report.filename);

    let body = document.body().ok_or_else(|| JsValue::from_str("No body"))?;
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();
    Url::revoke_object_url(&url)?;

    log::info!("Saved text report {}", report.filename);
    Ok(())
}
