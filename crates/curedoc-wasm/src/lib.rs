//! Browser front-end for the CureBot chat

use wasm_bindgen::prelude::*;

use curedoc_client::ClientConfig;

mod chat_ui;
mod dom;
mod download;
mod markdown;
mod storage;
mod transport;
mod utils;
mod view;

pub use storage::LocalStorageStore;

/// Runs once when the module loads: panics and `log` output go to the
/// browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Debug));
    log::info!("CureDoc module loaded");
}

/// Initialize the chat page, talking to `base_url` (or the default service)
#[wasm_bindgen]
pub async fn init_chat(base_url: Option<String>) -> Result<(), JsValue> {
    let config = match base_url {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::default(),
    };
    log::info!("Initializing chat against {}", config.base_url);
    chat_ui::ChatApp::new(config)?.start()
}
