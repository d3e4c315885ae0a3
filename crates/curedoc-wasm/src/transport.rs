use async_trait::async_trait;
use curedoc_client::{ClientError, HttpReply, Transport};
use gloo_net::http::{Request, Response};
use web_sys::{File, FormData};

/// `fetch`-backed transport for the browser
pub struct FetchTransport;

async fn into_reply(response: Response) -> Result<HttpReply, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Malformed(e.to_string()))?;
    Ok(HttpReply::new(status, body))
}

fn network(e: impl std::fmt::Display) -> ClientError {
    ClientError::Network(e.to_string())
}

fn js_network(e: wasm_bindgen::JsValue) -> ClientError {
    ClientError::Network(format!("{:?}", e))
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    type Image = File;

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply, ClientError> {
        let response = Request::post(url)
            .json(body)
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;
        into_reply(response).await
    }

    async fn post_image(&self, url: &str, image: &File, prompt: Option<&str>) -> Result<HttpReply, ClientError> {
        let form = FormData::new().map_err(js_network)?;
        form.append_with_blob_and_filename("image", image, &image.name())
            .map_err(js_network)?;
        if let Some(prompt) = prompt {
            form.append_with_str("prompt", prompt).map_err(js_network)?;
            form.append_with_str("query", prompt).map_err(js_network)?;
        }

        let response = Request::post(url)
            .body(form)
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;
        into_reply(response).await
    }
}
