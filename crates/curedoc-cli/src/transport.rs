use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use curedoc_client::{ClientError, HttpReply, Transport};
use reqwest::multipart::{Form, Part};

/// An image read from disk, ready to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self {
            mime: mime_for(path).to_string(),
            name,
            bytes,
        })
    }
}

/// MIME type guessed from the file extension
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// reqwest-backed transport for the terminal client
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

fn network(e: reqwest::Error) -> ClientError {
    ClientError::Network(e.to_string())
}

async fn into_reply(response: reqwest::Response) -> Result<HttpReply, ClientError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| ClientError::Malformed(e.to_string()))?;
    Ok(HttpReply::new(status, body))
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// GET a binary resource such as a PDF report
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<curedoc_client::types::ErrorBody>(&body)
                .ok()
                .map(|b| b.error);
            return Err(ClientError::Status { status: status.as_u16(), message });
        }

        let bytes = response.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    type Image = ImageFile;

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply, ClientError> {
        let response = self.client.post(url).json(body).send().await.map_err(network)?;
        into_reply(response).await
    }

    async fn post_image(&self, url: &str, image: &ImageFile, prompt: Option<&str>) -> Result<HttpReply, ClientError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.name.clone())
            .mime_str(&image.mime)
            .map_err(network)?;

        let mut form = Form::new().part("image", part);
        if let Some(prompt) = prompt {
            form = form
                .text("prompt", prompt.to_string())
                .text("query", prompt.to_string());
        }

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        into_reply(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for(Path::new("scan.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("notes")), "application/octet-stream");
    }
}
