use base64::{engine::general_purpose, Engine};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::utils::err_msg;

/// Saves an image locator to a local file. Holds no state of its own.
#[derive(Clone, Default)]
pub struct ImageDownloader {
    http: reqwest::Client,
}

impl ImageDownloader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn save(&self, image_source: &str, dest: &Path) -> AppResult<PathBuf> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        if image_source.starts_with("data:image") {
            save_base64_image(image_source, dest).await?;
        } else {
            let url = Url::parse(image_source)
                .map_err(|e| AppError::Other(format!("Invalid image URL {}: {}", image_source, e)))?;
            match url.scheme() {
                "http" | "https" => self.download_image_from_url(url, dest).await?,
                other => {
                    return Err(AppError::Other(format!(
                        "Cannot download images with scheme {}",
                        other
                    )))
                }
            }
        }

        tracing::info!("Saved image to {:?}", dest);
        Ok(dest.to_path_buf())
    }

    async fn download_image_from_url(&self, url: Url, dest: &Path) -> AppResult<()> {
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Other(format!(
                "Failed to download image: HTTP {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }
}

async fn save_base64_image(data_url: &str, dest: &Path) -> AppResult<()> {
    let base64_data = data_url
        .split_once(',')
        .map(|(_, data)| data)
        .ok_or_else(|| AppError::Other("Invalid data URL format".to_string()))?;

    let bytes = general_purpose::STANDARD.decode(base64_data).map_err(|e| {
        AppError::Other(err_msg(
            module_path!(),
            line!(),
            format!("Failed to decode base64: {}", e),
        ))
    })?;

    tokio::fs::write(dest, bytes).await?;
    Ok(())
}
