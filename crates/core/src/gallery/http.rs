//! HTTP gallery client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::GalleryError;
use super::traits::Gallery;
use super::types::{AssetMetadata, FrameRef};
use crate::job::SourceId;

/// Gallery endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Endpoint receiving the `package_idx` form POST.
    pub metadata_url: String,
    /// Frame download endpoint; the frame path is passed as `no`.
    pub frame_url: String,
    /// Referer header sent with frame downloads.
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_referer() -> String {
    "https://dccon.dcinside.com/".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
struct PackageResponse {
    info: PackageInfo,
    #[serde(default)]
    detail: Vec<PackageDetail>,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PackageDetail {
    path: String,
    ext: String,
}

/// Parses a metadata response body. Bodies that are not a package
/// description mean the gallery does not know the id.
fn parse_metadata(body: &str) -> Option<AssetMetadata> {
    let package: PackageResponse = serde_json::from_str(body).ok()?;
    Some(AssetMetadata {
        title: package.info.title,
        frames: package
            .detail
            .into_iter()
            .map(|d| FrameRef::new(d.path, d.ext))
            .collect(),
    })
}

/// Gallery client over HTTP.
pub struct HttpGallery {
    client: Client,
    config: GalleryConfig,
}

impl HttpGallery {
    pub fn new(config: GalleryConfig) -> Result<Self, GalleryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Gallery for HttpGallery {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_metadata(
        &self,
        source_id: SourceId,
    ) -> Result<Option<AssetMetadata>, GalleryError> {
        debug!(source_id, "Fetching gallery metadata");

        let response = self
            .client
            .post(&self.config.metadata_url)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&[("package_idx", source_id.to_string())])
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GalleryError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        // The gallery labels its JSON as text/html, so parse the raw body.
        let body = response.text().await?;
        let metadata = parse_metadata(&body);
        if metadata.is_none() {
            debug!(source_id, "Gallery has no package for id");
        }
        Ok(metadata)
    }

    async fn fetch_frame(&self, frame: &FrameRef) -> Result<Vec<u8>, GalleryError> {
        let response = self
            .client
            .get(&self.config.frame_url)
            .query(&[("no", frame.path.as_str())])
            .header(reqwest::header::REFERER, &self.config.referer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GalleryError::ApiError {
                status: status.as_u16(),
                message: format!("frame {} unavailable", frame.path),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata() {
        let body = r#"{
            "info": {"title": "Cat faces", "package_idx": "1001"},
            "detail": [
                {"path": "abc", "ext": "gif", "title": "1"},
                {"path": "def", "ext": "png", "title": "2"}
            ]
        }"#;

        let metadata = parse_metadata(body).unwrap();
        assert_eq!(metadata.title, "Cat faces");
        assert_eq!(
            metadata.frames,
            vec![FrameRef::new("abc", "gif"), FrameRef::new("def", "png")]
        );
    }

    #[test]
    fn test_parse_metadata_unknown_package() {
        assert!(parse_metadata("").is_none());
        assert!(parse_metadata("null").is_none());
        assert!(parse_metadata("<html>error</html>").is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config: GalleryConfig = toml::from_str(
            r#"
metadata_url = "https://gallery.example/index/package_detail"
frame_url = "https://img.gallery.example/viewer.php"
"#,
        )
        .unwrap();
        assert_eq!(config.referer, "https://dccon.dcinside.com/");
        assert_eq!(config.timeout_secs, 30);
        assert!(HttpGallery::new(config).is_ok());
    }
}
