//! Download, validation and normalization of raw gallery files.

use std::path::PathBuf;

use futures::future::join_all;
use image::ImageFormat;
use tracing::{debug, info, warn};

use super::config::RunnerConfig;
use super::error::JobError;
use super::types::{ItemKind, RawItem, SourceAsset};
use crate::gallery::{FrameRef, Gallery};
use crate::resolver::decode_frames;
use crate::workspace::JobWorkspace;

/// Fetches metadata and all raw files of `workspace.source_id`.
///
/// Downloads run concurrently. If any declared file is missing or not
/// larger than `min_frame_bytes`, the raw directory is cleared and the
/// whole download is repeated, up to `fetch_attempts` times.
pub async fn fetch_asset(
    gallery: &dyn Gallery,
    workspace: &JobWorkspace,
    config: &RunnerConfig,
) -> Result<SourceAsset, JobError> {
    let source_id = workspace.source_id;
    let metadata = gallery
        .fetch_metadata(source_id)
        .await?
        .ok_or(JobError::NotFound { source_id })?;
    if metadata.frames.is_empty() {
        return Err(JobError::EmptyAsset { source_id });
    }

    let exts: Vec<String> = metadata.frames.iter().map(|f| sanitize_ext(&f.ext)).collect();
    workspace.prepare().await?;

    let attempts = config.fetch_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        workspace.clear_raw().await?;
        download_all(gallery, workspace, &metadata.frames, &exts).await;

        match validate_downloads(workspace, &exts, config.min_frame_bytes).await {
            Ok(()) => break,
            Err(reason) if attempt < attempts => {
                warn!(source_id, attempt, %reason, "Download validation failed, retrying");
            }
            Err(reason) => {
                workspace.clear_raw().await?;
                return Err(JobError::Validation { attempts, reason });
            }
        }
    }

    let mut items = Vec::with_capacity(exts.len());
    for (i, ext) in exts.into_iter().enumerate() {
        let index = i + 1;
        let path = workspace.raw_file(index, &ext);
        items.push(tokio::task::spawn_blocking(move || normalize_item(index, path, ext)).await??);
    }

    info!(
        source_id,
        title = %metadata.title,
        items = items.len(),
        "Fetched source asset"
    );
    Ok(SourceAsset {
        source_id,
        title: metadata.title,
        items,
    })
}

/// Keeps only ASCII alphanumerics so the extension cannot leave the raw dir.
fn sanitize_ext(ext: &str) -> String {
    let clean: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if clean.is_empty() {
        "bin".to_string()
    } else {
        clean
    }
}

async fn download_all(
    gallery: &dyn Gallery,
    workspace: &JobWorkspace,
    frames: &[FrameRef],
    exts: &[String],
) {
    let downloads = frames.iter().zip(exts).enumerate().map(|(i, (frame, ext))| {
        let path = workspace.raw_file(i + 1, ext);
        async move {
            match gallery.fetch_frame(frame).await {
                Ok(bytes) => {
                    if let Err(e) = tokio::fs::write(&path, bytes).await {
                        warn!(path = %path.display(), error = %e, "Failed to write raw file");
                    }
                }
                Err(e) => {
                    warn!(frame = %frame.path, error = %e, "Failed to download frame");
                }
            }
        }
    });
    join_all(downloads).await;
}

async fn validate_downloads(
    workspace: &JobWorkspace,
    exts: &[String],
    min_bytes: u64,
) -> Result<(), String> {
    for (i, ext) in exts.iter().enumerate() {
        let path = workspace.raw_file(i + 1, ext);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.len() > min_bytes => {}
            Ok(meta) => return Err(format!("{}.{} is {} bytes", i + 1, ext, meta.len())),
            Err(_) => return Err(format!("{}.{} is missing", i + 1, ext)),
        }
    }
    Ok(())
}

/// Fixes a lying extension and turns single-frame GIFs into PNGs.
///
/// Blocking; run on a blocking worker.
fn normalize_item(index: usize, path: PathBuf, ext: String) -> Result<RawItem, JobError> {
    let bytes = std::fs::read(&path)?;
    let format = image::guess_format(&bytes)?;
    let (mut path, mut ext) = (path, ext);

    let known = format.extensions_str();
    if !known.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
        if let Some(actual) = known.first() {
            let renamed = path.with_extension(actual);
            std::fs::rename(&path, &renamed)?;
            debug!(from = %ext, to = %actual, index, "Renamed raw file to its real format");
            path = renamed;
            ext = actual.to_string();
        }
    }

    if format == ImageFormat::Gif {
        let frames = decode_frames(&path)?;
        if let [only] = frames.as_slice() {
            let png = path.with_extension("png");
            only.image.save_with_format(&png, ImageFormat::Png)?;
            std::fs::remove_file(&path)?;
            debug!(index, "Converted single-frame GIF to PNG");
            path = png;
            ext = "png".to_string();
        }
    }

    Ok(RawItem {
        index,
        kind: ItemKind::from_ext(&ext),
        path,
        ext,
    })
}
