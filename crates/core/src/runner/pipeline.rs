//! Per-asset job runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use image::{ImageFormat, RgbaImage};
use tracing::{debug, info};

use super::compose::{average_durations, fit_canvas, merge_pair, plan_items, ItemPlan};
use super::config::RunnerConfig;
use super::error::JobError;
use super::fetch::fetch_asset;
use super::types::{
    ArtifactKind, CompletedJob, EncodedArtifact, ItemKind, PhaseCallback, RawItem, SourceAsset,
};
use crate::encoder::{frame_file_name, EncodeRequest, SizeConstrainedEncoder};
use crate::gallery::Gallery;
use crate::job::{Job, JobPhase};
use crate::resolver::{decode_frames, FrameSet, FrameSourceResolver};
use crate::still::compress_still;
use crate::upscale::Upscaler;
use crate::workspace::{JobWorkspace, Workspace};

/// Frames written to disk and waiting for the encoder.
struct PendingAnimation {
    index: usize,
    frames_dir: PathBuf,
    durations_ms: Vec<u32>,
}

enum ItemOutput {
    Done(EncodedArtifact),
    Pending(PendingAnimation),
}

/// Runs one job from gallery fetch to validated artifacts.
///
/// Phases are strictly sequential: every item is fetched, then every item
/// is upscaled (stills are finished here), then animations are encoded one
/// by one. Publishing is left to the caller.
pub struct JobRunner {
    config: RunnerConfig,
    gallery: Arc<dyn Gallery>,
    upscaler: Arc<dyn Upscaler>,
    resolver: FrameSourceResolver,
    encoder: Arc<SizeConstrainedEncoder>,
    workspace: Workspace,
}

impl JobRunner {
    pub fn new(
        config: RunnerConfig,
        gallery: Arc<dyn Gallery>,
        upscaler: Arc<dyn Upscaler>,
        resolver: FrameSourceResolver,
        encoder: Arc<SizeConstrainedEncoder>,
        workspace: Workspace,
    ) -> Self {
        Self {
            config,
            gallery,
            upscaler,
            resolver,
            encoder,
            workspace,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Produces every artifact of `job`.
    ///
    /// Partial output is left on disk on failure; the caller owns cleanup.
    pub async fn run(&self, job: &Job, on_phase: PhaseCallback) -> Result<CompletedJob, JobError> {
        let workspace = self.workspace.job(job.source_id);

        on_phase(JobPhase::Fetching);
        let asset = fetch_asset(self.gallery.as_ref(), &workspace, &self.config).await?;

        on_phase(JobPhase::Upscaling);
        let plans = plan_items(asset.items.len(), &job.merge_indices);
        let mut outputs = Vec::with_capacity(plans.len());
        for plan in plans {
            outputs.push(self.process_item(&asset, &workspace, plan).await?);
        }

        let mut artifacts = Vec::with_capacity(outputs.len());
        let mut encoding_started = false;
        for output in outputs {
            match output {
                ItemOutput::Done(artifact) => artifacts.push(artifact),
                ItemOutput::Pending(pending) => {
                    if !encoding_started {
                        on_phase(JobPhase::Encoding);
                        encoding_started = true;
                    }
                    artifacts.push(self.encode_item(&workspace, pending).await?);
                }
            }
        }

        self.validate_artifacts(&artifacts)?;
        info!(
            source_id = job.source_id,
            artifacts = artifacts.len(),
            "Job artifacts ready"
        );
        Ok(CompletedJob {
            source_id: job.source_id,
            title: asset.title,
            artifacts,
        })
    }

    async fn process_item(
        &self,
        asset: &SourceAsset,
        workspace: &JobWorkspace,
        plan: ItemPlan,
    ) -> Result<ItemOutput, JobError> {
        let index = plan.output_index();
        let first = raw_item(asset, index)?;
        debug!(source_id = asset.source_id, index, ?plan, kind = ?first.kind, "Processing item");

        // The first item decides how a merged pair is treated.
        match (plan, first.kind) {
            (ItemPlan::Single(_), ItemKind::Static) => {
                let image = self.upscale_still(&first.path).await?;
                let canvas = self.config.canvas_size;
                let image = blocking(move || Ok(fit_canvas(&image, canvas))).await?;
                self.write_still(workspace, index, image).await.map(ItemOutput::Done)
            }
            (ItemPlan::Merged(_, second), ItemKind::Static) => {
                let second = raw_item(asset, second)?;
                let left = self.upscale_still(&first.path).await?;
                let right = self.upscale_still(&second.path).await?;
                let canvas = self.config.canvas_size;
                let image = blocking(move || Ok(merge_pair(&left, &right, canvas))).await?;
                self.write_still(workspace, index, image).await.map(ItemOutput::Done)
            }
            (ItemPlan::Single(_), ItemKind::Animated) => {
                let frames = self.resolve(&first.path).await?;
                let frames_dir = workspace.frames_dir(index);
                tokio::fs::create_dir_all(&frames_dir).await?;
                let durations_ms = frames.durations();

                let singles = frames.frames.into_iter().map(|f| (f.image, None));
                self.upscale_frames(&frames_dir, singles, self.config.canvas_size)
                    .await?;
                Ok(ItemOutput::Pending(PendingAnimation {
                    index,
                    frames_dir,
                    durations_ms,
                }))
            }
            (ItemPlan::Merged(_, second), ItemKind::Animated) => {
                let second = raw_item(asset, second)?;
                let left = self.resolve(&first.path).await?;
                let right = self.resolve(&second.path).await?;
                let durations_ms = average_durations(&left.durations(), &right.durations());
                let frames_dir = workspace.frames_dir(index);
                tokio::fs::create_dir_all(&frames_dir).await?;

                let pairs = left
                    .frames
                    .into_iter()
                    .zip(right.frames)
                    .map(|(l, r)| (l.image, Some(r.image)));
                self.upscale_frames(&frames_dir, pairs, self.config.canvas_size)
                    .await?;
                Ok(ItemOutput::Pending(PendingAnimation {
                    index,
                    frames_dir,
                    durations_ms,
                }))
            }
        }
    }

    async fn upscale_still(&self, path: &Path) -> Result<RgbaImage, JobError> {
        let path = path.to_path_buf();
        // Non-empty on success.
        let image = blocking(move || Ok(decode_frames(&path)?.swap_remove(0).image)).await?;
        Ok(self.upscaler.upscale(image).await?)
    }

    async fn resolve(&self, path: &Path) -> Result<FrameSet, JobError> {
        let resolver = self.resolver.clone();
        let path = path.to_path_buf();
        blocking(move || Ok(resolver.resolve(&path)?)).await
    }

    /// Upscales frames with bounded concurrency and writes them as
    /// `000.png`, `001.png`, ... into `frames_dir`. A frame with a partner
    /// is merged side by side with it after both are upscaled.
    async fn upscale_frames<I>(
        &self,
        frames_dir: &Path,
        frames: I,
        canvas: u32,
    ) -> Result<(), JobError>
    where
        I: Iterator<Item = (RgbaImage, Option<RgbaImage>)>,
    {
        let workers = self.config.upscale_workers.max(1);
        stream::iter(frames.enumerate())
            .map(|(n, (image, partner))| {
                let path = frames_dir.join(frame_file_name(n));
                async move {
                    let image = self.upscaler.upscale(image).await?;
                    let partner = match partner {
                        Some(p) => Some(self.upscaler.upscale(p).await?),
                        None => None,
                    };
                    blocking(move || {
                        let out = match partner {
                            Some(right) => merge_pair(&image, &right, canvas),
                            None => image,
                        };
                        out.save_with_format(&path, ImageFormat::Png)?;
                        Ok(())
                    })
                    .await
                }
            })
            .buffer_unordered(workers)
            .try_collect::<Vec<()>>()
            .await?;
        Ok(())
    }

    async fn write_still(
        &self,
        workspace: &JobWorkspace,
        index: usize,
        image: RgbaImage,
    ) -> Result<EncodedArtifact, JobError> {
        let policy = self.config.compression.clone();
        let compressed = blocking(move || Ok(compress_still(&image, &policy)?)).await?;

        let path = workspace.sticker_dir.join(format!("{}.png", index));
        tokio::fs::write(&path, &compressed.bytes).await?;
        debug!(
            index,
            size_bytes = compressed.bytes.len(),
            quality = ?compressed.quality,
            "Wrote still"
        );
        Ok(EncodedArtifact {
            index,
            path,
            kind: ArtifactKind::Static,
            size_bytes: compressed.bytes.len() as u64,
        })
    }

    async fn encode_item(
        &self,
        workspace: &JobWorkspace,
        pending: PendingAnimation,
    ) -> Result<EncodedArtifact, JobError> {
        let output_path = workspace.sticker_dir.join(format!("{}.webm", pending.index));
        let outcome = self
            .encoder
            .encode(&EncodeRequest {
                frames_dir: pending.frames_dir,
                durations_ms: pending.durations_ms,
                output_path,
            })
            .await?;
        Ok(EncodedArtifact {
            index: pending.index,
            path: outcome.output_path,
            kind: ArtifactKind::Animated,
            size_bytes: outcome.size_bytes,
        })
    }

    fn validate_artifacts(&self, artifacts: &[EncodedArtifact]) -> Result<(), JobError> {
        for artifact in artifacts {
            let max_kb = match artifact.kind {
                ArtifactKind::Static => self.config.compression.max_size_kb,
                ArtifactKind::Animated => self.encoder.config().target_size_kb,
            };
            if artifact.size_bytes > max_kb * 1024 {
                return Err(JobError::ArtifactTooLarge {
                    index: artifact.index,
                    size_kb: artifact.size_bytes as f64 / 1024.0,
                    max_kb,
                });
            }
        }
        Ok(())
    }
}

fn raw_item(asset: &SourceAsset, index: usize) -> Result<&RawItem, JobError> {
    asset
        .item(index)
        .ok_or_else(|| JobError::Worker(format!("item {} missing from source asset", index)))
}

/// Runs CPU-bound or blocking work off the async scheduler.
async fn blocking<T, F>(f: F) -> Result<T, JobError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, JobError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncoderConfig;
    use crate::resolver::ResolverConfig;
    use crate::testing::{fixtures, MockGallery, MockUpscaler, MockVideoEncoder};
    use crate::workspace::WorkspaceConfig;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        gallery: Arc<MockGallery>,
        upscaler: Arc<MockUpscaler>,
        video: Arc<MockVideoEncoder>,
        runner: JobRunner,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let gallery = Arc::new(MockGallery::new());
        let upscaler = Arc::new(MockUpscaler::new());
        let video = Arc::new(MockVideoEncoder::new());
        let encoder_config = EncoderConfig::default();
        let encoder = Arc::new(SizeConstrainedEncoder::new(video.clone(), encoder_config));
        let runner = JobRunner::new(
            RunnerConfig::default()
                .with_min_frame_bytes(64)
                .with_canvas_size(64),
            gallery.clone(),
            upscaler.clone(),
            FrameSourceResolver::new(ResolverConfig::default()),
            encoder,
            Workspace::new(&WorkspaceConfig::default().with_root(dir.path())),
        );
        Harness {
            _dir: dir,
            gallery,
            upscaler,
            video,
            runner,
        }
    }

    fn no_phase() -> PhaseCallback {
        Arc::new(|_| {})
    }

    #[tokio::test]
    async fn test_static_items_skip_encoder() {
        let h = harness();
        h.gallery
            .add_asset(
                10,
                "Stills",
                (0..3).map(|_| ("png", fixtures::noise_png(16, 16))).collect(),
            )
            .await;

        let job = Job::new(1, "alice", 10, Default::default());
        let completed = h.runner.run(&job, no_phase()).await.unwrap();

        assert_eq!(completed.artifacts.len(), 3);
        for (n, artifact) in completed.artifacts.iter().enumerate() {
            assert_eq!(artifact.index, n + 1);
            assert_eq!(artifact.kind, ArtifactKind::Static);
            assert!(artifact.size_bytes <= 512 * 1024);
            let still = image::open(&artifact.path).unwrap();
            assert_eq!((still.width(), still.height()), (64, 64));
        }
        assert_eq!(h.upscaler.call_count().await, 3);
        assert_eq!(h.video.pass_count().await, 0);
    }

    #[tokio::test]
    async fn test_animated_item_is_encoded() {
        let h = harness();
        h.gallery
            .add_asset(
                11,
                "Anim",
                vec![("gif", fixtures::noise_gif(16, 16, &[100, 200, 100]))],
            )
            .await;

        let phases = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = phases.clone();
        let on_phase: PhaseCallback = Arc::new(move |p| recorded.lock().unwrap().push(p));

        let job = Job::new(1, "alice", 11, Default::default());
        let completed = h.runner.run(&job, on_phase).await.unwrap();

        assert_eq!(completed.artifacts.len(), 1);
        let artifact = &completed.artifacts[0];
        assert_eq!(artifact.kind, ArtifactKind::Animated);
        assert!(artifact.path.ends_with("1.webm"));
        assert_eq!(h.upscaler.call_count().await, 3);
        assert!(h.video.pass_count().await >= 1);

        let frames_dir = h.runner.workspace().job(11).frames_dir(1);
        for n in 0..3 {
            assert!(frames_dir.join(frame_file_name(n)).exists());
        }
        assert_eq!(
            *phases.lock().unwrap(),
            vec![JobPhase::Fetching, JobPhase::Upscaling, JobPhase::Encoding]
        );
    }

    #[tokio::test]
    async fn test_merged_stills_make_one_artifact() {
        let h = harness();
        h.gallery
            .add_asset(
                12,
                "Pair",
                (0..3).map(|_| ("png", fixtures::noise_png(16, 16))).collect(),
            )
            .await;

        let job = Job::new(1, "alice", 12, Default::default()).with_merge_indices(vec![1]);
        let completed = h.runner.run(&job, no_phase()).await.unwrap();

        let indices: Vec<_> = completed.artifacts.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(h.upscaler.call_count().await, 3);

        let merged = image::open(&completed.artifacts[0].path).unwrap().to_rgba8();
        assert_eq!(merged.dimensions(), (64, 64));
        assert_eq!(merged.get_pixel(5, 2)[3], 0);
    }

    #[tokio::test]
    async fn test_merged_animations_use_shorter_sequence() {
        let h = harness();
        h.gallery
            .add_asset(
                13,
                "Anim pair",
                vec![
                    ("gif", fixtures::noise_gif(16, 16, &[100, 100, 100])),
                    ("gif", fixtures::noise_gif(16, 16, &[200, 200])),
                ],
            )
            .await;

        let job = Job::new(1, "alice", 13, Default::default()).with_merge_indices(vec![1]);
        let completed = h.runner.run(&job, no_phase()).await.unwrap();

        assert_eq!(completed.artifacts.len(), 1);
        // Two frame pairs, both halves upscaled.
        assert_eq!(h.upscaler.call_count().await, 4);
        let frames_dir = h.runner.workspace().job(13).frames_dir(1);
        assert!(frames_dir.join(frame_file_name(1)).exists());
        assert!(!frames_dir.join(frame_file_name(2)).exists());
    }

    #[tokio::test]
    async fn test_upscale_failure_fails_job() {
        let h = harness();
        h.gallery
            .add_asset(14, "Broken", vec![("png", fixtures::noise_png(16, 16))])
            .await;
        h.upscaler
            .set_next_error(crate::upscale::UpscaleError::failed("gpu lost", None))
            .await;

        let job = Job::new(1, "alice", 14, Default::default());
        let result = h.runner.run(&job, no_phase()).await;
        assert!(matches!(result, Err(JobError::Upscale(_))));
    }
}
