use async_trait::async_trait;
use image::RgbaImage;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;
use uuid::Uuid;

use super::config::UpscalerConfig;
use super::error::UpscaleError;
use super::traits::Upscaler;

/// Runs an external super-resolution tool on a temporary PNG.
pub struct CommandUpscaler {
    config: UpscalerConfig,
}

impl CommandUpscaler {
    pub fn new(config: UpscalerConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
        ];
        args.extend(self.config.args.iter().cloned());
        args
    }

    async fn run(&self, input: &Path, output: &Path) -> Result<(), UpscaleError> {
        let args = self.build_args(input, output);
        debug!(command = %self.config.command.display(), ?args, "Running upscaler");

        let child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    UpscaleError::CommandNotFound {
                        path: self.config.command.clone(),
                    }
                } else {
                    UpscaleError::Io(e)
                }
            })?;

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        // Dropping the future on timeout kills the child.
        let output = timeout(timeout_duration, child.wait_with_output())
            .await
            .map_err(|_| UpscaleError::Timeout {
                timeout_secs: self.config.timeout_secs,
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(UpscaleError::failed(
                format!("upscaler exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Upscaler for CommandUpscaler {
    fn name(&self) -> &str {
        "command"
    }

    async fn upscale(&self, image: RgbaImage) -> Result<RgbaImage, UpscaleError> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let id = Uuid::new_v4();
        let input = self.config.work_dir.join(format!("{}_in.png", id));
        let output = self.config.work_dir.join(format!("{}_out.png", id));

        let write_path = input.clone();
        tokio::task::spawn_blocking(move || image.save(&write_path))
            .await
            .map_err(|e| UpscaleError::failed(format!("encode worker failed: {}", e), None))??;

        let result = self.run(&input, &output).await;
        let upscaled = match result {
            Ok(()) => {
                let read_path = output.clone();
                tokio::task::spawn_blocking(move || {
                    image::open(&read_path).map(|img| img.to_rgba8())
                })
                .await
                .map_err(|e| UpscaleError::failed(format!("decode worker failed: {}", e), None))?
                .map_err(UpscaleError::from)
            }
            Err(e) => Err(e),
        };

        let _ = tokio::fs::remove_file(&input).await;
        let _ = tokio::fs::remove_file(&output).await;
        upscaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_args() {
        let upscaler = CommandUpscaler::new(UpscalerConfig::default());
        let args = upscaler.build_args(Path::new("/tmp/a.png"), Path::new("/tmp/b.png"));
        assert_eq!(
            args,
            vec!["-i", "/tmp/a.png", "-o", "/tmp/b.png", "-n", "1", "-s", "2"]
        );
    }

    #[tokio::test]
    async fn test_missing_command() {
        let dir = tempfile::tempdir().unwrap();
        let upscaler = CommandUpscaler::new(UpscalerConfig {
            command: PathBuf::from("/nonexistent/waifu2x"),
            work_dir: dir.path().to_path_buf(),
            ..UpscalerConfig::default()
        });

        let err = upscaler.upscale(RgbaImage::new(4, 4)).await.unwrap_err();
        assert!(matches!(err, UpscaleError::CommandNotFound { .. }));
        // Scratch files are removed even on failure.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
