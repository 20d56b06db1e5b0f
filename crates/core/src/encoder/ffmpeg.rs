//! FFmpeg-based video encoder.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::EncoderConfig;
use super::error::EncodeError;
use super::traits::VideoEncoder;
use super::types::EncodePass;

/// Encodes frame manifests to VP9 WebM with an alpha channel.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    /// Builds ffmpeg arguments for one pass.
    fn build_args(&self, pass: &EncodePass) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            pass.manifest_path.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!(
                "scale={}:{},format={}",
                pass.width, pass.height, self.config.pixel_format
            ),
            "-c:v".to_string(),
            self.config.codec.clone(),
            "-b:v".to_string(),
            format!("{}k", pass.bitrate_kbps),
            "-pix_fmt".to_string(),
            self.config.pixel_format.clone(),
            // No audio, no subtitles
            "-an".to_string(),
            "-sn".to_string(),
            "-y".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-hide_banner".to_string(),
            "-t".to_string(),
            format!("{}", pass.duration_secs),
        ];

        args.push(pass.output_path.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encode_pass(&self, pass: &EncodePass) -> Result<(), EncodeError> {
        if let Some(parent) = pass.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(pass);
        debug!(bitrate_kbps = pass.bitrate_kbps, output = %pass.output_path.display(), "Running ffmpeg pass");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EncodeError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EncodeError::encoder_failed("stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.pass_timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut error_output = String::new();
            while let Ok(Some(line)) = reader.next_line().await {
                error_output.push_str(&line);
                error_output.push('\n');
            }
            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(EncodeError::encoder_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(EncodeError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(EncodeError::Timeout {
                    timeout_secs: self.config.pass_timeout_secs,
                });
            }
        }

        if tokio::fs::metadata(&pass.output_path).await.is_err() {
            return Err(EncodeError::OutputMissing {
                path: pass.output_path.clone(),
            });
        }
        Ok(())
    }

    async fn validate(&self) -> Result<(), EncodeError> {
        let result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(EncodeError::encoder_failed(
                "ffmpeg -version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EncodeError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                })
            }
            Err(e) => Err(EncodeError::Io(e)),
        }
    }
}
