//! ffconcat manifests describing frame files and their durations.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::error::EncodeError;

/// File name of the manifest inside a frames directory.
pub const MANIFEST_FILE_NAME: &str = "frame_info.txt";

/// File name of the frame at `index` (zero-based).
pub fn frame_file_name(index: usize) -> String {
    format!("{:03}.png", index)
}

/// Renders the manifest text and returns it with the total duration in
/// seconds, rounded to hundredths.
///
/// The last frame is listed twice so the demuxer honors its duration.
pub fn render_manifest(durations_ms: &[u32]) -> (String, f64) {
    let mut text = String::new();
    let mut total_secs = 0.0_f64;

    for (index, duration) in durations_ms.iter().enumerate() {
        let secs = f64::from(*duration) / 1000.0;
        total_secs += secs;
        let _ = writeln!(text, "file '{}'", frame_file_name(index));
        let _ = writeln!(text, "duration {}", secs);
    }
    if !durations_ms.is_empty() {
        let _ = writeln!(text, "file '{}'", frame_file_name(durations_ms.len() - 1));
    }

    (text, (total_secs * 100.0).round() / 100.0)
}

/// Writes the manifest into `frames_dir`.
pub async fn write_manifest(
    frames_dir: &Path,
    durations_ms: &[u32],
) -> Result<(PathBuf, f64), EncodeError> {
    let (text, total_secs) = render_manifest(durations_ms);
    let path = frames_dir.join(MANIFEST_FILE_NAME);
    tokio::fs::write(&path, text).await?;
    Ok((path, total_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_manifest() {
        let (text, total) = render_manifest(&[60, 60, 130]);
        assert_eq!(
            text,
            "file '000.png'\nduration 0.06\n\
             file '001.png'\nduration 0.06\n\
             file '002.png'\nduration 0.13\n\
             file '002.png'\n"
        );
        assert_eq!(total, 0.25);
    }

    #[test]
    fn test_total_is_rounded() {
        let (_, total) = render_manifest(&[333, 333, 333]);
        assert_eq!(total, 1.0);
    }

    #[tokio::test]
    async fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let (path, total) = write_manifest(dir.path(), &[100, 200]).await.unwrap();

        assert_eq!(path.file_name().unwrap(), MANIFEST_FILE_NAME);
        assert_eq!(total, 0.3);
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.ends_with("file '001.png'\n"));
    }
}
