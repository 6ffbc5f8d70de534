use std::path::{Path, PathBuf};

use crate::shared::constants::{
    CANCEL_KEYS, DEFAULT_VIDEO_NAME, FRAMES_DIR_NAME, KEY_POLL_DELAY_MS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Capture,
    Playback,
}

/// Immutable per-run settings for a video session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub mode: SessionMode,
    /// Video file being played; `None` for camera capture.
    pub source: Option<PathBuf>,
    /// Video file being written; `None` for playback.
    pub destination: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub save_frames: bool,
    pub key_delay_ms: i32,
    pub cancel_keys: Vec<i32>,
    /// Stop after this many frames; `None` runs to end-of-stream or cancel.
    pub max_frames: Option<usize>,
}

impl SessionConfig {
    /// Capture into `output_dir`, writing `file_name` or `default.mp4`.
    pub fn capture(output_dir: impl Into<PathBuf>, file_name: Option<&str>) -> Self {
        let output_dir = output_dir.into();
        let destination = output_dir.join(file_name.unwrap_or(DEFAULT_VIDEO_NAME));
        Self {
            mode: SessionMode::Capture,
            source: None,
            destination: Some(destination),
            output_dir,
            save_frames: false,
            key_delay_ms: KEY_POLL_DELAY_MS,
            cancel_keys: CANCEL_KEYS.to_vec(),
            max_frames: None,
        }
    }

    pub fn playback(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let output_dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            mode: SessionMode::Playback,
            source: Some(source),
            destination: None,
            output_dir,
            save_frames: false,
            key_delay_ms: KEY_POLL_DELAY_MS,
            cancel_keys: CANCEL_KEYS.to_vec(),
            max_frames: None,
        }
    }

    pub fn with_save_frames(mut self, save_frames: bool) -> Self {
        self.save_frames = save_frames;
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join(FRAMES_DIR_NAME)
    }

    /// Where the composite for frame `index` is saved: `<dir>/frames/<index>.png`.
    pub fn snapshot_path(&self, index: usize) -> PathBuf {
        self.frames_dir().join(format!("{index}.png"))
    }

    pub fn is_cancel_key(&self, key: i32) -> bool {
        self.cancel_keys.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_defaults_to_default_mp4() {
        let config = SessionConfig::capture("videos", None);
        assert_eq!(config.mode, SessionMode::Capture);
        assert_eq!(config.destination, Some(PathBuf::from("videos/default.mp4")));
        assert_eq!(config.source, None);
        assert!(!config.save_frames);
        assert_eq!(config.key_delay_ms, 25);
        assert_eq!(config.max_frames, None);
    }

    #[test]
    fn test_capture_with_custom_name() {
        let config = SessionConfig::capture("out", Some("clip.mp4"));
        assert_eq!(config.destination, Some(PathBuf::from("out/clip.mp4")));
    }

    #[test]
    fn test_playback_has_no_destination() {
        let config = SessionConfig::playback("videos/default.mp4");
        assert_eq!(config.mode, SessionMode::Playback);
        assert_eq!(config.source, Some(PathBuf::from("videos/default.mp4")));
        assert_eq!(config.destination, None);
        assert_eq!(config.output_dir, PathBuf::from("videos"));
    }

    #[test]
    fn test_snapshot_path() {
        let config = SessionConfig::capture("videos", None).with_save_frames(true);
        assert_eq!(config.snapshot_path(17), PathBuf::from("videos/frames/17.png"));
    }

    #[test]
    fn test_cancel_keys() {
        let config = SessionConfig::capture("videos", None);
        assert!(config.is_cancel_key(b'q' as i32));
        assert!(config.is_cancel_key(27));
        assert!(!config.is_cancel_key(b'x' as i32));
    }
}
