use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::shared::constants::FRAMES_DIR_NAME;

/// Creates `dir` and `dir/frames` when absent. Returns the frames directory.
pub fn prepare_output_dirs(dir: &Path) -> io::Result<PathBuf> {
    let frames = dir.join(FRAMES_DIR_NAME);
    for d in [dir, frames.as_path()] {
        if !d.exists() {
            log::info!("dir {} doesn't exist - creating", d.display());
            fs::create_dir_all(d)?;
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_dir_and_frames_subdir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("videos");
        let frames = prepare_output_dirs(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(frames.is_dir());
        assert_eq!(frames, dir.join("frames"));
    }

    #[test]
    fn test_existing_dirs_are_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let frames = tmp.path().join("frames");
        fs::create_dir_all(&frames).unwrap();
        fs::write(frames.join("0.png"), b"x").unwrap();

        prepare_output_dirs(tmp.path()).unwrap();
        assert!(frames.join("0.png").exists());
    }

    #[test]
    fn test_file_in_the_way_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("videos");
        fs::write(&blocker, b"not a dir").unwrap();
        assert!(prepare_output_dirs(&blocker).is_err());
    }
}
