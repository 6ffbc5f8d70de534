use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{ASSEMBLED_FPS, IMAGE_EXTENSIONS, OUTPUT_FOURCC};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::video_writer::VideoWriter;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("no frame images found in {0}")]
    NoFrames(PathBuf),
    #[error("cannot list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read image {path}: {message}")]
    Image { path: PathBuf, message: String },
    #[error("{path} is {}x{}, expected {}x{}", actual.0, actual.1, expected.0, expected.1)]
    SizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("video writer failed: {0}")]
    Writer(String),
}

/// Stitches saved snapshot images back into a video.
pub struct AssembleVideoUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn VideoWriter>,
}

impl AssembleVideoUseCase {
    pub fn new(reader: Box<dyn ImageReader>, writer: Box<dyn VideoWriter>) -> Self {
        Self { reader, writer }
    }

    /// Writes every image in `frames_dir` to `output`, sized after the
    /// first image. Returns the number of frames written.
    pub fn execute(&mut self, frames_dir: &Path, output: &Path) -> Result<usize, AssembleError> {
        let images = list_frame_images(frames_dir)?;
        let Some(first_path) = images.first() else {
            return Err(AssembleError::NoFrames(frames_dir.to_path_buf()));
        };
        log::info!("Assembling {} images from {}", images.len(), frames_dir.display());

        let first = self.read(first_path, 0)?;
        let metadata = VideoMetadata {
            width: first.width(),
            height: first.height(),
            fps: ASSEMBLED_FPS,
            total_frames: images.len(),
            codec: OUTPUT_FOURCC.iter().collect(),
            source_path: Some(output.to_path_buf()),
        };
        self.writer
            .open(output, &metadata)
            .map_err(|e| AssembleError::Writer(e.to_string()))?;

        let result = self.write_all(&images, first.dimensions());
        let closed = self
            .writer
            .close()
            .map_err(|e| AssembleError::Writer(e.to_string()));
        let written = result?;
        closed?;

        log::info!("Wrote {written} frames to {}", output.display());
        Ok(written)
    }

    fn write_all(
        &mut self,
        images: &[PathBuf],
        expected: (u32, u32),
    ) -> Result<usize, AssembleError> {
        for (index, path) in images.iter().enumerate() {
            let frame = self.read(path, index)?;
            if frame.dimensions() != expected {
                return Err(AssembleError::SizeMismatch {
                    path: path.clone(),
                    expected,
                    actual: frame.dimensions(),
                });
            }
            self.writer
                .write(&frame)
                .map_err(|e| AssembleError::Writer(e.to_string()))?;
        }
        Ok(images.len())
    }

    fn read(&self, path: &Path, index: usize) -> Result<Frame, AssembleError> {
        self.reader
            .read(path, index)
            .map_err(|e| AssembleError::Image {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

/// Image files in `dir`, ordered by numeric stem (`9.png` before `10.png`).
/// Non-numeric stems follow, alphabetically.
pub fn list_frame_images(dir: &Path) -> Result<Vec<PathBuf>, AssembleError> {
    let io_err = |source| AssembleError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut images = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| compare_frame_paths(a, b));
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn compare_frame_paths(a: &Path, b: &Path) -> Ordering {
    let stem = |p: &Path| {
        p.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    };
    let (sa, sb) = (stem(a), stem(b));
    match (sa.parse::<u64>(), sb.parse::<u64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb).then_with(|| sa.cmp(&sb)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => sa.cmp(&sb),
    }
}
