use std::path::Path;

use opencv::core::{Mat, Rect, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::video::infrastructure::mat_convert::frame_to_mat;

const SCALE_FACTOR: f64 = 1.1;
const MIN_NEIGHBORS: i32 = 3;

/// Viola-Jones detector running a pre-trained Haar cascade on the
/// grayscale version of each frame.
pub struct HaarCascadeDetector {
    classifier: CascadeClassifier,
    min_size: (u32, u32),
    gray: Mat,
    hits: Vector<Rect>,
}

impl HaarCascadeDetector {
    pub fn new(
        cascade_path: &Path,
        min_size: (u32, u32),
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let path_str = cascade_path
            .to_str()
            .ok_or_else(|| format!("Invalid cascade path: {}", cascade_path.display()))?;
        let classifier = CascadeClassifier::new(path_str)?;
        if classifier.empty()? {
            return Err(format!("Failed to load cascade: {}", cascade_path.display()).into());
        }
        log::info!("Loaded cascade {}", cascade_path.display());
        Ok(Self {
            classifier,
            min_size,
            gray: Mat::default(),
            hits: Vector::new(),
        })
    }
}

impl ObjectDetector for HaarCascadeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let mat = frame_to_mat(frame)?;
        let gray = if frame.channels() == 1 {
            &mat
        } else {
            imgproc::cvt_color_def(&mat, &mut self.gray, imgproc::COLOR_BGR2GRAY)?;
            &self.gray
        };

        self.hits.clear();
        self.classifier.detect_multi_scale(
            gray,
            &mut self.hits,
            SCALE_FACTOR,
            MIN_NEIGHBORS,
            0,
            Size::new(self.min_size.0 as i32, self.min_size.1 as i32),
            Size::default(),
        )?;

        Ok(self
            .hits
            .iter()
            .map(|r| Region::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}
