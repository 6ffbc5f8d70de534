use opencv::core::{Mat, Ptr};
use opencv::prelude::*;
use opencv::video::{self, BackgroundSubtractorKNN, BackgroundSubtractorMOG2};

use crate::segmentation::domain::background_subtractor::{
    BackgroundSubtractor, SubtractorAlgorithm,
};
use crate::shared::frame::Frame;
use crate::video::infrastructure::mat_convert::{frame_to_mat, mat_to_frame};

const HISTORY: i32 = 500;
const KNN_DIST2_THRESHOLD: f64 = 400.0;
const MOG2_VAR_THRESHOLD: f64 = 16.0;
const DETECT_SHADOWS: bool = true;
/// Negative rate lets OpenCV pick the learning rate from the history length.
const AUTO_LEARNING_RATE: f64 = -1.0;

enum Model {
    Knn(Ptr<BackgroundSubtractorKNN>),
    Mog2(Ptr<BackgroundSubtractorMOG2>),
}

/// OpenCV KNN or MOG2 background model with OpenCV's default parameters.
pub struct OpenCvBackgroundSubtractor {
    model: Model,
    mask: Mat,
}

impl OpenCvBackgroundSubtractor {
    pub fn new(algorithm: SubtractorAlgorithm) -> Result<Self, Box<dyn std::error::Error>> {
        let model = match algorithm {
            SubtractorAlgorithm::Knn => Model::Knn(video::create_background_subtractor_knn(
                HISTORY,
                KNN_DIST2_THRESHOLD,
                DETECT_SHADOWS,
            )?),
            SubtractorAlgorithm::Mog2 => Model::Mog2(video::create_background_subtractor_mog2(
                HISTORY,
                MOG2_VAR_THRESHOLD,
                DETECT_SHADOWS,
            )?),
        };
        log::debug!("Created {algorithm} background subtractor");
        Ok(Self {
            model,
            mask: Mat::default(),
        })
    }
}

impl BackgroundSubtractor for OpenCvBackgroundSubtractor {
    fn apply(&mut self, frame: &Frame) -> Result<Frame, Box<dyn std::error::Error>> {
        let mat = frame_to_mat(frame)?;
        match &mut self.model {
            Model::Knn(m) => m.apply(&mat, &mut self.mask, AUTO_LEARNING_RATE)?,
            Model::Mog2(m) => m.apply(&mat, &mut self.mask, AUTO_LEARNING_RATE)?,
        }
        mat_to_frame(&self.mask, frame.index())
    }
}
