use std::fmt;
use std::str::FromStr;

use crate::shared::frame::Frame;

/// Stateful foreground/background model updated with every frame.
pub trait BackgroundSubtractor: Send {
    /// Feeds `frame` into the model and returns its single-channel
    /// foreground mask, same width and height as `frame`.
    fn apply(&mut self, frame: &Frame) -> Result<Frame, Box<dyn std::error::Error>>;
}

/// Background-subtraction model family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubtractorAlgorithm {
    /// K-nearest-neighbours model.
    #[default]
    Knn,
    /// Gaussian mixture model.
    Mog2,
}

impl FromStr for SubtractorAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "knn" => Ok(Self::Knn),
            "mog2" => Ok(Self::Mog2),
            other => Err(format!(
                "Subtractor must be 'knn' or 'mog2', got '{other}'"
            )),
        }
    }
}

impl fmt::Display for SubtractorAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Knn => write!(f, "knn"),
            Self::Mog2 => write!(f, "mog2"),
        }
    }
}
