pub mod annotation;
pub mod detection;
pub mod pipeline;
pub mod segmentation;
pub mod shared;
pub mod video;
