pub mod detection_pass;
pub mod object_detector;
